//! Error types for profile validation, queries, builds and the matrix file.

use std::io;

use crate::ratings::{ItemId, UserId};

// ============================================================================
// RATINGS
// ============================================================================

/// Malformed rating data for a single user.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("item {item} is rated more than once")]
    DuplicateItem { item: ItemId },

    #[error("rating for item {item} is not a finite number")]
    NonFiniteRating { item: ItemId },
}

/// The canonical user ordering is not a valid set of row positions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderingError {
    #[error("user {0} appears more than once in the ordering")]
    DuplicateUser(UserId),
}

// ============================================================================
// QUERIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatrixError {
    #[error("user {0} not found in the matrix")]
    UserNotFound(UserId),
}

// ============================================================================
// BUILD
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("neighbor capacity k must be at least 1")]
    ZeroCapacity,

    #[error("overlap threshold must be at least 1")]
    ZeroOverlapThreshold,

    #[error("worker pool needs at least one thread")]
    ZeroThreads,
}

/// Why a single row of the matrix could not be computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("rating source has no ratings for the row user")]
    MissingRatings,

    #[error("malformed ratings: {0}")]
    Profile(#[from] ProfileError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    pub user: UserId,
    pub error: RowError,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid user ordering: {0}")]
    Ordering(#[from] OrderingError),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Some rows failed. Every other row is complete in `partial`; failed rows are empty.
    #[error("{} of {} rows failed", .failures.len(), .partial.len())]
    RowsFailed {
        failures: Vec<RowFailure>,
        partial: Box<crate::matrix::CorrelationMatrix>,
    },
}

// ============================================================================
// MATRIX FILE
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid user ordering: {0}")]
    Ordering(#[from] OrderingError),

    #[error("matrix file is missing its header lines")]
    MissingHeader,

    #[error("invalid row count {0:?}")]
    InvalidRowCount(String),

    #[error("matrix declares {declared} rows but the user ordering has {expected}")]
    RowCountMismatch { declared: usize, expected: usize },

    #[error("matrix file ends before row {row}")]
    MissingRow { row: usize },

    #[error("row {row} has {actual} cells, expected {expected}")]
    CellCount {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("row {row}, column {column}: invalid cell {token:?}")]
    InvalidCell {
        row: usize,
        column: usize,
        token: String,
    },

    #[error("row {row} stores a similarity for its own user")]
    SelfCorrelation { row: usize },

    #[error("row {row} holds {entries} neighbors, capacity is {capacity}")]
    RowOverCapacity {
        row: usize,
        entries: usize,
        capacity: usize,
    },

    #[error("unexpected content after row {rows}")]
    TrailingData { rows: usize },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
