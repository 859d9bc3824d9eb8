//! Pearson Kernel - top-K user neighbor matrix for collaborative filtering
//!
//! Provides:
//! - Weighted Pearson correlation over sparse rating vectors
//! - Parallel all-pairs build keeping the K strongest neighbors per user
//! - Dense text persistence of the resulting (asymmetric) matrix

pub mod builder;
pub mod codec;
pub mod config;
pub mod correlation;
pub mod error;
pub mod fingerprint;
pub mod matrix;
pub mod neighbors;
pub mod ratings;
pub mod score;

#[cfg(feature = "python")]
mod bindings;

pub use builder::{build_matrix, MatrixBuilder};
pub use codec::{read_matrix, write_matrix};
pub use config::MatrixConfig;
pub use correlation::{CorrelationEngine, SparseProfile};
pub use error::{BuildError, CodecError, ConfigError, MatrixError, OrderingError, ProfileError, RowError, RowFailure};
pub use matrix::CorrelationMatrix;
pub use neighbors::BoundedNeighborSet;
pub use ratings::{check_ordering, InMemoryRatings, ItemId, RatingEntry, RatingSource, UserId};
pub use score::QuantizedScore;
