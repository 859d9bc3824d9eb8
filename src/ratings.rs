//! Rating source, the read-only input to a matrix build.
//!
//! The kernel never loads raw training files. Anything that can hand out the
//! canonical user ordering and each user's sparse ratings can feed a build.

use std::collections::{HashMap, HashSet};

use crate::error::OrderingError;

pub type UserId = u32;
pub type ItemId = u32;

/// One (item, rating) pair of a user's sparse rating vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingEntry {
    pub item: ItemId,
    pub rating: f64,
}

impl RatingEntry {
    pub fn new(item: ItemId, rating: f64) -> Self {
        Self { item, rating }
    }
}

/// Source of the canonical user ordering and per-user ratings.
///
/// The ordering fixes the row and column positions of the matrix, both when
/// building and when reading a persisted file, so it must not change for the
/// lifetime of either operation.
pub trait RatingSource: Sync {
    fn user_ids(&self) -> &[UserId];

    fn ratings_for(&self, user: UserId) -> Option<&[RatingEntry]>;
}

/// Every id of a canonical ordering must name exactly one row.
pub fn check_ordering(user_ids: &[UserId]) -> Result<(), OrderingError> {
    let mut seen = HashSet::with_capacity(user_ids.len());
    match user_ids.iter().find(|&&user| !seen.insert(user)) {
        Some(&user) => Err(OrderingError::DuplicateUser(user)),
        None => Ok(()),
    }
}

/// Ratings held in memory, users ordered by first appearance.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRatings {
    user_ids: Vec<UserId>,
    ratings: HashMap<UserId, Vec<RatingEntry>>,
}

impl InMemoryRatings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an explicit ordering. Users in `user_ids` without ratings
    /// are kept in the ordering; ratings for users outside it are kept but
    /// never reach a row.
    pub fn with_ordering(user_ids: Vec<UserId>, ratings: HashMap<UserId, Vec<RatingEntry>>) -> Self {
        Self { user_ids, ratings }
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (UserId, ItemId, f64)>,
    {
        let mut source = Self::new();
        for (user, item, rating) in records {
            source.push(user, item, rating);
        }
        source
    }

    pub fn push(&mut self, user: UserId, item: ItemId, rating: f64) {
        let entries = self.ratings.entry(user).or_insert_with(|| {
            self.user_ids.push(user);
            Vec::new()
        });
        entries.push(RatingEntry::new(item, rating));
    }

    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }
}

impl RatingSource for InMemoryRatings {
    fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    fn ratings_for(&self, user: UserId) -> Option<&[RatingEntry]> {
        self.ratings.get(&user).map(Vec::as_slice)
    }
}
