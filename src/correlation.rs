//! Weighted Pearson correlation between two sparse rating vectors.
//!
//! Only co-rated items count: means, deviations and norms are all taken over
//! the intersection of the two users' items. Pairs with fewer than
//! `overlap_threshold` co-rated items are damped by `overlap / threshold`.

use std::cmp::Ordering;

use crate::error::ProfileError;
use crate::ratings::{ItemId, RatingEntry};

pub const DEFAULT_OVERLAP_THRESHOLD: usize = 125;

/// One user's ratings, validated and sorted by item id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseProfile {
    items: Vec<ItemId>,
    ratings: Vec<f64>,
}

impl SparseProfile {
    pub fn from_ratings(entries: &[RatingEntry]) -> Result<Self, ProfileError> {
        let mut sorted: Vec<RatingEntry> = entries.to_vec();
        sorted.sort_unstable_by_key(|entry| entry.item);

        let mut items = Vec::with_capacity(sorted.len());
        let mut ratings = Vec::with_capacity(sorted.len());
        for entry in sorted {
            if !entry.rating.is_finite() {
                return Err(ProfileError::NonFiniteRating { item: entry.item });
            }
            if items.last() == Some(&entry.item) {
                return Err(ProfileError::DuplicateItem { item: entry.item });
            }
            items.push(entry.item);
            ratings.push(entry.rating);
        }

        Ok(Self { items, ratings })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Co-rated items as `(x, y)` rating pairs, in item order.
    fn co_rated(&self, other: &SparseProfile) -> Vec<(f64, f64)> {
        let mut pairs = Vec::with_capacity(self.len().min(other.len()));
        let (mut i, mut j) = (0, 0);
        while i < self.items.len() && j < other.items.len() {
            match self.items[i].cmp(&other.items[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    pairs.push((self.ratings[i], other.ratings[j]));
                    i += 1;
                    j += 1;
                }
            }
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationEngine {
    overlap_threshold: usize,
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAP_THRESHOLD)
    }
}

impl CorrelationEngine {
    /// `overlap_threshold` must be positive; `MatrixConfig::validate` guards the build path.
    pub fn new(overlap_threshold: usize) -> Self {
        Self {
            overlap_threshold: overlap_threshold.max(1),
        }
    }

    pub fn overlap_threshold(&self) -> usize {
        self.overlap_threshold
    }

    /// Damping weight for `overlap` co-rated items.
    pub fn weight(&self, overlap: usize) -> f64 {
        if overlap >= self.overlap_threshold {
            1.0
        } else {
            overlap as f64 / self.overlap_threshold as f64
        }
    }

    /// Correlate two raw rating lists in any item order.
    pub fn correlate(&self, x: &[RatingEntry], y: &[RatingEntry]) -> Result<f64, ProfileError> {
        let x = SparseProfile::from_ratings(x)?;
        let y = SparseProfile::from_ratings(y)?;
        Ok(self.correlate_profiles(&x, &y))
    }

    /// Weighted Pearson correlation over the co-rated items.
    ///
    /// Returns 0 when the users share no item or when either side is constant
    /// over the shared items.
    pub fn correlate_profiles(&self, x: &SparseProfile, y: &SparseProfile) -> f64 {
        let pairs = x.co_rated(y);
        let overlap = pairs.len();
        if overlap == 0 {
            return 0.0;
        }

        let n = overlap as f64;
        let mean_x = pairs.iter().map(|&(a, _)| a).sum::<f64>() / n;
        let mean_y = pairs.iter().map(|&(_, b)| b).sum::<f64>() / n;

        let mut covariance = 0.0;
        let mut ss_x = 0.0;
        let mut ss_y = 0.0;
        for &(a, b) in &pairs {
            let dx = a - mean_x;
            let dy = b - mean_y;
            covariance += dx * dy;
            ss_x += dx * dx;
            ss_y += dy * dy;
        }

        if ss_x == 0.0 || ss_y == 0.0 {
            return 0.0;
        }

        self.weight(overlap) * covariance / (ss_x.sqrt() * ss_y.sqrt())
    }
}
