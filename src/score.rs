//! Fixed-point similarity owned by a neighbor id.
//!
//! Similarities are stored as `round(similarity * 10000)` in an `i16`, so
//! ranking thousands of candidates compares integers, never floats.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::ratings::UserId;

pub const SCALE: f64 = 10_000.0;

#[derive(Debug, Clone, Copy)]
pub struct QuantizedScore {
    owner: UserId,
    scaled: i16,
}

impl QuantizedScore {
    /// Quantize `similarity`. Values outside `[-1, 1]` saturate at the `i16` range.
    pub fn new(owner: UserId, similarity: f64) -> Self {
        let scaled = (similarity * SCALE)
            .round()
            .clamp(i16::MIN as f64, i16::MAX as f64) as i16;
        Self { owner, scaled }
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn scaled(&self) -> i16 {
        self.scaled
    }

    pub fn magnitude(&self) -> u16 {
        self.scaled.unsigned_abs()
    }

    pub fn similarity(&self) -> f64 {
        self.scaled as f64 / SCALE
    }

    pub fn is_zero(&self) -> bool {
        self.scaled == 0
    }

    /// Rank order: ascending by `|scaled|`, then by owner id.
    ///
    /// Total over (magnitude, owner). Not an `Ord` impl, since equality is
    /// the owner alone.
    pub fn cmp_rank(&self, other: &Self) -> Ordering {
        self.magnitude()
            .cmp(&other.magnitude())
            .then_with(|| self.owner.cmp(&other.owner))
    }

    /// Strength order: larger magnitude wins, a smaller owner id wins a tie.
    pub fn cmp_strength(&self, other: &Self) -> Ordering {
        self.magnitude()
            .cmp(&other.magnitude())
            .then_with(|| other.owner.cmp(&self.owner))
    }
}

/// Identity is the owner alone.
impl PartialEq for QuantizedScore {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner
    }
}

impl Eq for QuantizedScore {}

impl Hash for QuantizedScore {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
    }
}
