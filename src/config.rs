//! Build parameters and their line-2 annotation in the matrix file.

use crate::correlation::DEFAULT_OVERLAP_THRESHOLD;
use crate::error::ConfigError;
use crate::fingerprint::ordering_fingerprint;
use crate::ratings::UserId;

pub const DEFAULT_K: usize = 200;
pub const DEFAULT_THREADS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixConfig {
    /// Neighbors kept per row
    pub k: usize,
    /// Co-rated items needed for full correlation weight
    pub overlap_threshold: usize,
    /// Worker pool size
    pub num_threads: usize,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            num_threads: DEFAULT_THREADS,
        }
    }
}

impl MatrixConfig {
    pub fn with_k(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.overlap_threshold == 0 {
            return Err(ConfigError::ZeroOverlapThreshold);
        }
        if self.num_threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }

    /// Human-readable record of the build, e.g.
    /// `k=200,overlap_threshold=125,threads=4,ordering=9f86d081884c7d65`.
    pub fn annotation(&self, ordering: &[UserId]) -> String {
        format!(
            "k={},overlap_threshold={},threads={},ordering={}",
            self.k,
            self.overlap_threshold,
            self.num_threads,
            ordering_fingerprint(ordering)
        )
    }
}

/// Value of `key` in a `key=value,...` annotation line.
pub fn annotation_value<'a>(annotation: &'a str, key: &str) -> Option<&'a str> {
    annotation.split(',').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k.trim() == key).then(|| v.trim())
    })
}
