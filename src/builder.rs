//! Matrix Builder - all-pairs weighted correlation on a fixed worker pool (O(N²)).
//!
//! Workers claim row indices from a shared atomic counter. Each row is owned
//! by exactly one worker for its whole inner loop and lands in its own
//! write-once slot, so rows need no locking.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use log::{debug, info, warn};
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::config::MatrixConfig;
use crate::correlation::{CorrelationEngine, SparseProfile};
use crate::error::{BuildError, ConfigError, RowError, RowFailure};
use crate::matrix::CorrelationMatrix;
use crate::neighbors::BoundedNeighborSet;
use crate::ratings::{check_ordering, RatingSource, UserId};
use crate::score::QuantizedScore;

const PROGRESS_EVERY: usize = 100;

/// Hands out each row index exactly once.
struct RowTasks {
    total: usize,
    remaining: AtomicUsize,
}

impl RowTasks {
    fn new(total: usize) -> Self {
        Self {
            total,
            remaining: AtomicUsize::new(total),
        }
    }

    /// Decrement-and-fetch; rows come out in ascending order.
    fn claim(&self) -> Option<usize> {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(1))
            .ok()
            .map(|left| self.total - left)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixBuilder {
    config: MatrixConfig,
    engine: CorrelationEngine,
}

impl MatrixBuilder {
    pub fn new(config: MatrixConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            engine: CorrelationEngine::new(config.overlap_threshold),
        })
    }

    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    /// Compute every row of the matrix for `source`.
    ///
    /// Rows fail independently: a row whose user has no or malformed ratings
    /// is reported, the remaining rows still complete. If any row failed the
    /// result is `BuildError::RowsFailed` carrying the partial matrix.
    pub fn build<S>(&self, source: &S) -> Result<CorrelationMatrix, BuildError>
    where
        S: RatingSource + ?Sized,
    {
        let started = Instant::now();
        let user_ids = source.user_ids();
        check_ordering(user_ids)?;
        let n = user_ids.len();
        info!(
            "building correlation matrix: {} users, k={}, overlap_threshold={}, threads={}",
            n, self.config.k, self.config.overlap_threshold, self.config.num_threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads)
            .thread_name(|idx| format!("pearson-row-{}", idx))
            .build()?;

        let profiles: Vec<Result<SparseProfile, RowError>> = pool.install(|| {
            user_ids
                .par_iter()
                .map(|&user| prepare_profile(source, user))
                .collect()
        });

        let slots: Vec<OnceLock<BoundedNeighborSet>> = (0..n).map(|_| OnceLock::new()).collect();
        let failures: Mutex<Vec<(usize, RowFailure)>> = Mutex::new(Vec::new());
        let tasks = RowTasks::new(n);
        let completed = AtomicUsize::new(0);

        pool.scope(|scope| {
            for _ in 0..self.config.num_threads {
                scope.spawn(|_| {
                    while let Some(row) = tasks.claim() {
                        match self.compute_row(row, user_ids, &profiles) {
                            Ok(neighbors) => {
                                let stored = slots[row].set(neighbors).is_ok();
                                debug_assert!(stored, "row {} claimed twice", row);
                            }
                            Err(error) => {
                                failures.lock().push((
                                    row,
                                    RowFailure {
                                        user: user_ids[row],
                                        error,
                                    },
                                ));
                            }
                        }

                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        if done % PROGRESS_EVERY == 0 {
                            debug!("rows done: {}/{}", done, n);
                        }
                    }
                });
            }
        });

        let rows: Vec<BoundedNeighborSet> = slots
            .into_iter()
            .zip(user_ids)
            .map(|(slot, &user)| {
                slot.into_inner()
                    .unwrap_or_else(|| BoundedNeighborSet::new(user, self.config.k))
            })
            .collect();
        let matrix = CorrelationMatrix::from_rows(user_ids, rows, self.config.k);

        let mut failures = failures.into_inner();
        info!(
            "correlation matrix done in {:.3}s ({} rows failed)",
            started.elapsed().as_secs_f64(),
            failures.len()
        );

        if failures.is_empty() {
            return Ok(matrix);
        }
        failures.sort_by_key(|(row, _)| *row);
        Err(BuildError::RowsFailed {
            failures: failures.into_iter().map(|(_, failure)| failure).collect(),
            partial: Box::new(matrix),
        })
    }

    /// Correlate row `row` against every other user.
    fn compute_row(
        &self,
        row: usize,
        user_ids: &[UserId],
        profiles: &[Result<SparseProfile, RowError>],
    ) -> Result<BoundedNeighborSet, RowError> {
        let owner = user_ids[row];
        let profile = profiles[row].as_ref().map_err(Clone::clone)?;
        let mut neighbors = BoundedNeighborSet::new(owner, self.config.k);

        for (&other, other_profile) in user_ids.iter().zip(profiles) {
            if other == owner {
                continue;
            }
            let Ok(other_profile) = other_profile else {
                continue;
            };
            let similarity = self.engine.correlate_profiles(profile, other_profile);
            if QuantizedScore::new(other, similarity).is_zero() {
                continue;
            }
            neighbors.try_insert(other, similarity);
        }

        Ok(neighbors)
    }
}

fn prepare_profile<S>(source: &S, user: UserId) -> Result<SparseProfile, RowError>
where
    S: RatingSource + ?Sized,
{
    let ratings = source.ratings_for(user).ok_or(RowError::MissingRatings)?;
    SparseProfile::from_ratings(ratings).map_err(|error| {
        warn!("user {}: {}; excluded from every row", user, error);
        RowError::from(error)
    })
}

/// Build with `config` in one call.
pub fn build_matrix<S>(source: &S, config: MatrixConfig) -> Result<CorrelationMatrix, BuildError>
where
    S: RatingSource + ?Sized,
{
    MatrixBuilder::new(config)?.build(source)
}
