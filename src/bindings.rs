//! Python Bindings for Pearson Kernel

use std::collections::HashMap;

use pyo3::exceptions::{PyIOError, PyKeyError, PyValueError};
use pyo3::prelude::*;

use crate::builder::MatrixBuilder;
use crate::codec;
use crate::config::MatrixConfig;
use crate::correlation::CorrelationEngine;
use crate::error::{BuildError, CodecError, MatrixError};
use crate::matrix::CorrelationMatrix;
use crate::ratings::{InMemoryRatings, ItemId, RatingEntry, UserId};

fn build_err(err: BuildError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn codec_err(err: CodecError) -> PyErr {
    match err {
        CodecError::Io(io) => PyIOError::new_err(io.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

fn matrix_err(err: MatrixError) -> PyErr {
    PyKeyError::new_err(err.to_string())
}

fn to_entries(ratings: Vec<(ItemId, f64)>) -> Vec<RatingEntry> {
    ratings
        .into_iter()
        .map(|(item, rating)| RatingEntry::new(item, rating))
        .collect()
}

// ============================================================================
// MATRIX
// ============================================================================

#[pyclass]
struct Matrix {
    inner: CorrelationMatrix,
    config: MatrixConfig,
}

#[pymethods]
impl Matrix {
    /// Compute the top-k Pearson neighbor matrix (O(N²), releases the GIL)
    #[staticmethod]
    #[pyo3(signature = (user_ids, ratings, k=200, overlap_threshold=125, num_threads=4))]
    fn build(
        py: Python<'_>,
        user_ids: Vec<UserId>,
        ratings: HashMap<UserId, Vec<(ItemId, f64)>>,
        k: usize,
        overlap_threshold: usize,
        num_threads: usize,
    ) -> PyResult<Self> {
        let config = MatrixConfig {
            k,
            overlap_threshold,
            num_threads,
        };
        let ratings = ratings
            .into_iter()
            .map(|(user, entries)| (user, to_entries(entries)))
            .collect();
        let source = InMemoryRatings::with_ordering(user_ids, ratings);

        let builder = MatrixBuilder::new(config).map_err(|e| PyValueError::new_err(e.to_string()))?;
        let inner = py.allow_threads(|| builder.build(&source)).map_err(build_err)?;
        Ok(Self { inner, config })
    }

    #[staticmethod]
    #[pyo3(signature = (path, user_ids, k=200))]
    fn read(path: &str, user_ids: Vec<UserId>, k: usize) -> PyResult<Self> {
        let inner = codec::read_matrix(path, &user_ids, k).map_err(codec_err)?;
        Ok(Self {
            inner,
            config: MatrixConfig::with_k(k),
        })
    }

    fn write(&self, path: &str) -> PyResult<()> {
        let annotation = self.config.annotation(self.inner.user_ids());
        codec::write_matrix(path, &self.inner, &annotation).map_err(codec_err)
    }

    /// Similarity of col in row's neighbors, None if not retained
    fn get(&self, row: UserId, col: UserId) -> PyResult<Option<f64>> {
        self.inner.get(row, col).map_err(matrix_err)
    }

    /// (user, similarity) pairs, strongest first
    fn neighbors(&self, row: UserId) -> PyResult<Vec<(UserId, f64)>> {
        let neighbors = self.inner.neighbors_of(row).map_err(matrix_err)?;
        Ok(neighbors
            .sorted()
            .into_iter()
            .map(|score| (score.owner(), score.similarity()))
            .collect())
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }
}

// ============================================================================
// CORRELATION
// ============================================================================

/// Weighted Pearson correlation of two (item, rating) lists
#[pyfunction]
#[pyo3(signature = (x, y, overlap_threshold=125))]
fn correlate(x: Vec<(ItemId, f64)>, y: Vec<(ItemId, f64)>, overlap_threshold: usize) -> PyResult<f64> {
    CorrelationEngine::new(overlap_threshold)
        .correlate(&to_entries(x), &to_entries(y))
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

// ============================================================================
// MODULE EXPORT
// ============================================================================

#[pymodule]
fn pearson_kernel(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<Matrix>()?;
    m.add_function(wrap_pyfunction!(correlate, m)?)?;
    Ok(())
}
