//! Correlation matrix: one bounded neighbor set per user, in canonical order.
//!
//! Rows are truncated independently, so the matrix is asymmetric: `(i, j)`
//! may be present while `(j, i)` is absent even though the underlying
//! correlation is symmetric.

use std::collections::HashMap;

use crate::error::MatrixError;
use crate::neighbors::BoundedNeighborSet;
use crate::ratings::UserId;

#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    user_ids: Vec<UserId>,
    positions: HashMap<UserId, usize>,
    rows: Vec<BoundedNeighborSet>,
    capacity: usize,
}

impl CorrelationMatrix {
    /// One empty row per user of `user_ids`.
    pub fn empty(user_ids: &[UserId], capacity: usize) -> Self {
        let rows = user_ids
            .iter()
            .map(|&user| BoundedNeighborSet::new(user, capacity))
            .collect();
        Self::from_rows(user_ids, rows, capacity)
    }

    /// `rows[i]` must belong to `user_ids[i]`.
    pub(crate) fn from_rows(user_ids: &[UserId], rows: Vec<BoundedNeighborSet>, capacity: usize) -> Self {
        debug_assert_eq!(user_ids.len(), rows.len());
        let mut positions = HashMap::with_capacity(user_ids.len());
        for (position, &user) in user_ids.iter().enumerate() {
            positions.entry(user).or_insert(position);
        }
        Self {
            user_ids: user_ids.to_vec(),
            positions,
            rows,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    pub fn position(&self, user: UserId) -> Option<usize> {
        self.positions.get(&user).copied()
    }

    pub(crate) fn positions(&self) -> &HashMap<UserId, usize> {
        &self.positions
    }

    /// Similarity of `col` in `row`'s neighbor set; `None` if not retained.
    pub fn get(&self, row: UserId, col: UserId) -> Result<Option<f64>, MatrixError> {
        Ok(self.neighbors_of(row)?.lookup(col))
    }

    pub fn neighbors_of(&self, row: UserId) -> Result<&BoundedNeighborSet, MatrixError> {
        self.position(row)
            .map(|position| &self.rows[position])
            .ok_or(MatrixError::UserNotFound(row))
    }

    /// Rows in canonical order.
    pub fn rows(&self) -> impl Iterator<Item = &BoundedNeighborSet> + '_ {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rows_per_user() {
        let matrix = CorrelationMatrix::empty(&[10, 20, 30], 5);
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.capacity(), 5);
        assert_eq!(matrix.position(20), Some(1));
        assert!(matrix.rows().all(|row| row.is_empty()));
    }

    #[test]
    fn test_get_reports_missing_row_user() {
        let matrix = CorrelationMatrix::empty(&[10, 20], 5);
        assert_eq!(matrix.get(10, 20), Ok(None));
        assert_eq!(matrix.get(99, 20), Err(MatrixError::UserNotFound(99)));
        assert!(matrix.neighbors_of(99).is_err());
    }

    #[test]
    fn test_rows_are_independent() {
        let mut a = BoundedNeighborSet::new(1, 1);
        a.try_insert(2, 0.4);
        let b = BoundedNeighborSet::new(2, 1);

        let matrix = CorrelationMatrix::from_rows(&[1, 2], vec![a, b], 1);
        assert_eq!(matrix.get(1, 2), Ok(Some(0.4)));
        assert_eq!(matrix.get(2, 1), Ok(None));
    }
}
