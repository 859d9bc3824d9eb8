//! The K strongest neighbors of one row user.
//!
//! Residents live in a binary heap whose top is the weakest member, so a full
//! set decides admission with one comparison and evicts in O(log K).

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashMap;

use crate::ratings::UserId;
use crate::score::QuantizedScore;

pub const NAN_CELL: &str = "NaN";

/// Heap entry ordered by weakness: the heap top is the first eviction candidate.
#[derive(Debug, Clone, Copy)]
struct Weakest(QuantizedScore);

impl PartialEq for Weakest {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Weakest {}

impl Ord for Weakest {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.cmp_strength(&self.0)
    }
}

impl PartialOrd for Weakest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
pub struct BoundedNeighborSet {
    owner: UserId,
    capacity: usize,
    heap: BinaryHeap<Weakest>,
}

impl BoundedNeighborSet {
    pub fn new(owner: UserId, capacity: usize) -> Self {
        Self {
            owner,
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Offer a neighbor. Returns whether it became resident.
    ///
    /// A full set admits the candidate only if it is stronger than the weakest
    /// resident, which is then evicted. Offers for the owner itself, or for a
    /// user already resident, are ignored.
    pub fn try_insert(&mut self, other: UserId, similarity: f64) -> bool {
        if other == self.owner {
            return false;
        }
        let offered = Weakest(QuantizedScore::new(other, similarity));

        if self.heap.len() < self.capacity {
            if self.contains(other) {
                return false;
            }
            self.heap.push(offered);
            return true;
        }

        // Most offers to a full set lose here, before the membership scan.
        let stronger = matches!(self.heap.peek(), Some(top) if offered < *top);
        if !stronger || self.contains(other) {
            return false;
        }
        if let Some(mut top) = self.heap.peek_mut() {
            *top = offered;
        }
        true
    }

    pub fn contains(&self, other: UserId) -> bool {
        self.heap.iter().any(|entry| entry.0.owner() == other)
    }

    /// Dequantized similarity for `other`, if it survived truncation.
    pub fn lookup(&self, other: UserId) -> Option<f64> {
        self.heap
            .iter()
            .find(|entry| entry.0.owner() == other)
            .map(|entry| entry.0.similarity())
    }

    /// Residents in heap order.
    pub fn iter(&self) -> impl Iterator<Item = &QuantizedScore> + '_ {
        self.heap.iter().map(|entry| &entry.0)
    }

    /// Residents strongest first.
    pub fn sorted(&self) -> Vec<QuantizedScore> {
        let mut scores: Vec<QuantizedScore> = self.iter().copied().collect();
        scores.sort_by(|a, b| b.cmp_strength(a));
        scores
    }

    /// One cell per position of `ordered_user_ids`: the similarity with four
    /// decimals, or `NaN` where no neighbor is resident.
    pub fn to_dense_row(&self, ordered_user_ids: &[UserId]) -> Vec<String> {
        let positions: HashMap<UserId, usize> = ordered_user_ids
            .iter()
            .enumerate()
            .map(|(position, &user)| (user, position))
            .collect();
        self.to_dense_row_indexed(ordered_user_ids.len(), &positions)
    }

    pub(crate) fn to_dense_row_indexed(
        &self,
        width: usize,
        positions: &HashMap<UserId, usize>,
    ) -> Vec<String> {
        let mut cells = vec![NAN_CELL.to_string(); width];
        for score in self.iter() {
            if let Some(&position) = positions.get(&score.owner()) {
                cells[position] = format_similarity(score.similarity());
            }
        }
        cells
    }

    /// Insert without applying the capacity policy. Used when loading a
    /// persisted row whose size has already been checked.
    pub(crate) fn insert_unchecked(&mut self, other: UserId, similarity: f64) {
        self.heap.push(Weakest(QuantizedScore::new(other, similarity)));
    }
}

pub fn format_similarity(similarity: f64) -> String {
    format!("{:.4}", similarity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners(set: &BoundedNeighborSet) -> Vec<UserId> {
        set.sorted().iter().map(|s| s.owner()).collect()
    }

    #[test]
    fn test_fills_up_to_capacity() {
        let mut set = BoundedNeighborSet::new(0, 3);
        assert!(set.try_insert(1, 0.1));
        assert!(set.try_insert(2, -0.2));
        assert!(set.try_insert(3, 0.05));
        assert!(set.is_full());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_evicts_weakest_magnitude() {
        let mut set = BoundedNeighborSet::new(0, 2);
        set.try_insert(1, 0.3);
        set.try_insert(2, -0.9);

        assert!(set.try_insert(3, -0.5));
        assert_eq!(owners(&set), vec![2, 3]);
        assert_eq!(set.lookup(1), None);

        assert!(!set.try_insert(4, 0.4));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_quantized_tie_does_not_evict_smaller_owner() {
        let mut set = BoundedNeighborSet::new(0, 1);
        set.try_insert(5, 0.25);
        // 0.25004 quantizes to the same magnitude; the larger id loses the tie.
        assert!(!set.try_insert(9, 0.25004));
        assert!(set.try_insert(2, -0.25));
        assert_eq!(owners(&set), vec![2]);
    }

    #[test]
    fn test_strongest_k_regardless_of_order() {
        let offers = [
            (1, 0.10),
            (2, -0.80),
            (3, 0.40),
            (4, 0.40),
            (5, -0.05),
            (6, 0.90),
            (7, -0.40),
        ];

        let mut forward = BoundedNeighborSet::new(0, 4);
        for &(user, sim) in offers.iter() {
            forward.try_insert(user, sim);
        }
        let mut backward = BoundedNeighborSet::new(0, 4);
        for &(user, sim) in offers.iter().rev() {
            backward.try_insert(user, sim);
        }

        assert_eq!(owners(&forward), vec![6, 2, 3, 4]);
        assert_eq!(owners(&backward), vec![6, 2, 3, 4]);
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let mut set = BoundedNeighborSet::new(0, 5);
        for user in 1..200u32 {
            let sim = ((user * 37) % 101) as f64 / 100.0 - 0.5;
            set.try_insert(user, sim);
            assert!(set.len() <= 5);
        }
    }

    #[test]
    fn test_rejects_owner_and_duplicates() {
        let mut set = BoundedNeighborSet::new(7, 3);
        assert!(!set.try_insert(7, 0.9));
        assert!(set.try_insert(8, 0.2));
        assert!(!set.try_insert(8, 0.9));
        assert_eq!(set.lookup(8), Some(0.2));
        assert_eq!(set.lookup(7), None);
    }

    #[test]
    fn test_dense_row() {
        let mut set = BoundedNeighborSet::new(2, 3);
        set.try_insert(1, -0.365);
        set.try_insert(4, 0.00123);

        let row = set.to_dense_row(&[1, 2, 3, 4]);
        assert_eq!(row, vec!["-0.3650", "NaN", "NaN", "0.0012"]);
    }
}
