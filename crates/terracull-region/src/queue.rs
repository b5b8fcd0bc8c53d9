//! Distance-ordered region frontier.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::storage::RegionId;

#[derive(Debug)]
struct QueueEntry {
    id: RegionId,
    /// Squared chunk distance to camera (lower = higher priority).
    distance_sq: i32,
    /// Insertion order, breaks distance ties first-in first-out.
    seq: u64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.distance_sq == other.distance_sq && self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        other
            .distance_sq
            .cmp(&self.distance_sq)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of regions keyed by squared chunk distance from the camera.
#[derive(Debug, Default)]
pub struct DistanceQueue {
    heap: BinaryHeap<QueueEntry>,
    next_seq: u64,
}

impl DistanceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: RegionId, distance_sq: i32) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueueEntry {
            id,
            distance_sq,
            seq,
        });
    }

    /// Closest region and its distance.
    pub fn pop(&mut self) -> Option<(RegionId, i32)> {
        self.heap.pop().map(|e| (e.id, e.distance_sq))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.next_seq = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_closest_first_then_fifo() {
        let mut queue = DistanceQueue::new();
        let a = RegionId::new(0, 0);
        let b = RegionId::new(1, 0);
        let c = RegionId::new(2, 0);

        queue.push(a, 9);
        queue.push(b, 1);
        queue.push(c, 1);

        assert_eq!(queue.pop(), Some((b, 1)));
        assert_eq!(queue.pop(), Some((c, 1)));
        assert_eq!(queue.pop(), Some((a, 9)));
        assert!(queue.is_empty());
    }
}
