use crate::position::BoardPosition;
use crossbeam_queue::SegQueue;
use std::sync::Arc;

/// Open queue for one search direction: one lock-free FIFO per heuristic
/// bucket, where the bucket counts boxes already on their correct goals.
///
/// Dequeue scans buckets high-to-low, so positions closer to the goal state
/// are expanded first. The scan is only an ordering hint: a push racing with
/// a pop can make the pop miss a bucket it already passed, and ties within a
/// bucket are FIFO.
pub struct OpenQueue {
    buckets: Vec<SegQueue<Arc<BoardPosition>>>,
}

impl OpenQueue {
    /// One bucket per box on the board.
    pub fn new(num_buckets: usize) -> Self {
        OpenQueue {
            buckets: (0..num_buckets.max(1)).map(|_| SegQueue::new()).collect(),
        }
    }

    pub fn push(&self, bucket: usize, bp: Arc<BoardPosition>) {
        assert!(bucket < self.buckets.len(), "bucket index out of range");
        self.buckets[bucket].push(bp);
    }

    /// Pop from the highest-indexed non-empty bucket. `None` means this
    /// caller observed every bucket empty.
    pub fn pop(&self) -> Option<Arc<BoardPosition>> {
        for bucket in self.buckets.iter().rev() {
            if let Some(bp) = bucket.pop() {
                return Some(bp);
            }
        }
        None
    }
}
