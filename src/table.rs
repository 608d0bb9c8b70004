use crate::position::BoardPosition;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

const SHARD_COUNT: usize = 64;

/// Concurrent map from board position to the first stored instance.
///
/// Sharded by the Zobrist hash; equal positions always land in the same
/// shard, so `put_if_absent` is atomic per key. Serves both as the search
/// dedup set and as the forward/backward meet detector.
pub struct TranspositionTable {
    shards: Vec<Mutex<HashSet<Arc<BoardPosition>>>>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        TranspositionTable {
            shards: (0..SHARD_COUNT)
                .map(|_| Mutex::new(HashSet::new()))
                .collect(),
        }
    }

    /// Insert `bp` if no equal position is present and return `None`;
    /// otherwise return the already-stored instance (which may carry the
    /// opposite search direction).
    pub fn put_if_absent(&self, bp: &Arc<BoardPosition>) -> Option<Arc<BoardPosition>> {
        let shard = &self.shards[bp.hash_value() as usize & (SHARD_COUNT - 1)];
        let mut set = shard.lock().unwrap();
        if let Some(existing) = set.get(bp.as_ref()) {
            return Some(existing.clone());
        }
        set.insert(bp.clone());
        None
    }

    /// Number of stored positions, summed over all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().unwrap().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}
