use crate::bits::MAX_CELLS;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Fixed seed so hash-derived behavior is reproducible across runs.
const SEED: u64 = 42;

/// Zobrist hash constants for box positions, one 32-bit value per cell.
pub struct Zobrist {
    cells: Vec<u32>,
}

impl Zobrist {
    pub fn new() -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        let cells = (0..MAX_CELLS).map(|_| rng.next_u32()).collect();
        Zobrist { cells }
    }

    /// Hash constant for a box at the given cell.
    pub fn cell(&self, pos: u16) -> u32 {
        self.cells[pos as usize]
    }

    /// XOR over all box cells.
    pub fn boxes_hash(&self, boxes: &[u16]) -> u32 {
        boxes.iter().fold(0, |hash, &pos| hash ^ self.cell(pos))
    }
}

impl Default for Zobrist {
    fn default() -> Self {
        Self::new()
    }
}
