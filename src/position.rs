use crate::board::Direction;
use crate::zobrist::Zobrist;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An immutable snapshot of box positions reached during search.
///
/// The box array is canonical (sorted ascending, no duplicates), which makes
/// equality player-agnostic. Children either carry a full array or only the
/// one-box delta against their parent; the 32-bit Zobrist hash is identical
/// either way. Parent links form an immutable forest used for solution
/// reconstruction.
#[derive(Debug)]
pub struct BoardPosition {
    hash: u32,
    backward: bool,
    parent: Option<Arc<BoardPosition>>,
    repr: Repr,
}

#[derive(Debug)]
enum Repr {
    Root {
        boxes: Box<[u16]>,
    },
    Push {
        boxes: Box<[u16]>,
        pushed_to: u16,
        direction: Direction,
        push_count: u32,
    },
    Delta {
        old_pos: u16,
        new_pos: u16,
    },
}

impl BoardPosition {
    /// A search root holding a full snapshot.
    pub fn root(mut boxes: Vec<u16>, backward: bool, zobrist: &Zobrist) -> Self {
        boxes.sort_unstable();
        debug_assert!(boxes.windows(2).all(|w| w[0] < w[1]));
        let hash = zobrist.boxes_hash(&boxes);
        BoardPosition {
            hash,
            backward,
            parent: None,
            repr: Repr::Root {
                boxes: boxes.into_boxed_slice(),
            },
        }
    }

    /// A full-snapshot child recording the push that produced it.
    pub fn pushed(
        mut boxes: Vec<u16>,
        pushed_to: u16,
        direction: Direction,
        parent: Arc<BoardPosition>,
        zobrist: &Zobrist,
    ) -> Self {
        boxes.sort_unstable();
        debug_assert!(boxes.windows(2).all(|w| w[0] < w[1]));
        let hash = zobrist.boxes_hash(&boxes);
        BoardPosition {
            hash,
            backward: parent.backward,
            repr: Repr::Push {
                boxes: boxes.into_boxed_slice(),
                pushed_to,
                direction,
                push_count: parent.push_count() + 1,
            },
            parent: Some(parent),
        }
    }

    /// A delta child: the parent's boxes with one box moved from `old_pos`
    /// to `new_pos`.
    pub fn delta(old_pos: u16, new_pos: u16, parent: Arc<BoardPosition>, zobrist: &Zobrist) -> Self {
        let hash = parent.hash ^ zobrist.cell(old_pos) ^ zobrist.cell(new_pos);
        BoardPosition {
            hash,
            backward: parent.backward,
            repr: Repr::Delta { old_pos, new_pos },
            parent: Some(parent),
        }
    }

    pub fn hash_value(&self) -> u32 {
        self.hash
    }

    pub fn backward(&self) -> bool {
        self.backward
    }

    pub fn parent(&self) -> Option<&Arc<BoardPosition>> {
        self.parent.as_ref()
    }

    /// Depth from the root, counted in pushes. Zero for roots and delta
    /// nodes (delta chains are not depth-tracked).
    pub fn push_count(&self) -> u32 {
        match &self.repr {
            Repr::Push { push_count, .. } => *push_count,
            _ => 0,
        }
    }

    /// The push recorded on this node, if any.
    pub fn push(&self) -> Option<(u16, Direction)> {
        match &self.repr {
            Repr::Push {
                pushed_to,
                direction,
                ..
            } => Some((*pushed_to, *direction)),
            _ => None,
        }
    }

    /// The sorted box array for this position.
    pub fn boxes(&self) -> Vec<u16> {
        let mut out = Vec::new();
        self.reify_into(&mut out);
        out
    }

    /// Reify the box array into `out`, reusing its allocation.
    ///
    /// Walks the parent chain to the nearest full snapshot, applies each
    /// delta in root-to-leaf order, then sorts once.
    pub fn reify_into(&self, out: &mut Vec<u16>) {
        out.clear();
        let mut deltas: Vec<(u16, u16)> = Vec::new();
        let mut current = self;
        loop {
            match &current.repr {
                Repr::Root { boxes } | Repr::Push { boxes, .. } => {
                    out.extend_from_slice(boxes);
                    break;
                }
                Repr::Delta { old_pos, new_pos } => {
                    deltas.push((*old_pos, *new_pos));
                    current = current
                        .parent
                        .as_deref()
                        .expect("delta node without a parent");
                }
            }
        }
        for &(old_pos, new_pos) in deltas.iter().rev() {
            let slot = out
                .iter()
                .position(|&p| p == old_pos)
                .expect("delta replaces a box missing from the parent chain");
            out[slot] = new_pos;
        }
        out.sort_unstable();
        debug_assert!(out.windows(2).all(|w| w[0] < w[1]));
    }
}

impl PartialEq for BoardPosition {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.boxes() == other.boxes()
    }
}

impl Eq for BoardPosition {}

impl Hash for BoardPosition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash);
    }
}

// Parent chains grow one node per push and can get very long; dropping them
// link by link keeps the stack flat.
impl Drop for BoardPosition {
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            match Arc::try_unwrap(node) {
                Ok(mut inner) => parent = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_sorted_and_hashed() {
        let zobrist = Zobrist::new();
        let bp = BoardPosition::root(vec![9, 2, 5], false, &zobrist);
        assert_eq!(bp.boxes(), vec![2, 5, 9]);
        assert_eq!(bp.hash_value(), zobrist.boxes_hash(&[2, 5, 9]));
        assert_eq!(bp.push_count(), 0);
        assert!(bp.push().is_none());
    }

    #[test]
    fn test_delta_reifies_to_full_form() {
        let zobrist = Zobrist::new();
        let root = Arc::new(BoardPosition::root(vec![2, 5, 9], false, &zobrist));
        let child = BoardPosition::delta(5, 7, root, &zobrist);

        assert_eq!(child.boxes(), vec![2, 7, 9]);
        let full = BoardPosition::root(vec![2, 7, 9], false, &zobrist);
        assert_eq!(child, full);
        assert_eq!(child.hash_value(), full.hash_value());
    }

    #[test]
    fn test_delta_chain_reifies_in_order() {
        let zobrist = Zobrist::new();
        let root = Arc::new(BoardPosition::root(vec![10, 20, 30], false, &zobrist));
        let a = Arc::new(BoardPosition::delta(10, 12, root, &zobrist));
        let b = Arc::new(BoardPosition::delta(12, 14, a, &zobrist));
        let c = BoardPosition::delta(30, 28, b, &zobrist);

        assert_eq!(c.boxes(), vec![14, 20, 28]);
        assert_eq!(
            c.hash_value(),
            zobrist.boxes_hash(&[14, 20, 28]),
            "incremental hash must match the full hash"
        );
    }

    #[test]
    fn test_reify_keeps_length_of_root_snapshot() {
        let zobrist = Zobrist::new();
        let root = Arc::new(BoardPosition::root(vec![1, 2, 3, 4], true, &zobrist));
        let child = BoardPosition::delta(3, 40, root, &zobrist);
        assert_eq!(child.boxes().len(), 4);
        assert!(child.backward());
    }

    #[test]
    fn test_equality_ignores_direction_and_parent() {
        let zobrist = Zobrist::new();
        let fwd = BoardPosition::root(vec![3, 8], false, &zobrist);
        let bwd = BoardPosition::root(vec![3, 8], true, &zobrist);
        assert_eq!(fwd, bwd);

        let other = BoardPosition::root(vec![3, 9], false, &zobrist);
        assert_ne!(fwd, other);
    }

    #[test]
    fn test_pushed_child_tracks_depth() {
        let zobrist = Zobrist::new();
        let root = Arc::new(BoardPosition::root(vec![4, 6], false, &zobrist));
        let child = Arc::new(BoardPosition::pushed(
            vec![4, 7],
            7,
            Direction::Right,
            root,
            &zobrist,
        ));
        let grandchild =
            BoardPosition::pushed(vec![4, 8], 8, Direction::Right, child, &zobrist);

        assert_eq!(grandchild.push_count(), 2);
        assert_eq!(grandchild.push(), Some((8, Direction::Right)));
    }

    #[test]
    fn test_dropping_long_chain_does_not_recurse() {
        let zobrist = Zobrist::new();
        let mut tip = Arc::new(BoardPosition::root(vec![0, 1], false, &zobrist));
        // Shuttle one box back and forth to build a deep chain.
        let mut at = 1u16;
        for _ in 0..100_000 {
            let next = if at == 1 { 2 } else { 1 };
            tip = Arc::new(BoardPosition::delta(at, next, tip, &zobrist));
            at = next;
        }
        drop(tip);
    }
}
