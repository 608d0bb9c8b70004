use crate::board::{Board, Direction};
use crate::deadlocks;

/// Lower bound on the number of pushes needed to solve a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowerBound {
    Pushes(usize),
    Deadlock,
}

/// The axis a box can travel along: `Right` when the cell above is a wall,
/// `Down` otherwise. Zero-space levels wall off the other axis entirely.
pub fn free_axis(board: &Board, pos: u16) -> Direction {
    match board.step(pos, Direction::Up) {
        Some(above) if !board.is_wall(above) => Direction::Down,
        _ => Direction::Right,
    }
}

/// Whether the box at `pos` sits on its own goal.
///
/// Walk from `pos` along its free axis up to the wall, counting boxes and
/// goals passed (exclusive of `pos`). Equal counts mean every goal ahead is
/// claimed by a box ahead, so a goal under `pos` is this box's own.
pub fn is_on_correct_goal(board: &Board, pos: u16) -> bool {
    if !board.is_goal(pos) {
        return false;
    }
    let dir = free_axis(board, pos);
    let mut boxes = 0usize;
    let mut goals = 0usize;
    let mut current = pos;
    while let Some(next) = board.step(current, dir) {
        if board.is_wall(next) {
            break;
        }
        if board.is_box(next) {
            boxes += 1;
        }
        if board.is_goal(next) {
            goals += 1;
        }
        current = next;
    }
    boxes == goals
}

/// Count of boxes currently on their correct goals; the open-queue bucket
/// value for the current configuration.
pub fn boxes_on_correct_goals(board: &Board) -> usize {
    board
        .box_positions()
        .iter()
        .filter(|&&pos| is_on_correct_goal(board, pos))
        .count()
}

/// `Deadlock` if any box is freeze-deadlocked; otherwise the number of
/// boxes still off their correct goals (zero exactly when solved).
pub fn lower_bound(board: &Board) -> LowerBound {
    let positions = board.box_positions();
    for &pos in &positions {
        if deadlocks::is_freeze_deadlock(board, pos) {
            return LowerBound::Deadlock;
        }
    }
    let misplaced = positions
        .iter()
        .filter(|&&pos| !is_on_correct_goal(board, pos))
        .count();
    LowerBound::Pushes(misplaced)
}
