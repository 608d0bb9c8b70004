use crate::board::{ALL_DIRECTIONS, Board, Direction};
use crate::deadlocks;
use crate::lurd::MoveHistory;
use crate::memory;
use crate::position::BoardPosition;
use crate::solver::{CancelFlag, ProgressSink, Solution, SolverError};
use crate::table::TranspositionTable;
use crate::zobrist::Zobrist;
use std::collections::VecDeque;
use std::sync::Arc;

/// Expansions between progress reports and memory checks.
const PROGRESS_INTERVAL: u64 = 512;

/// Solver for levels whose optimal solution has moves equal to pushes:
/// every player move pushes a box, so a breadth-first search over
/// push-space is also optimal in moves.
///
/// The search state is the sorted box array; the player position is implied
/// by the push that produced the state. States are deduplicated through the
/// transposition table.
pub fn solve(
    board: &Board,
    name: &str,
    zobrist: &Zobrist,
    progress: &dyn ProgressSink,
    cancel: &CancelFlag,
) -> Result<Solution, SolverError> {
    let mut work = board.clone();
    let start_boxes = work.box_positions();
    let start_player = work.player();

    if work.is_solved() {
        progress.publish("solved");
        return Ok(Solution {
            name: name.to_string(),
            lurd: String::new(),
        });
    }

    let table = TranspositionTable::new();
    let root = Arc::new(BoardPosition::root(start_boxes.clone(), false, zobrist));
    table.put_if_absent(&root);
    let mut open: VecDeque<Arc<BoardPosition>> = VecDeque::new();
    open.push_back(root);

    // Push legality is checked against the board the solver itself mutates,
    // so the boxes come off now and get reinstalled per expansion.
    work.remove_all_boxes();

    let mut scratch = Vec::with_capacity(start_boxes.len());
    let mut expansions: u64 = 0;

    let solution_tip = loop {
        if cancel.is_cancelled() {
            return Err(SolverError::Cancelled);
        }
        let Some(current) = open.pop_front() else {
            return Err(SolverError::NoSolution);
        };

        expansions += 1;
        if expansions % PROGRESS_INTERVAL == 0 {
            progress.publish(&format!(
                "positions: {}, depth: {} pushes",
                table.len(),
                current.push_count()
            ));
            if memory::is_low() {
                return Err(SolverError::OutOfMemory);
            }
        }

        current.reify_into(&mut scratch);
        work.set_boxes(&scratch);
        let player = implied_player(&work, &current, start_player);
        work.set_player(player);

        let mut solved = None;
        for dir in ALL_DIRECTIONS {
            let Some(box_pos) = work.step(player, dir) else {
                continue;
            };
            if !work.is_box(box_pos) {
                continue;
            }
            let Some(dest) = work.step(box_pos, dir) else {
                continue;
            };
            if !work.is_box_accessible(dest) {
                continue;
            }

            work.push_box(box_pos, dest);
            work.set_player(box_pos);

            if deadlocks::is_freeze_deadlock(&work, dest) {
                // Dead push; drop the child entirely.
            } else if work.is_box_on_goal(dest) && work.is_solved() {
                solved = Some(Arc::new(BoardPosition::pushed(
                    work.box_positions(),
                    dest,
                    dir,
                    current.clone(),
                    zobrist,
                )));
            } else {
                let child = Arc::new(BoardPosition::pushed(
                    work.box_positions(),
                    dest,
                    dir,
                    current.clone(),
                    zobrist,
                ));
                if table.put_if_absent(&child).is_none() {
                    open.push_back(child);
                }
            }

            work.undo_push(dest, box_pos);
            work.set_player(player);
            if solved.is_some() {
                break;
            }
        }

        if let Some(tip) = solved {
            break tip;
        }
    };

    progress.publish("solved");

    // Walk the parent chain back to the root, then replay the pushes in
    // order against the restored starting board.
    let mut pushes: Vec<(u16, Direction)> = Vec::new();
    let mut node: &BoardPosition = &solution_tip;
    loop {
        if let Some(push) = node.push() {
            pushes.push(push);
        }
        match node.parent() {
            Some(parent) => node = parent.as_ref(),
            None => break,
        }
    }
    pushes.reverse();

    work.set_boxes(&start_boxes);
    work.set_player(start_player);
    let mut history = MoveHistory::new();
    for (to, dir) in pushes {
        let from = work
            .step(to, dir.reverse())
            .expect("recorded push has no source cell");
        assert!(work.is_box(from), "recorded push has no box to move");
        let box_no = work
            .box_positions()
            .iter()
            .position(|&p| p == from)
            .expect("pushed box missing from the snapshot");
        work.push_box(from, to);
        work.set_player(from);
        history.add_push(dir, box_no);
    }
    assert!(
        work.is_solved(),
        "reconstructed push sequence does not solve the level"
    );

    Ok(Solution {
        name: name.to_string(),
        lurd: history.lurd(),
    })
}

/// Where the player stands in this state: behind the box it just pushed,
/// or at the start position for the root.
fn implied_player(board: &Board, bp: &BoardPosition, start_player: u16) -> u16 {
    match bp.push() {
        Some((to, dir)) => board
            .step(to, dir.reverse())
            .expect("push destination has no source cell"),
        None => start_player,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lurd;
    use crate::solver::NullSink;

    fn parse_board(text: &str) -> Board {
        Board::from_text(text.trim_matches('\n')).unwrap()
    }

    fn solve_board(board: &Board) -> Result<Solution, SolverError> {
        let zobrist = Zobrist::new();
        solve(board, "test", &zobrist, &NullSink, &CancelFlag::new())
    }

    #[test]
    fn test_solve_single_push() {
        let board = parse_board(
            r#"
#####
#@$.#
#####
"#,
        );
        let solution = solve_board(&board).unwrap();
        assert_eq!(solution.lurd, "R");

        let mut replayed = board.clone();
        lurd::replay(&mut replayed, &solution.lurd).unwrap();
        assert!(replayed.is_solved());
    }

    #[test]
    fn test_solve_two_pushes() {
        let board = parse_board(
            r#"
######
#@$ .#
######
"#,
        );
        let solution = solve_board(&board).unwrap();
        assert_eq!(solution.lurd, "RR");

        let mut replayed = board.clone();
        lurd::replay(&mut replayed, &solution.lurd).unwrap();
        assert!(replayed.is_solved());
    }

    #[test]
    fn test_solve_downward_push() {
        let board = parse_board(
            r#"
####
#@ #
#$ #
#. #
####
"#,
        );
        let solution = solve_board(&board).unwrap();
        assert_eq!(solution.lurd, "D");
    }

    #[test]
    fn test_already_solved_returns_empty_lurd() {
        let board = parse_board(
            r#"
####
#@*#
####
"#,
        );
        let solution = solve_board(&board).unwrap();
        assert!(solution.lurd.is_empty());
        assert_eq!(solution.name, "test");
    }

    #[test]
    fn test_unsolvable_is_reported() {
        let board = parse_board(
            r#"
#######
#@$ #.#
#######
"#,
        );
        assert_eq!(solve_board(&board), Err(SolverError::NoSolution));
    }

    #[test]
    fn test_freeze_pruning_rejects_corner_push() {
        // The only available push jams the box into the corner.
        let board = parse_board(
            r#"
#####
#@$ #
#  .#
#####
"#,
        );
        assert_eq!(solve_board(&board), Err(SolverError::NoSolution));
    }

    #[test]
    fn test_cancellation_stops_search() {
        let board = parse_board(
            r#"
######
#@$ .#
######
"#,
        );
        let zobrist = Zobrist::new();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = solve(&board, "test", &zobrist, &NullSink, &cancel);
        assert_eq!(result, Err(SolverError::Cancelled));
    }

    #[test]
    fn test_caller_board_is_untouched() {
        let board = parse_board(
            r#"
######
#@$ .#
######
"#,
        );
        let before_boxes = board.box_positions();
        let before_player = board.player();
        solve_board(&board).unwrap();
        assert_eq!(board.box_positions(), before_boxes);
        assert_eq!(board.player(), before_player);
    }
}
