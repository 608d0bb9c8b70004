use crate::bits::PosSet;
use crate::board::{Board, Direction};

/// Returns true if the box at `pos` is frozen (it can never be pushed
/// again) and the frozen cluster it belongs to contains a box that is not
/// on a goal.
pub fn is_freeze_deadlock(board: &Board, pos: u16) -> bool {
    let mut in_progress = PosSet::new();
    let mut frozen = Vec::new();
    if !freeze_check(board, pos, &mut in_progress, &mut frozen) {
        return false;
    }
    frozen.iter().any(|&p| !board.is_goal(p))
}

/// A box is frozen when it is blocked along both axes. A neighboring box
/// still being examined counts as blocked; mutually supporting pairs freeze
/// each other through that rule.
fn freeze_check(board: &Board, pos: u16, in_progress: &mut PosSet, frozen: &mut Vec<u16>) -> bool {
    in_progress.insert(pos);
    let horizontal = axis_blocked(
        board,
        pos,
        Direction::Left,
        Direction::Right,
        in_progress,
        frozen,
    );
    let vertical = axis_blocked(
        board,
        pos,
        Direction::Up,
        Direction::Down,
        in_progress,
        frozen,
    );
    if horizontal && vertical {
        frozen.push(pos);
        true
    } else {
        in_progress.remove(pos);
        false
    }
}

fn axis_blocked(
    board: &Board,
    pos: u16,
    first: Direction,
    second: Direction,
    in_progress: &mut PosSet,
    frozen: &mut Vec<u16>,
) -> bool {
    for dir in [first, second] {
        let Some(next) = board.step(pos, dir) else {
            return true;
        };
        if board.is_wall(next) {
            return true;
        }
        if board.is_box(next)
            && (in_progress.contains(next) || freeze_check(board, next, in_progress, frozen))
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_board(text: &str) -> Board {
        Board::from_text(text.trim_matches('\n')).unwrap()
    }

    fn pos(board: &Board, x: u16, y: u16) -> u16 {
        (y as usize * board.width() + x as usize) as u16
    }

    #[test]
    fn test_corner_box_is_deadlocked() {
        let board = parse_board(
            r#"
####
#$ #
# .#
#@ #
####
"#,
        );
        assert!(is_freeze_deadlock(&board, pos(&board, 1, 1)));
    }

    #[test]
    fn test_corner_box_on_goal_is_not_deadlocked() {
        let board = parse_board(
            r#"
####
#* #
# @#
####
"#,
        );
        assert!(!is_freeze_deadlock(&board, pos(&board, 1, 1)));
    }

    #[test]
    fn test_pair_against_wall_is_deadlocked() {
        let board = parse_board(
            r#"
######
#$$  #
#..@ #
######
"#,
        );
        assert!(is_freeze_deadlock(&board, pos(&board, 1, 1)));
        assert!(is_freeze_deadlock(&board, pos(&board, 2, 1)));
    }

    #[test]
    fn test_open_floor_box_is_free() {
        let board = parse_board(
            r#"
#####
#   #
# $ #
# . #
#@  #
#####
"#,
        );
        assert!(!is_freeze_deadlock(&board, pos(&board, 2, 2)));
    }

    #[test]
    fn test_wall_hugging_box_can_still_slide() {
        // Blocked vertically only; it can still be pushed sideways.
        let board = parse_board(
            r#"
#####
# $ #
# . #
#@  #
#####
"#,
        );
        assert!(!is_freeze_deadlock(&board, pos(&board, 2, 1)));
    }

    #[test]
    fn test_vertical_pair_in_open_column_is_free() {
        let board = parse_board(
            r#"
#####
# $ #
# $ #
# ..#
#@  #
#####
"#,
        );
        assert!(!is_freeze_deadlock(&board, pos(&board, 2, 1)));
        assert!(!is_freeze_deadlock(&board, pos(&board, 2, 2)));
    }
}
