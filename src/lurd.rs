use crate::board::{Board, Direction};

/// LURD alphabet: lowercase letters are plain walks, uppercase letters are
/// walks that push a box.
pub fn walk_char(dir: Direction) -> char {
    match dir {
        Direction::Up => 'u',
        Direction::Right => 'r',
        Direction::Down => 'd',
        Direction::Left => 'l',
    }
}

pub fn push_char(dir: Direction) -> char {
    walk_char(dir).to_ascii_uppercase()
}

/// Decode one LURD character into `(direction, is_push)`. Any other
/// character yields `None` and is ignored by consumers.
pub fn parse_char(ch: char) -> Option<(Direction, bool)> {
    let dir = match ch.to_ascii_lowercase() {
        'u' => Direction::Up,
        'r' => Direction::Right,
        'd' => Direction::Down,
        'l' => Direction::Left,
        _ => return None,
    };
    Some((dir, ch.is_ascii_uppercase()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Movement {
    Walk(Direction),
    Push(Direction, usize),
}

/// Move-history sink: collects player walks and `(direction, box_no)` push
/// events during solution reconstruction and renders the LURD string for
/// the run.
#[derive(Debug, Default)]
pub struct MoveHistory {
    movements: Vec<Movement>,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_walk(&mut self, dir: Direction) {
        self.movements.push(Movement::Walk(dir));
    }

    pub fn add_push(&mut self, dir: Direction, box_no: usize) {
        self.movements.push(Movement::Push(dir, box_no));
    }

    pub fn push_count(&self) -> usize {
        self.movements
            .iter()
            .filter(|m| matches!(m, Movement::Push(..)))
            .count()
    }

    pub fn lurd(&self) -> String {
        self.movements
            .iter()
            .map(|m| match m {
                Movement::Walk(dir) => walk_char(*dir),
                Movement::Push(dir, _) => push_char(*dir),
            })
            .collect()
    }
}

/// Apply a LURD string to a board, moving the player and pushing boxes.
/// Characters outside the LURD alphabet are skipped.
pub fn replay(board: &mut Board, lurd: &str) -> Result<(), String> {
    for ch in lurd.chars() {
        let Some((dir, push)) = parse_char(ch) else {
            continue;
        };
        let player = board.player();
        let Some(next) = board.step(player, dir) else {
            return Err(format!("move '{}' walks off the board", ch));
        };
        if push {
            if !board.is_box(next) {
                return Err(format!("push '{}' has no box in front of the player", ch));
            }
            let Some(target) = board.step(next, dir) else {
                return Err(format!("push '{}' shoves a box off the board", ch));
            };
            if !board.is_box_accessible(target) {
                return Err(format!("push '{}' destination is blocked", ch));
            }
            board.push_box(next, target);
        } else if board.is_wall(next) || board.is_box(next) {
            return Err(format!("walk '{}' runs into a blocked cell", ch));
        }
        board.set_player(next);
    }
    Ok(())
}
