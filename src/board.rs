use crate::bits::PosSet;
use arrayvec::ArrayVec;
use std::fmt;

pub const MAX_SIZE: usize = 64;
pub const MAX_BOXES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Floor,
    Goal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Right,
    Direction::Down,
    Direction::Left,
];

impl Direction {
    pub fn reverse(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Right => write!(f, "Right"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
        }
    }
}

/// A Sokoban board over a row-major grid of cells.
///
/// Cell positions are flat `u16` indices (`y * width + x`). The board holds
/// the static tiles plus the dynamic box set and player position; solvers
/// snapshot and reinstall the dynamic parts through `box_positions`,
/// `set_boxes` and `set_player`.
#[derive(Debug, Clone)]
pub struct Board {
    width: u16,
    height: u16,
    tiles: Vec<Tile>,
    boxes: Vec<u16>,
    box_at: PosSet,
    goals: Vec<u16>,
    player: u16,
    reachable: PosSet,
}

impl Board {
    /// Parse a Sokoban board from text format.
    ///
    /// Characters:
    /// - `#` = Wall
    /// - ` ` = Floor (empty space)
    /// - `.` = Goal (target location for boxes)
    /// - `$` = Box
    /// - `@` = Player
    /// - `*` = Box on goal
    /// - `+` = Player on goal
    pub fn from_text(text: &str) -> Result<Self, String> {
        let lines: Vec<&str> = text.lines().collect();

        if lines.is_empty() {
            return Err("Empty board".to_string());
        }

        let height = lines.len();
        let width = lines.iter().map(|line| line.len()).max().unwrap_or(0);

        if width > MAX_SIZE {
            return Err(format!(
                "Board width {} exceeds maximum size {}",
                width, MAX_SIZE
            ));
        }
        if height > MAX_SIZE {
            return Err(format!(
                "Board height {} exceeds maximum size {}",
                height, MAX_SIZE
            ));
        }

        let mut tiles = vec![Tile::Floor; width * height];
        let mut boxes = Vec::new();
        let mut box_at = PosSet::new();
        let mut goals = Vec::new();
        let mut player = None;

        for (y, line) in lines.iter().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                let pos = (y * width + x) as u16;
                match ch {
                    '#' => tiles[pos as usize] = Tile::Wall,
                    ' ' => tiles[pos as usize] = Tile::Floor,
                    '.' => {
                        tiles[pos as usize] = Tile::Goal;
                        goals.push(pos);
                    }
                    '$' => {
                        boxes.push(pos);
                        box_at.insert(pos);
                    }
                    '*' => {
                        tiles[pos as usize] = Tile::Goal;
                        goals.push(pos);
                        boxes.push(pos);
                        box_at.insert(pos);
                    }
                    '@' => {
                        if player.is_some() {
                            return Err("Multiple players found".to_string());
                        }
                        player = Some(pos);
                    }
                    '+' => {
                        tiles[pos as usize] = Tile::Goal;
                        goals.push(pos);
                        if player.is_some() {
                            return Err("Multiple players found".to_string());
                        }
                        player = Some(pos);
                    }
                    _ => {
                        return Err(format!(
                            "Invalid character '{}' at position ({}, {})",
                            ch, x, y
                        ));
                    }
                }
            }
        }

        let Some(player) = player else {
            return Err("No player found on board".to_owned());
        };

        if goals.len() != boxes.len() {
            return Err(format!(
                "Goal count ({}) does not match box count ({})",
                goals.len(),
                boxes.len()
            ));
        }
        if boxes.len() > MAX_BOXES {
            return Err(format!(
                "Box count {} exceeds maximum {}",
                boxes.len(),
                MAX_BOXES
            ));
        }

        Ok(Board {
            width: width as u16,
            height: height as u16,
            tiles,
            boxes,
            box_at,
            goals,
            player,
            reachable: PosSet::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    pub fn goal_positions(&self) -> &[u16] {
        &self.goals
    }

    /// Flat-index delta for moving one cell in the given direction.
    pub fn offset(&self, dir: Direction) -> i32 {
        match dir {
            Direction::Up => -(self.width as i32),
            Direction::Right => 1,
            Direction::Down => self.width as i32,
            Direction::Left => -1,
        }
    }

    /// Move from a position in the given direction.
    /// Returns `None` if the new position falls off the grid.
    pub fn step(&self, pos: u16, dir: Direction) -> Option<u16> {
        let x = pos % self.width;
        let y = pos / self.width;
        let in_bounds = match dir {
            Direction::Up => y > 0,
            Direction::Down => y + 1 < self.height,
            Direction::Left => x > 0,
            Direction::Right => x + 1 < self.width,
        };
        if in_bounds {
            Some((pos as i32 + self.offset(dir)) as u16)
        } else {
            None
        }
    }

    pub fn is_wall(&self, pos: u16) -> bool {
        self.tiles[pos as usize] == Tile::Wall
    }

    pub fn is_goal(&self, pos: u16) -> bool {
        self.tiles[pos as usize] == Tile::Goal
    }

    pub fn is_box(&self, pos: u16) -> bool {
        self.box_at.contains(pos)
    }

    pub fn is_box_on_goal(&self, pos: u16) -> bool {
        self.is_box(pos) && self.is_goal(pos)
    }

    /// Whether a box could occupy this cell (floor or goal, not occupied).
    pub fn is_box_accessible(&self, pos: u16) -> bool {
        !self.is_wall(pos) && !self.is_box(pos)
    }

    pub fn player(&self) -> u16 {
        self.player
    }

    pub fn set_player(&mut self, pos: u16) {
        self.player = pos;
    }

    /// Move a box between two cells. The cells need not be adjacent.
    /// Panics if there is no box at `from` or `to` is not open for a box.
    pub fn push_box(&mut self, from: u16, to: u16) {
        assert!(self.is_box(from), "no box at {} to push", from);
        assert!(
            self.is_box_accessible(to),
            "Cannot push box to {}: destination blocked",
            to
        );
        let idx = self
            .boxes
            .iter()
            .position(|&p| p == from)
            .expect("box list out of sync with occupancy set");
        self.boxes[idx] = to;
        self.box_at.remove(from);
        self.box_at.insert(to);
    }

    /// Exact inverse of `push_box(from, to)`.
    pub fn undo_push(&mut self, to: u16, from: u16) {
        self.push_box(to, from);
    }

    /// Sorted snapshot of the current box positions.
    pub fn box_positions(&self) -> Vec<u16> {
        let mut positions = self.boxes.clone();
        positions.sort_unstable();
        positions
    }

    pub fn remove_all_boxes(&mut self) {
        self.boxes.clear();
        self.box_at.clear();
    }

    /// Replace all boxes with the given positions.
    pub fn set_boxes(&mut self, positions: &[u16]) {
        self.remove_all_boxes();
        for &pos in positions {
            assert!(!self.is_wall(pos), "cannot place box inside a wall");
            assert!(!self.box_at.contains(pos), "duplicate box position");
            self.boxes.push(pos);
            self.box_at.insert(pos);
        }
    }

    /// Check if all boxes are on goals (win condition).
    pub fn is_solved(&self) -> bool {
        self.boxes.iter().all(|&p| self.is_goal(p))
    }

    /// Recompute the set of cells the player can walk to from the current
    /// player position. Any box move invalidates the result.
    pub fn update_player_reachable(&mut self) {
        self.reachable.clear();
        let mut stack: ArrayVec<u16, { MAX_SIZE * MAX_SIZE }> = ArrayVec::new();
        self.reachable.insert(self.player);
        stack.push(self.player);

        while let Some(pos) = stack.pop() {
            for dir in ALL_DIRECTIONS {
                if let Some(next) = self.step(pos, dir) {
                    if !self.is_wall(next)
                        && !self.is_box(next)
                        && !self.reachable.contains(next)
                    {
                        self.reachable.insert(next);
                        stack.push(next);
                    }
                }
            }
        }
    }

    pub fn is_player_reachable(&self, pos: u16) -> bool {
        self.reachable.contains(pos)
    }

    /// Shortest walking path from the player to `target`, avoiding walls
    /// and boxes. `Some` and empty when the player already stands there,
    /// `None` when the target cannot be reached.
    pub fn player_path(&self, target: u16) -> Option<Vec<Direction>> {
        if self.player == target {
            return Some(Vec::new());
        }
        if self.is_wall(target) || self.is_box(target) {
            return None;
        }

        let mut came_from: Vec<Option<(u16, Direction)>> =
            vec![None; self.width as usize * self.height as usize];
        let mut queue: std::collections::VecDeque<u16> = std::collections::VecDeque::new();
        queue.push_back(self.player);

        while let Some(pos) = queue.pop_front() {
            for dir in ALL_DIRECTIONS {
                let Some(next) = self.step(pos, dir) else {
                    continue;
                };
                if self.is_wall(next)
                    || self.is_box(next)
                    || next == self.player
                    || came_from[next as usize].is_some()
                {
                    continue;
                }
                came_from[next as usize] = Some((pos, dir));
                if next == target {
                    let mut path = Vec::new();
                    let mut current = target;
                    while current != self.player {
                        let (prev, dir) =
                            came_from[current as usize].expect("path chain broken");
                        path.push(dir);
                        current = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// Build the mirror board for backward search: boxes are placed at goal
    /// cells and goals at the original box cells.
    pub fn mirrored(&self) -> Self {
        let mut tiles = self.tiles.clone();
        for &old_goal in &self.goals {
            tiles[old_goal as usize] = Tile::Floor;
        }
        let mut new_goals = self.boxes.clone();
        new_goals.sort_unstable();
        for &new_goal in &new_goals {
            tiles[new_goal as usize] = Tile::Goal;
        }

        let mut new_boxes = self.goals.clone();
        new_boxes.sort_unstable();
        let mut box_at = PosSet::new();
        for &pos in &new_boxes {
            box_at.insert(pos);
        }

        Board {
            width: self.width,
            height: self.height,
            tiles,
            boxes: new_boxes,
            box_at,
            goals: new_goals,
            player: self.player,
            reachable: PosSet::new(),
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            let mut line = String::new();
            for x in 0..self.width {
                let pos = y * self.width + x;
                let tile = self.tiles[pos as usize];

                let ch = if pos == self.player {
                    match tile {
                        Tile::Goal => '+',
                        _ => '@',
                    }
                } else if self.is_box(pos) {
                    match tile {
                        Tile::Goal => '*',
                        _ => '$',
                    }
                } else {
                    match tile {
                        Tile::Wall => '#',
                        Tile::Floor => ' ',
                        Tile::Goal => '.',
                    }
                };
                line.push(ch);
            }
            // Trim trailing spaces to match original input format
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_board(text: &str) -> Board {
        Board::from_text(text.trim_matches('\n')).unwrap()
    }

    fn pos(board: &Board, x: u16, y: u16) -> u16 {
        y * board.width + x
    }

    #[test]
    fn test_parse_basic_board() {
        let board = parse_board(
            r#"
####
# .#
#  ###
#*@  #
#  $ #
#  ###
####
"#,
        );
        assert_eq!(board.width(), 6);
        assert_eq!(board.height(), 7);
        assert_eq!(board.player(), pos(&board, 2, 3));
        assert_eq!(board.box_count(), 2);
    }

    #[test]
    fn test_no_player() {
        assert!(Board::from_text("####\n#  #\n####").is_err());
    }

    #[test]
    fn test_multiple_players() {
        assert!(Board::from_text("####\n#@@#\n####").is_err());
    }

    #[test]
    fn test_goal_box_count_validation() {
        assert!(Board::from_text("#####\n#.$@#\n#.$ #\n#####").is_ok());
        assert!(Board::from_text("#####\n#..@#\n# $ #\n#####").is_err());
        assert!(Board::from_text("#####\n#$$@#\n# . #\n#####").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let input = "####\n# .#\n#  ###\n#*@  #\n#  $ #\n#  ###\n####";
        let board = Board::from_text(input).unwrap();
        assert_eq!(board.to_string().trim_end(), input);
    }

    #[test]
    fn test_step_bounds() {
        let board = parse_board(
            r#"
#####
#@$.#
#####
"#,
        );
        let top_left = 0;
        assert_eq!(board.step(top_left, Direction::Up), None);
        assert_eq!(board.step(top_left, Direction::Left), None);
        assert_eq!(board.step(top_left, Direction::Right), Some(1));
        assert_eq!(board.step(top_left, Direction::Down), Some(5));

        let bottom_right = (board.width() * board.height() - 1) as u16;
        assert_eq!(board.step(bottom_right, Direction::Down), None);
        assert_eq!(board.step(bottom_right, Direction::Right), None);
    }

    #[test]
    fn test_push_undo_restores_state() {
        let mut board = parse_board(
            r#"
#####
#@$.#
#####
"#,
        );
        let before_boxes = board.box_positions();
        let before_player = board.player();

        let from = pos(&board, 2, 1);
        let to = pos(&board, 3, 1);
        board.push_box(from, to);
        assert!(board.is_box(to));
        assert!(!board.is_box(from));
        assert!(board.is_box_on_goal(to));
        assert!(board.is_solved());

        board.undo_push(to, from);
        assert_eq!(board.box_positions(), before_boxes);
        assert_eq!(board.player(), before_player);
        assert!(!board.is_solved());
    }

    #[test]
    #[should_panic(expected = "destination blocked")]
    fn test_push_into_wall() {
        let mut board = parse_board(
            r#"
####
#@$#
#. #
####
"#,
        );
        let from = pos(&board, 2, 1);
        board.push_box(from, pos(&board, 3, 1));
    }

    #[test]
    fn test_box_positions_sorted() {
        let board = parse_board(
            r#"
######
#  $.#
#@$. #
######
"#,
        );
        let positions = board.box_positions();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
        assert_eq!(positions.len(), 2);
    }

    #[test]
    fn test_set_boxes_and_remove() {
        let mut board = parse_board(
            r#"
#####
#@$.#
#####
"#,
        );
        let snapshot = board.box_positions();
        board.remove_all_boxes();
        assert_eq!(board.box_count(), 0);
        board.set_boxes(&snapshot);
        assert_eq!(board.box_positions(), snapshot);
    }

    #[test]
    fn test_player_reachability() {
        let mut board = parse_board(
            r#"
######
#@$  #
#### #
#  . #
######
"#,
        );
        board.update_player_reachable();
        // The box blocks the only corridor to the right side.
        assert!(board.is_player_reachable(board.player()));
        assert!(!board.is_player_reachable(pos(&board, 3, 1)));

        // Remove the box: the full corridor opens up.
        board.remove_all_boxes();
        board.update_player_reachable();
        assert!(board.is_player_reachable(pos(&board, 3, 1)));
        assert!(board.is_player_reachable(pos(&board, 3, 3)));
    }

    #[test]
    fn test_player_path_goes_around_boxes() {
        let board = parse_board(
            r#"
######
#@*  #
#    #
######
"#,
        );
        // Straight right is blocked by the box; the path dips through the
        // open row below.
        let path = board.player_path(pos(&board, 3, 1)).unwrap();
        assert_eq!(path.len(), 4);

        let mut at = board.player();
        for dir in path {
            at = board.step(at, dir).unwrap();
            assert!(!board.is_wall(at) && !board.is_box(at));
        }
        assert_eq!(at, pos(&board, 3, 1));
    }

    #[test]
    fn test_player_path_trivial_and_blocked() {
        let board = parse_board(
            r#"
######
#@*  #
#### #
######
"#,
        );
        assert_eq!(board.player_path(board.player()), Some(Vec::new()));
        // The box seals the only corridor.
        assert_eq!(board.player_path(pos(&board, 3, 1)), None);
        // A box cell is never a walking target.
        assert_eq!(board.player_path(pos(&board, 2, 1)), None);
    }

    #[test]
    fn test_mirrored_swaps_boxes_and_goals() {
        let board = parse_board(
            r#"
######
#@$ .#
######
"#,
        );
        let mirror = board.mirrored();
        let box_pos = pos(&board, 2, 1);
        let goal_pos = pos(&board, 4, 1);

        assert!(mirror.is_box(goal_pos));
        assert!(!mirror.is_box(box_pos));
        assert!(mirror.is_goal(box_pos));
        assert!(!mirror.is_goal(goal_pos));
        assert_eq!(mirror.player(), board.player());
    }

    #[test]
    fn test_mirrored_box_on_goal() {
        let board = parse_board(
            r#"
####
#@*#
####
"#,
        );
        let mirror = board.mirrored();
        let cell = pos(&board, 2, 1);
        assert!(mirror.is_box_on_goal(cell));
        assert!(mirror.is_solved());
    }

    #[test]
    fn test_is_solved() {
        let solved = parse_board("####\n#*@#\n####");
        assert!(solved.is_solved());

        let unsolved = parse_board("####\n#$.#\n# @#\n####");
        assert!(!unsolved.is_solved());
    }
}
