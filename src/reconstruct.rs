use crate::board::Direction;
use crate::lurd;
use thiserror::Error;

/// Reasons a solution trace cannot be replayed into a puzzle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructError {
    #[error("a push conjures a box onto an already visited cell")]
    BoxOnVisitedCell,
    #[error("a walk runs into a box")]
    WalkIntoBox,
    #[error("a push shoves a box into another box")]
    BoxBehindBox,
}

/// Cell state while replaying the trace on an initially unreached grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Unreached,
    Floor,
    Box,
}

/// Rebuild a complete puzzle (walls, boxes, goals, player) from nothing but
/// a LURD solution trace. Characters outside the LURD alphabet are ignored.
/// Returns the empty string when the trace is empty or not replayable.
pub fn reconstruct(input: &str) -> String {
    try_reconstruct(input).unwrap_or_default()
}

pub fn try_reconstruct(input: &str) -> Result<String, ReconstructError> {
    let moves: Vec<(Direction, bool)> = input.chars().filter_map(lurd::parse_char).collect();
    if moves.is_empty() {
        return Ok(String::new());
    }

    // Bounds pass. An uppercase move reaches one cell past the player for
    // the pushed box; the final grid adds a one-cell wall border on top.
    let (mut x, mut y) = (0i32, 0i32);
    let (mut min_x, mut max_x) = (0i32, 0i32);
    let (mut min_y, mut max_y) = (0i32, 0i32);
    for &(dir, push) in &moves {
        let (dx, dy) = deltas(dir);
        x += dx;
        y += dy;
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
        if push {
            min_x = min_x.min(x + dx);
            max_x = max_x.max(x + dx);
            min_y = min_y.min(y + dy);
            max_y = max_y.max(y + dy);
        }
    }
    let width = (max_x - min_x + 3) as usize;
    let height = (max_y - min_y + 3) as usize;
    let start_x = (-min_x + 1) as usize;
    let start_y = (-min_y + 1) as usize;

    // Replay pass.
    let mut grid = vec![vec![Cell::Unreached; width]; height];
    let mut initial_box = vec![vec![false; width]; height];
    grid[start_y][start_x] = Cell::Floor;

    let (mut px, mut py) = (start_x as i32, start_y as i32);
    for &(dir, push) in &moves {
        let (dx, dy) = deltas(dir);
        px += dx;
        py += dy;
        let (cx, cy) = (px as usize, py as usize);

        if push && grid[cy][cx] != Cell::Box {
            // First touch of this cell while pushing: the box the player is
            // shoving must live here in the initial puzzle.
            if grid[cy][cx] != Cell::Unreached {
                return Err(ReconstructError::BoxOnVisitedCell);
            }
            grid[cy][cx] = Cell::Box;
            initial_box[cy][cx] = true;
        }
        if grid[cy][cx] == Cell::Box {
            if !push {
                return Err(ReconstructError::WalkIntoBox);
            }
            let (tx, ty) = ((px + dx) as usize, (py + dy) as usize);
            if grid[ty][tx] == Cell::Box {
                return Err(ReconstructError::BoxBehindBox);
            }
            grid[ty][tx] = Cell::Box;
        }
        grid[cy][cx] = Cell::Floor;
    }

    // Synthesis pass: walls wrap every unreached neighbor of the reached
    // region; cells where a box came to rest are its goal.
    let mut wall = vec![vec![false; width]; height];
    for cy in 0..height {
        for cx in 0..width {
            if grid[cy][cx] == Cell::Unreached {
                continue;
            }
            for ny in cy.saturating_sub(1)..=(cy + 1).min(height - 1) {
                for nx in cx.saturating_sub(1)..=(cx + 1).min(width - 1) {
                    if grid[ny][nx] == Cell::Unreached {
                        wall[ny][nx] = true;
                    }
                }
            }
        }
    }

    // Render pass.
    let mut out = String::new();
    for cy in 0..height {
        let mut line = String::new();
        for cx in 0..width {
            let is_goal = grid[cy][cx] == Cell::Box;
            let is_box = initial_box[cy][cx];
            let is_player = (cx, cy) == (start_x, start_y);
            let ch = if wall[cy][cx] {
                '#'
            } else if is_player {
                if is_goal { '+' } else { '@' }
            } else if is_box {
                if is_goal { '*' } else { '$' }
            } else if is_goal {
                '.'
            } else {
                ' '
            };
            line.push(ch);
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    Ok(out)
}

fn deltas(dir: Direction) -> (i32, i32) {
    match dir {
        Direction::Up => (0, -1),
        Direction::Right => (1, 0),
        Direction::Down => (0, 1),
        Direction::Left => (-1, 0),
    }
}
