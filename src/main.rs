mod bidir;
mod bits;
mod board;
mod deadlocks;
mod heuristic;
mod levels;
mod lurd;
mod memory;
mod position;
mod pushes;
mod queue;
mod reconstruct;
mod solver;
mod table;
mod zobrist;

use board::Board;
use clap::{Parser, Subcommand, ValueEnum};
use levels::Levels;
use solver::{CancelFlag, LogSink, Solution, SolverError};
use std::time::Instant;
use zobrist::Zobrist;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SolverKind {
    /// BFS by pushes for levels whose moves equal their pushes
    MovesPushes,
    /// Parallel bidirectional search for zero-space spanning-tree levels
    Btype,
}

#[derive(Parser)]
#[command(name = "talos")]
#[command(about = "Specialized Sokoban solvers and a LURD puzzle reconstructor", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve levels from an XSB collection
    Solve {
        /// Path to the levels file (XSB format)
        #[arg(value_name = "FILE")]
        levels_file: String,

        /// Level number to solve (1-indexed), or start of range
        #[arg(value_name = "LEVEL")]
        level_start: usize,

        /// Optional end of level range (inclusive, 1-indexed)
        #[arg(value_name = "LEVEL_END")]
        level_end: Option<usize>,

        /// Solver to run
        #[arg(short, long, value_enum, default_value = "moves-pushes")]
        solver: SolverKind,

        /// Worker threads for the btype solver (defaults to all cores)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Print the solution step-by-step
        #[arg(short, long)]
        print_solution: bool,
    },
    /// Rebuild a puzzle from a LURD solution trace
    Reconstruct {
        /// The LURD string; non-move characters are ignored
        #[arg(value_name = "LURD")]
        lurd: String,
    },
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Solve {
            levels_file,
            level_start,
            level_end,
            solver,
            threads,
            print_solution,
        } => run_solve(
            &levels_file,
            level_start,
            level_end,
            solver,
            threads,
            print_solution,
        ),
        Command::Reconstruct { lurd } => {
            let text = reconstruct::reconstruct(&lurd);
            if text.is_empty() {
                eprintln!("Invalid LURD trace");
                std::process::exit(1);
            }
            print!("{}", text);
        }
    }
}

struct LevelStats {
    solved: bool,
    pushes: usize,
    elapsed_ms: u128,
}

fn run_solve(
    levels_file: &str,
    level_start: usize,
    level_end: Option<usize>,
    solver: SolverKind,
    threads: Option<usize>,
    print_solution: bool,
) {
    let levels = match Levels::from_file(levels_file) {
        Ok(levels) => levels,
        Err(e) => {
            eprintln!("Error loading levels: {}", e);
            std::process::exit(1);
        }
    };

    let level_end = level_end.unwrap_or(level_start);
    let num_levels = level_end.saturating_sub(level_start) + 1;

    if level_start == 0 {
        eprintln!("Error: level numbers must be at least 1");
        std::process::exit(1);
    }
    if level_end < level_start {
        eprintln!("Error: level end must be >= level start");
        std::process::exit(1);
    }
    if level_end > levels.len() {
        eprintln!(
            "Error: level {} not found (file contains {} levels)",
            level_end,
            levels.len()
        );
        std::process::exit(1);
    }
    if print_solution && num_levels > 1 {
        eprintln!("Error: solution printing only supported when solving a single level");
        std::process::exit(1);
    }

    let zobrist = Zobrist::new();
    let cancel = CancelFlag::new();

    let mut total_solved = 0;
    let mut total_pushes = 0;
    let mut total_time_ms = 0;

    for level_num in level_start..=level_end {
        let level = levels.get(level_num - 1).unwrap();
        let start = Instant::now();
        let result = match solver {
            SolverKind::MovesPushes => {
                pushes::solve(&level.board, &level.name, &zobrist, &LogSink, &cancel)
            }
            SolverKind::Btype => bidir::solve(
                &level.board,
                &level.name,
                threads,
                &zobrist,
                &LogSink,
                &cancel,
            ),
        };
        let elapsed_ms = start.elapsed().as_millis();

        let stats = report_level(level_num, &level.board, result, elapsed_ms, print_solution);
        if stats.solved {
            total_solved += 1;
        }
        total_pushes += stats.pushes;
        total_time_ms += stats.elapsed_ms;
    }

    if num_levels > 1 {
        println!("---");
        println!(
            "solved: {:>3}/{:<3}  pushes: {:<5}  elapsed: {} ms",
            total_solved, num_levels, total_pushes, total_time_ms
        );
    }
}

fn report_level(
    level_num: usize,
    board: &Board,
    result: Result<Solution, SolverError>,
    elapsed_ms: u128,
    print_solution: bool,
) -> LevelStats {
    let (solved_char, pushes, solution) = match &result {
        Ok(solution) => ('Y', solution.lurd.len(), Some(solution.clone())),
        Err(SolverError::NoSolution) | Err(SolverError::DeadlockAtStart) => ('X', 0, None),
        Err(_) => ('N', 0, None),
    };
    if let Err(e) = &result {
        log::warn!("level {}: {}", level_num, e);
    }

    println!(
        "level: {:<3}  solved: {}  pushes: {:<5}  elapsed: {} ms",
        level_num, solved_char, pushes, elapsed_ms
    );

    if print_solution {
        if let Some(solution) = &solution {
            print_solution_steps(board, &solution.lurd);
        }
    }

    LevelStats {
        solved: solved_char == 'Y',
        pushes,
        elapsed_ms,
    }
}

fn print_solution_steps(board: &Board, lurd: &str) {
    println!("\nStarting position:\n{}", board);
    let mut board = board.clone();
    let total = lurd.chars().count();
    for (count, ch) in lurd.chars().enumerate() {
        lurd::replay(&mut board, &ch.to_string())
            .unwrap_or_else(|e| panic!("solution failed to replay: {}", e));
        println!("Move {} ({}/{}):\n{}", ch, count + 1, total, board);
    }
}
