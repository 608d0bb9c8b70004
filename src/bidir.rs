use crate::board::{ALL_DIRECTIONS, Board, Direction};
use crate::heuristic::{self, LowerBound};
use crate::lurd::MoveHistory;
use crate::memory;
use crate::position::BoardPosition;
use crate::queue::OpenQueue;
use crate::solver::{CancelFlag, ProgressSink, Solution, SolverError};
use crate::table::TranspositionTable;
use crate::zobrist::Zobrist;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Insertion attempts between progress reports and memory checks.
const PROGRESS_INTERVAL: u64 = 65_536;

/// How long an idle worker waits before re-reading the idle counter.
const QUIESCENCE_RECHECK: Duration = Duration::from_millis(20);

/// Parallel bidirectional solver for zero-space spanning-tree levels.
///
/// A forward search from the starting boxes and a backward search from the
/// goal configuration (run on the mirror board) share one transposition
/// table; inserting a position the opposite side already stored is a meet,
/// and the two parent chains concatenate into a solution. Every push in
/// this level class moves a box exactly two cells along its free axis.
pub fn solve(
    board: &Board,
    name: &str,
    threads: Option<usize>,
    zobrist: &Zobrist,
    progress: &dyn ProgressSink,
    cancel: &CancelFlag,
) -> Result<Solution, SolverError> {
    match heuristic::lower_bound(board) {
        LowerBound::Deadlock => return Err(SolverError::DeadlockAtStart),
        LowerBound::Pushes(0) => {
            progress.publish("solved");
            return Ok(Solution {
                name: name.to_string(),
                lurd: String::new(),
            });
        }
        LowerBound::Pushes(_) => {}
    }

    let mirror = board.mirrored();
    let box_count = board.box_count();
    let per_direction = (threads.unwrap_or_else(num_cpus::get) / 2).max(1);

    let shared = Shared {
        table: TranspositionTable::new(),
        queues: [OpenQueue::new(box_count), OpenQueue::new(box_count)],
        zobrist,
        progress,
        cancel,
        running: AtomicBool::new(true),
        idle_workers: AtomicUsize::new(0),
        worker_count: per_direction * 2,
        insertions: AtomicU64::new(0),
        solution: Mutex::new(None),
        failure: Mutex::new(None),
    };

    // The roots cannot collide in the table: equal roots would mean the
    // level starts solved, and the zero lower bound already returned.
    let forward_root = Arc::new(BoardPosition::root(board.box_positions(), false, zobrist));
    let backward_root = Arc::new(BoardPosition::root(mirror.box_positions(), true, zobrist));
    shared.table.put_if_absent(&forward_root);
    shared.table.put_if_absent(&backward_root);
    shared.queues[0].push(bucket(board), forward_root);
    shared.queues[1].push(bucket(&mirror), backward_root);

    std::thread::scope(|scope| {
        for _ in 0..per_direction {
            let mut forward = Worker {
                shared: &shared,
                board: board.clone(),
                backward: false,
                scratch: Vec::with_capacity(box_count),
            };
            scope.spawn(move || forward.run());

            let mut backward = Worker {
                shared: &shared,
                board: mirror.clone(),
                backward: true,
                scratch: Vec::with_capacity(box_count),
            };
            scope.spawn(move || backward.run());
        }
    });

    let path = shared.solution.lock().unwrap().take();
    if let Some(path) = path {
        progress.publish("solved");
        return Ok(Solution {
            name: name.to_string(),
            lurd: assemble_moves(board, &path),
        });
    }
    let failure = shared.failure.lock().unwrap().take();
    Err(failure.unwrap_or(SolverError::NoSolution))
}

/// Open-queue bucket for the configuration currently on the board. A
/// configuration with no box on its correct goal clamps to the lowest
/// bucket instead of underflowing.
fn bucket(board: &Board) -> usize {
    heuristic::boxes_on_correct_goals(board).saturating_sub(1)
}

struct Shared<'a> {
    table: TranspositionTable,
    /// Forward queue at index 0, backward at index 1.
    queues: [OpenQueue; 2],
    zobrist: &'a Zobrist,
    progress: &'a dyn ProgressSink,
    cancel: &'a CancelFlag,
    running: AtomicBool,
    idle_workers: AtomicUsize,
    worker_count: usize,
    insertions: AtomicU64,
    solution: Mutex<Option<Vec<Arc<BoardPosition>>>>,
    failure: Mutex<Option<SolverError>>,
}

impl Shared<'_> {
    fn queue(&self, backward: bool) -> &OpenQueue {
        &self.queues[usize::from(backward)]
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    fn fail(&self, error: SolverError) {
        let mut slot = self.failure.lock().unwrap();
        if slot.is_none() {
            *slot = Some(error);
        }
        drop(slot);
        self.stop();
    }

    /// Record a completed meet path; the shortest recorded path wins.
    fn record_solution(&self, path: Vec<Arc<BoardPosition>>) {
        let mut slot = self.solution.lock().unwrap();
        match slot.as_ref() {
            Some(existing) if existing.len() <= path.len() => {}
            _ => *slot = Some(path),
        }
        drop(slot);
        self.stop();
    }
}

struct Worker<'a, 'b> {
    shared: &'b Shared<'a>,
    board: Board,
    backward: bool,
    scratch: Vec<u16>,
}

impl Worker<'_, '_> {
    fn run(&mut self) {
        loop {
            if !self.shared.running.load(Ordering::Relaxed) {
                return;
            }
            if self.shared.cancel.is_cancelled() {
                self.shared.fail(SolverError::Cancelled);
                return;
            }
            match self.shared.queue(self.backward).pop() {
                Some(bp) => self.expand(&bp),
                None => {
                    if self.quiesce() {
                        return;
                    }
                }
            }
        }
    }

    /// Idle protocol: global termination only once every worker has
    /// simultaneously observed an empty queue. The sleep-and-recheck
    /// tolerates a racing worker that was about to enqueue.
    fn quiesce(&self) -> bool {
        let idle = self.shared.idle_workers.fetch_add(1, Ordering::SeqCst) + 1;
        if idle == self.shared.worker_count {
            return true;
        }
        std::thread::sleep(QUIESCENCE_RECHECK);
        if self.shared.idle_workers.load(Ordering::SeqCst) == self.shared.worker_count {
            return true;
        }
        self.shared.idle_workers.fetch_sub(1, Ordering::SeqCst);
        false
    }

    fn expand(&mut self, bp: &Arc<BoardPosition>) {
        bp.reify_into(&mut self.scratch);
        self.board.set_boxes(&self.scratch);

        for i in 0..self.scratch.len() {
            let from = self.scratch[i];
            for dir in ALL_DIRECTIONS {
                let Some(mid) = self.board.step(from, dir) else {
                    continue;
                };
                let Some(dest) = self.board.step(mid, dir) else {
                    continue;
                };
                // Both cells of the double push must be open.
                if !self.board.is_box_accessible(mid) || !self.board.is_box_accessible(dest) {
                    continue;
                }

                self.board.push_box(from, dest);
                self.board.set_player(mid);

                if corral_exists(&mut self.board, dest) {
                    self.board.undo_push(dest, from);
                    continue;
                }

                let child = Arc::new(BoardPosition::delta(
                    from,
                    dest,
                    bp.clone(),
                    self.shared.zobrist,
                ));

                let inserted = self.shared.insertions.fetch_add(1, Ordering::Relaxed) + 1;
                if inserted % PROGRESS_INTERVAL == 0 {
                    self.shared
                        .progress
                        .publish(&format!("positions: {}", self.shared.table.len()));
                    if memory::is_low() {
                        self.shared.fail(SolverError::OutOfMemory);
                        self.board.undo_push(dest, from);
                        return;
                    }
                }

                match self.shared.table.put_if_absent(&child) {
                    None => {
                        let bucket = bucket(&self.board);
                        self.shared.queue(self.backward).push(bucket, child);
                    }
                    Some(other) if other.backward() != self.backward => {
                        self.record_meet(child, other);
                        self.board.undo_push(dest, from);
                        return;
                    }
                    Some(_) => {}
                }

                self.board.undo_push(dest, from);
            }
        }
    }

    fn record_meet(&self, side_a: Arc<BoardPosition>, side_b: Arc<BoardPosition>) {
        let (forward, backward) = if side_a.backward() {
            (side_b, side_a)
        } else {
            (side_a, side_b)
        };

        // [forward root .. forward tip], then the backward chain from just
        // past the meet (the backward tip holds the same boxes as the
        // forward tip) down to the backward root.
        let mut path: Vec<Arc<BoardPosition>> = Vec::new();
        let mut node = &forward;
        loop {
            path.push(node.clone());
            match node.parent() {
                Some(parent) => node = parent,
                None => break,
            }
        }
        path.reverse();
        let mut next = backward.parent();
        while let Some(node) = next {
            path.push(node.clone());
            next = node.parent();
        }

        self.shared.record_solution(path);
    }
}

/// A free cell next to the pushed box that the player cannot reach seals a
/// corral; for zero-space levels that is always a deadlock.
fn corral_exists(board: &mut Board, box_pos: u16) -> bool {
    board.update_player_reachable();
    for dir in ALL_DIRECTIONS {
        if let Some(next) = board.step(box_pos, dir) {
            if board.is_box_accessible(next) && !board.is_player_reachable(next) {
                return true;
            }
        }
    }
    false
}

/// Convert the meet path into player movements. Each adjacent pair differs
/// by one box moved two cells along one axis: two identical pushes, with
/// the walks that bring the player behind the box filled in between.
fn assemble_moves(board: &Board, path: &[Arc<BoardPosition>]) -> String {
    let mut work = board.clone();
    let mut history = MoveHistory::new();
    let mut prev = path[0].boxes();
    let mut next = Vec::new();

    for node in &path[1..] {
        node.reify_into(&mut next);
        let (from, to) = moved_box(&prev, &next);
        let dir = double_push_direction(&work, from, to);
        let box_no = work
            .box_positions()
            .iter()
            .position(|&p| p == from)
            .expect("moved box missing from the board");

        // Bring the player to the cell behind the box.
        let stand = work
            .step(from, dir.reverse())
            .expect("no cell to push the box from");
        let walks = work
            .player_path(stand)
            .expect("player cannot reach the pushing position");
        for walk in walks {
            history.add_walk(walk);
        }

        let mid = work
            .step(from, dir)
            .expect("double push has no intermediate cell");
        work.push_box(from, to);
        work.set_player(mid);
        history.add_push(dir, box_no);
        history.add_push(dir, box_no);

        std::mem::swap(&mut prev, &mut next);
    }

    assert!(
        work.is_solved(),
        "assembled path does not end in the solved configuration"
    );
    history.lurd()
}

/// The single `(from, to)` pair by which two sorted box arrays differ.
fn moved_box(prev: &[u16], next: &[u16]) -> (u16, u16) {
    let mut from = None;
    let mut to = None;
    let (mut i, mut j) = (0, 0);
    while i < prev.len() || j < next.len() {
        match (prev.get(i), next.get(j)) {
            (Some(&a), Some(&b)) if a == b => {
                i += 1;
                j += 1;
            }
            (Some(&a), Some(&b)) if a < b => {
                assert!(from.is_none(), "more than one box moved between positions");
                from = Some(a);
                i += 1;
            }
            (Some(&a), None) => {
                assert!(from.is_none(), "more than one box moved between positions");
                from = Some(a);
                i += 1;
            }
            (_, Some(&b)) => {
                assert!(to.is_none(), "more than one box moved between positions");
                to = Some(b);
                j += 1;
            }
            (None, None) => break,
        }
    }
    (
        from.expect("adjacent positions are identical"),
        to.expect("adjacent positions are identical"),
    )
}

fn double_push_direction(board: &Board, from: u16, to: u16) -> Direction {
    for dir in ALL_DIRECTIONS {
        if let Some(mid) = board.step(from, dir) {
            if board.step(mid, dir) == Some(to) {
                return dir;
            }
        }
    }
    panic!("box moved from {} to {} without a double push", from, to);
}
