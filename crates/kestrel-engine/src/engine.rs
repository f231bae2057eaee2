//! Engine worker: runs one search at a time on a dedicated thread.
//!
//! The [`Engine`] owns the transposition table and hands it to the worker
//! for the duration of a search. The control thread talks to a running
//! search only through the shared [`SearchControl`]: `stop` zeroes the time
//! limits, a ponder hit installs the real ones.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cozy_chess::Board;
use kestrel_core::{GenKind, Move, MoveList, generate};
use tracing::{debug, info, warn};

use crate::error::{EngineError, ParamError};
use crate::eval::Evaluator;
use crate::listener::SearchListener;
use crate::search::Searcher;
use crate::search::control::SearchControl;
use crate::search::strength::MAX_STRENGTH;
use crate::search::tt::TranspositionTable;
use crate::time::{GoParams, Limits, compute_time_limits};

/// Polling interval while a finished search waits for ponderhit or stop.
const WAIT_POLL: Duration = Duration::from_millis(10);

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Transposition table size in megabytes.
    pub hash_mb: usize,
    /// Plan the clock assuming some moves are ponder hits.
    pub ponder_mode: bool,
    /// Playing strength in `0..=1000`.
    pub strength: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_mb: 16,
            ponder_mode: true,
            strength: MAX_STRENGTH,
        }
    }
}

/// Result of a finished search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    /// `None` only when the root had no legal move.
    pub best_move: Option<Move>,
    /// Expected reply to the best move, if the table knows a legal one.
    pub ponder_move: Option<Move>,
}

/// What the worker hands back on join.
struct Finished {
    outcome: SearchOutcome,
    tt: TranspositionTable,
}

/// Everything the worker thread needs, moved in at spawn.
struct SearchJob {
    board: Board,
    game_hashes: Vec<u64>,
    root: MoveList,
    limits: Limits,
    strength: u32,
    seed: u64,
}

/// A chess engine that searches on a background thread.
pub struct Engine {
    config: EngineConfig,
    evaluator: Arc<Evaluator>,
    /// `None` while the worker owns the table.
    tt: Option<TranspositionTable>,
    worker: Option<JoinHandle<Finished>>,
    control: Arc<SearchControl>,
    seed: u64,
    /// Limits of the current `go`, installed on a ponder hit.
    pending_limits: Limits,
    one_possible_move: bool,
    pending_clear_tt: bool,
    /// TT resize (MB) to apply when the worker returns the table.
    pending_hash_mb: Option<usize>,
}

impl Engine {
    /// Create an idle engine.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            evaluator: Arc::new(Evaluator::default()),
            tt: Some(TranspositionTable::with_hash_mb(config.hash_mb)),
            worker: None,
            control: Arc::new(SearchControl::new()),
            seed: 0,
            pending_limits: Limits::default(),
            one_possible_move: false,
            pending_clear_tt: false,
            pending_hash_mb: None,
        }
    }

    /// Current settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Return `true` while a search thread exists (running or waiting to be joined).
    pub fn is_searching(&self) -> bool {
        self.worker.is_some()
    }

    /// Return `true` once the running search has produced its result.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| w.is_finished())
    }

    /// Start searching `board`.
    ///
    /// `game_hashes` are the hashes of the game positions before `board`,
    /// oldest first. With `params.ponder` set this behaves like
    /// [`start_ponder`](Self::start_ponder). The listener receives progress
    /// and, at the end, the best move.
    pub fn start_search(
        &mut self,
        board: &Board,
        game_hashes: &[u64],
        params: GoParams,
        listener: Box<dyn SearchListener>,
    ) -> Result<(), EngineError> {
        if self.worker.is_some() {
            return Err(EngineError::Busy);
        }
        let limits = compute_time_limits(&params, board.side_to_move(), self.config.ponder_mode);
        let infinite = limits.is_unbounded();

        let mut root = MoveList::new();
        generate(board, GenKind::All, &mut root);
        if !params.search_moves.is_empty() {
            root.retain(|mv| params.search_moves.contains(mv));
        }

        self.one_possible_move = root.len() < 2 && !infinite;
        self.pending_limits = limits;
        let mut search_limits = if params.ponder { Limits::default() } else { limits };
        if self.one_possible_move && !params.ponder {
            search_limits.depth = Some(search_limits.depth.map_or(2, |d| d.min(2)));
        }

        let control = Arc::new(SearchControl::with_limits(search_limits.min, search_limits.max));
        control.set_wait_flags(params.ponder, infinite);
        self.control = Arc::clone(&control);

        let mut tt = self
            .tt
            .take()
            .unwrap_or_else(|| TranspositionTable::with_hash_mb(self.config.hash_mb));
        tt.next_generation();

        debug!(
            moves = root.len(),
            ponder = params.ponder,
            infinite,
            min = ?search_limits.min,
            max = ?search_limits.max,
            depth = ?search_limits.depth,
            nodes = ?search_limits.nodes,
            "starting search"
        );

        let job = SearchJob {
            board: board.clone(),
            game_hashes: game_hashes.to_vec(),
            root,
            limits: search_limits,
            strength: self.config.strength,
            seed: self.seed,
        };
        let evaluator = Arc::clone(&self.evaluator);
        self.worker = Some(thread::spawn(move || {
            run_search(job, tt, &evaluator, &control, listener)
        }));
        Ok(())
    }

    /// Start pondering: search without limits until
    /// [`ponder_hit`](Self::ponder_hit) or [`stop`](Self::stop).
    pub fn start_ponder(
        &mut self,
        board: &Board,
        game_hashes: &[u64],
        mut params: GoParams,
        listener: Box<dyn SearchListener>,
    ) -> Result<(), EngineError> {
        params.ponder = true;
        self.start_search(board, game_hashes, params, listener)
    }

    /// The opponent played the expected move: switch the ponder search to
    /// the limits of its `go` request.
    pub fn ponder_hit(&mut self) {
        if self.worker.is_none() || !self.control.is_pondering() {
            return;
        }
        let mut limits = self.pending_limits;
        if self.one_possible_move {
            let one_ms = Duration::from_millis(1);
            limits.min = limits.min.map(|d| d.min(one_ms));
            limits.max = limits.max.map(|d| d.min(one_ms));
        }
        self.control.set_time_limit(limits.min, limits.max);
        self.control.set_wait_flags(false, limits.is_unbounded());
        debug!(min = ?limits.min, max = ?limits.max, "ponder hit");
    }

    /// Stop the running search and return its result.
    ///
    /// Returns `Ok(None)` when no search was running.
    pub fn stop(&mut self) -> Result<Option<SearchOutcome>, EngineError> {
        match self.worker.take() {
            Some(worker) => {
                self.control.stop();
                self.join(worker).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Wait for the running search to finish on its own.
    ///
    /// Blocks until a ponder or infinite search is released by another
    /// thread, so those are normally ended with [`stop`](Self::stop).
    pub fn wait(&mut self) -> Result<Option<SearchOutcome>, EngineError> {
        match self.worker.take() {
            Some(worker) => self.join(worker).map(Some),
            None => Ok(None),
        }
    }

    /// Prepare for a new game: fresh weak-play seed and an empty table.
    pub fn new_game(&mut self) {
        self.seed = rand::random();
        match self.tt.as_mut() {
            Some(tt) => tt.clear(),
            None => self.pending_clear_tt = true,
        }
    }

    /// Resize the transposition table. Applied after the running search, if any.
    pub fn set_hash_mb(&mut self, mb: usize) {
        self.config.hash_mb = mb;
        if self.tt.is_some() {
            self.tt = Some(TranspositionTable::with_hash_mb(mb));
            info!(mb, "transposition table resized");
        } else {
            self.pending_hash_mb = Some(mb);
        }
    }

    /// Set the playing strength in `0..=1000` for the next search.
    pub fn set_strength(&mut self, level: u32) {
        self.config.strength = level.min(MAX_STRENGTH);
    }

    /// Enable or disable ponder-aware time planning.
    pub fn set_ponder_mode(&mut self, on: bool) {
        self.config.ponder_mode = on;
    }

    /// Set a tunable evaluation/search parameter for the next search.
    pub fn set_parameter(&mut self, name: &str, value: i32) -> Result<(), ParamError> {
        Arc::make_mut(&mut self.evaluator).params_mut().set(name, value)
    }

    fn join(&mut self, worker: JoinHandle<Finished>) -> Result<SearchOutcome, EngineError> {
        match worker.join() {
            Ok(finished) => {
                self.restore_tt(finished.tt);
                Ok(finished.outcome)
            }
            Err(_) => {
                warn!("search thread panicked, rebuilding transposition table");
                self.pending_clear_tt = false;
                let mb = self.pending_hash_mb.take().unwrap_or(self.config.hash_mb);
                self.tt = Some(TranspositionTable::with_hash_mb(mb));
                Err(EngineError::WorkerPanicked)
            }
        }
    }

    fn restore_tt(&mut self, mut tt: TranspositionTable) {
        if let Some(mb) = self.pending_hash_mb.take() {
            tt = TranspositionTable::with_hash_mb(mb);
            info!(mb, "transposition table resized");
        } else if self.pending_clear_tt {
            tt.clear();
        }
        self.pending_clear_tt = false;
        self.tt = Some(tt);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.control.stop();
            let _ = worker.join();
        }
    }
}

/// Worker body: search, wait while pondering or infinite, report.
fn run_search(
    job: SearchJob,
    mut tt: TranspositionTable,
    evaluator: &Evaluator,
    control: &SearchControl,
    mut listener: Box<dyn SearchListener>,
) -> Finished {
    let best_move = {
        let mut searcher = Searcher::new(&job.board, &job.game_hashes, &mut tt, evaluator, control);
        searcher.set_strength(job.strength, job.seed);
        searcher.set_listener(listener.as_mut());
        let best = searcher.iterative_deepening(&job.root, job.limits.depth, job.limits.nodes, false);
        info!(nodes = searcher.total_nodes(), "search finished");
        best
    };

    while control.must_wait() {
        thread::sleep(WAIT_POLL);
    }

    let ponder_move = best_move.and_then(|mv| ponder_move(&mut tt, &job.board, mv));
    if let Some(best) = best_move {
        listener.notify_best_move(best, ponder_move);
    }
    Finished {
        outcome: SearchOutcome {
            best_move,
            ponder_move,
        },
        tt,
    }
}

/// The table's best move in the position after `best`, if it is legal there.
fn ponder_move(tt: &mut TranspositionTable, board: &Board, best: Move) -> Option<Move> {
    let mut child = board.clone();
    child.play_unchecked(best.into());
    let reply = tt.probe(child.hash())?.best_move();
    let mut legal = MoveList::new();
    generate(&child, GenKind::All, &mut legal);
    legal.contains(reply).then_some(reply)
}

#[cfg(test)]
mod tests {
    use cozy_chess::Square;

    use crate::listener::TracingListener;
    use crate::search::tt::Bound;

    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.hash_mb, 16);
        assert!(config.ponder_mode);
        assert_eq!(config.strength, MAX_STRENGTH);
    }

    #[test]
    fn second_search_is_rejected_while_busy() {
        let mut engine = Engine::default();
        let board = Board::default();
        let params = GoParams {
            infinite: true,
            ..GoParams::default()
        };
        engine
            .start_search(&board, &[], params.clone(), Box::new(TracingListener))
            .unwrap();
        assert!(matches!(
            engine.start_search(&board, &[], params, Box::new(TracingListener)),
            Err(EngineError::Busy)
        ));
        let outcome = engine.stop().unwrap().unwrap();
        assert!(outcome.best_move.is_some());
        assert!(!engine.is_searching());
    }

    #[test]
    fn stop_without_search_is_a_no_op() {
        let mut engine = Engine::default();
        assert_eq!(engine.stop().unwrap(), None);
        assert_eq!(engine.wait().unwrap(), None);
    }

    #[test]
    fn settings_are_clamped_and_recorded() {
        let mut engine = Engine::default();
        engine.set_strength(4000);
        engine.set_ponder_mode(false);
        engine.set_hash_mb(1);
        assert_eq!(engine.config().strength, MAX_STRENGTH);
        assert!(!engine.config().ponder_mode);
        assert_eq!(engine.config().hash_mb, 1);
        assert!(engine.set_parameter("no_such_parameter", 1).is_err());
    }

    #[test]
    fn ponder_move_comes_from_the_table() {
        let board = Board::default();
        let mut tt = TranspositionTable::with_log2_size(10);
        let best = Move::new(Square::E2, Square::E4);
        assert_eq!(ponder_move(&mut tt, &board, best), None);

        let mut child = board.clone();
        child.play_unchecked(best.into());
        let reply = Move::new(Square::E7, Square::E5);
        tt.insert(child.hash(), reply, Bound::Exact, 0, 8, None);
        assert_eq!(ponder_move(&mut tt, &board, best), Some(reply));
    }
}
