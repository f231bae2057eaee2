//! Game-tree search: iterative deepening over a negascout main search with
//! quiescence, a two-bucket transposition table and move-ordering heuristics.

pub mod control;
pub mod draw;
pub mod heuristics;
mod negascout;
pub mod ordering;
mod quiesce;
pub mod see;
pub mod strength;
pub mod tt;

use std::time::{Duration, Instant};

use cozy_chess::{Board, Square};
use kestrel_core::{Move, MoveList, MoveStack, gives_check, is_capture, is_passed_pawn_push};
use tracing::debug;

use crate::error::Interrupted;
use crate::eval::Evaluator;
use crate::listener::{PvInfo, ReportedScore, ScoreBound, SearchListener};

use control::SearchControl;
use heuristics::{History, KillerTable};
use strength::Strength;
use tt::{Bound, TranspositionTable};

/// Depth units per ply. Extensions and reductions are multiples of this.
pub const PLY_SCALE: i32 = 8;

/// Score of delivering mate at the root. A side mated at ply `p` scores `-(MATE0 - p)`.
pub const MATE0: i32 = 32000;

/// Deepest ply the tree may reach.
pub const MAX_PLY: usize = 128;

/// Iteration cap when no depth limit is given.
pub const MAX_DEPTH: u32 = 100;

/// Nodes searched between two time checks.
const NODES_BETWEEN_TIME_CHECK: i32 = 5000;

/// Per-ply scratch state of the current search line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchTreeInfo {
    /// Move being searched from this ply.
    current_move: Move,
    /// Best move found at this ply; after a null-move search, the threat.
    best_move: Move,
    /// Cleared for the ply after a null move, so two never follow each other.
    allow_null_move: bool,
    /// Reduction applied to `current_move`, in depth units.
    lmr: i32,
}

impl Default for SearchTreeInfo {
    fn default() -> Self {
        Self {
            current_move: Move::NULL,
            best_move: Move::NULL,
            allow_null_move: true,
            lmr: 0,
        }
    }
}

/// Root move with the node count spent on it in the last iteration.
#[derive(Debug, Clone, Copy)]
struct RootMove {
    mv: Move,
    nodes: u64,
}

/// Re-search windows after an aspiration failure.
///
/// A fail high first widens beta by twice the aspiration delta, then opens
/// it completely. A fail low on the first root move opens alpha at once.
#[derive(Debug, Clone, Copy)]
struct Aspiration {
    retry: i32,
}

impl Aspiration {
    fn new(delta: i32) -> Self {
        Self { retry: delta * 2 }
    }

    fn widen_beta(&mut self, score: i32) -> i32 {
        let beta = (score + self.retry).min(MATE0);
        self.retry = MATE0 * 2;
        beta
    }

    fn widen_alpha(score: i32) -> i32 {
        (score - MATE0 * 2).max(-MATE0)
    }
}

/// Bound type of `score` searched with window `(alpha, beta)`.
fn bound_for(score: i32, alpha: i32, beta: i32) -> Bound {
    if score <= alpha {
        Bound::Upper
    } else if score >= beta {
        Bound::Lower
    } else {
        Bound::Exact
    }
}

/// Plies by which the root move at index `mi` is first searched shallower.
///
/// Only quiet, non-checking moves from the fourth one on are reduced, from
/// depth 3 up; a reduced move that beats alpha is searched again at full depth.
fn root_reduction(board: &Board, mv: Move, depth: i32, mi: usize, child_in_check: bool) -> i32 {
    let quiet = !is_capture(board, mv)
        && mv.promotion().is_none()
        && !child_in_check
        && !is_passed_pawn_push(board, mv);
    if depth >= 3 && mi >= 3 && quiet { 1 } else { 0 }
}

/// `mv` carrying `score` in its ordering field, as the table expects.
fn scored(mut mv: Move, score: i32) -> Move {
    mv.set_score(score);
    mv
}

/// One search over a root position.
///
/// The searcher borrows the transposition table, evaluator and control
/// block; killers, history and the per-ply tree state are its own.
/// Positions are copied on every move, so the root board never changes.
pub struct Searcher<'a> {
    board: Board,
    tt: &'a mut TranspositionTable,
    evaluator: &'a Evaluator,
    control: &'a SearchControl,
    listener: Option<&'a mut dyn SearchListener>,

    killers: KillerTable,
    history: History,
    tree: Vec<SearchTreeInfo>,
    stack: MoveStack,

    /// Hashes of the positions before the current node, oldest first.
    hash_list: Vec<u64>,
    /// First `hash_list` entry reached inside this search.
    first_new: usize,

    t_start: Instant,
    t_last_stats: Instant,
    /// Poll against the maximum instead of the minimum time limit.
    need_more_time: bool,
    max_nodes: Option<u64>,
    nodes_to_go: i32,

    nodes: u64,
    q_nodes: u64,
    total_nodes: u64,

    strength: Strength,
    /// Static eval handed from the main search to the first quiescence ply.
    q0_eval: Option<i32>,
    verbose: bool,
}

impl<'a> Searcher<'a> {
    /// Create a searcher for `board`.
    ///
    /// `game_hashes` lists the hashes of the game positions before `board`,
    /// oldest first, for repetition detection.
    pub fn new(
        board: &Board,
        game_hashes: &[u64],
        tt: &'a mut TranspositionTable,
        evaluator: &'a Evaluator,
        control: &'a SearchControl,
    ) -> Self {
        let mut hash_list = Vec::with_capacity(game_hashes.len() + MAX_PLY);
        hash_list.extend_from_slice(game_hashes);
        let now = Instant::now();
        Self {
            board: board.clone(),
            tt,
            evaluator,
            control,
            listener: None,
            killers: KillerTable::new(),
            history: History::new(),
            tree: vec![SearchTreeInfo::default(); MAX_PLY + 2],
            stack: MoveStack::new(MAX_PLY),
            first_new: hash_list.len(),
            hash_list,
            t_start: now,
            t_last_stats: now,
            need_more_time: false,
            max_nodes: None,
            nodes_to_go: 0,
            nodes: 0,
            q_nodes: 0,
            total_nodes: 0,
            strength: Strength::default(),
            q0_eval: None,
            verbose: false,
        }
    }

    /// Register a progress listener.
    pub fn set_listener(&mut self, listener: &'a mut dyn SearchListener) {
        self.listener = Some(listener);
    }

    /// Set the minimum and maximum thinking time. `None` means unlimited.
    pub fn time_limit(&mut self, min: Option<Duration>, max: Option<Duration>) {
        self.control.set_time_limit(min, max);
    }

    /// Weaken play to `level` in `0..=1000`; 1000 is full strength.
    pub fn set_strength(&mut self, level: u32, seed: u64) {
        self.strength = Strength::new(level, seed);
    }

    /// Root position.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Nodes searched so far, quiescence included.
    pub fn total_nodes(&self) -> u64 {
        self.total_nodes
    }

    /// Find the best of `root_moves` by iterative deepening.
    ///
    /// Runs until `max_depth` (capped at [`MAX_DEPTH`]), the node budget,
    /// the time limits, or a proven mate ends it. Returns `None` only when
    /// `root_moves` is empty. The returned move carries its score.
    pub fn iterative_deepening(
        &mut self,
        root_moves: &MoveList,
        max_depth: Option<u32>,
        max_nodes: Option<u64>,
        verbose: bool,
    ) -> Option<Move> {
        self.t_start = Instant::now();
        self.t_last_stats = self.t_start;
        self.total_nodes = 0;
        if root_moves.is_empty() {
            return None;
        }
        let mut root: Vec<RootMove> = root_moves
            .iter()
            .map(|&mv| RootMove { mv, nodes: 0 })
            .collect();
        self.max_nodes = max_nodes;
        self.nodes_to_go = 0;
        self.verbose = verbose;
        let max_depth = max_depth.map_or(MAX_DEPTH, |d| d.clamp(1, MAX_DEPTH)) as i32;
        self.tree.fill(SearchTreeInfo::default());

        let mut best_move = root[0].mv;
        let board = self.board.clone();
        if self.deepen(&board, &mut root, max_depth, &mut best_move).is_err() {
            self.hash_list.truncate(self.first_new);
            debug!(nodes = self.total_nodes, "search interrupted");
        }
        self.notify_stats();
        Some(best_move)
    }

    /// The iteration loop of [`iterative_deepening`](Self::iterative_deepening).
    ///
    /// `best_move` is kept current so an interrupted search still has an answer.
    fn deepen(
        &mut self,
        board: &Board,
        root: &mut [RootMove],
        max_depth: i32,
        best_move: &mut Move,
    ) -> Result<(), Interrupted> {
        let key = board.hash();
        let mut best_score_last_iter: i32 = 0;
        for depth in 1.. {
            self.nodes = 0;
            self.q_nodes = 0;
            if let Some(listener) = self.listener.as_deref_mut() {
                listener.notify_depth(depth as u32);
            }
            let delta = if best_score_last_iter.abs() <= MATE0 / 2 {
                self.evaluator.params().aspiration_delta
            } else {
                1000
            };
            let mut alpha = if depth > 1 {
                (best_score_last_iter - delta).max(-MATE0)
            } else {
                -MATE0
            };
            let mut best_score = -MATE0;
            let mut need_more_time = false;

            for mi in 0..root.len() {
                self.need_more_time = mi > 0;
                let mv = root[mi].mv;
                if self.t_start.elapsed() >= Duration::from_secs(1) {
                    if let Some(listener) = self.listener.as_deref_mut() {
                        listener.notify_curr_move(mv, mi + 1);
                    }
                }
                self.nodes = 0;
                self.q_nodes = 0;
                let child_in_check = gives_check(board, mv);
                let mut beta = match (depth > 1, mi) {
                    (false, _) => MATE0,
                    (true, 0) => (best_score_last_iter + delta).min(MATE0),
                    (true, _) => alpha + 1,
                };

                let lmr = root_reduction(board, mv, depth, mi, child_in_check);
                let mut child = board.clone();
                child.play_unchecked(mv.into());
                self.tree[0].current_move = mv;
                self.tree[0].lmr = lmr * PLY_SCALE;
                let mut score =
                    self.search_child(key, &child, alpha, beta, 1, (depth - lmr - 1) * PLY_SCALE, None, child_in_check)?;
                if lmr > 0 && score > alpha {
                    self.tree[0].lmr = 0;
                    score = self.search_child(key, &child, alpha, beta, 1, (depth - 1) * PLY_SCALE, None, child_in_check)?;
                }
                let mut nodes_this_move = self.nodes + self.q_nodes;
                self.tt.insert(
                    key,
                    scored(mv, score),
                    bound_for(score, alpha, beta),
                    0,
                    depth * PLY_SCALE,
                    None,
                );

                if score >= beta {
                    let mut window = Aspiration::new(delta);
                    while score >= beta {
                        beta = window.widen_beta(score);
                        if mi != 0 {
                            need_more_time = true;
                        }
                        *best_move = scored(mv, score);
                        if self.verbose {
                            debug!(depth, %mv, score, nodes = self.nodes, q_nodes = self.q_nodes, "fail high");
                        }
                        self.notify_pv(board, depth, score, ScoreBound::Lower, mv);
                        self.nodes = 0;
                        self.q_nodes = 0;
                        let retry =
                            self.search_child(key, &child, score, beta, 1, (depth - 1) * PLY_SCALE, None, child_in_check)?;
                        score = score.max(retry);
                        nodes_this_move += self.nodes + self.q_nodes;
                    }
                } else if mi == 0 && score <= alpha {
                    while score <= alpha {
                        alpha = Aspiration::widen_alpha(score);
                        need_more_time = true;
                        self.need_more_time = true;
                        if self.verbose {
                            debug!(depth, %mv, score, nodes = self.nodes, q_nodes = self.q_nodes, "fail low");
                        }
                        self.notify_pv(board, depth, score, ScoreBound::Upper, mv);
                        self.nodes = 0;
                        self.q_nodes = 0;
                        score =
                            self.search_child(key, &child, alpha, score, 1, (depth - 1) * PLY_SCALE, None, child_in_check)?;
                        nodes_this_move += self.nodes + self.q_nodes;
                    }
                }

                let improved = score > alpha || mi == 0;
                if self.verbose {
                    let pv = if improved {
                        self.pv_string(board, mv)
                    } else {
                        String::new()
                    };
                    debug!(
                        depth,
                        %mv,
                        score,
                        nodes = self.nodes,
                        q_nodes = self.q_nodes,
                        improved = score > alpha,
                        %pv,
                        "root move"
                    );
                }
                if improved && depth > 1 {
                    self.notify_pv(board, depth, score, ScoreBound::Exact, mv);
                }

                root[mi].mv.set_score(score);
                root[mi].nodes = nodes_this_move;
                best_score = best_score.max(score);
                if depth > 1 && improved {
                    alpha = score;
                    root[..=mi].rotate_right(1);
                    *best_move = root[0].mv;
                }
                if depth > 1 && self.control.out_of_time(self.t_start.elapsed(), need_more_time) {
                    break;
                }
            }

            if depth == 1 {
                root.sort_by(|a, b| b.mv.score().cmp(&a.mv.score()));
                *best_move = root[0].mv;
                self.notify_pv(board, depth, best_move.score(), ScoreBound::Exact, *best_move);
            }

            let elapsed = self.t_start.elapsed();
            debug!(
                depth,
                score = best_score,
                best = %best_move,
                nodes = self.total_nodes,
                elapsed_ms = elapsed.as_millis() as u64,
                "iteration complete"
            );
            if self.control.has_max_limit() && self.control.min_time_reached(elapsed) {
                break;
            }
            if depth >= max_depth {
                break;
            }
            if self.max_nodes.is_some_and(|limit| self.total_nodes >= limit) {
                break;
            }
            if depth >= MATE0 - best_score.abs() {
                break;
            }
            best_score_last_iter = best_score;

            if depth > 1 {
                // Moves that were expensive to resolve go first next time.
                root[1..].sort_by(|a, b| b.nodes.cmp(&a.nodes));
            }
        }
        Ok(())
    }

    /// Search `child`, reached from the node with hash `key`, and return
    /// its score from the parent's point of view.
    #[allow(clippy::too_many_arguments)]
    fn search_child(
        &mut self,
        key: u64,
        child: &Board,
        alpha: i32,
        beta: i32,
        ply: usize,
        depth: i32,
        recapture: Option<Square>,
        in_check: bool,
    ) -> Result<i32, Interrupted> {
        self.hash_list.push(key);
        let score = self.negascout(child, -beta, -alpha, ply, depth, recapture, in_check);
        self.hash_list.pop();
        Ok(-score?)
    }

    /// Poll the time and node limits every [`NODES_BETWEEN_TIME_CHECK`] nodes.
    fn check_limits(&mut self) -> Result<(), Interrupted> {
        self.nodes_to_go -= 1;
        if self.nodes_to_go > 0 {
            return Ok(());
        }
        self.nodes_to_go = NODES_BETWEEN_TIME_CHECK;
        if self.control.out_of_time(self.t_start.elapsed(), self.need_more_time)
            || self.max_nodes.is_some_and(|limit| self.total_nodes >= limit)
        {
            return Err(Interrupted);
        }
        if self.t_last_stats.elapsed() >= Duration::from_secs(1) {
            self.notify_stats();
        }
        Ok(())
    }

    fn evaluate(&self, board: &Board) -> i32 {
        self.evaluator.evaluate(board)
    }

    fn nps(&self, elapsed: Duration) -> u64 {
        let ms = elapsed.as_millis() as u64;
        if ms > 0 {
            self.total_nodes * 1000 / ms
        } else {
            0
        }
    }

    fn notify_pv(&mut self, board: &Board, depth: i32, score: i32, bound: ScoreBound, mv: Move) {
        if self.listener.is_none() {
            return;
        }
        let elapsed = self.t_start.elapsed();
        let info = PvInfo {
            depth: depth as u32,
            score: ReportedScore::from_search(score),
            bound,
            time_ms: elapsed.as_millis() as u64,
            nodes: self.total_nodes,
            nps: self.nps(elapsed),
            pv: self.tt.extract_pv(board, mv),
        };
        if let Some(listener) = self.listener.as_deref_mut() {
            listener.notify_pv(&info);
        }
    }

    fn notify_stats(&mut self) {
        let elapsed = self.t_start.elapsed();
        let (nodes, nps) = (self.total_nodes, self.nps(elapsed));
        if let Some(listener) = self.listener.as_deref_mut() {
            listener.notify_stats(nodes, nps, elapsed.as_millis() as u64);
        }
        self.t_last_stats = Instant::now();
    }

    fn pv_string(&mut self, board: &Board, mv: Move) -> String {
        self.tt
            .extract_pv(board, mv)
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use kestrel_core::{GenKind, generate};

    use super::*;

    fn legal_moves(board: &Board) -> MoveList {
        let mut list = MoveList::new();
        generate(board, GenKind::All, &mut list);
        list
    }

    #[test]
    fn aspiration_widening_converges() {
        // Fail-soft model: a search in (alpha, beta) returns the true score
        // clamped to the window.
        for delta in [20, 1000] {
            for true_score in [-MATE0 + 1, -5000, -21, 0, 45, 900, MATE0 - 1] {
                let prev = 0;
                let mut beta = prev + delta;
                let mut score = true_score.min(beta);
                let mut steps = 0;
                let mut window = Aspiration::new(delta);
                while score >= beta {
                    let low = score;
                    beta = window.widen_beta(score);
                    score = low.max(true_score.min(beta));
                    steps += 1;
                }
                assert!(steps <= 2, "fail high took {steps} steps for {true_score}");
                assert_eq!(score, true_score);

                let mut alpha = prev - delta;
                let mut score = true_score.max(alpha);
                let mut steps = 0;
                while score <= alpha {
                    alpha = Aspiration::widen_alpha(score);
                    score = true_score.max(alpha);
                    steps += 1;
                }
                assert!(steps <= 1, "fail low took {steps} steps for {true_score}");
            }
        }
    }

    #[test]
    fn root_reduction_applies_to_late_quiet_moves() {
        let board = Board::from_fen("4k3/8/8/3p4/4P3/8/8/R3K3 w - - 0 1", false).unwrap();
        let quiet = Move::new(Square::A1, Square::A2);
        let capture = Move::new(Square::E4, Square::D5);
        let check = Move::new(Square::A1, Square::A8);
        assert_eq!(root_reduction(&board, quiet, 3, 3, false), 1);
        assert_eq!(root_reduction(&board, quiet, 2, 3, false), 0);
        assert_eq!(root_reduction(&board, quiet, 5, 2, false), 0);
        assert_eq!(root_reduction(&board, capture, 5, 6, false), 0);
        assert_eq!(root_reduction(&board, check, 5, 6, true), 0);
    }

    #[test]
    fn bound_follows_window() {
        assert_eq!(bound_for(10, 10, 20), Bound::Upper);
        assert_eq!(bound_for(15, 10, 20), Bound::Exact);
        assert_eq!(bound_for(20, 10, 20), Bound::Lower);
    }

    #[test]
    fn empty_root_list_gives_no_move() {
        let board = Board::default();
        let mut tt = TranspositionTable::with_log2_size(10);
        let eval = Evaluator::default();
        let control = SearchControl::new();
        let mut searcher = Searcher::new(&board, &[], &mut tt, &eval, &control);
        assert_eq!(searcher.iterative_deepening(&MoveList::new(), Some(3), None, false), None);
    }

    #[test]
    fn fifty_move_draw_scores_zero() {
        // White is a rook up, but the clock allows a draw claim.
        let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 100 90", false).unwrap();
        let mut tt = TranspositionTable::with_log2_size(10);
        let eval = Evaluator::default();
        let control = SearchControl::new();
        let mut searcher = Searcher::new(&board, &[], &mut tt, &eval, &control);
        let score = searcher.negascout(&board, -MATE0, MATE0, 1, 4 * PLY_SCALE, None, false);
        assert_eq!(score, Ok(0));
    }

    #[test]
    fn fifty_move_rule_does_not_hide_mate() {
        // Black is checkmated; the clock would otherwise allow a claim.
        let board = Board::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 100 90", false).unwrap();
        let mut tt = TranspositionTable::with_log2_size(10);
        let eval = Evaluator::default();
        let control = SearchControl::new();
        let mut searcher = Searcher::new(&board, &[], &mut tt, &eval, &control);
        let score = searcher.negascout(&board, -MATE0, MATE0, 1, 4 * PLY_SCALE, None, true);
        assert_eq!(score, Ok(-(MATE0 - 1)));
    }

    #[test]
    fn repetition_in_search_line_and_game_scores_zero() {
        // Shuffling knights: after Nf3 Nf6 Ng1 Ng8 the start position repeats.
        let start = Board::default();
        let mut hashes = Vec::new();
        let mut board = start.clone();
        for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            hashes.push(board.hash());
            let mv = kestrel_core::parse_uci_move(&board, uci).unwrap();
            board.play_unchecked(mv.into());
        }
        assert_eq!(board.hash(), start.hash());

        let mut tt = TranspositionTable::with_log2_size(10);
        let eval = Evaluator::default();
        let control = SearchControl::new();
        // The game already went through the cycle once; the search repeats it.
        let mut searcher = Searcher::new(&board, &hashes, &mut tt, &eval, &control);
        searcher.hash_list.extend_from_slice(&hashes);
        let score = searcher.negascout(&board, -MATE0, MATE0, 4, 3 * PLY_SCALE, None, false);
        assert_eq!(score, Ok(0));
    }

    #[test]
    fn depth_one_returns_a_legal_opening_move() {
        let board = Board::default();
        let moves = legal_moves(&board);
        assert_eq!(moves.len(), 20);
        let mut tt = TranspositionTable::with_log2_size(12);
        let eval = Evaluator::default();
        let control = SearchControl::new();
        let mut searcher = Searcher::new(&board, &[], &mut tt, &eval, &control);
        let best = searcher
            .iterative_deepening(&moves, Some(1), None, false)
            .expect("a move");
        assert!(moves.contains(best));
        assert!(best.score().abs() < MATE0 / 2);
        assert_eq!(searcher.board().hash(), board.hash());
    }
}
