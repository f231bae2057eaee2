//! Integration tests for the searcher and the engine worker.
//!
//! Covers result correctness (legal moves, mate scores, root restrictions)
//! and control behaviour (zero budgets, stop, ponder hit).

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use kestrel_core::{Board, GenKind, Move, MoveList, Square, generate};
use kestrel_engine::{
    Engine, EngineConfig, Evaluator, GoParams, MATE0, SearchControl, SearchListener, Searcher,
    TranspositionTable,
};

const SCHOLARS_MATE_FEN: &str =
    "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";

/// White is in check and Kxb2 is the only legal move.
const ONE_MOVE_FEN: &str = "k7/8/8/8/8/8/1q6/K7 w - - 0 1";

fn board(fen: &str) -> Board {
    Board::from_fen(fen, false).unwrap()
}

fn legal_moves(board: &Board) -> MoveList {
    let mut list = MoveList::new();
    generate(board, GenKind::All, &mut list);
    list
}

/// Helper: search `board` with the given limits on a fresh table.
fn search(board: &Board, depth: Option<u32>, control: &SearchControl) -> Option<Move> {
    let mut tt = TranspositionTable::with_log2_size(16);
    let eval = Evaluator::default();
    let mut searcher = Searcher::new(board, &[], &mut tt, &eval, control);
    searcher.iterative_deepening(&legal_moves(board), depth, None, false)
}

/// Listener that records the final best move.
#[derive(Clone, Default)]
struct BestMoveSink(Arc<Mutex<Option<(Move, Option<Move>)>>>);

impl SearchListener for BestMoveSink {
    fn notify_best_move(&mut self, best: Move, ponder: Option<Move>) {
        *self.0.lock().unwrap() = Some((best, ponder));
    }
}

// ── Searcher ──────────────────────────────────────────────────────────────────

#[test]
fn startpos_depth_one_returns_legal_move_with_finite_score() {
    let board = Board::default();
    let best = search(&board, Some(1), &SearchControl::new()).unwrap();
    assert!(legal_moves(&board).contains(best));
    assert!(best.score().abs() < MATE0 / 2, "score {}", best.score());
}

#[test]
fn finds_mate_in_one_with_exact_score() {
    let board = board(SCHOLARS_MATE_FEN);
    let best = search(&board, Some(3), &SearchControl::new()).unwrap();
    assert_eq!(best.to_string(), "h5f7");
    assert_eq!(best.score(), MATE0 - 1);
}

#[test]
fn single_legal_move_is_returned() {
    let board = board(ONE_MOVE_FEN);
    let best = search(&board, Some(4), &SearchControl::new()).unwrap();
    assert_eq!(best, Move::new(Square::A1, Square::B2));
}

#[test]
fn zero_time_budget_still_answers_and_keeps_root() {
    let board = Board::default();
    let control = SearchControl::with_limits(Some(Duration::ZERO), Some(Duration::ZERO));
    let mut tt = TranspositionTable::with_log2_size(12);
    let eval = Evaluator::default();
    let mut searcher = Searcher::new(&board, &[], &mut tt, &eval, &control);
    let best = searcher
        .iterative_deepening(&legal_moves(&board), None, None, false)
        .unwrap();
    assert!(legal_moves(&board).contains(best));
    assert_eq!(searcher.board().hash(), board.hash());
}

#[test]
fn node_budget_returns_last_completed_iteration() {
    let board = Board::default();
    let eval = Evaluator::default();
    let control = SearchControl::new();
    let run = |depth: Option<u32>, max_nodes: Option<u64>| {
        let mut tt = TranspositionTable::with_log2_size(16);
        let mut searcher = Searcher::new(&board, &[], &mut tt, &eval, &control);
        let best = searcher
            .iterative_deepening(&legal_moves(&board), depth, max_nodes, false)
            .unwrap();
        assert_eq!(searcher.board().hash(), board.hash());
        (best, searcher.total_nodes())
    };

    // Pick an iteration whose successor is long enough to be cut short.
    let (depth, best, nodes) = (2..=6)
        .map(|d| {
            let (best, nodes) = run(Some(d), None);
            (d, best, nodes)
        })
        .find(|&(d, _, nodes)| run(Some(d + 1), None).1 > nodes + 100_000)
        .expect("some iteration grows by 100k nodes");

    let (cut, cut_nodes) = run(None, Some(nodes + 1));
    assert_eq!(cut, best, "interrupted at depth {}", depth + 1);
    assert!(cut_nodes > nodes);
}

#[test]
fn empty_root_list_gives_none() {
    let board = Board::default();
    let mut tt = TranspositionTable::with_log2_size(10);
    let eval = Evaluator::default();
    let control = SearchControl::new();
    let mut searcher = Searcher::new(&board, &[], &mut tt, &eval, &control);
    assert_eq!(searcher.iterative_deepening(&MoveList::new(), Some(3), None, false), None);
}

// ── Engine worker ─────────────────────────────────────────────────────────────

#[test]
fn engine_reports_best_move_to_listener() {
    let mut engine = Engine::new(EngineConfig {
        hash_mb: 1,
        ..EngineConfig::default()
    });
    let sink = BestMoveSink::default();
    let params = GoParams {
        depth: Some(3),
        ..GoParams::default()
    };
    let board = Board::default();
    engine
        .start_search(&board, &[], params, Box::new(sink.clone()))
        .unwrap();
    let outcome = engine.wait().unwrap().unwrap();
    let best = outcome.best_move.unwrap();
    assert!(legal_moves(&board).contains(best));
    let reported = sink.0.lock().unwrap().unwrap();
    assert_eq!(reported.0, best);
    assert_eq!(reported.1, outcome.ponder_move);
}

#[test]
fn engine_one_possible_move_answers_quickly() {
    let mut engine = Engine::default();
    let params = GoParams {
        movetime: Some(Duration::from_secs(30)),
        ..GoParams::default()
    };
    let started = Instant::now();
    engine
        .start_search(&board(ONE_MOVE_FEN), &[], params, Box::new(BestMoveSink::default()))
        .unwrap();
    let outcome = engine.wait().unwrap().unwrap();
    assert_eq!(outcome.best_move, Some(Move::new(Square::A1, Square::B2)));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn engine_stop_ends_infinite_search() {
    let mut engine = Engine::default();
    let params = GoParams {
        infinite: true,
        ..GoParams::default()
    };
    let board = Board::default();
    engine
        .start_search(&board, &[], params, Box::new(BestMoveSink::default()))
        .unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert!(!engine.is_finished(), "infinite search waits for stop");
    let outcome = engine.stop().unwrap().unwrap();
    assert!(legal_moves(&board).contains(outcome.best_move.unwrap()));
    assert!(!engine.is_searching());
}

#[test]
fn engine_ponder_hit_installs_time_limits() {
    let mut engine = Engine::default();
    let params = GoParams {
        movetime: Some(Duration::from_millis(50)),
        ..GoParams::default()
    };
    let board = Board::default();
    engine
        .start_ponder(&board, &[], params, Box::new(BestMoveSink::default()))
        .unwrap();
    std::thread::sleep(Duration::from_millis(20));
    assert!(!engine.is_finished(), "ponder search runs until ponderhit");
    engine.ponder_hit();
    let outcome = engine.wait().unwrap().unwrap();
    assert!(legal_moves(&board).contains(outcome.best_move.unwrap()));
}

#[test]
fn engine_respects_search_moves() {
    let mut engine = Engine::default();
    let only = Move::new(Square::A2, Square::A3);
    let params = GoParams {
        depth: Some(2),
        search_moves: vec![only],
        ..GoParams::default()
    };
    engine
        .start_search(&Board::default(), &[], params, Box::new(BestMoveSink::default()))
        .unwrap();
    let outcome = engine.wait().unwrap().unwrap();
    assert_eq!(outcome.best_move, Some(only));
}

#[test]
fn engine_new_game_and_resize_between_searches() {
    let mut engine = Engine::default();
    engine.new_game();
    engine.set_hash_mb(2);
    let params = GoParams {
        depth: Some(2),
        ..GoParams::default()
    };
    engine
        .start_search(&Board::default(), &[], params.clone(), Box::new(BestMoveSink::default()))
        .unwrap();
    engine.new_game();
    engine.set_hash_mb(1);
    assert!(engine.wait().unwrap().unwrap().best_move.is_some());
    engine
        .start_search(&Board::default(), &[], params, Box::new(BestMoveSink::default()))
        .unwrap();
    assert!(engine.wait().unwrap().unwrap().best_move.is_some());
    assert_eq!(engine.config().hash_mb, 1);
}
