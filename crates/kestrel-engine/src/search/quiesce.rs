//! Quiescence search: captures, plus checks for the first plies, until the
//! position is quiet.

use cozy_chess::{Board, Color};
use kestrel_core::{GenKind, MoveList, captured_piece, generate, gives_check, is_capture};

use crate::eval::material::MaterialCount;
use crate::params::Parameters;

use super::ordering::{score_mvv_lva, select_best};
use super::see::neg_see;
use super::{MATE0, MAX_PLY, Searcher};

/// Checking moves are tried while the quiescence depth is above this.
const CHECK_DEPTH: i32 = -3;

/// Check detection stops once `depth - 1` falls to this.
const CHECK_DETECT_DEPTH: i32 = -4;

/// Moves ordered by selection before the rest are taken as generated.
const SELECT_LIMIT: usize = 8;

impl Searcher<'_> {
    /// Quiescence search at `ply`; `depth` counts down from 0 in plies.
    ///
    /// Not in check, the static evaluation is a lower bound (stand pat). In
    /// check every evasion is searched and there is no stand pat.
    pub(super) fn quiesce(
        &mut self,
        board: &Board,
        mut alpha: i32,
        beta: i32,
        ply: usize,
        depth: i32,
        in_check: bool,
    ) -> i32 {
        self.q_nodes += 1;
        self.total_nodes += 1;
        if ply >= MAX_PLY - 1 {
            return self.evaluate(board);
        }

        let stand_pat = if in_check {
            -(MATE0 - ply as i32)
        } else if depth == 0 {
            match self.q0_eval {
                Some(e) => e,
                None => {
                    let e = self.evaluate(board);
                    self.q0_eval = Some(e);
                    e
                }
            }
        } else {
            self.evaluate(board)
        };
        if stand_pat >= beta {
            return stand_pat;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let try_checks = depth > CHECK_DEPTH;
        let kind = if in_check {
            GenKind::Evasions
        } else if try_checks {
            GenKind::CapturesAndChecks
        } else {
            GenKind::Captures
        };
        let mut moves = self.stack.take(ply);
        generate(board, kind, &mut moves);
        let best = self.quiesce_moves(board, &mut moves, alpha, beta, ply, depth, in_check, stand_pat);
        self.stack.give_back(ply, moves);
        best
    }

    #[allow(clippy::too_many_arguments)]
    fn quiesce_moves(
        &mut self,
        board: &Board,
        moves: &mut MoveList,
        mut alpha: i32,
        beta: i32,
        ply: usize,
        depth: i32,
        in_check: bool,
        stand_pat: i32,
    ) -> i32 {
        let evaluator = self.evaluator;
        let params = evaluator.params();
        score_mvv_lva(moves, board, params);

        let detect_checks = depth - 1 > CHECK_DETECT_DEPTH;
        let mut best_score = stand_pat;
        for mi in 0..moves.len() {
            if mi < SELECT_LIMIT {
                select_best(moves, mi);
            }
            let mv = moves[mi];
            let mut gives = None;
            if !in_check {
                if !is_capture(board, mv) && mv.promotion().is_none() {
                    let checks = gives_check(board, mv);
                    gives = Some(checks);
                    if !checks || neg_see(board, mv, params) {
                        continue;
                    }
                } else {
                    if neg_see(board, mv, params) {
                        continue;
                    }
                    let capt = captured_piece(board, mv).map_or(0, |p| params.piece_value(p));
                    let prom = mv.promotion().map_or(0, |p| params.piece_value(p));
                    let optimistic = stand_pat + capt + prom + params.delta_margin;
                    if optimistic < alpha && both_sides_keep_material(board, capt, params) {
                        let checks = detect_checks && gives_check(board, mv);
                        gives = Some(checks);
                        if !checks {
                            best_score = best_score.max(optimistic);
                            continue;
                        }
                    }
                }
            }

            let gives = gives.unwrap_or_else(|| detect_checks && gives_check(board, mv));
            let next_in_check = detect_checks && gives;

            let mut child = board.clone();
            child.play_unchecked(mv.into());
            let score = -self.quiesce(&child, -beta, -alpha, ply + 1, depth - 1, next_in_check);
            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        return alpha;
                    }
                }
            }
        }
        best_score
    }
}

/// Both sides keep pawns and more non-pawn material than `capt`.
fn both_sides_keep_material(board: &Board, capt: i32, params: &Parameters) -> bool {
    [Color::White, Color::Black].into_iter().all(|color| {
        let m = MaterialCount::of(board, color, params);
        m.pawns > 0 && m.total > capt + m.pawns
    })
}
