//! Main search: negascout with null-move pruning, razoring, futility
//! pruning, internal iterative deepening, extensions and late move
//! reductions.

use cozy_chess::{Board, Color, Square};
use kestrel_core::{
    GenKind, Move, MoveList, captured_piece, generate, gives_check, is_capture, is_passed_pawn_push,
    moved_piece, squares_between,
};

use crate::error::Interrupted;
use crate::eval::material::MaterialCount;
use crate::params::Parameters;

use super::draw::{can_claim_draw_50, can_claim_draw_rep};
use super::ordering::{score_move_list, select_best, select_hash_move};
use super::see::see;
use super::tt::Bound;
use super::{MATE0, MAX_PLY, PLY_SCALE, Searcher, bound_for, scored};

/// Node facts the move loop needs besides the window.
struct NodeContext {
    key: u64,
    ply: usize,
    depth: i32,
    in_check: bool,
    recapture: Option<Square>,
    hash_move: Move,
    eval: Option<i32>,
    /// Quiet moves may be replaced by `futility_score`.
    futile: bool,
    futility_score: i32,
}

impl Searcher<'_> {
    /// Search `board` at `ply` with `depth` remaining, in depth units.
    ///
    /// Returns the score for the side to move, or [`Interrupted`] when a
    /// time or node limit has been hit.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn negascout(
        &mut self,
        board: &Board,
        alpha: i32,
        beta: i32,
        ply: usize,
        depth: i32,
        recapture: Option<Square>,
        in_check: bool,
    ) -> Result<i32, Interrupted> {
        self.check_limits()?;
        self.nodes += 1;
        self.total_nodes += 1;
        let key = board.hash();
        let mated = -(MATE0 - ply as i32);

        if can_claim_draw_50(board) {
            if in_check && !has_legal_move(board) {
                return Ok(mated);
            }
            return Ok(0);
        }
        // A mate here would have been found the first time round.
        if can_claim_draw_rep(key, &self.hash_list, self.first_new) {
            return Ok(0);
        }
        if ply >= MAX_PLY - 1 {
            return Ok(self.evaluate(board));
        }

        let mut eval = None;
        let mut hash_move = Move::NULL;
        if let Some(ent) = self.tt.probe(key) {
            let score = ent.score(ply);
            eval = ent.eval();
            let ply_to_mate = MATE0 - score.abs();
            let deep_enough = ent.depth() >= depth || ent.depth() >= ply_to_mate * PLY_SCALE;
            if beta == alpha + 1 && deep_enough && ent.cuts_off(alpha, beta, ply) {
                if score >= beta {
                    let mv = ent.best_move();
                    if !mv.is_null() && !is_capture(board, mv) {
                        self.killers.store(ply, mv);
                    }
                }
                return Ok(score);
            }
            hash_move = ent.best_move();
        }

        let pos_extend = if in_check { PLY_SCALE } else { 0 };

        if depth + pos_extend <= 0 {
            self.q0_eval = eval;
            let score = self.quiesce(board, alpha, beta, ply, 0, in_check);
            self.q_nodes -= 1;
            self.total_nodes -= 1;
            let bound = bound_for(score, alpha, beta);
            self.tt.insert(key, scored(Move::NULL, score), bound, ply, depth, self.q0_eval);
            return Ok(score);
        }

        let evaluator = self.evaluator;
        let params = evaluator.params();

        // Null move.
        self.tree[ply].current_move = Move::NULL;
        if depth >= 3 * PLY_SCALE
            && !in_check
            && self.tree[ply].allow_null_move
            && beta.abs() <= MATE0 / 2
        {
            let us = MaterialCount::of(board, board.side_to_move(), params);
            let null_ok = us.non_pawn() > 0
                && us.pawns > 0
                && *eval.get_or_insert_with(|| evaluator.evaluate(board)) >= beta;
            if let Some(passed) = board.null_move().filter(|_| null_ok) {
                let r = if depth > 6 * PLY_SCALE {
                    4 * PLY_SCALE
                } else {
                    3 * PLY_SCALE
                };
                self.tree[ply + 1].allow_null_move = false;
                self.tree[ply + 1].best_move = Move::NULL;
                let result = self.negascout(&passed, -beta, -(beta - 1), ply + 1, depth - r, None, false);
                self.tree[ply + 1].allow_null_move = true;
                let score = -result?;
                if score >= beta {
                    // Unproven mate claims are not trusted.
                    let score = if score > MATE0 / 2 { beta } else { score };
                    self.tt.insert(key, scored(Move::NULL, score), Bound::Lower, ply, depth, eval);
                    return Ok(score);
                }
                let parent = self.tree[ply.saturating_sub(1)];
                if ply > 0 && parent.lmr > 0 && depth < 5 * PLY_SCALE {
                    if related_moves(parent.current_move, self.tree[ply + 1].best_move) {
                        // The reduced parent move allowed the threat; make it re-search.
                        return Ok(alpha);
                    }
                }
            }
        }

        // Razoring.
        if alpha.abs() <= MATE0 / 2 && depth < 4 * PLY_SCALE && beta == alpha + 1 {
            let e = *eval.get_or_insert_with(|| evaluator.evaluate(board));
            let margin = params.razor_margin;
            if e < beta - margin {
                self.q0_eval = Some(e);
                let score = self.quiesce(board, alpha - margin, beta - margin, ply, 0, in_check);
                self.q_nodes -= 1;
                self.total_nodes -= 1;
                if score <= alpha - margin {
                    self.tt.insert(key, scored(Move::NULL, score), Bound::Upper, ply, depth, eval);
                    return Ok(score);
                }
            }
        }

        // Futility.
        let mut futile = false;
        let mut futility_score = alpha;
        if !in_check && depth < 5 * PLY_SCALE && alpha.abs() <= MATE0 / 2 && beta.abs() <= MATE0 / 2 {
            let idx = match depth {
                d if d <= PLY_SCALE => 0,
                d if d <= 2 * PLY_SCALE => 1,
                d if d <= 3 * PLY_SCALE => 2,
                _ => 3,
            };
            let e = *eval.get_or_insert_with(|| evaluator.evaluate(board));
            futility_score = e + params.futility_margins[idx];
            futile = futility_score <= alpha;
        }

        // Internal iterative deepening.
        if depth > 4 * PLY_SCALE && hash_move.is_null() {
            let is_pv = beta > alpha + 1;
            if is_pv || depth > 8 * PLY_SCALE {
                let new_depth = if is_pv {
                    depth - 2 * PLY_SCALE
                } else {
                    depth * 3 / 8
                };
                self.negascout(board, alpha, beta, ply, new_depth, None, in_check)?;
                if let Some(ent) = self.tt.probe(key) {
                    hash_move = ent.best_move();
                }
            }
        }

        let mut moves = self.stack.take(ply);
        let kind = if in_check { GenKind::Evasions } else { GenKind::All };
        generate(board, kind, &mut moves);
        let node = NodeContext {
            key,
            ply,
            depth,
            in_check,
            recapture,
            hash_move,
            eval,
            futile,
            futility_score,
        };
        let result = self.search_moves(board, &mut moves, alpha, beta, &node);
        self.stack.give_back(ply, moves);
        result
    }

    /// The move loop of [`negascout`](Self::negascout).
    fn search_moves(
        &mut self,
        board: &Board,
        moves: &mut MoveList,
        mut alpha: i32,
        beta: i32,
        node: &NodeContext,
    ) -> Result<i32, Interrupted> {
        let NodeContext { key, ply, depth, in_check, .. } = *node;
        let ply_i = ply as i32;

        if moves.is_empty() {
            if in_check {
                let mated = -(MATE0 - ply_i);
                self.tt.insert(key, scored(Move::NULL, mated), Bound::Exact, ply, depth, node.eval);
                return Ok(mated);
            }
            return Ok(0);
        }

        let evaluator = self.evaluator;
        let params = evaluator.params();
        let pawn = params.pawn_value;
        let pos_extend = if in_check { PLY_SCALE } else { 0 };

        let hash_selected = select_hash_move(moves, node.hash_move);
        let mut scored_rest = false;
        if !hash_selected {
            score_move_list(moves, 0, board, ply, &self.killers, &mut self.history, params);
            scored_rest = true;
        }

        // Never a real score: the child would need to be mated at this ply.
        let skipped_score = -(MATE0 - (ply_i + 1));
        let mut have_legal = false;
        let mut b = beta;
        let mut best_score = skipped_score;
        let mut best_idx = None;
        let mut lmr_count = 0;

        for mi in 0..moves.len() {
            if mi == 1 && !scored_rest {
                score_move_list(moves, 1, board, ply, &self.killers, &mut self.history, params);
                scored_rest = true;
            }
            if mi > 0 || !hash_selected {
                select_best(moves, mi);
            }
            let mv = moves[mi];
            let capture = is_capture(board, mv);
            let promotion = mv.promotion().is_some();
            let may_reduce = mv.score() < 53 && (!capture || mv.score() < 0) && !promotion;
            let gives = gives_check(board, mv);
            let quiet_push = !gives && !is_passed_pawn_push(board, mv);
            let victim = captured_piece(board, mv).map_or(0, |p| params.piece_value(p));

            let mut score;
            if node.futile && may_reduce && have_legal && quiet_push {
                score = node.futility_score;
            } else {
                let mut move_extend = 0;
                if pos_extend == 0 {
                    if node.recapture == Some(mv.dest()) && see(board, mv, params) > victim - pawn / 2 {
                        move_extend = PLY_SCALE;
                    }
                    if move_extend < PLY_SCALE && capture && enters_pawn_endgame(board, victim, params) {
                        move_extend = PLY_SCALE;
                    }
                }
                let extend = pos_extend.max(move_extend);

                let mut lmr = 0;
                if depth >= 3 * PLY_SCALE && may_reduce && extend == 0 && quiet_push {
                    lmr_count += 1;
                    lmr = if lmr_count > 3 && depth > 3 * PLY_SCALE && !capture {
                        2 * PLY_SCALE
                    } else {
                        PLY_SCALE
                    };
                }
                let mut new_depth = depth - PLY_SCALE + extend - lmr;

                // Only equal trades make the next ply a recapture candidate.
                let mut next_recapture = None;
                if capture && (gives || depth + extend > PLY_SCALE) {
                    let attacker = moved_piece(board, mv).map_or(0, |p| params.piece_value(p));
                    if (victim - attacker).abs() < pawn / 2 && see(board, mv, params).abs() < pawn / 2 {
                        next_recapture = Some(mv.dest());
                    }
                }

                let mut child = board.clone();
                child.play_unchecked(mv.into());
                self.tree[ply].current_move = mv;
                self.tree[ply].lmr = lmr;
                score = self.search_child(key, &child, alpha, b, ply + 1, new_depth, next_recapture, gives)?;
                let scout_failed = score > alpha && score < beta && b != beta && score != skipped_score;
                if (lmr > 0 && score > alpha) || scout_failed {
                    self.tree[ply].lmr = 0;
                    new_depth += lmr;
                    score = self.search_child(key, &child, alpha, beta, ply + 1, new_depth, next_recapture, gives)?;
                }
            }

            if self.strength.is_weak() && have_legal {
                let own_last = ply
                    .checked_sub(2)
                    .map(|p| self.tree[p].current_move)
                    .filter(|m| !m.is_null())
                    .map(|m| m.dest());
                if self.strength.skip_move(board, mv, ply, own_last, params) {
                    score = skipped_score;
                }
            }
            moves[mi].set_score(score);

            if score != skipped_score {
                have_legal = true;
            }
            best_score = best_score.max(score);
            if score > alpha {
                alpha = score;
                best_idx = Some(mi);
                self.tree[ply].best_move = mv;
            }
            if alpha >= beta {
                if !capture {
                    self.killers.store(ply, mv);
                    self.history.add_success(board, mv, depth / PLY_SCALE);
                    for &earlier in &moves.as_slice()[..mi] {
                        if !is_capture(board, earlier) {
                            self.history.add_fail(board, earlier, depth / PLY_SCALE);
                        }
                    }
                }
                self.tt.insert(key, moves[mi], Bound::Lower, ply, depth, node.eval);
                return Ok(alpha);
            }
            b = alpha + 1;
        }

        match best_idx {
            Some(i) => self.tt.insert(key, moves[i], Bound::Exact, ply, depth, node.eval),
            None => self.tt.insert(key, scored(Move::NULL, best_score), Bound::Upper, ply, depth, node.eval),
        }
        Ok(best_score)
    }
}

/// Return `true` if `threat` could have been made possible by `reduced`:
/// the threat starts where the reduced move landed, moves to the square it
/// left, or passes through that square.
fn related_moves(reduced: Move, threat: Move) -> bool {
    if reduced.is_null() || threat.is_null() {
        return false;
    }
    reduced.dest() == threat.source()
        || reduced.source() == threat.dest()
        || squares_between(threat.source(), threat.dest()).has(reduced.source())
}

/// Return `true` if the side to move has any legal move.
fn has_legal_move(board: &Board) -> bool {
    let mut list = MoveList::new();
    generate(board, GenKind::All, &mut list);
    !list.is_empty()
}

/// Return `true` if capturing a piece worth `victim` leaves only kings and pawns.
fn enters_pawn_endgame(board: &Board, victim: i32, params: &Parameters) -> bool {
    let white = MaterialCount::of(board, Color::White, params);
    let black = MaterialCount::of(board, Color::Black, params);
    if white.pawns + black.pawns <= params.pawn_value {
        return false;
    }
    let (us, them) = match board.side_to_move() {
        Color::White => (white, black),
        Color::Black => (black, white),
    };
    us.non_pawn() == 0 && them.non_pawn() == victim
}
