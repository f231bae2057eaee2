//! Move ordering: capture scoring by victim/attacker and SEE, killer and
//! history scoring for quiet moves, hash-move promotion, and lazy
//! selection of the next best move.

use cozy_chess::Board;
use kestrel_core::{Move, MoveList, captured_piece, is_capture};

use crate::params::Parameters;
use crate::search::heuristics::{History, KillerTable};
use crate::search::see::sign_see;

/// Ordering score given to the hash move.
pub const HASH_MOVE_SCORE: i32 = 10_000;

/// Killer moves score `killer_score + KILLER_BONUS`, above any history score.
pub const KILLER_BONUS: i32 = 50;

/// Score moves `start..` of `list` for the main search.
///
/// Captures and promotions get `((victim/10)*1000 - attacker/10 + bucket) * 100`,
/// where the bucket is +2,000,000 / +1,000,000 / -1,000,000 for a
/// positive / zero / negative SEE sign. Every move then gets its killer
/// bonus, or failing that its history score.
pub fn score_move_list(
    list: &mut MoveList,
    start: usize,
    board: &Board,
    ply: usize,
    killers: &KillerTable,
    history: &mut History,
    params: &Parameters,
) {
    for i in start..list.len() {
        let mv = list[i];
        let mut score = 0;
        if is_capture(board, mv) || mv.promotion().is_some() {
            let victim = captured_piece(board, mv).map_or(0, |p| params.piece_value(p));
            let attacker = board.piece_on(mv.source()).map_or(0, |p| params.piece_value(p));
            score = victim / 10 * 1000 - attacker / 10;
            score += match sign_see(board, mv, params) {
                s if s > 0 => 2_000_000,
                0 => 1_000_000,
                _ => -1_000_000,
            };
            score *= 100;
        }
        let killer = killers.score(ply, mv);
        if killer > 0 {
            score += killer + KILLER_BONUS;
        } else {
            score += history.score(board, mv);
        }
        list[i].set_score(score);
    }
}

/// Score captures for quiescence by most valuable victim, least valuable attacker.
pub fn score_mvv_lva(list: &mut MoveList, board: &Board, params: &Parameters) {
    for i in 0..list.len() {
        let mv = list[i];
        let mut victim = captured_piece(board, mv).map_or(0, |p| params.piece_value(p));
        if let Some(promo) = mv.promotion() {
            victim += params.piece_value(promo) - params.pawn_value;
        }
        let attacker = board.piece_on(mv.source()).map_or(0, |p| params.piece_value(p));
        list[i].set_score(victim * 10_000 - attacker);
    }
}

/// Swap the best-scoring move among `start..` into position `start`.
pub fn select_best(list: &mut MoveList, start: usize) {
    let mut best = start;
    let mut best_score = list[start].score();
    for i in start + 1..list.len() {
        if list[i].score() > best_score {
            best = i;
            best_score = list[i].score();
        }
    }
    if best != start {
        list.swap(start, best);
    }
}

/// Move `hash_move` to the front with [`HASH_MOVE_SCORE`].
///
/// Returns `false` if the move is not in the list.
pub fn select_hash_move(list: &mut MoveList, hash_move: Move) -> bool {
    if hash_move.is_null() {
        return false;
    }
    for i in 0..list.len() {
        if list[i] == hash_move {
            list[i].set_score(HASH_MOVE_SCORE);
            list.swap(0, i);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use cozy_chess::{Board, Square};
    use kestrel_core::{GenKind, generate};

    use super::*;

    fn scored_list(board: &Board, ply: usize, killers: &KillerTable) -> MoveList {
        let mut list = MoveList::new();
        generate(board, GenKind::All, &mut list);
        let mut history = History::new();
        score_move_list(&mut list, 0, board, ply, killers, &mut history, &Parameters::new());
        list
    }

    fn score_of(list: &MoveList, mv: Move) -> i32 {
        list.iter().find(|&&m| m == mv).expect("move present").score()
    }

    #[test]
    fn captures_by_see_bucket_and_killers_above_history() {
        // Nxd4 is an even trade, Qxc5 loses the queen to d6xc5.
        let board = Board::from_fen("4k3/8/3p4/2p5/3n4/Q7/2N5/4K3 w - - 0 1", false).unwrap();
        let mut killers = KillerTable::new();
        let quiet = Move::new(Square::E1, Square::F1);
        killers.store(2, quiet);
        let list = scored_list(&board, 2, &killers);

        let even = score_of(&list, Move::new(Square::C2, Square::D4));
        let bad = score_of(&list, Move::new(Square::A3, Square::C5));
        let killer = score_of(&list, quiet);
        let other = score_of(&list, Move::new(Square::E1, Square::D1));

        assert!(even > killer, "even capture sorts above killers");
        assert!(bad < 0, "losing capture sorts below quiet moves");
        assert_eq!(killer, 4 + KILLER_BONUS);
        assert_eq!(other, 0);
    }

    #[test]
    fn select_best_brings_highest_score_forward() {
        let mut list = MoveList::new();
        for (i, to) in [Square::A3, Square::B3, Square::C3].into_iter().enumerate() {
            let mut mv = Move::new(Square::A2, to);
            mv.set_score([5, 40, 7][i]);
            list.push(mv);
        }
        select_best(&mut list, 0);
        assert_eq!(list[0].dest(), Square::B3);
        select_best(&mut list, 1);
        assert_eq!(list[1].score(), 7);
    }

    #[test]
    fn hash_move_goes_first() {
        let board = Board::default();
        let mut list = MoveList::new();
        generate(&board, GenKind::All, &mut list);
        let hash = Move::new(Square::G1, Square::F3);
        assert!(select_hash_move(&mut list, hash));
        assert_eq!(list[0], hash);
        assert_eq!(list[0].score(), HASH_MOVE_SCORE);

        assert!(!select_hash_move(&mut list, Move::new(Square::E2, Square::E5)));
        assert!(!select_hash_move(&mut list, Move::NULL));
    }

    #[test]
    fn mvv_lva_prefers_big_victims_and_small_attackers() {
        let board = Board::from_fen("4k3/8/8/2q1r3/3P4/8/8/7K w - - 0 1", false).unwrap();
        let mut list = MoveList::new();
        generate(&board, GenKind::Captures, &mut list);
        score_mvv_lva(&mut list, &board, &Parameters::new());
        select_best(&mut list, 0);
        assert_eq!(list[0], Move::new(Square::D4, Square::C5), "pawn takes queen first");
    }
}
