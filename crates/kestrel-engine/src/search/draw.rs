//! Draw claims by the fifty-move rule and by repetition.

use cozy_chess::Board;

/// Return `true` if the fifty-move rule allows a draw claim.
pub fn can_claim_draw_50(board: &Board) -> bool {
    board.halfmove_clock() >= 100
}

/// Return `true` if `hash` repeats often enough to claim a draw.
///
/// `hash_list` holds the hashes of every position before the current one,
/// oldest first, back to the last irreversible move. Entries from
/// `first_new` on were reached inside the current search. Only positions
/// with the same side to move are compared; two earlier occurrences are
/// needed, but one inside the search is enough on its own.
pub fn can_claim_draw_rep(hash: u64, hash_list: &[u64], first_new: usize) -> bool {
    let mut reps = 0;
    let mut i = hash_list.len() as isize - 4;
    while i >= 0 {
        let idx = i as usize;
        if hash_list[idx] == hash {
            reps += 1;
            if idx >= first_new {
                reps += 1;
                break;
            }
        }
        i -= 2;
    }
    reps >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifty_move_threshold() {
        let at_99 = Board::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 99 80", false).unwrap();
        let at_100 = Board::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 100 80", false).unwrap();
        assert!(!can_claim_draw_50(&at_99));
        assert!(can_claim_draw_50(&at_100));
    }

    #[test]
    fn one_occurrence_inside_search_is_enough() {
        // Positions: X a b c [current == X], X reached during the search.
        let x = 0xABCD;
        let list = [x, 1, 2, 3];
        assert!(can_claim_draw_rep(x, &list, 0));
    }

    #[test]
    fn game_history_needs_two_occurrences() {
        let x = 0xABCD;
        let once = [x, 1, 2, 3];
        assert!(!can_claim_draw_rep(x, &once, once.len()));

        let twice = [x, 1, 2, 3, x, 5, 6, 7];
        assert!(can_claim_draw_rep(x, &twice, twice.len()));
    }

    #[test]
    fn other_side_to_move_is_ignored() {
        let x = 0xABCD;
        // Odd distance from the current position: opposite side to move.
        let list = [x, 1, 2, 3, 4];
        assert!(!can_claim_draw_rep(x, &list, 0));
    }

    #[test]
    fn too_recent_entries_are_skipped() {
        let x = 0xABCD;
        assert!(!can_claim_draw_rep(x, &[x, 1], 0));
        assert!(!can_claim_draw_rep(x, &[], 0));
    }
}
