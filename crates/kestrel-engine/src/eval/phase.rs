//! Game phase from remaining non-pawn material.

use cozy_chess::{Board, Piece};

/// Phase of a full starting complement of minor and major pieces.
///
/// Weights: Knight=1, Bishop=1, Rook=2, Queen=4.
pub const MAX_PHASE: i32 = 24;

/// Game phase in `0..=MAX_PHASE`; promotions cannot push it above the maximum.
pub fn game_phase(board: &Board) -> i32 {
    let count = |piece| board.pieces(piece).len() as i32;
    let phase = count(Piece::Knight)
        + count(Piece::Bishop)
        + 2 * count(Piece::Rook)
        + 4 * count(Piece::Queen);
    phase.min(MAX_PHASE)
}

#[cfg(test)]
mod tests {
    use cozy_chess::Board;

    use super::{MAX_PHASE, game_phase};

    #[test]
    fn starting_position_is_max_phase() {
        assert_eq!(game_phase(&Board::default()), MAX_PHASE);
    }

    #[test]
    fn bare_kings_is_zero_phase() {
        let board = Board::from_fen("8/8/4k3/8/8/4K3/8/8 w - - 0 1", false).unwrap();
        assert_eq!(game_phase(&board), 0);
    }

    #[test]
    fn missing_one_queen_is_20() {
        let board =
            Board::from_fen("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", false)
                .unwrap();
        assert_eq!(game_phase(&board), 20);
    }
}
