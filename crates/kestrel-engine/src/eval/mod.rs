//! Static evaluation: tapered material plus piece-square tables.

pub mod material;
pub mod phase;
pub mod pst;
pub mod score;

use cozy_chess::{Board, Color, Piece};

use crate::params::Parameters;

use material::material;
use phase::game_phase;
use pst::pst_value;
use score::Score;

/// Small bonus for having the move.
const TEMPO: i32 = 10;

/// Static evaluator owning its parameter set.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    params: Parameters,
}

impl Evaluator {
    /// Create an evaluator over the given parameters.
    pub fn new(params: Parameters) -> Self {
        Self { params }
    }

    /// Parameters used by this evaluator.
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Mutable access for tuning between searches.
    pub fn params_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    /// Evaluate `board` from the side to move's perspective, in centipawns.
    pub fn evaluate(&self, board: &Board) -> i32 {
        let mut score = material(board, &self.params);
        for color in [Color::White, Color::Black] {
            let mut side = Score::ZERO;
            for piece in Piece::ALL {
                for sq in board.colored_pieces(color, piece) {
                    side += pst_value(piece, color, sq);
                }
            }
            match color {
                Color::White => score += side,
                Color::Black => score -= side,
            }
        }

        let white_relative = score.taper(game_phase(board));
        match board.side_to_move() {
            Color::White => white_relative + TEMPO,
            Color::Black => -white_relative + TEMPO,
        }
    }
}

#[cfg(test)]
mod tests {
    use cozy_chess::Board;

    use super::*;

    #[test]
    fn starting_position_is_tempo_only() {
        let eval = Evaluator::default();
        assert_eq!(eval.evaluate(&Board::default()), TEMPO);
    }

    #[test]
    fn evaluation_is_side_to_move_relative() {
        let eval = Evaluator::default();
        let white = Board::from_fen("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1", false).unwrap();
        let black = Board::from_fen("4k3/8/8/8/8/8/8/Q3K3 b - - 0 1", false).unwrap();
        assert!(eval.evaluate(&white) > 800);
        assert!(eval.evaluate(&black) < -800);
    }

    #[test]
    fn parameters_change_the_score() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", false).unwrap();
        let mut eval = Evaluator::default();
        let before = eval.evaluate(&board);
        eval.params_mut().rook_value += 100;
        assert_eq!(eval.evaluate(&board), before + 100);
    }
}
