//! Material counting.
//!
//! [`material`] feeds the evaluator; [`MaterialCount`] gives the search
//! per-side totals for null-move, delta-pruning and weak-play decisions.

use cozy_chess::{Board, Color, Piece};

use crate::eval::score::{S, Score};
use crate::params::Parameters;

/// Bonus for owning two or more bishops.
const BISHOP_PAIR_BONUS: Score = S(50, 60);

/// Material of one side, kings excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterialCount {
    /// Total value of all pieces and pawns.
    pub total: i32,
    /// Value of the pawns alone.
    pub pawns: i32,
}

impl MaterialCount {
    /// Count the material of `color`.
    pub fn of(board: &Board, color: Color, params: &Parameters) -> Self {
        let mut total = 0;
        for piece in [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
            total += board.colored_pieces(color, piece).len() as i32 * params.piece_value(piece);
        }
        let pawns = board.colored_pieces(color, Piece::Pawn).len() as i32 * params.pawn_value;
        Self { total, pawns }
    }

    /// Value of everything but pawns.
    #[inline]
    pub fn non_pawn(self) -> i32 {
        self.total - self.pawns
    }
}

/// Material balance from White's perspective, with bishop-pair bonus.
pub fn material(board: &Board, params: &Parameters) -> Score {
    let mut score = Score::ZERO;
    for piece in [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        let white = board.colored_pieces(Color::White, piece).len() as i32;
        let black = board.colored_pieces(Color::Black, piece).len() as i32;
        let value = params.piece_value(piece);
        score += S(value * (white - black), value * (white - black));
    }

    if board.colored_pieces(Color::White, Piece::Bishop).len() >= 2 {
        score += BISHOP_PAIR_BONUS;
    }
    if board.colored_pieces(Color::Black, Piece::Bishop).len() >= 2 {
        score -= BISHOP_PAIR_BONUS;
    }
    score
}
