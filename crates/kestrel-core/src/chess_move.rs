//! Search-side move representation.
//!
//! A [`Move`] is a from/to/promotion triple plus a mutable ordering score.
//! The score is scratch space for move ordering and never takes part in
//! equality or hashing.

use std::fmt;
use std::hash::{Hash, Hasher};

use cozy_chess::{Piece, Square};

// Packed layout (see `Move::pack`).
const FROM_MASK: u16 = 0x003F;
const TO_SHIFT: u32 = 6;
const PROMO_SHIFT: u32 = 12;

/// A chess move with an attached ordering score.
///
/// Castling follows the board crate's convention: the king "captures" its
/// own rook, so a castling move goes from the king square to the rook square.
#[derive(Clone, Copy)]
pub struct Move {
    from: Square,
    to: Square,
    promotion: Option<Piece>,
    score: i32,
}

impl Move {
    /// Null move sentinel (A1→A1). Never a legal move.
    pub const NULL: Move = Move {
        from: Square::A1,
        to: Square::A1,
        promotion: None,
        score: 0,
    };

    /// Create a non-promotion move.
    pub const fn new(from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            promotion: None,
            score: 0,
        }
    }

    /// Create a promotion move.
    pub const fn new_promotion(from: Square, to: Square, piece: Piece) -> Move {
        Move {
            from,
            to,
            promotion: Some(piece),
            score: 0,
        }
    }

    /// Source square.
    pub const fn source(self) -> Square {
        self.from
    }

    /// Destination square.
    pub const fn dest(self) -> Square {
        self.to
    }

    /// Promotion piece, if any.
    pub const fn promotion(self) -> Option<Piece> {
        self.promotion
    }

    /// Ordering score.
    pub const fn score(self) -> i32 {
        self.score
    }

    /// Set the ordering score.
    pub fn set_score(&mut self, score: i32) {
        self.score = score;
    }

    /// Return `true` if this is the null move sentinel.
    pub fn is_null(self) -> bool {
        self.from == self.to
    }

    /// Pack into 16 bits: `from | to << 6 | promotion << 12`.
    ///
    /// The promotion field is 0 for none, otherwise `piece index + 1`.
    pub fn pack(self) -> u16 {
        let promo = self.promotion.map_or(0, |p| p as u16 + 1);
        (self.from as u16) | ((self.to as u16) << TO_SHIFT) | (promo << PROMO_SHIFT)
    }

    /// Inverse of [`pack`](Self::pack). The score is reset to 0.
    pub fn unpack(bits: u16) -> Move {
        let from = Square::ALL[(bits & FROM_MASK) as usize];
        let to = Square::ALL[((bits >> TO_SHIFT) & FROM_MASK) as usize];
        let promotion = match bits >> PROMO_SHIFT {
            0 => None,
            p => Piece::ALL.get(p as usize - 1).copied(),
        };
        Move {
            from,
            to,
            promotion,
            score: 0,
        }
    }
}

impl Default for Move {
    fn default() -> Self {
        Move::NULL
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }
}

impl Eq for Move {}

impl Hash for Move {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        self.to.hash(state);
        self.promotion.hash(state);
    }
}

impl From<cozy_chess::Move> for Move {
    fn from(mv: cozy_chess::Move) -> Self {
        Move {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
            score: 0,
        }
    }
}

impl From<Move> for cozy_chess::Move {
    fn from(mv: Move) -> Self {
        cozy_chess::Move {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
        }
    }
}

fn promotion_char(piece: Piece) -> char {
    match piece {
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::Pawn => 'p',
        Piece::King => 'k',
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "0000");
        }
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", promotion_char(piece))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({} score={})", self, self.score)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use cozy_chess::{Piece, Square};

    use super::Move;

    #[test]
    fn equality_ignores_score() {
        let mut a = Move::new(Square::E2, Square::E4);
        let b = Move::new(Square::E2, Square::E4);
        a.set_score(1234);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b), "hash must not depend on the score");
    }

    #[test]
    fn promotion_distinguishes_moves() {
        let q = Move::new_promotion(Square::A7, Square::A8, Piece::Queen);
        let n = Move::new_promotion(Square::A7, Square::A8, Piece::Knight);
        assert_ne!(q, n);
        assert_ne!(q, Move::new(Square::A7, Square::A8));
    }

    #[test]
    fn pack_preserves_squares_and_promotion() {
        let mv = Move::new_promotion(Square::G2, Square::H1, Piece::Rook);
        let back = Move::unpack(mv.pack());
        assert_eq!(back, mv);
        assert_eq!(back.promotion(), Some(Piece::Rook));

        assert!(Move::unpack(Move::NULL.pack()).is_null());
    }

    #[test]
    fn null_move_displays_as_zeros() {
        assert!(Move::NULL.is_null());
        assert_eq!(Move::NULL.to_string(), "0000");
        assert_eq!(Move::new(Square::E2, Square::E4).to_string(), "e2e4");
        assert_eq!(
            Move::new_promotion(Square::B7, Square::B8, Piece::Queen).to_string(),
            "b7b8q"
        );
    }

    #[test]
    fn converts_to_and_from_board_moves() {
        let raw = cozy_chess::Move {
            from: Square::G1,
            to: Square::F3,
            promotion: None,
        };
        let mv = Move::from(raw);
        assert_eq!(mv.source(), Square::G1);
        assert_eq!(mv.dest(), Square::F3);
        assert_eq!(cozy_chess::Move::from(mv), raw);
    }
}
