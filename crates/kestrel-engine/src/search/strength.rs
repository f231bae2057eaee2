//! Reduced playing strength by skipping moves during search.
//!
//! A weakened search pretends not to see some moves. The chance of
//! overlooking a move grows with the effective ply and shrinks with
//! strength; "easy" moves are overlooked less often. The decision is a
//! pure function of the position, the move and the seed.

use cozy_chess::{Board, Color, Square};
use kestrel_core::{Move, is_capture};

use crate::eval::material::MaterialCount;
use crate::params::Parameters;

/// Full strength; no move is ever skipped.
pub const MAX_STRENGTH: u32 = 1000;

/// Strength setting for weakened play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strength {
    level: u32,
    seed: u64,
}

impl Strength {
    /// Create a strength setting. `level` is clamped to `0..=1000`.
    pub fn new(level: u32, seed: u64) -> Self {
        Self {
            level: level.min(MAX_STRENGTH),
            seed,
        }
    }

    /// Strength level in `0..=1000`.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Return `true` if some moves may be skipped.
    pub fn is_weak(&self) -> bool {
        self.level < MAX_STRENGTH
    }

    /// Decide whether the search should overlook `mv` at `ply`.
    ///
    /// `own_last_to` is the destination of the previous move by the same
    /// side (two plies up), if any.
    pub fn skip_move(
        &self,
        board: &Board,
        mv: Move,
        ply: usize,
        own_last_to: Option<Square>,
        params: &Parameters,
    ) -> bool {
        let bits = board.hash() ^ square_key(mv.source()) ^ square_key(mv.dest()).rotate_left(17) ^ self.seed;
        let rnd = ((bits & 0x7fff_ffff_ffff_ffff) % 1_000_000_000) as f64 / 1e9;

        let s = self.level as f64 * 1e-3;
        let offs = 4.0 - 15.0 * s;
        let material = MaterialCount::of(board, Color::White, params).total
            + MaterialCount::of(board, Color::Black, params).total;
        let eff_ply = ply as f64 * interpolate(material, 0, 30, params.queen_value * 4, 100) as f64 * 1e-2;
        let mut p = 1.0 / (1.0 + (eff_ply + offs).exp());

        let easy = is_capture(board, mv) || ply < 2 || own_last_to == Some(mv.source());
        if easy {
            p = 1.0 - (1.0 - p) * (1.0 - p);
        }
        rnd > p
    }
}

impl Default for Strength {
    fn default() -> Self {
        Self::new(MAX_STRENGTH, 0)
    }
}

/// Per-square mixing constant (splitmix64 finalizer).
fn square_key(sq: Square) -> u64 {
    let mut z = (sq as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Linear interpolation of `x` between `(x1, y1)` and `(x2, y2)`, clamped.
fn interpolate(x: i32, x1: i32, y1: i32, x2: i32, y2: i32) -> i32 {
    if x > x2 {
        y2
    } else if x < x1 {
        y1
    } else {
        (x - x1) * (y2 - y1) / (x2 - x1) + y1
    }
}

#[cfg(test)]
mod tests {
    use kestrel_core::{GenKind, MoveList, generate};

    use super::*;

    fn skipped(strength: Strength, board: &Board, ply: usize) -> usize {
        let mut list = MoveList::new();
        generate(board, GenKind::All, &mut list);
        let params = Parameters::new();
        list.iter()
            .filter(|&&mv| strength.skip_move(board, mv, ply, None, &params))
            .count()
    }

    #[test]
    fn level_is_clamped() {
        assert_eq!(Strength::new(5000, 1).level(), MAX_STRENGTH);
        assert!(!Strength::new(1000, 1).is_weak());
        assert!(Strength::new(999, 1).is_weak());
    }

    #[test]
    fn decisions_are_reproducible() {
        let board = Board::default();
        let weak = Strength::new(100, 42);
        assert_eq!(skipped(weak, &board, 6), skipped(weak, &board, 6));
    }

    #[test]
    fn weaker_play_skips_more_moves_deep_in_the_tree() {
        let board = Board::default();
        let strong = skipped(Strength::new(1000, 7), &board, 8);
        let weak = skipped(Strength::new(0, 7), &board, 8);
        assert!(weak > strong);
        assert!(weak >= 15, "level 0 overlooks nearly every move at ply 8");
    }

    #[test]
    fn interpolation_clamps() {
        assert_eq!(interpolate(-5, 0, 30, 100, 100), 30);
        assert_eq!(interpolate(50, 0, 30, 100, 100), 65);
        assert_eq!(interpolate(500, 0, 30, 100, 100), 100);
    }
}
