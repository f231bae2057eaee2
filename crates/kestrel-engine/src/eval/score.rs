//! Middlegame/endgame score pair used throughout evaluation.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use super::phase::MAX_PHASE;

/// A pair of middlegame and endgame values, blended by game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    /// Middlegame component.
    pub mg: i32,
    /// Endgame component.
    pub eg: i32,
}

/// Shorthand constructor for a [`Score`].
#[allow(non_snake_case)]
#[inline]
pub const fn S(mg: i32, eg: i32) -> Score {
    Score { mg, eg }
}

impl Score {
    /// Zero score.
    pub const ZERO: Score = S(0, 0);

    /// Blend the two components for a phase in `0..=MAX_PHASE`
    /// (`MAX_PHASE` = pure middlegame, 0 = pure endgame).
    #[inline]
    pub fn taper(self, phase: i32) -> i32 {
        let phase = phase.clamp(0, MAX_PHASE);
        (self.mg * phase + self.eg * (MAX_PHASE - phase)) / MAX_PHASE
    }
}

impl Add for Score {
    type Output = Score;

    #[inline]
    fn add(self, rhs: Score) -> Score {
        S(self.mg + rhs.mg, self.eg + rhs.eg)
    }
}

impl AddAssign for Score {
    #[inline]
    fn add_assign(&mut self, rhs: Score) {
        self.mg += rhs.mg;
        self.eg += rhs.eg;
    }
}

impl Sub for Score {
    type Output = Score;

    #[inline]
    fn sub(self, rhs: Score) -> Score {
        S(self.mg - rhs.mg, self.eg - rhs.eg)
    }
}

impl SubAssign for Score {
    #[inline]
    fn sub_assign(&mut self, rhs: Score) {
        self.mg -= rhs.mg;
        self.eg -= rhs.eg;
    }
}

impl Neg for Score {
    type Output = Score;

    #[inline]
    fn neg(self) -> Score {
        S(-self.mg, -self.eg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taper_endpoints() {
        let s = S(100, -40);
        assert_eq!(s.taper(MAX_PHASE), 100);
        assert_eq!(s.taper(0), -40);
        assert_eq!(s.taper(MAX_PHASE / 2), 30);
    }

    #[test]
    fn arithmetic_is_componentwise() {
        let mut s = S(10, 20) + S(1, 2) - S(3, 4);
        assert_eq!(s, S(8, 18));
        s -= S(8, 18);
        assert_eq!(s, Score::ZERO);
        assert_eq!(-S(5, -6), S(-5, 6));
    }
}
