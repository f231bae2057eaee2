//! Tunable engine parameters.
//!
//! A [`Parameters`] value is built explicitly and owned by the engine; the
//! evaluator and searcher read it by reference. Nothing here is global.

use cozy_chess::Piece;

use crate::error::ParamError;

/// Name and inclusive range of every settable parameter.
///
/// | Name               | Default | Range       |
/// |--------------------|---------|-------------|
/// | `PawnValue`        | 100     | 50..=200    |
/// | `KnightValue`      | 325     | 200..=600   |
/// | `BishopValue`      | 330     | 200..=600   |
/// | `RookValue`        | 500     | 300..=800   |
/// | `QueenValue`       | 975     | 700..=1400  |
/// | `RazorMargin`      | 250     | 0..=1000    |
/// | `FutilityMargin1`  | 61      | 0..=1000    |
/// | `FutilityMargin2`  | 144     | 0..=1000    |
/// | `FutilityMargin3`  | 268     | 0..=1000    |
/// | `FutilityMargin4`  | 334     | 0..=1000    |
/// | `DeltaMargin`      | 200     | 0..=1000    |
/// | `AspirationDelta`  | 20      | 5..=200     |
pub const PARAMETER_RANGES: [(&str, i32, i32); 12] = [
    ("PawnValue", 50, 200),
    ("KnightValue", 200, 600),
    ("BishopValue", 200, 600),
    ("RookValue", 300, 800),
    ("QueenValue", 700, 1400),
    ("RazorMargin", 0, 1000),
    ("FutilityMargin1", 0, 1000),
    ("FutilityMargin2", 0, 1000),
    ("FutilityMargin3", 0, 1000),
    ("FutilityMargin4", 0, 1000),
    ("DeltaMargin", 0, 1000),
    ("AspirationDelta", 5, 200),
];

/// Value of a king for exchange and material purposes. Not tunable.
pub const KING_VALUE: i32 = 9900;

/// Engine tunables: piece values and search margins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    /// Pawn value in centipawns.
    pub pawn_value: i32,
    /// Knight value.
    pub knight_value: i32,
    /// Bishop value.
    pub bishop_value: i32,
    /// Rook value.
    pub rook_value: i32,
    /// Queen value.
    pub queen_value: i32,
    /// Razoring margin below beta.
    pub razor_margin: i32,
    /// Futility margins for remaining depth of 1, 2, 3 and 4 plies.
    pub futility_margins: [i32; 4],
    /// Quiescence delta-pruning margin.
    pub delta_margin: i32,
    /// Half-width of the root aspiration window.
    pub aspiration_delta: i32,
}

impl Parameters {
    /// Create the default parameter set.
    pub fn new() -> Self {
        Self {
            pawn_value: 100,
            knight_value: 325,
            bishop_value: 330,
            rook_value: 500,
            queen_value: 975,
            razor_margin: 250,
            futility_margins: [61, 144, 268, 334],
            delta_margin: 200,
            aspiration_delta: 20,
        }
    }

    /// Material value of a piece. The king is worth [`KING_VALUE`].
    #[inline]
    pub fn piece_value(&self, piece: Piece) -> i32 {
        match piece {
            Piece::Pawn => self.pawn_value,
            Piece::Knight => self.knight_value,
            Piece::Bishop => self.bishop_value,
            Piece::Rook => self.rook_value,
            Piece::Queen => self.queen_value,
            Piece::King => KING_VALUE,
        }
    }

    /// Read a parameter by name.
    pub fn get(&self, name: &str) -> Option<i32> {
        let value = match name {
            "PawnValue" => self.pawn_value,
            "KnightValue" => self.knight_value,
            "BishopValue" => self.bishop_value,
            "RookValue" => self.rook_value,
            "QueenValue" => self.queen_value,
            "RazorMargin" => self.razor_margin,
            "FutilityMargin1" => self.futility_margins[0],
            "FutilityMargin2" => self.futility_margins[1],
            "FutilityMargin3" => self.futility_margins[2],
            "FutilityMargin4" => self.futility_margins[3],
            "DeltaMargin" => self.delta_margin,
            "AspirationDelta" => self.aspiration_delta,
            _ => return None,
        };
        Some(value)
    }

    /// Set a parameter by name, validating its range.
    pub fn set(&mut self, name: &str, value: i32) -> Result<(), ParamError> {
        let &(canonical, min, max) = PARAMETER_RANGES
            .iter()
            .find(|(n, _, _)| n.eq_ignore_ascii_case(name))
            .ok_or_else(|| ParamError::Unknown {
                name: name.to_string(),
            })?;
        if !(min..=max).contains(&value) {
            return Err(ParamError::OutOfRange {
                name: canonical,
                value,
                min,
                max,
            });
        }

        let slot = match canonical {
            "PawnValue" => &mut self.pawn_value,
            "KnightValue" => &mut self.knight_value,
            "BishopValue" => &mut self.bishop_value,
            "RookValue" => &mut self.rook_value,
            "QueenValue" => &mut self.queen_value,
            "RazorMargin" => &mut self.razor_margin,
            "FutilityMargin1" => &mut self.futility_margins[0],
            "FutilityMargin2" => &mut self.futility_margins[1],
            "FutilityMargin3" => &mut self.futility_margins[2],
            "FutilityMargin4" => &mut self.futility_margins[3],
            "DeltaMargin" => &mut self.delta_margin,
            _ => &mut self.aspiration_delta,
        };
        *slot = value;
        Ok(())
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}
