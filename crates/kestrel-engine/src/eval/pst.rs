//! Piece-square tables.
//!
//! Tables are built once from a few positional shapes (centralisation,
//! pawn advancement, king shelter) rather than hand-typed. Indices are from
//! White's point of view (0 = A1, 63 = H8); Black squares are mirrored.

use std::sync::OnceLock;

use cozy_chess::{Color, Piece, Square};

use crate::eval::score::{S, Score};

static PST: OnceLock<[[Score; 64]; 6]> = OnceLock::new();

/// Distance from the board centre: 0 on d4/e4/d5/e5, 3 on the rim corners.
fn center_distance(file: i32, rank: i32) -> i32 {
    let df = if file < 4 { 3 - file } else { file - 4 };
    let dr = if rank < 4 { 3 - rank } else { rank - 4 };
    df.max(dr)
}

fn entry(piece: Piece, file: i32, rank: i32) -> Score {
    let center = 3 - center_distance(file, rank);
    match piece {
        Piece::Pawn => {
            if rank == 0 || rank == 7 {
                return Score::ZERO;
            }
            let central_file = if (2..=5).contains(&file) { 5 } else { 0 };
            let advance = rank - 1;
            S(advance * 5 + central_file * (rank.min(4) - 1), advance * advance * 4)
        }
        Piece::Knight => S(center * 12 - 20, center * 10 - 15),
        Piece::Bishop => S(center * 6 - 5, center * 5 - 5),
        Piece::Rook => {
            let seventh = if rank == 6 { 20 } else { 0 };
            let central_file = if (2..=5).contains(&file) { 5 } else { 0 };
            S(seventh + central_file, seventh / 2)
        }
        Piece::Queen => S(center * 3, center * 6),
        Piece::King => {
            let shelter = match rank {
                0 => 10,
                1 => -10,
                _ => -30,
            };
            let wing = if file <= 2 || file >= 6 { 15 } else { 0 };
            S(shelter + wing, center * 15 - 20)
        }
    }
}

fn tables() -> &'static [[Score; 64]; 6] {
    PST.get_or_init(|| {
        let mut t = [[Score::ZERO; 64]; 6];
        for (p, piece) in Piece::ALL.into_iter().enumerate() {
            for sq in 0..64 {
                t[p][sq] = entry(piece, (sq % 8) as i32, (sq / 8) as i32);
            }
        }
        t
    })
}

/// Positional value of `piece` of `color` on `sq`, from that side's view.
#[inline]
pub fn pst_value(piece: Piece, color: Color, sq: Square) -> Score {
    let idx = match color {
        Color::White => sq as usize,
        Color::Black => sq as usize ^ 56,
    };
    tables()[piece as usize][idx]
}
