//! Boundary parsing: FEN positions and coordinate-notation moves.

use cozy_chess::{Board, File, Piece, Square};
use tracing::trace;

use crate::chess_move::Move;
use crate::error::PositionError;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a board.
pub fn parse_fen(fen: &str) -> Result<Board, PositionError> {
    Board::from_fen(fen.trim(), false).map_err(|e| PositionError::InvalidFen {
        fen: fen.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Parse a coordinate-notation move (`e2e4`, `e7e8q`) in the context of `board`.
///
/// Standard king-two-squares castling (`e1g1`) is translated to the
/// king-takes-rook form the board uses.
pub fn parse_uci_move(board: &Board, text: &str) -> Result<Move, PositionError> {
    let raw: cozy_chess::Move = text.parse().map_err(|_| PositionError::InvalidMove {
        text: text.to_string(),
    })?;

    let mut mv = Move::from(raw);
    let file_distance = (raw.from.file() as i32 - raw.to.file() as i32).abs();
    if board.piece_on(raw.from) == Some(Piece::King)
        && board.color_on(raw.to).is_none()
        && file_distance == 2
    {
        let rook_file = if raw.to.file() as usize > raw.from.file() as usize {
            File::H
        } else {
            File::A
        };
        mv = Move::new(raw.from, Square::new(rook_file, raw.from.rank()));
    }

    if !board.is_legal(mv.into()) {
        return Err(PositionError::IllegalMove {
            text: text.to_string(),
            fen: format!("{board}"),
        });
    }
    Ok(mv)
}

/// Format `mv` in coordinate notation for output, with castling written as
/// the king's two-square move (`e1g1`). Inverse of [`parse_uci_move`].
pub fn format_uci_move(board: &Board, mv: Move) -> String {
    let (from, to) = (mv.source(), mv.dest());
    if board.piece_on(from) == Some(Piece::King)
        && board.piece_on(to) == Some(Piece::Rook)
        && board.color_on(to) == board.color_on(from)
    {
        let king_file = if to.file() as usize > from.file() as usize {
            File::G
        } else {
            File::C
        };
        return Move::new(from, Square::new(king_file, from.rank())).to_string();
    }
    mv.to_string()
}

/// Apply a sequence of coordinate moves to `board`.
///
/// Returns the final board and the hashes of every position before each
/// move, oldest first, for repetition detection.
pub fn play_uci_moves(board: &Board, moves: &[&str]) -> Result<(Board, Vec<u64>), PositionError> {
    let mut current = board.clone();
    let mut hashes = Vec::with_capacity(moves.len());
    for text in moves {
        let mv = parse_uci_move(&current, text)?;
        trace!(%mv, "applying move");
        hashes.push(current.hash());
        current.play_unchecked(mv.into());
    }
    Ok((current, hashes))
}
