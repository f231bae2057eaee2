//! Move generation by kind and the move/board predicates the search needs.
//!
//! The board crate only generates strictly legal moves, so every list
//! produced here is legal and evasions are simply "all moves while in check".

use cozy_chess::{BitBoard, Board, Color, Piece, Rank};

use crate::chess_move::Move;
use crate::move_list::MoveList;

/// Which subset of legal moves to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenKind {
    /// Every legal move.
    All,
    /// Moves out of check. Only meaningful when the side to move is in check.
    Evasions,
    /// Captures (including en passant) and promotions.
    Captures,
    /// Captures, promotions, and quiet moves that give check.
    CapturesAndChecks,
}

/// Fill `list` with the legal moves of the requested kind.
///
/// The list is cleared first. Scores are zero.
pub fn generate(board: &Board, kind: GenKind, list: &mut MoveList) {
    list.clear();
    board.generate_moves(|piece_moves| {
        for raw in piece_moves {
            let mv = Move::from(raw);
            let keep = match kind {
                GenKind::All | GenKind::Evasions => true,
                GenKind::Captures => is_capture(board, mv) || mv.promotion().is_some(),
                GenKind::CapturesAndChecks => {
                    is_capture(board, mv) || mv.promotion().is_some() || gives_check(board, mv)
                }
            };
            if keep {
                list.push(mv);
            }
        }
        false
    });
}

/// Piece standing on the move's source square.
pub fn moved_piece(board: &Board, mv: Move) -> Option<Piece> {
    board.piece_on(mv.source())
}

/// Return `true` if `mv` is an en passant capture.
pub fn is_en_passant(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.source()) == Some(Piece::Pawn)
        && mv.source().file() != mv.dest().file()
        && board.piece_on(mv.dest()).is_none()
}

/// Return `true` if `mv` captures an enemy piece.
///
/// Castling (king onto own rook) is not a capture.
pub fn is_capture(board: &Board, mv: Move) -> bool {
    board.color_on(mv.dest()) == Some(!board.side_to_move()) || is_en_passant(board, mv)
}

/// Piece captured by `mv`, if any. En passant captures a pawn.
pub fn captured_piece(board: &Board, mv: Move) -> Option<Piece> {
    if board.color_on(mv.dest()) == Some(!board.side_to_move()) {
        board.piece_on(mv.dest())
    } else if is_en_passant(board, mv) {
        Some(Piece::Pawn)
    } else {
        None
    }
}

/// Return `true` if playing `mv` puts the opponent in check.
///
/// `mv` must be legal in `board`.
pub fn gives_check(board: &Board, mv: Move) -> bool {
    let mut child = board.clone();
    child.play_unchecked(mv.into());
    !child.checkers().is_empty()
}

/// Return `true` if `mv` pushes a passed pawn to its sixth rank or beyond.
///
/// A pawn is passed when no enemy pawn stands ahead of its destination on
/// the same or an adjacent file.
pub fn is_passed_pawn_push(board: &Board, mv: Move) -> bool {
    if board.piece_on(mv.source()) != Some(Piece::Pawn) {
        return false;
    }
    let us = board.side_to_move();
    let to = mv.dest();
    let rank = to.rank() as usize;
    let relative_rank = match us {
        Color::White => rank,
        Color::Black => 7 - rank,
    };
    if relative_rank < Rank::Sixth as usize {
        return false;
    }
    let file = to.file() as i32;
    let enemy_pawns = board.colored_pieces(!us, Piece::Pawn);
    !enemy_pawns.into_iter().any(|sq| {
        let ahead = match us {
            Color::White => (sq.rank() as usize) > rank,
            Color::Black => (sq.rank() as usize) < rank,
        };
        ahead && (sq.file() as i32 - file).abs() <= 1
    })
}

/// Squares strictly between `a` and `b` on a shared line, empty otherwise.
pub fn squares_between(a: cozy_chess::Square, b: cozy_chess::Square) -> BitBoard {
    cozy_chess::get_between_rays(a, b)
}

#[cfg(test)]
mod tests {
    use cozy_chess::{Board, Square};

    use super::*;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen, false).unwrap()
    }

    #[test]
    fn startpos_has_twenty_moves_and_no_captures() {
        let b = Board::default();
        let mut list = MoveList::new();
        generate(&b, GenKind::All, &mut list);
        assert_eq!(list.len(), 20);
        generate(&b, GenKind::Captures, &mut list);
        assert!(list.is_empty());
    }

    #[test]
    fn captures_include_en_passant() {
        let b = board("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        let mut list = MoveList::new();
        generate(&b, GenKind::Captures, &mut list);
        let ep = Move::new(Square::E5, Square::D6);
        assert!(list.contains(ep), "en passant must be generated as a capture");
        assert!(is_en_passant(&b, ep));
        assert_eq!(captured_piece(&b, ep), Some(Piece::Pawn));
    }

    #[test]
    fn captures_and_checks_adds_quiet_checks() {
        // Rook to e-file gives check to the king on e8.
        let b = board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        let mut list = MoveList::new();
        generate(&b, GenKind::CapturesAndChecks, &mut list);
        assert!(list.contains(Move::new(Square::A1, Square::A8)));
        assert!(list.as_slice().iter().all(|&m| gives_check(&b, m) || is_capture(&b, m)));
    }

    #[test]
    fn castling_is_not_a_capture() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let castle = Move::new(Square::E1, Square::H1);
        assert!(b.is_legal(castle.into()));
        assert!(!is_capture(&b, castle));
        assert_eq!(captured_piece(&b, castle), None);
    }

    #[test]
    fn passed_pawn_push_detection() {
        // White pawn e5->e6 with no black pawns ahead on d/e/f files.
        let b = board("4k3/p7/8/4P3/8/8/8/4K3 w - - 0 1");
        assert!(is_passed_pawn_push(&b, Move::new(Square::E5, Square::E6)));

        // Black pawn on f7 stops it from being passed.
        let b = board("4k3/5p2/8/4P3/8/8/8/4K3 w - - 0 1");
        assert!(!is_passed_pawn_push(&b, Move::new(Square::E5, Square::E6)));

        // Pushes short of the sixth rank never count.
        let b = board("4k3/8/8/8/4P3/8/8/4K3 w - - 0 1");
        assert!(!is_passed_pawn_push(&b, Move::new(Square::E4, Square::E5)));
    }

    #[test]
    fn black_passed_pawn_push_uses_relative_rank() {
        let b = board("4k3/8/8/8/3p4/8/8/4K3 b - - 0 1");
        assert!(is_passed_pawn_push(&b, Move::new(Square::D4, Square::D3)));
    }

    #[test]
    fn squares_between_on_diagonal() {
        let between = squares_between(Square::A1, Square::D4);
        assert!(between.has(Square::B2));
        assert!(between.has(Square::C3));
        assert_eq!(between.len(), 2);
        assert!(squares_between(Square::A1, Square::B3).is_empty());
    }
}
