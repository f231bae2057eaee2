//! Static Exchange Evaluation (SEE).
//!
//! Determines the material outcome of a sequence of captures on a single square,
//! assuming both sides use their least valuable attacker at each step.

use cozy_chess::{
    BitBoard, Board, Color, Piece, Square, get_bishop_moves, get_king_moves, get_knight_moves,
    get_pawn_attacks, get_rook_moves,
};
use kestrel_core::{Move, captured_piece, is_en_passant};

use crate::params::{KING_VALUE, Parameters};

/// Least valuable piece of `side` attacking `sq` with occupancy `occ`.
///
/// Order: pawn, knight, bishop, rook, queen, king. Sliders see through
/// pieces already removed from `occ`.
fn least_valuable_attacker(
    board: &Board,
    sq: Square,
    side: Color,
    occ: BitBoard,
) -> Option<(Square, Piece)> {
    let ours = |piece| board.colored_pieces(side, piece) & occ;

    let pawns = get_pawn_attacks(sq, !side) & ours(Piece::Pawn);
    if let Some(from) = pawns.next_square() {
        return Some((from, Piece::Pawn));
    }
    let knights = get_knight_moves(sq) & ours(Piece::Knight);
    if let Some(from) = knights.next_square() {
        return Some((from, Piece::Knight));
    }
    let diagonal = get_bishop_moves(sq, occ);
    if let Some(from) = (diagonal & ours(Piece::Bishop)).next_square() {
        return Some((from, Piece::Bishop));
    }
    let straight = get_rook_moves(sq, occ);
    if let Some(from) = (straight & ours(Piece::Rook)).next_square() {
        return Some((from, Piece::Rook));
    }
    if let Some(from) = ((diagonal | straight) & ours(Piece::Queen)).next_square() {
        return Some((from, Piece::Queen));
    }
    let kings = get_king_moves(sq) & ours(Piece::King);
    kings.next_square().map(|from| (from, Piece::King))
}

/// Full Static Exchange Evaluation.
///
/// Returns the material gain for the side to move after all profitable
/// recaptures on the destination square. Capturing a king ends the
/// sequence; an en passant victim counts as a pawn.
pub fn see(board: &Board, mv: Move, params: &Parameters) -> i32 {
    let to = mv.dest();
    let us = board.side_to_move();

    let victim = captured_piece(board, mv);
    if victim == Some(Piece::King) {
        return KING_VALUE;
    }

    let mut captures = [0i32; 64];
    captures[0] = victim.map_or(0, |p| params.piece_value(p));
    let mut count = 1;

    let mover = board.piece_on(mv.source()).unwrap_or(Piece::Pawn);
    let mut value_on_square = params.piece_value(mover);

    let mut occ = board.occupied() & !mv.source().bitboard();
    if is_en_passant(board, mv) {
        let victim_sq = Square::new(to.file(), mv.source().rank());
        occ &= !victim_sq.bitboard();
    }

    let mut side = !us;
    while count < captures.len() {
        let Some((from, piece)) = least_valuable_attacker(board, to, side, occ) else {
            break;
        };
        captures[count] = value_on_square;
        count += 1;
        if value_on_square == KING_VALUE {
            break;
        }
        value_on_square = params.piece_value(piece);
        occ &= !from.bitboard();
        side = !side;
    }

    // Each side may stop capturing when continuing would lose material.
    let mut score = 0;
    for i in (1..count).rev() {
        score = (captures[i] - score).max(0);
    }
    captures[0] - score
}

/// Sign of [`see`], skipping the exchange when the victim outvalues the attacker.
pub fn sign_see(board: &Board, mv: Move, params: &Parameters) -> i32 {
    let attacker = board.piece_on(mv.source()).map_or(0, |p| params.piece_value(p));
    let victim = captured_piece(board, mv).map_or(0, |p| params.piece_value(p));
    if attacker < victim {
        return 1;
    }
    see(board, mv, params).signum()
}

/// Return `true` if `mv` loses material, skipping the exchange when the
/// victim is worth at least the attacker.
pub fn neg_see(board: &Board, mv: Move, params: &Parameters) -> bool {
    let attacker = board.piece_on(mv.source()).map_or(0, |p| params.piece_value(p));
    let victim = captured_piece(board, mv).map_or(0, |p| params.piece_value(p));
    if attacker <= victim {
        return false;
    }
    see(board, mv, params) < 0
}
