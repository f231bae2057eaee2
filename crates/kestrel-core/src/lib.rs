//! Core chess types for kestrel: search-side moves, move lists, and the
//! move-generation and board queries the search needs on top of `cozy-chess`.

mod chess_move;
mod error;
mod fen;
mod move_list;
mod movegen;

pub use chess_move::Move;
pub use error::PositionError;
pub use fen::{STARTING_FEN, format_uci_move, parse_fen, parse_uci_move, play_uci_moves};
pub use move_list::{MoveList, MoveStack};
pub use movegen::{
    GenKind, captured_piece, generate, gives_check, is_capture, is_en_passant,
    is_passed_pawn_push, moved_piece, squares_between,
};

pub use cozy_chess::{BitBoard, Board, Color, File, Piece, Rank, Square};
