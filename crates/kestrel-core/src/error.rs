//! Errors raised when turning external text into board state.

/// Errors from parsing positions and moves at the engine boundary.
#[derive(Debug, thiserror::Error)]
pub enum PositionError {
    /// The FEN string was rejected by the board parser.
    #[error("invalid FEN \"{fen}\": {reason}")]
    InvalidFen {
        /// The FEN string that failed to parse.
        fen: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// A move string is not in coordinate notation.
    #[error("invalid move text: {text}")]
    InvalidMove {
        /// The move string that failed to parse.
        text: String,
    },

    /// A well-formed move that is not legal in the position.
    #[error("illegal move {text} in position {fen}")]
    IllegalMove {
        /// The move string.
        text: String,
        /// FEN of the position the move was applied to.
        fen: String,
    },
}
