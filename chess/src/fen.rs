use cozy_chess::Board;

use crate::types::PieceColor;

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a Board
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let fields = fen.split_whitespace().count();
    if fields < 4 {
        return Err(FenError::InvalidFormat);
    }
    fen.trim().parse().map_err(|_| FenError::InvalidBoardLayout)
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

/// The position part of a FEN: placement, side to move, castling rights and
/// en passant square, without the move counters. Two FENs describing the same
/// position reached at different move numbers share this key.
pub fn position_key(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// Side to move read straight from the FEN's second field, without parsing
/// the board.
pub fn side_to_move(fen: &str) -> Option<PieceColor> {
    match fen.split_whitespace().nth(1)? {
        "w" => Some(PieceColor::White),
        "b" => Some(PieceColor::Black),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
    #[error("Invalid board layout")]
    InvalidBoardLayout,
}
