use cozy_chess::{Board, GameStatus, Move, Piece};

use crate::types::PieceKind;
use crate::uci::{file_char, format_square, is_castle, rank_char};

/// Parse Standard Algebraic Notation (SAN) move.
///
/// Matching is done against the SAN of every legal move, so anything
/// `format_san` produces round-trips. Check marks, annotation suffixes and
/// zero-style castling ("0-0") are tolerated.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let wanted = normalize(san);
    if wanted.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let mut found = None;
    let mut ambiguous = false;
    board.generate_moves(|mvs| {
        for mv in mvs {
            if normalize(&format_san(board, mv)) == wanted {
                if found.is_some() {
                    ambiguous = true;
                }
                found = Some(mv);
            }
        }
        false
    });

    match found {
        _ if ambiguous => Err(SanError::AmbiguousMove(san.to_string())),
        Some(mv) => Ok(mv),
        None => Err(SanError::NoLegalMove(san.to_string())),
    }
}

/// Format a legal move as SAN, with disambiguation and check/mate suffix.
pub fn format_san(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        return format!("{}{}", format_square(mv.from), format_square(mv.to));
    };

    let mut san = String::new();
    if is_castle(board, mv) {
        if mv.to.file() > mv.from.file() {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let is_capture = board.color_on(mv.to).is_some()
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

        if piece == Piece::Pawn {
            if is_capture {
                san.push(file_char(mv.from.file()));
            }
        } else {
            san.push(PieceKind::from(piece).to_char_upper());
            san.push_str(&disambiguation(board, mv, piece));
        }

        if is_capture {
            san.push('x');
        }
        san.push_str(&format_square(mv.to));

        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(PieceKind::from(promo).to_char_upper());
        }
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if after.status() == GameStatus::Won {
        san.push('#');
    } else if !after.checkers().is_empty() {
        san.push('+');
    }
    san
}

/// File, rank, or full square needed to tell `mv` apart from other moves of
/// the same piece kind landing on the same square.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let mut rivals = Vec::new();
    board.generate_moves(|mvs| {
        if mvs.piece == piece && mvs.from != mv.from {
            for other in mvs {
                if other.to == mv.to {
                    rivals.push(other.from);
                }
            }
        }
        false
    });

    if rivals.is_empty() {
        return String::new();
    }
    let shares_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());
    match (shares_file, shares_rank) {
        (false, _) => file_char(mv.from.file()).to_string(),
        (true, false) => rank_char(mv.from.rank()).to_string(),
        (true, true) => format_square(mv.from),
    }
}

fn normalize(san: &str) -> String {
    san.trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .replace('0', "O")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}
