//! UCI move notation helpers.
//!
//! Moves travel through the system as plain UCI strings ("e2e4", "e7e8q").
//! cozy-chess encodes castling as king-takes-own-rook ("e1h1"), so every
//! conversion to and from cozy-chess goes through this module.

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

/// Parse a square string like "e2".
pub fn parse_square(s: &str) -> Option<Square> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let file = match bytes[0].to_ascii_lowercase() {
        b @ b'a'..=b'h' => File::index((b - b'a') as usize),
        _ => return None,
    };
    let rank = match bytes[1] {
        b @ b'1'..=b'8' => Rank::index((b - b'1') as usize),
        _ => return None,
    };
    Some(Square::new(file, rank))
}

/// Format a square as "e4".
pub fn format_square(sq: Square) -> String {
    format!("{}{}", file_char(sq.file()), rank_char(sq.rank()))
}

pub fn file_char(file: File) -> char {
    (b'a' + file as u8) as char
}

pub fn rank_char(rank: Rank) -> char {
    (b'1' + rank as u8) as char
}

/// Parse a promotion suffix character.
pub fn parse_promotion(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'n' => Some(Piece::Knight),
        'b' => Some(Piece::Bishop),
        'r' => Some(Piece::Rook),
        'q' => Some(Piece::Queen),
        _ => None,
    }
}

/// Lowercase letter used for a promotion suffix.
pub fn format_piece(piece: Piece) -> char {
    crate::types::PieceKind::from(piece).to_char_lower()
}

/// Whether a string has the shape of a UCI move: 4 or 5 characters,
/// two squares and an optional promotion letter.
pub fn is_uci_shape(uci: &str) -> bool {
    let len = uci.len();
    if !(4..=5).contains(&len) || !uci.is_ascii() {
        return false;
    }
    if parse_square(&uci[0..2]).is_none() || parse_square(&uci[2..4]).is_none() {
        return false;
    }
    match uci[4..].chars().next() {
        Some(c) => parse_promotion(c).is_some(),
        None => true,
    }
}

/// Parse a UCI string into a cozy-chess move for `board`.
///
/// Standard castling notation (e1g1) is rewritten to cozy-chess's king-to-rook
/// form when the king sits on the origin square. The returned move is not
/// checked for legality.
pub fn parse_uci_move(board: &Board, uci: &str) -> Option<Move> {
    if !is_uci_shape(uci) {
        return None;
    }
    let from = parse_square(&uci[0..2])?;
    let to = parse_square(&uci[2..4])?;
    let promotion = uci[4..].chars().next().and_then(parse_promotion);

    let mv = Move {
        from,
        to,
        promotion,
    };

    if board.piece_on(from) == Some(Piece::King) && promotion.is_none() {
        let distance = (from.file() as i8 - to.file() as i8).abs();
        if distance == 2 && from.rank() == to.rank() {
            let rook_file = if to.file() > from.file() {
                File::H
            } else {
                File::A
            };
            return Some(Move {
                from,
                to: Square::new(rook_file, from.rank()),
                promotion: None,
            });
        }
    }

    Some(mv)
}

/// Format a cozy-chess move played on `board` as standard UCI. Castling is
/// written as the king's two-square step.
pub fn format_uci_move(board: &Board, mv: Move) -> String {
    let to = if is_castle(board, mv) {
        let file = if mv.to.file() > mv.from.file() {
            File::G
        } else {
            File::C
        };
        Square::new(file, mv.from.rank())
    } else {
        mv.to
    };

    let mut s = format!("{}{}", format_square(mv.from), format_square(to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

/// cozy-chess castling: the king lands on a square held by its own rook.
pub fn is_castle(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to).is_some()
        && board.color_on(mv.to) == board.color_on(mv.from)
}
