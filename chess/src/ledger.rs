//! Position Ledger: derived facts about a position that is already known to
//! be legal.
//!
//! Legality and move application are delegated to cozy-chess; the ledger only
//! describes what the rules engine produced. The one place a move can be
//! rejected is [`PositionLedger::play`], which is how an illegal local move is
//! stopped before it reaches any move list.

use std::collections::BTreeMap;

use cozy_chess::{BitBoard, Board, GameStatus, Move, Piece};
use serde::{Deserialize, Serialize};

use crate::fen::{format_fen, parse_fen, FenError};
use crate::pgn::san::format_san;
use crate::types::{PieceColor, PieceKind};
use crate::uci::{format_uci_move, is_castle, parse_uci_move};

/// Coarse game phase, decided by how many non-king pieces remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStage {
    #[serde(rename = "early")]
    Early,
    #[serde(rename = "mid")]
    Mid,
    #[serde(rename = "end")]
    End,
}

impl GameStage {
    /// More than 20 non-king pieces is the opening, more than 12 the
    /// middlegame, anything else the endgame.
    pub fn from_piece_count(non_king_pieces: u32) -> Self {
        match non_king_pieces {
            n if n > 20 => Self::Early,
            n if n > 12 => Self::Mid,
            _ => Self::End,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Mid => "mid",
            Self::End => "end",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "early" | "opening" => Some(Self::Early),
            "mid" | "middlegame" => Some(Self::Mid),
            "end" | "endgame" => Some(Self::End),
            _ => None,
        }
    }
}

/// Pieces each side has taken from the other, keyed by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTally {
    pub by_white: BTreeMap<PieceKind, u8>,
    pub by_black: BTreeMap<PieceKind, u8>,
}

impl CaptureTally {
    /// Pieces captured by `side`.
    pub fn by(&self, side: PieceColor) -> &BTreeMap<PieceKind, u8> {
        match side {
            PieceColor::White => &self.by_white,
            PieceColor::Black => &self.by_black,
        }
    }

    /// Material captured by `side` in centipawns.
    pub fn material(&self, side: PieceColor) -> u32 {
        self.by(side)
            .iter()
            .map(|(kind, count)| piece_value(*kind) * u32::from(*count))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_white.is_empty() && self.by_black.is_empty()
    }
}

/// Standard piece values in centipawns.
pub fn piece_value(kind: PieceKind) -> u32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 0,
    }
}

/// What happened on the most recent move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveFacts {
    pub uci: String,
    pub san: String,
    pub piece: PieceKind,
    pub mover: PieceColor,
    pub captured: Option<PieceKind>,
    pub is_castle: bool,
    pub promotion: Option<PieceKind>,
    pub gives_check: bool,
    pub is_checkmate: bool,
}

impl MoveFacts {
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] FenError),
    #[error("malformed move: {0}")]
    MalformedMove(String),
    #[error("illegal move {uci} in {fen}")]
    IllegalMove { uci: String, fen: String },
}

/// Facts about one position, plus the move that led to it when known.
#[derive(Debug, Clone)]
pub struct PositionLedger {
    board: Board,
    last_move: Option<MoveFacts>,
}

impl PositionLedger {
    /// Load a position. Fails only on a syntactically invalid FEN.
    pub fn load(fen: &str) -> Result<Self, LedgerError> {
        let board = parse_fen(fen)?;
        Ok(Self {
            board,
            last_move: None,
        })
    }

    pub fn starting() -> Self {
        Self {
            board: Board::default(),
            last_move: None,
        }
    }

    pub fn fen(&self) -> String {
        format_fen(&self.board)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move.
    pub fn turn(&self) -> PieceColor {
        self.board.side_to_move().into()
    }

    /// Side that made the move leading to this position.
    pub fn mover(&self) -> PieceColor {
        self.turn().opposite()
    }

    pub fn in_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.status() == GameStatus::Won
    }

    pub fn is_stalemate(&self) -> bool {
        !self.in_check() && !self.has_legal_moves()
    }

    /// Stalemate, the fifty-move rule, or insufficient mating material.
    pub fn is_draw(&self) -> bool {
        self.board.status() == GameStatus::Drawn || self.insufficient_material()
    }

    pub fn stage(&self) -> GameStage {
        let non_kings = self.board.occupied() & !self.board.pieces(Piece::King);
        GameStage::from_piece_count(non_kings.len())
    }

    pub fn last_move(&self) -> Option<&MoveFacts> {
        self.last_move.as_ref()
    }

    /// Captured material derived from what is missing against the standard
    /// starting set. See [`PositionLedger::captured_since`].
    pub fn captured(&self) -> CaptureTally {
        self.captured_since(&Self::starting())
    }

    /// Captured material derived from what is missing against `origin`, the
    /// position the game started from. Promoted pieces are charged against
    /// the pawn count so a promotion is not reported as a capture.
    pub fn captured_since(&self, origin: &PositionLedger) -> CaptureTally {
        let missing = |color: cozy_chess::Color| -> BTreeMap<PieceKind, u8> {
            let own = self.board.colors(color);
            let had = origin.board.colors(color);
            let mut promoted_extras: u8 = 0;
            let mut tally = BTreeMap::new();
            for kind in [
                PieceKind::Knight,
                PieceKind::Bishop,
                PieceKind::Rook,
                PieceKind::Queen,
            ] {
                let on_board = count(own & self.board.pieces(kind.into()));
                let start = count(had & origin.board.pieces(kind.into()));
                if on_board > start {
                    promoted_extras += on_board - start;
                } else if on_board < start {
                    tally.insert(kind, start - on_board);
                }
            }
            let pawns = count(own & self.board.pieces(Piece::Pawn));
            let lost_pawns = count(had & origin.board.pieces(Piece::Pawn))
                .saturating_sub(pawns)
                .saturating_sub(promoted_extras);
            if lost_pawns > 0 {
                tally.insert(PieceKind::Pawn, lost_pawns);
            }
            tally
        };

        CaptureTally {
            by_white: missing(cozy_chess::Color::Black),
            by_black: missing(cozy_chess::Color::White),
        }
    }

    /// Apply a UCI move through the rules engine. Returns the resulting
    /// position with its `last_move` filled in; `self` is left untouched.
    pub fn play(&self, uci: &str) -> Result<(PositionLedger, MoveFacts), LedgerError> {
        let mv = parse_uci_move(&self.board, uci)
            .ok_or_else(|| LedgerError::MalformedMove(uci.to_string()))?;
        self.play_move(mv)
    }

    fn play_move(&self, mv: Move) -> Result<(PositionLedger, MoveFacts), LedgerError> {
        let illegal = || LedgerError::IllegalMove {
            uci: format_uci_move(&self.board, mv),
            fen: self.fen(),
        };

        if !self.board.is_legal(mv) {
            return Err(illegal());
        }
        let piece = self.board.piece_on(mv.from).ok_or_else(illegal)?;
        let castle = is_castle(&self.board, mv);
        let captured = if castle {
            None
        } else if let Some(taken) = self.board.piece_on(mv.to) {
            Some(taken)
        } else if piece == Piece::Pawn && mv.from.file() != mv.to.file() {
            // En passant: the destination square is empty.
            Some(Piece::Pawn)
        } else {
            None
        };
        let san = format_san(&self.board, mv);
        let uci = format_uci_move(&self.board, mv);

        let mut next = self.board.clone();
        next.try_play(mv).map_err(|_| illegal())?;

        let facts = MoveFacts {
            uci,
            san,
            piece: piece.into(),
            mover: self.turn(),
            captured: captured.map(PieceKind::from),
            is_castle: castle,
            promotion: mv.promotion.map(PieceKind::from),
            gives_check: !next.checkers().is_empty(),
            is_checkmate: next.status() == GameStatus::Won,
        };

        Ok((
            PositionLedger {
                board: next,
                last_move: Some(facts.clone()),
            },
            facts,
        ))
    }

    /// SAN for a UCI move in this position, if the move is legal.
    pub fn san(&self, uci: &str) -> Option<String> {
        let mv = parse_uci_move(&self.board, uci)?;
        self.board.is_legal(mv).then(|| format_san(&self.board, mv))
    }

    /// All legal moves in UCI notation.
    pub fn legal_moves(&self) -> Vec<String> {
        let mut moves = Vec::new();
        self.board.generate_moves(|mvs| {
            for mv in mvs {
                moves.push(format_uci_move(&self.board, mv));
            }
            false
        });
        moves
    }

    fn has_legal_moves(&self) -> bool {
        self.board.generate_moves(|mvs| !mvs.is_empty())
    }

    fn insufficient_material(&self) -> bool {
        let heavy = self.board.pieces(Piece::Pawn)
            | self.board.pieces(Piece::Rook)
            | self.board.pieces(Piece::Queen);
        if !heavy.is_empty() {
            return false;
        }
        let minors = self.board.pieces(Piece::Knight) | self.board.pieces(Piece::Bishop);
        minors.len() <= 1
    }
}

fn count(bb: BitBoard) -> u8 {
    bb.len() as u8
}
