//! Opening book: exact position → opening name.
//!
//! Positions are keyed by [`chess::position_key`], so the same position
//! reached at a different move number still matches.

use std::collections::HashMap;
use std::path::Path;

use chess::{position_key, LedgerError, PositionLedger};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opening {
    pub eco: String,
    pub name: String,
}

/// One entry of a JSON book file. Either `fen` or `moves` (space separated
/// UCI from the starting position) identifies the position.
#[derive(Debug, Deserialize)]
struct BookEntry {
    eco: String,
    name: String,
    #[serde(default)]
    fen: Option<String>,
    #[serde(default)]
    moves: Option<String>,
}

const BUILTIN_LINES: &[(&str, &str, &str)] = &[
    ("B00", "King's Pawn Opening", "e2e4"),
    ("D00", "Queen's Pawn Opening", "d2d4"),
    ("A10", "English Opening", "c2c4"),
    ("A04", "Reti Opening", "g1f3"),
    ("C20", "King's Pawn Game", "e2e4 e7e5"),
    ("C30", "King's Gambit", "e2e4 e7e5 f2f4"),
    ("C42", "Petrov's Defence", "e2e4 e7e5 g1f3 g8f6"),
    ("C44", "Scotch Game", "e2e4 e7e5 g1f3 b8c6 d2d4"),
    ("C50", "Italian Game", "e2e4 e7e5 g1f3 b8c6 f1c4"),
    ("C60", "Ruy Lopez", "e2e4 e7e5 g1f3 b8c6 f1b5"),
    ("B20", "Sicilian Defence", "e2e4 c7c5"),
    ("C00", "French Defence", "e2e4 e7e6"),
    ("B10", "Caro-Kann Defence", "e2e4 c7c6"),
    ("B01", "Scandinavian Defence", "e2e4 d7d5"),
    ("B07", "Pirc Defence", "e2e4 d7d6 d2d4 g8f6"),
    ("D06", "Queen's Gambit", "d2d4 d7d5 c2c4"),
    ("D20", "Queen's Gambit Accepted", "d2d4 d7d5 c2c4 d5c4"),
    ("D30", "Queen's Gambit Declined", "d2d4 d7d5 c2c4 e7e6"),
    ("D10", "Slav Defence", "d2d4 d7d5 c2c4 c7c6"),
    ("D02", "London System", "d2d4 d7d5 c1f4"),
    ("E60", "King's Indian Defence", "d2d4 g8f6 c2c4 g7g6"),
    ("E20", "Nimzo-Indian Defence", "d2d4 g8f6 c2c4 e7e6 b1c3 f8b4"),
    ("A80", "Dutch Defence", "d2d4 f7f5"),
];

#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    entries: HashMap<String, Opening>,
}

impl OpeningBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Book of common openings shipped with the crate.
    pub fn builtin() -> Self {
        let mut book = Self::new();
        for (eco, name, moves) in BUILTIN_LINES {
            if let Ok(fen) = fen_after_line(moves) {
                book.insert(
                    &fen,
                    Opening {
                        eco: eco.to_string(),
                        name: name.to_string(),
                    },
                );
            }
        }
        book
    }

    /// Parse a JSON array of `{eco, name, fen | moves}` entries.
    pub fn from_json(json: &str) -> Result<Self, BookError> {
        let raw: Vec<BookEntry> = serde_json::from_str(json)?;
        let mut book = Self::new();
        for entry in raw {
            let fen = match (entry.fen, entry.moves) {
                (Some(fen), _) => fen,
                (None, Some(moves)) => {
                    fen_after_line(&moves).map_err(|source| BookError::InvalidLine {
                        name: entry.name.clone(),
                        source,
                    })?
                }
                (None, None) => return Err(BookError::MissingPosition(entry.name)),
            };
            book.insert(
                &fen,
                Opening {
                    eco: entry.eco,
                    name: entry.name,
                },
            );
        }
        Ok(book)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Later entries win over earlier ones for the same position.
    pub fn insert(&mut self, fen: &str, opening: Opening) {
        self.entries.insert(position_key(fen), opening);
    }

    pub fn extend(&mut self, other: OpeningBook) {
        self.entries.extend(other.entries);
    }

    pub fn lookup(&self, fen: &str) -> Option<&Opening> {
        self.entries.get(&position_key(fen))
    }

    /// The last book position along a sequence of FENs, i.e. the deepest
    /// opening name the game reached.
    pub fn identify<'a>(&self, fens: impl IntoIterator<Item = &'a str>) -> Option<&Opening> {
        fens.into_iter().filter_map(|fen| self.lookup(fen)).last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn fen_after_line(moves: &str) -> Result<String, LedgerError> {
    let mut position = PositionLedger::starting();
    for uci in moves.split_whitespace() {
        let (next, _) = position.play(uci)?;
        position = next;
    }
    Ok(position.fen())
}

#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("Failed to read opening book: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed opening book: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Opening '{0}' has neither a fen nor a move list")]
    MissingPosition(String),
    #[error("Opening '{name}' has an unplayable move list: {source}")]
    InvalidLine {
        name: String,
        #[source]
        source: LedgerError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fen_of(moves: &str) -> String {
        fen_after_line(moves).unwrap()
    }

    #[test]
    fn builtin_knows_every_line() {
        let book = OpeningBook::builtin();
        assert_eq!(book.len(), BUILTIN_LINES.len());

        let ruy = book.lookup(&fen_of("e2e4 e7e5 g1f3 b8c6 f1b5")).unwrap();
        assert_eq!(ruy.name, "Ruy Lopez");
        assert_eq!(ruy.eco, "C60");
    }

    #[test]
    fn lookup_ignores_move_counters() {
        let book = OpeningBook::builtin();
        let fen = fen_of("e2e4 c7c5");
        let mut fields: Vec<&str> = fen.split_whitespace().collect();
        fields[5] = "40";
        let moved_on = fields.join(" ");
        assert_eq!(book.lookup(&moved_on).unwrap().name, "Sicilian Defence");
    }

    #[test]
    fn unknown_position_is_none() {
        let book = OpeningBook::builtin();
        assert!(book.lookup(&fen_of("a2a3 h7h6")).is_none());
    }

    #[test]
    fn identify_returns_deepest_match() {
        let book = OpeningBook::builtin();
        let line = ["e2e4", "e2e4 e7e5", "e2e4 e7e5 g1f3", "e2e4 e7e5 g1f3 b8c6 f1c4"];
        let fens: Vec<String> = line.iter().map(|m| fen_of(m)).collect();
        let opening = book.identify(fens.iter().map(String::as_str)).unwrap();
        assert_eq!(opening.name, "Italian Game");
    }

    #[test]
    fn loads_json_with_fen_or_moves() {
        let json = format!(
            r#"[
                {{"eco": "B12", "name": "Caro-Kann Advance", "moves": "e2e4 c7c6 d2d4 d7d5 e4e5"}},
                {{"eco": "X00", "name": "Start", "fen": "{}"}}
            ]"#,
            chess::START_FEN
        );
        let book = OpeningBook::from_json(&json).unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(book.lookup(chess::START_FEN).unwrap().eco, "X00");
        assert_eq!(
            book.lookup(&fen_of("e2e4 c7c6 d2d4 d7d5 e4e5")).unwrap().name,
            "Caro-Kann Advance"
        );
    }

    #[test]
    fn rejects_bad_entries() {
        let missing = r#"[{"eco": "A00", "name": "Nowhere"}]"#;
        assert!(matches!(
            OpeningBook::from_json(missing),
            Err(BookError::MissingPosition(name)) if name == "Nowhere"
        ));

        let illegal = r#"[{"eco": "A00", "name": "Bad", "moves": "e2e5"}]"#;
        assert!(matches!(
            OpeningBook::from_json(illegal),
            Err(BookError::InvalidLine { .. })
        ));

        assert!(matches!(
            OpeningBook::from_json("{not json"),
            Err(BookError::Json(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"eco": "A00", "name": "Polish", "moves": "b2b4"}}]"#).unwrap();

        let book = OpeningBook::load(file.path()).unwrap();
        assert_eq!(book.lookup(&fen_of("b2b4")).unwrap().name, "Polish");

        let missing = OpeningBook::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(BookError::Io(_))));
    }
}
