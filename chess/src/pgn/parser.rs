use std::collections::BTreeMap;

use crate::fen::START_FEN;
use crate::ledger::{LedgerError, PositionLedger};
use crate::uci::format_uci_move;

use super::san::parse_san;

/// A parsed PGN game
#[derive(Debug, Clone)]
pub struct PgnGame {
    pub tags: BTreeMap<String, String>,
    pub start_fen: String,
    pub moves: Vec<PgnMove>,
    pub result: GameResult,
}

/// A single mainline move in PGN with metadata
#[derive(Debug, Clone)]
pub struct PgnMove {
    pub uci: String,
    pub san: String,
    pub fen_after: String,
    pub comment: Option<String>,
    pub nags: Vec<u8>, // Numeric Annotation Glyphs (!!, ?, etc.)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    Ongoing,
}

impl GameResult {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "1-0" => Some(Self::WhiteWins),
            "0-1" => Some(Self::BlackWins),
            "1/2-1/2" => Some(Self::Draw),
            "*" => Some(Self::Ongoing),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Ongoing => "*",
        }
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Tag(String, String),
    Move(String),
    Comment(String),
    Nag(u8),
    Result(GameResult),
}

/// Parse a single-game PGN string. Side variations are skipped; only the
/// mainline is returned.
pub fn parse_pgn(input: &str) -> Result<PgnGame, PgnError> {
    let tokens = tokenize(input)?;

    let mut tags = BTreeMap::new();
    for token in &tokens {
        if let Token::Tag(key, value) = token {
            tags.insert(key.clone(), value.clone());
        }
    }

    let start_fen = tags
        .get("FEN")
        .cloned()
        .unwrap_or_else(|| START_FEN.to_string());
    let mut position = PositionLedger::load(&start_fen)?;

    let mut moves: Vec<PgnMove> = Vec::new();
    let mut result = GameResult::Ongoing;

    for token in tokens {
        match token {
            Token::Tag(..) => {}
            Token::Move(san) => {
                let mv = parse_san(position.board(), &san)?;
                let uci = format_uci_move(position.board(), mv);
                let (next, facts) = position.play(&uci)?;
                moves.push(PgnMove {
                    uci: facts.uci,
                    san: facts.san,
                    fen_after: next.fen(),
                    comment: None,
                    nags: Vec::new(),
                });
                position = next;
            }
            Token::Comment(text) => {
                if let Some(last) = moves.last_mut() {
                    match last.comment {
                        Some(ref mut existing) => {
                            existing.push(' ');
                            existing.push_str(&text);
                        }
                        None => last.comment = Some(text),
                    }
                }
            }
            Token::Nag(nag) => {
                if let Some(last) = moves.last_mut() {
                    last.nags.push(nag);
                }
            }
            Token::Result(r) => result = r,
        }
    }

    Ok(PgnGame {
        tags,
        start_fen,
        moves,
        result,
    })
}

fn tokenize(input: &str) -> Result<Vec<Token>, PgnError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut variation_depth = 0usize;

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' => {
                chars.next();
                let line: String = chars.by_ref().take_while(|&ch| ch != ']').collect();
                if variation_depth == 0 {
                    tokens.push(parse_tag(&line)?);
                }
            }
            '{' => {
                chars.next();
                let text: String = chars.by_ref().take_while(|&ch| ch != '}').collect();
                if variation_depth == 0 {
                    tokens.push(Token::Comment(text.trim().to_string()));
                }
            }
            ';' => {
                let _: String = chars.by_ref().take_while(|&ch| ch != '\n').collect();
            }
            '(' => {
                chars.next();
                variation_depth += 1;
            }
            ')' => {
                chars.next();
                variation_depth = variation_depth
                    .checked_sub(1)
                    .ok_or(PgnError::InvalidFormat)?;
            }
            _ => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || matches!(ch, '{' | '(' | ')' | ';' | '[') {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                if variation_depth == 0 {
                    if let Some(token) = classify_word(&word)? {
                        tokens.push(token);
                    }
                }
            }
        }
    }

    if variation_depth != 0 {
        return Err(PgnError::InvalidFormat);
    }
    Ok(tokens)
}

fn parse_tag(line: &str) -> Result<Token, PgnError> {
    let line = line.trim();
    let (key, rest) = line
        .split_once(char::is_whitespace)
        .ok_or_else(|| PgnError::InvalidTag(line.to_string()))?;
    let value = rest.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or_else(|| PgnError::InvalidTag(line.to_string()))?;
    Ok(Token::Tag(key.to_string(), value.replace("\\\"", "\"")))
}

fn classify_word(word: &str) -> Result<Option<Token>, PgnError> {
    if let Some(result) = GameResult::parse(word) {
        return Ok(Some(Token::Result(result)));
    }
    if let Some(nag) = word.strip_prefix('$') {
        let value = nag
            .parse()
            .map_err(|_| PgnError::InvalidToken(word.to_string()))?;
        return Ok(Some(Token::Nag(value)));
    }

    if word.starts_with("0-0") || word.starts_with("O-O") {
        return Ok(Some(Token::Move(word.to_string())));
    }

    // Strip a leading move number ("12." / "12..." / "12...e5").
    let san = word.trim_start_matches(|c: char| c.is_ascii_digit());
    let san = if san.len() != word.len() {
        san.trim_start_matches('.')
    } else {
        word
    };
    if san.is_empty() {
        return Ok(None);
    }
    Ok(Some(Token::Move(san.to_string())))
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("Invalid PGN format")]
    InvalidFormat,
    #[error("Invalid tag: {0}")]
    InvalidTag(String),
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("SAN parse error: {0}")]
    SanError(#[from] super::san::SanError),
    #[error("Position error: {0}")]
    Position(#[from] LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[Event "Casual"]
[White "Alice"]
[Black "Bob"]
[Result "1-0"]

1. e4 e5 2. Nf3 {develops} Nc6 (2... d6 3. d4) 3. Bb5 $1 a6 1-0"#;

    #[test]
    fn parses_tags_moves_and_result() {
        let game = parse_pgn(SAMPLE).unwrap();
        assert_eq!(game.tags.get("White").map(String::as_str), Some("Alice"));
        assert_eq!(game.result, GameResult::WhiteWins);

        let ucis: Vec<&str> = game.moves.iter().map(|m| m.uci.as_str()).collect();
        assert_eq!(ucis, ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6"]);
        assert_eq!(game.moves[2].comment.as_deref(), Some("develops"));
        assert_eq!(game.moves[4].nags, vec![1]);
    }

    #[test]
    fn variations_are_skipped() {
        let game = parse_pgn(SAMPLE).unwrap();
        assert!(game.moves.iter().all(|m| m.san != "d6"));
    }

    #[test]
    fn starts_from_fen_tag() {
        let pgn = r#"[FEN "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"]

1. e4 *"#;
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.start_fen, "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        assert_eq!(game.moves.len(), 1);
        assert_eq!(game.result, GameResult::Ongoing);
    }

    #[test]
    fn illegal_move_fails() {
        assert!(matches!(
            parse_pgn("1. e5 *"),
            Err(PgnError::SanError(_))
        ));
    }

    #[test]
    fn unbalanced_variation_fails() {
        assert!(matches!(parse_pgn("1. e4 (1. d4 *"), Err(PgnError::InvalidFormat)));
    }
}
