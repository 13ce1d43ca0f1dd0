use chess::{mover_delta, relative_to, PieceColor};
use serde::{Deserialize, Serialize};

/// Score swing (mover's view) at or below which a move is a blunder.
pub const BLUNDER_THRESHOLD: i32 = -100;
pub const MISTAKE_THRESHOLD: i32 = -50;
pub const INACCURACY_THRESHOLD: i32 = -20;

/// Margin over the second-best sibling needed for a best move to count as great.
pub const GREAT_MARGIN: i32 = 80;
pub const GOOD_MARGIN: i32 = 30;

/// Verdict on a single mainline move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveClassification {
    /// Only good move by a wide margin.
    Great,
    /// Best available with a clear edge over the runner-up.
    Good,
    Neutral,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl MoveClassification {
    /// Classify from the mover-relative swing alone. Returns `None` when the
    /// move didn't lose enough to be flagged and needs a sibling comparison.
    pub fn from_delta(delta: i32) -> Option<Self> {
        match delta {
            d if d <= BLUNDER_THRESHOLD => Some(Self::Blunder),
            d if d <= MISTAKE_THRESHOLD => Some(Self::Mistake),
            d if d <= INACCURACY_THRESHOLD => Some(Self::Inaccuracy),
            _ => None,
        }
    }

    /// Classify a best-available move by its margin over the second best.
    pub fn from_margin(margin: i32) -> Self {
        match margin {
            m if m >= GREAT_MARGIN => Self::Great,
            m if m >= GOOD_MARGIN => Self::Good,
            _ => Self::Neutral,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Great => "great",
            Self::Good => "good",
            Self::Neutral => "neutral",
            Self::Inaccuracy => "inaccuracy",
            Self::Mistake => "mistake",
            Self::Blunder => "blunder",
        }
    }

    /// Suffix used when printing the move, PGN style.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Great => "!!",
            Self::Good => "!",
            Self::Neutral => "",
            Self::Inaccuracy => "?!",
            Self::Mistake => "?",
            Self::Blunder => "??",
        }
    }

    /// NAG (Numeric Annotation Glyph) for PGN export.
    pub fn to_nag(self) -> Option<u8> {
        match self {
            Self::Great => Some(3),      // !!
            Self::Good => Some(1),       // !
            Self::Neutral => None,
            Self::Inaccuracy => Some(6), // ?!
            Self::Mistake => Some(2),    // ?
            Self::Blunder => Some(4),    // ??
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, Self::Inaccuracy | Self::Mistake | Self::Blunder)
    }
}

impl std::fmt::Display for MoveClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the move that took the evaluation from `before` to `after`.
///
/// Both scores are White-perspective centipawns. `alternatives` are the
/// scores of the sibling continuations from the same position (the first
/// moves of the engine's PVs there). The played move is "best available"
/// when nothing in `alternatives` beats it for the mover; ties count as best.
pub fn classify_move(
    before: i32,
    after: i32,
    mover: PieceColor,
    alternatives: &[i32],
) -> MoveClassification {
    let delta = mover_delta(before, after, mover);
    if let Some(verdict) = MoveClassification::from_delta(delta) {
        return verdict;
    }

    // Rank everything from the mover's side so "higher is better" holds for
    // both colours.
    let mut ranked: Vec<i32> = std::iter::once(after)
        .chain(alternatives.iter().copied())
        .map(|score| relative_to(score, mover))
        .collect();
    ranked.sort_unstable_by(|a, b| b.cmp(a));

    let played = relative_to(after, mover);
    match ranked.as_slice() {
        [best, second, ..] if played >= *best => MoveClassification::from_margin(best - second),
        _ => MoveClassification::Neutral,
    }
}
