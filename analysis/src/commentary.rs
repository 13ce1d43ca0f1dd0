//! Text commentary for a single move.
//!
//! Pure: everything the generator reads comes in through [`CommentaryInput`]
//! and it returns an ordered list of fragments for the caller to join or
//! reveal one at a time.

use chess::{format_pawns, mover_delta, MoveFacts, PieceColor};

use crate::classify::MoveClassification;
use crate::features::FeatureDelta;
use crate::openings::Opening;

#[derive(Debug, Clone, Copy)]
pub struct CommentaryInput<'a> {
    /// The move as shown to the user (SAN when known, else UCI).
    pub notation: &'a str,
    pub mover: PieceColor,
    pub classification: Option<MoveClassification>,
    /// White-perspective evaluation before and after the move.
    pub score_before: Option<i32>,
    pub score_after: Option<i32>,
    /// Engine's preferred move from the same position, if it differs.
    pub best_alternative: Option<&'a str>,
    pub opening: Option<&'a Opening>,
    pub feature_deltas: &'a [FeatureDelta],
    pub facts: Option<&'a MoveFacts>,
}

impl<'a> CommentaryInput<'a> {
    pub fn new(notation: &'a str, mover: PieceColor) -> Self {
        Self {
            notation,
            mover,
            classification: None,
            score_before: None,
            score_after: None,
            best_alternative: None,
            opening: None,
            feature_deltas: &[],
            facts: None,
        }
    }
}

pub fn generate_commentary(input: &CommentaryInput<'_>) -> Vec<String> {
    let mut fragments = Vec::new();

    if let Some(opening) = input.opening {
        fragments.push(format!("Book position: {} ({}).", opening.name, opening.eco));
    }

    if let Some(verdict) = input.classification {
        if let Some(text) = verdict_fragment(input, verdict) {
            fragments.push(text);
        }
        if verdict.is_error() {
            if let Some(alt) = input.best_alternative.filter(|alt| *alt != input.notation) {
                fragments.push(format!("Better was {alt}."));
            }
        }
    }

    if let Some(facts) = input.facts {
        fragments.extend(tactical_fragment(input, facts));
    }

    for delta in input.feature_deltas {
        let verb = if delta.improved() { "Improves" } else { "Weakens" };
        fragments.push(format!("{verb} {}.", delta.label()));
    }

    if let Some(after) = input.score_after {
        fragments.push(format!("Evaluation: {}.", format_pawns(after)));
    }

    fragments
}

fn verdict_fragment(input: &CommentaryInput<'_>, verdict: MoveClassification) -> Option<String> {
    let mv = input.notation;
    let swing = match (input.score_before, input.score_after) {
        (Some(before), Some(after)) => Some(mover_delta(before, after, input.mover)),
        _ => None,
    };
    let lost = |kind: &str| match swing {
        Some(delta) => format!("{mv} is {kind}, giving up {:.2} pawns.", -delta as f64 / 100.0),
        None => format!("{mv} is {kind}."),
    };

    match verdict {
        MoveClassification::Great => Some(format!("{mv} is a great find, clearly the best move.")),
        MoveClassification::Good => Some(format!("{mv} is the strongest option here.")),
        MoveClassification::Neutral => None,
        MoveClassification::Inaccuracy => Some(lost("an inaccuracy")),
        MoveClassification::Mistake => Some(lost("a mistake")),
        MoveClassification::Blunder => Some(lost("a blunder")),
    }
}

fn tactical_fragment(input: &CommentaryInput<'_>, facts: &MoveFacts) -> Option<String> {
    let side = match input.mover {
        PieceColor::White => "White",
        PieceColor::Black => "Black",
    };
    if facts.is_checkmate {
        return Some(format!("{side} delivers checkmate."));
    }
    if facts.is_castle {
        return Some(format!("{side} castles."));
    }
    if let Some(promoted) = facts.promotion {
        return Some(format!("The pawn promotes to a {}.", promoted.name()));
    }
    let check = if facts.gives_check { " with check" } else { "" };
    match facts.captured {
        Some(taken) => Some(format!("{side} captures a {}{check}.", taken.name())),
        None if facts.gives_check => Some(format!("{side} gives check.")),
        None => None,
    }
}
