//! Evaluation helpers.
//!
//! Every score in the system is an integer number of centipawns from White's
//! point of view, whoever moved. These helpers are the only place the sign is
//! flipped for Black.

use crate::types::PieceColor;

/// Re-express a White-perspective score from `side`'s point of view.
pub fn relative_to(score: i32, side: PieceColor) -> i32 {
    score * side.sign()
}

/// How much a move changed the evaluation for the side that played it.
/// Negative means the mover made their position worse.
pub fn mover_delta(before: i32, after: i32, mover: PieceColor) -> i32 {
    relative_to(after - before, mover)
}

/// Format centipawns as a signed pawn value: `+0.35`, `-1.20`.
pub fn format_pawns(cp: i32) -> String {
    format!("{:+.2}", cp as f64 / 100.0)
}
