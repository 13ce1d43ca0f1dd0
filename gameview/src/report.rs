//! Plain-text rendering of review snapshots.

use std::fmt::Write as _;

use chess::{format_pawns, PieceColor};
use viewer::prelude::*;

/// `12.` after a White move, `12...` after a Black one, read from the
/// resulting position. Falls back to the ply when the FEN is unusable.
pub fn move_number(record: &MoveRecord) -> String {
    let fullmove = record
        .fen
        .split_whitespace()
        .nth(5)
        .and_then(|n| n.parse::<u32>().ok());
    match (record.mover(), fullmove) {
        (Some(PieceColor::White), Some(n)) => format!("{n}."),
        (Some(PieceColor::Black), Some(n)) => format!("{}...", n.saturating_sub(1).max(1)),
        _ => format!("{}.", record.ply + 1),
    }
}

/// One move as a single line: number, notation with its verdict symbol,
/// evaluation, and the verdict itself when it is worth pointing out.
pub fn move_line(record: &MoveRecord) -> String {
    let symbol = record.classification.map_or("", MoveClassification::symbol);
    let mut line = format!("{:>6} {}{}", move_number(record), record.notation(), symbol);
    match record.score {
        Some(score) => {
            let _ = write!(line, "  {}", format_pawns(score));
        }
        None if !record.is_analyzed => line.push_str("  (pending)"),
        None => {}
    }
    if let Some(verdict) = record.classification.filter(|c| c.is_error()) {
        let _ = write!(line, "  [{verdict}]");
    }
    line
}

/// Header block for a snapshot: players, opening, state.
pub fn summary(snapshot: &ReviewSnapshot) -> String {
    let mut out = String::new();
    let white = snapshot.headers.get("White").map_or("?", String::as_str);
    let black = snapshot.headers.get("Black").map_or("?", String::as_str);
    let _ = writeln!(out, "{white} - {black}");
    if let Some(opening) = snapshot.opening() {
        let _ = writeln!(out, "Opening: {} ({})", opening.name, opening.eco);
    }
    let _ = write!(
        out,
        "State: {:?}, {} moves, cursor {}",
        snapshot.state,
        snapshot.moves.len(),
        snapshot.current_move_index
    );
    if snapshot.full_analysis_running {
        let _ = write!(out, ", analysis {:.0}%", snapshot.progress);
    }
    if let Some(error) = &snapshot.ws_error {
        let _ = write!(out, "\nError: {error}");
    }
    out
}

/// Every mainline move, one per line, with engine lines indented under the
/// move they answer.
pub fn game_listing(snapshot: &ReviewSnapshot, with_pvs: bool) -> String {
    let mut out = String::new();
    for (index, slot) in snapshot.moves.slots().iter().enumerate() {
        if with_pvs {
            for pv in [&slot.pv1, &slot.pv2] {
                if let Some(line) = pv_text(pv) {
                    let _ = writeln!(out, "         ({line})");
                }
            }
        }
        let marker = if index == snapshot.current_move_index { ">" } else { " " };
        let _ = writeln!(out, "{marker}{}", move_line(&slot.mainline));
    }
    out
}

fn pv_text(pv: &[MoveRecord]) -> Option<String> {
    let first = pv.first()?;
    let moves: Vec<&str> = pv.iter().map(MoveRecord::notation).collect();
    Some(match first.score {
        Some(score) => format!("{} {}", format_pawns(score), moves.join(" ")),
        None => moves.join(" "),
    })
}
