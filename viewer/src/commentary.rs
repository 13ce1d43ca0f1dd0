//! Commentary for a move in context: pulls the pieces the generator needs
//! out of the surrounding line.

use analysis::{generate_commentary, top_feature_deltas, CommentaryInput, OpeningBook};
use chess::PositionLedger;

use crate::record::MoveRecord;

/// Commentary fragments for `line[index]`, in display order. `best` is the
/// engine's first choice from the same position (the head of the PV stored
/// next to the move); it is only mentioned when it differs from the move
/// played. Empty when `index` is out of range.
pub fn commentary_for(
    line: &[MoveRecord],
    index: usize,
    best: Option<&MoveRecord>,
    start_fen: &str,
    book: &OpeningBook,
) -> Vec<String> {
    let Some(record) = line.get(index) else {
        return Vec::new();
    };
    let previous = index.checked_sub(1).and_then(|i| line.get(i));
    let before_fen = previous.map_or(start_fen, |p| p.fen.as_str());

    let ledger = PositionLedger::load(before_fen).ok();
    let facts = ledger
        .as_ref()
        .and_then(|l| l.play(&record.uci).ok())
        .map(|(_, facts)| facts);
    let Some(mover) = record.mover().or(facts.as_ref().map(|f| f.mover)) else {
        return Vec::new();
    };

    let notation = record
        .san
        .clone()
        .or_else(|| facts.as_ref().map(|f| f.san.clone()))
        .unwrap_or_else(|| record.uci.clone());

    let best_notation = best.filter(|alt| alt.uci != record.uci).map(|alt| {
        alt.san
            .clone()
            .or_else(|| ledger.as_ref().and_then(|l| l.san(&alt.uci)))
            .unwrap_or_else(|| alt.uci.clone())
    });

    let stage = record
        .phase
        .or_else(|| ledger.as_ref().map(PositionLedger::stage));
    let deltas = match (previous.and_then(|p| p.trace.as_ref()), record.trace.as_ref(), stage) {
        (Some(before), Some(after), Some(stage)) => top_feature_deltas(before, after, mover, stage),
        _ => Default::default(),
    };

    let input = CommentaryInput {
        classification: record.classification,
        score_before: previous.and_then(|p| p.score),
        score_after: record.score,
        best_alternative: best_notation.as_deref(),
        opening: book.lookup(&record.fen),
        feature_deltas: &deltas,
        facts: facts.as_ref(),
        ..CommentaryInput::new(&notation, mover)
    };
    generate_commentary(&input)
}
