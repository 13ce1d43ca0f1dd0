// Conversion between wire payloads (string-based, every field optional) and
// the typed records the viewer works with.

use std::collections::BTreeMap;

use analysis::{FeatureTrace, FeatureValue};
use analysis_client::{WireCaptures, WireMove};
use chess::{
    is_uci_shape, side_to_move, CaptureTally, GameStage, LedgerError, PgnGame, PieceKind,
    PositionLedger,
};
use tracing::warn;

use crate::record::{LineContext, MoveId, MoveRecord};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("move {id:?} is missing `{field}`")]
    MissingField {
        field: &'static str,
        id: Option<MoveId>,
    },
    #[error("invalid `{field}`: {value}")]
    InvalidField { field: &'static str, value: String },
    #[error("move {ply} of the game does not replay: {source}")]
    Replay {
        ply: usize,
        #[source]
        source: LedgerError,
    },
}

/// Convert one wire move. `id`, `fen` and `uci` are required; optional
/// fields that don't parse are dropped with a warning rather than failing
/// the whole record.
pub fn record_from_wire(
    wire: &WireMove,
    default_context: LineContext,
    default_ply: u32,
) -> Result<MoveRecord, ConvertError> {
    let id = wire.id.ok_or(ConvertError::MissingField {
        field: "id",
        id: None,
    })?;
    // The top id is kept free so there is always one above any seen id.
    if id == MoveId::MAX {
        return Err(ConvertError::InvalidField {
            field: "id",
            value: id.to_string(),
        });
    }
    let fen = wire.fen.as_deref().ok_or(ConvertError::MissingField {
        field: "fen",
        id: Some(id),
    })?;
    if side_to_move(fen).is_none() {
        return Err(ConvertError::InvalidField {
            field: "fen",
            value: fen.to_string(),
        });
    }
    let uci = wire.uci.as_deref().ok_or(ConvertError::MissingField {
        field: "uci",
        id: Some(id),
    })?;
    if !is_uci_shape(uci) {
        return Err(ConvertError::InvalidField {
            field: "uci",
            value: uci.to_string(),
        });
    }

    let context = match wire.context.as_deref() {
        None => default_context,
        Some(raw) => LineContext::parse(raw).unwrap_or_else(|| {
            warn!(id, context = raw, "Unknown line context, using {}", default_context);
            default_context
        }),
    };

    let mut record = MoveRecord::new(id, wire.ply.unwrap_or(default_ply), fen, uci, context);
    record.is_analyzed = wire.is_analyzed;
    record.san = wire.san.clone();
    record.score = wire.score;
    record.annotation = wire.annotation.clone();
    record.phase = wire.phase.as_deref().and_then(|raw| {
        let phase = GameStage::parse(raw);
        if phase.is_none() {
            warn!(id, phase = raw, "Ignoring unknown game phase");
        }
        phase
    });
    record.piece = wire.piece.as_deref().and_then(|raw| {
        let piece = PieceKind::from_name(raw);
        if piece.is_none() {
            warn!(id, piece = raw, "Ignoring unknown piece");
        }
        piece
    });
    record.captured = wire.captured.as_ref().map(tally_from_wire);
    record.trace = wire.trace.as_ref().map(|trace| {
        trace
            .iter()
            .map(|(name, f)| (name.clone(), FeatureValue::new(f.mg, f.eg)))
            .collect::<FeatureTrace>()
    });
    Ok(record)
}

/// Convert a line of wire moves; `ply` defaults to the position in the line.
pub fn records_from_wire(
    wires: &[WireMove],
    default_context: LineContext,
) -> Result<Vec<MoveRecord>, ConvertError> {
    wires
        .iter()
        .enumerate()
        .map(|(i, wire)| record_from_wire(wire, default_context, i as u32))
        .collect()
}

/// Convert a PV, forcing its context so records stay tagged with the line
/// they were stored in even if the backend omitted it.
pub fn pv_from_wire(wires: &[WireMove], context: LineContext) -> Result<Vec<MoveRecord>, ConvertError> {
    let mut records = records_from_wire(wires, context)?;
    for record in &mut records {
        record.context = context;
    }
    Ok(records)
}

fn tally_from_wire(wire: &WireCaptures) -> CaptureTally {
    fn side(map: &BTreeMap<String, u8>) -> BTreeMap<PieceKind, u8> {
        map.iter()
            .filter_map(|(name, count)| match PieceKind::from_name(name) {
                Some(kind) => Some((kind, *count)),
                None => {
                    warn!(piece = %name, "Ignoring unknown captured piece");
                    None
                }
            })
            .collect()
    }
    CaptureTally {
        by_white: side(&wire.white),
        by_black: side(&wire.black),
    }
}

/// Unanalysed mainline records for a parsed game, ids counting up from
/// `first_id`. Each record carries SAN, moved piece, phase and the running
/// capture tally from a replay of the game.
pub fn records_from_pgn(game: &PgnGame, first_id: MoveId) -> Result<Vec<MoveRecord>, ConvertError> {
    let origin = PositionLedger::load(&game.start_fen)
        .map_err(|source| ConvertError::Replay { ply: 0, source })?;
    let mut ledger = origin.clone();
    let mut records = Vec::with_capacity(game.moves.len());

    for (ply, mv) in game.moves.iter().enumerate() {
        let (next, facts) = ledger
            .play(&mv.uci)
            .map_err(|source| ConvertError::Replay { ply, source })?;
        let mut record = MoveRecord::from_facts(
            first_id + ply as MoveId,
            ply as u32,
            next.fen(),
            &facts,
            LineContext::Mainline,
        );
        record.phase = Some(next.stage());
        record.captured = Some(next.captured_since(&origin));
        record.annotation = mv.comment.clone();
        records.push(record);
        ledger = next;
    }
    Ok(records)
}
