//! Wire types exchanged with the analysis backend.
//!
//! Every frame is one JSON object on its own line, tagged by `type`.
//! Move payloads are deliberately loose (every field optional) so that a
//! frame with a missing field still decodes and the receiver can report
//! exactly what was missing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

pub type MoveId = u64;

/// Client → backend requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    Join {
        session_id: String,
    },
    GetSessionMetadata,
    GetMoveList,
    GetDetailedAnalysis {
        move_id: MoveId,
        fen: String,
        uci: String,
        context: String,
    },
    GetFullGameAnalysis,
}

impl ClientRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::GetSessionMetadata => "get_session_metadata",
            Self::GetMoveList => "get_move_list",
            Self::GetDetailedAnalysis { .. } => "get_detailed_analysis",
            Self::GetFullGameAnalysis => "get_full_game_analysis",
        }
    }
}

/// Backend → client pushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Error {
        message: String,
    },
    SessionMetadata {
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
    MoveList {
        moves: Vec<WireMove>,
    },
    AnalysisUpdate {
        #[serde(rename = "move")]
        record: WireMove,
        #[serde(default)]
        pv1: Option<Vec<WireMove>>,
        #[serde(default)]
        pv2: Option<Vec<WireMove>>,
    },
    AnalysisProgress {
        percentage: f64,
    },
    FullAnalysisComplete {
        moves: Vec<WireMove>,
        /// PVs keyed by the decimal id of the move they follow.
        #[serde(default)]
        pvs: BTreeMap<String, WirePvPair>,
    },
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Error { .. } => "error",
            Self::SessionMetadata { .. } => "session_metadata",
            Self::MoveList { .. } => "move_list",
            Self::AnalysisUpdate { .. } => "analysis_update",
            Self::AnalysisProgress { .. } => "analysis_progress",
            Self::FullAnalysisComplete { .. } => "full_analysis_complete",
        }
    }
}

/// A move as the backend sends it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireMove {
    pub id: Option<MoveId>,
    /// Parent move in the game tree; `-1` for a root move.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<i64>,
    pub ply: Option<u32>,
    pub fen: Option<String>,
    #[serde(alias = "move")]
    pub uci: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub san: Option<String>,
    pub context: Option<String>,
    pub is_analyzed: bool,
    pub score: Option<i32>,
    pub phase: Option<String>,
    pub captured: Option<WireCaptures>,
    pub piece: Option<String>,
    pub trace: Option<BTreeMap<String, WireFeature>>,
    pub annotation: Option<String>,
}

/// Pieces taken by each side, keyed by piece name ("pawn", "knight", ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireCaptures {
    pub white: BTreeMap<String, u8>,
    pub black: BTreeMap<String, u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireFeature {
    pub mg: f64,
    pub eg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WirePvPair {
    pub pv1: Vec<WireMove>,
    pub pv2: Vec<WireMove>,
}

/// Body of the HTTP game submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitGame {
    pub pgn: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// What the backend returns for a submitted game, before any session exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialAnalysis {
    pub session_id: Option<String>,
    pub moves: Vec<WireMove>,
    /// Every known move with its parent link, mainline and variations.
    pub tree: Vec<WireMove>,
    pub metadata: BTreeMap<String, String>,
}

/// Encode a request as one newline-terminated JSON line.
pub fn encode_request(request: &ClientRequest) -> ClientResult<String> {
    let mut line = serde_json::to_string(request).map_err(ClientError::Encode)?;
    line.push('\n');
    Ok(line)
}

/// Decode one inbound line. Blank lines are keep-alives and yield `None`.
pub fn decode_message(line: &str) -> ClientResult<Option<ServerMessage>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| ClientError::Protocol(e.to_string()))
}
