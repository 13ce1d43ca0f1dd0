//! The move record: one ply plus whatever analysis has arrived for it.

use analysis::{FeatureTrace, MoveClassification};
use chess::{side_to_move, CaptureTally, GameStage, MoveFacts, PieceColor, PieceKind};
use serde::{Deserialize, Serialize};

pub use analysis_client::MoveId;

/// Which line a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineContext {
    Mainline,
    Pv1,
    Pv2,
    Preview,
}

impl LineContext {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mainline => "mainline",
            Self::Pv1 => "pv1",
            Self::Pv2 => "pv2",
            Self::Preview => "preview",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mainline" => Some(Self::Mainline),
            "pv1" => Some(Self::Pv1),
            "pv2" => Some(Self::Pv2),
            "preview" => Some(Self::Preview),
            _ => None,
        }
    }
}

impl std::fmt::Display for LineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ply, its resulting position, and optional analysis.
///
/// `score` is centipawns from White's point of view whoever moved. A record
/// is never removed on its own; it is overwritten in place when analysis for
/// the same id arrives, or dropped with the whole line it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub id: MoveId,
    /// Index within the owning line.
    pub ply: u32,
    /// Position after the move.
    pub fen: String,
    pub uci: String,
    pub context: LineContext,
    pub is_analyzed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub san: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<GameStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<CaptureTally>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece: Option<PieceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<FeatureTrace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<MoveClassification>,
}

impl MoveRecord {
    pub fn new(
        id: MoveId,
        ply: u32,
        fen: impl Into<String>,
        uci: impl Into<String>,
        context: LineContext,
    ) -> Self {
        Self {
            id,
            ply,
            fen: fen.into(),
            uci: uci.into(),
            context,
            is_analyzed: false,
            san: None,
            score: None,
            phase: None,
            captured: None,
            piece: None,
            trace: None,
            annotation: None,
            classification: None,
        }
    }

    /// A locally played move, described by the ledger that played it.
    pub fn from_facts(
        id: MoveId,
        ply: u32,
        fen_after: impl Into<String>,
        facts: &MoveFacts,
        context: LineContext,
    ) -> Self {
        Self {
            san: Some(facts.san.clone()),
            piece: Some(facts.piece),
            ..Self::new(id, ply, fen_after, facts.uci.clone(), context)
        }
    }

    pub fn with_score(mut self, score: i32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_context(mut self, context: LineContext) -> Self {
        self.context = context;
        self
    }

    pub fn analyzed(mut self) -> Self {
        self.is_analyzed = true;
        self
    }

    /// Side that played this move: the opposite of the side to move in the
    /// resulting position.
    pub fn mover(&self) -> Option<PieceColor> {
        side_to_move(&self.fen).map(PieceColor::opposite)
    }

    /// SAN when known, UCI otherwise.
    pub fn notation(&self) -> &str {
        self.san.as_deref().unwrap_or(&self.uci)
    }
}
