use std::collections::BTreeMap;

use analysis_client::InitialAnalysis;
use tokio::sync::{broadcast, oneshot};

use super::events::ReviewEvent;
use super::snapshot::ReviewSnapshot;
use crate::error::ReviewError;
use crate::navigation::PlayOutcome;
use crate::record::{MoveId, MoveRecord};

type Reply<T> = oneshot::Sender<T>;

/// Commands sent to the review actor. Each embeds a oneshot for the reply.
pub enum ReviewCommand {
    Connect {
        session_id: String,
        reply: Reply<Result<ReviewSnapshot, ReviewError>>,
    },
    Disconnect {
        reply: Reply<ReviewSnapshot>,
    },
    GoToMove {
        index: usize,
        reply: Reply<ReviewSnapshot>,
    },
    MoveNext {
        reply: Reply<ReviewSnapshot>,
    },
    MovePrev {
        reply: Reply<ReviewSnapshot>,
    },
    GoToFirst {
        reply: Reply<ReviewSnapshot>,
    },
    GoToLast {
        reply: Reply<ReviewSnapshot>,
    },
    EnterPreview {
        from: Option<usize>,
        reply: Reply<ReviewSnapshot>,
    },
    EnterPreviewWithMove {
        record: MoveRecord,
        reply: Reply<ReviewSnapshot>,
    },
    EnterPreviewWithPvSequence {
        sequence: Vec<MoveRecord>,
        reply: Reply<ReviewSnapshot>,
    },
    AddPreviewMove {
        record: MoveRecord,
        reply: Reply<ReviewSnapshot>,
    },
    AddPvSequenceToPreview {
        sequence: Vec<MoveRecord>,
        anchor_index: usize,
        reply: Reply<ReviewSnapshot>,
    },
    ExitPreview {
        reply: Reply<ReviewSnapshot>,
    },
    PlayMove {
        uci: String,
        reply: Reply<Result<(PlayOutcome, ReviewSnapshot), ReviewError>>,
    },
    RequestFullAnalysis {
        reply: Reply<Result<ReviewSnapshot, ReviewError>>,
    },
    LoadInitial {
        initial: InitialAnalysis,
        reply: Reply<Result<ReviewSnapshot, ReviewError>>,
    },
    LoadLocal {
        records: Vec<MoveRecord>,
        headers: BTreeMap<String, String>,
        reply: Reply<ReviewSnapshot>,
    },
    AllocateId {
        reply: Reply<MoveId>,
    },
    GetSnapshot {
        reply: Reply<ReviewSnapshot>,
    },
    Subscribe {
        reply: Reply<(ReviewSnapshot, broadcast::Receiver<ReviewEvent>)>,
    },
    Shutdown,
}
