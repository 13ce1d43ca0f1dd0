use std::collections::BTreeMap;

use analysis_client::InitialAnalysis;
use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::ReviewCommand;
use super::events::ReviewEvent;
use super::snapshot::ReviewSnapshot;
use crate::error::ReviewError;
use crate::navigation::PlayOutcome;
use crate::record::{MoveId, MoveRecord};

/// Cheap, cloneable handle to a review actor.
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<ReviewCommand>,
}

impl SessionHandle {
    pub(crate) fn new(cmd_tx: mpsc::Sender<ReviewCommand>) -> Self {
        Self { cmd_tx }
    }

    pub async fn connect(&self, session_id: impl Into<String>) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::Connect {
            session_id: session_id.into(),
            reply: tx,
        })
        .await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))?
    }

    pub async fn disconnect(&self) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::Disconnect { reply: tx }).await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn go_to_move(&self, index: usize) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::GoToMove { index, reply: tx }).await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn move_next(&self) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::MoveNext { reply: tx }).await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn move_prev(&self) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::MovePrev { reply: tx }).await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn go_to_first(&self) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::GoToFirst { reply: tx }).await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn go_to_last(&self) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::GoToLast { reply: tx }).await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn enter_preview(&self, from: Option<usize>) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::EnterPreview { from, reply: tx })
            .await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn enter_preview_with_move(
        &self,
        record: MoveRecord,
    ) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::EnterPreviewWithMove { record, reply: tx })
            .await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn enter_preview_with_pv_sequence(
        &self,
        sequence: Vec<MoveRecord>,
    ) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::EnterPreviewWithPvSequence {
            sequence,
            reply: tx,
        })
        .await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn add_preview_move(&self, record: MoveRecord) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::AddPreviewMove { record, reply: tx })
            .await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn add_pv_sequence_to_preview(
        &self,
        sequence: Vec<MoveRecord>,
        anchor_index: usize,
    ) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::AddPvSequenceToPreview {
            sequence,
            anchor_index,
            reply: tx,
        })
        .await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn exit_preview(&self) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::ExitPreview { reply: tx }).await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn play_move(
        &self,
        uci: impl Into<String>,
    ) -> Result<(PlayOutcome, ReviewSnapshot), ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::PlayMove {
            uci: uci.into(),
            reply: tx,
        })
        .await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))?
    }

    pub async fn request_full_analysis(&self) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::RequestFullAnalysis { reply: tx })
            .await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))?
    }

    pub async fn load_initial(&self, initial: InitialAnalysis) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::LoadInitial { initial, reply: tx })
            .await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))?
    }

    pub async fn load_local(
        &self,
        records: Vec<MoveRecord>,
        headers: BTreeMap<String, String>,
    ) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::LoadLocal {
            records,
            headers,
            reply: tx,
        })
        .await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn allocate_id(&self) -> Result<MoveId, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::AllocateId { reply: tx }).await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn get_snapshot(&self) -> Result<ReviewSnapshot, ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::GetSnapshot { reply: tx }).await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn subscribe(
        &self,
    ) -> Result<(ReviewSnapshot, broadcast::Receiver<ReviewEvent>), ReviewError> {
        let (tx, rx) = oneshot::channel();
        self.send(ReviewCommand::Subscribe { reply: tx }).await?;
        rx.await
            .map_err(|_| ReviewError::Internal("Reply dropped".into()))
    }

    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(ReviewCommand::Shutdown).await;
    }

    async fn send(&self, cmd: ReviewCommand) -> Result<(), ReviewError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| ReviewError::Internal("Review actor closed".into()))
    }
}
