//! Review state machine: the mainline, an optional preview branch, the
//! cursor, and the session status, kept consistent while analysis arrives.
//!
//! The navigator never touches the network. Requests are queued in an
//! outbox that the session actor flushes after every handler, and every
//! inbound message goes through [`Navigator::handle_message`]. Mutating
//! operations return whether anything observable changed so the owner knows
//! when to publish a snapshot.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use analysis::OpeningBook;
use analysis_client::{ClientRequest, InitialAnalysis, ServerMessage, WireMove, WirePvPair};
use chess::{PositionLedger, START_FEN};
use tracing::{debug, info, warn};

use crate::converters::{pv_from_wire, record_from_wire, records_from_wire, ConvertError};
use crate::error::ReviewError;
use crate::move_list::{MoveList, PvPair};
use crate::move_tree::MoveTree;
use crate::record::{LineContext, MoveId, MoveRecord};
use crate::session::ReviewSnapshot;

/// Connection lifecycle, independent of preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    Loading,
    Browsing,
    Error,
}

/// What the user is doing, as observers see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Disconnected,
    Loading,
    MainlineBrowsing,
    PreviewBrowsing,
    Error,
}

/// A user-explored line. Preview move `k` stands where mainline move
/// `anchor + k` would.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewBranch {
    pub moves: MoveList,
    pub cursor: usize,
    pub anchor: usize,
}

impl PreviewBranch {
    pub fn current(&self) -> Option<&MoveRecord> {
        self.moves.mainline_at(self.cursor)
    }
}

/// How a played move was taken into the review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// It was the next mainline move; the cursor advanced.
    FollowedMainline,
    /// It was the head of an engine line; that line opened as a preview.
    FollowedPv,
    /// It was the next move of the preview; the preview cursor advanced.
    FollowedPreview,
    /// Nothing known continued that way; a preview branch now holds it.
    Branched,
}

pub struct Navigator {
    session_id: Option<String>,
    moves: MoveList,
    current_move_index: usize,
    preview: Option<PreviewBranch>,
    phase: SessionPhase,
    transport_open: bool,
    progress: f64,
    full_analysis_running: bool,
    ws_error: Option<String>,
    headers: BTreeMap<String, String>,
    start_fen: String,
    tree: MoveTree,
    pending_analysis: HashSet<MoveId>,
    /// Every id that has been part of a preview branch, live or discarded.
    preview_ids: HashSet<MoveId>,
    /// Lowest id never handed out or seen.
    id_watermark: MoveId,
    outbox: Vec<ClientRequest>,
    book: Arc<OpeningBook>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Arc::new(OpeningBook::builtin()))
    }
}

impl Navigator {
    pub fn new(book: Arc<OpeningBook>) -> Self {
        Self {
            session_id: None,
            moves: MoveList::new(),
            current_move_index: 0,
            preview: None,
            phase: SessionPhase::Disconnected,
            transport_open: false,
            progress: 0.0,
            full_analysis_running: false,
            ws_error: None,
            headers: BTreeMap::new(),
            start_fen: START_FEN.to_string(),
            tree: MoveTree::new(),
            pending_analysis: HashSet::new(),
            preview_ids: HashSet::new(),
            id_watermark: 0,
            outbox: Vec::new(),
            book,
        }
    }

    pub fn state(&self) -> NavState {
        match self.phase {
            SessionPhase::Disconnected => NavState::Disconnected,
            SessionPhase::Loading => NavState::Loading,
            SessionPhase::Error => NavState::Error,
            SessionPhase::Browsing if self.preview.is_some() => NavState::PreviewBrowsing,
            SessionPhase::Browsing => NavState::MainlineBrowsing,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn moves(&self) -> &MoveList {
        &self.moves
    }

    pub fn current_move_index(&self) -> usize {
        self.current_move_index
    }

    pub fn preview(&self) -> Option<&PreviewBranch> {
        self.preview.as_ref()
    }

    pub fn is_preview(&self) -> bool {
        self.preview.is_some()
    }

    pub fn transport_open(&self) -> bool {
        self.transport_open
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn full_analysis_running(&self) -> bool {
        self.full_analysis_running
    }

    pub fn ws_error(&self) -> Option<&str> {
        self.ws_error.as_deref()
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    pub fn tree(&self) -> &MoveTree {
        &self.tree
    }

    pub fn is_pending(&self, id: MoveId) -> bool {
        self.pending_analysis.contains(&id)
    }

    /// The record under the cursor of whichever line is active.
    pub fn current_move(&self) -> Option<&MoveRecord> {
        match &self.preview {
            Some(preview) => preview.current(),
            None => self.moves.mainline_at(self.current_move_index),
        }
    }

    /// Requests queued since the last call, oldest first.
    pub fn take_requests(&mut self) -> Vec<ClientRequest> {
        std::mem::take(&mut self.outbox)
    }

    pub fn snapshot(&self) -> ReviewSnapshot {
        ReviewSnapshot {
            session_id: self.session_id.clone(),
            state: self.state(),
            current_move_index: self.current_move_index,
            preview: self.preview.clone(),
            moves: self.moves.clone(),
            start_fen: self.start_fen.clone(),
            progress: self.progress,
            full_analysis_running: self.full_analysis_running,
            ws_error: self.ws_error.clone(),
            headers: self.headers.clone(),
            tree: self.tree.clone(),
            book: Arc::clone(&self.book),
        }
    }

    /// Id the next [`Navigator::allocate_id`] call would return.
    pub fn next_id(&self) -> MoveId {
        let preview_next = self.preview.as_ref().map_or(0, |p| p.moves.next_id());
        let tree_next = self.tree.max_id().map_or(0, |id| id.saturating_add(1));
        self.id_watermark
            .max(self.moves.next_id())
            .max(preview_next)
            .max(tree_next)
    }

    /// Hand out an id above every id this session has seen, including ids
    /// from preview branches that have since been discarded.
    pub fn allocate_id(&mut self) -> MoveId {
        let id = self.next_id();
        self.id_watermark = id.saturating_add(1);
        id
    }

    // Navigation

    /// Move the cursor of the active line. In preview, `index` is a mainline
    /// index and is translated by the branch anchor. Out of range clamps.
    pub fn go_to_move(&mut self, index: usize) -> bool {
        let target = match &self.preview {
            Some(preview) => index.saturating_sub(preview.anchor),
            None => index,
        };
        self.set_active_index(target)
    }

    pub fn move_next(&mut self) -> bool {
        let (index, len) = self.active_position();
        if index + 1 >= len {
            return false;
        }
        self.set_active_index(index + 1)
    }

    pub fn move_prev(&mut self) -> bool {
        let (index, len) = self.active_position();
        if index == 0 || len == 0 {
            return false;
        }
        self.set_active_index(index - 1)
    }

    pub fn go_to_first(&mut self) -> bool {
        self.set_active_index(0)
    }

    pub fn go_to_last(&mut self) -> bool {
        let (_, len) = self.active_position();
        self.set_active_index(len.saturating_sub(1))
    }

    /// Open PV1 at `from` (default: the cursor) as a preview anchored there.
    /// Does nothing outside mainline browsing or when that PV is empty.
    pub fn enter_preview_mode(&mut self, from: Option<usize>) -> bool {
        if self.state() != NavState::MainlineBrowsing {
            return false;
        }
        let from = from.unwrap_or(self.current_move_index);
        let line = preview_copy(self.moves.pv1_at(from));
        if line.is_empty() {
            return false;
        }
        self.open_preview(line, from, 0);
        true
    }

    /// Branch off the mainline with one move played after the cursor.
    pub fn enter_preview_mode_with_move(&mut self, record: MoveRecord) -> bool {
        if self.state() != NavState::MainlineBrowsing {
            return false;
        }
        let anchor = self.current_move_index + 1;
        self.open_preview(vec![record.with_context(LineContext::Preview)], anchor, 0);
        true
    }

    /// Open an explicit sequence as a preview with its cursor on the last
    /// move.
    pub fn enter_preview_mode_with_pv_sequence(&mut self, sequence: Vec<MoveRecord>) -> bool {
        if self.state() != NavState::MainlineBrowsing || sequence.is_empty() {
            return false;
        }
        let line = preview_copy(&sequence);
        let cursor = line.len() - 1;
        self.open_preview(line, self.current_move_index, cursor);
        true
    }

    /// Drop everything after the preview cursor and append `record`.
    pub fn add_preview_move(&mut self, record: MoveRecord) -> bool {
        let Some(preview) = self.preview.as_mut() else {
            return false;
        };
        self.id_watermark = self.id_watermark.max(record.id.saturating_add(1));
        self.preview_ids.insert(record.id);
        preview.moves.truncate(preview.cursor + 1);
        preview
            .moves
            .append(record.with_context(LineContext::Preview), Vec::new(), Vec::new());
        preview.cursor = preview.moves.len() - 1;
        self.request_analysis_at_cursor();
        true
    }

    /// Keep the first `anchor_index` preview moves and append `sequence`.
    pub fn add_pv_sequence_to_preview(&mut self, sequence: Vec<MoveRecord>, anchor_index: usize) -> bool {
        if sequence.is_empty() {
            return false;
        }
        let Some(preview) = self.preview.as_mut() else {
            return false;
        };
        let line = preview_copy(&sequence);
        if let Some(max) = line.iter().map(|r| r.id).max() {
            self.id_watermark = self.id_watermark.max(max.saturating_add(1));
        }
        self.preview_ids.extend(line.iter().map(|r| r.id));
        preview.moves.truncate(anchor_index);
        for record in line {
            preview.moves.append(record, Vec::new(), Vec::new());
        }
        preview.cursor = preview.moves.len() - 1;
        self.request_analysis_at_cursor();
        true
    }

    /// Discard the preview and return to the mainline cursor it left.
    pub fn exit_preview_mode(&mut self) -> bool {
        if self.state() != NavState::PreviewBrowsing {
            return false;
        }
        self.preview = None;
        self.request_analysis_at_cursor();
        true
    }

    /// Play `uci` from the current position. Illegal moves are rejected
    /// before anything changes.
    pub fn play_move(&mut self, uci: &str) -> Result<PlayOutcome, ReviewError> {
        if !matches!(
            self.state(),
            NavState::MainlineBrowsing | NavState::PreviewBrowsing
        ) {
            return Err(ReviewError::NotBrowsing);
        }
        let fen = self.current_move().ok_or(ReviewError::NoPosition)?.fen.clone();
        let (next, facts) = PositionLedger::load(&fen)?.play(uci)?;

        if let Some(preview) = &self.preview {
            let next_index = preview.cursor + 1;
            if preview
                .moves
                .mainline_at(next_index)
                .is_some_and(|r| r.uci == facts.uci)
            {
                self.move_next();
                return Ok(PlayOutcome::FollowedPreview);
            }
            let id = self.allocate_id();
            let record = MoveRecord::from_facts(id, next_index as u32, next.fen(), &facts, LineContext::Preview);
            self.add_preview_move(record);
            return Ok(PlayOutcome::Branched);
        }

        let next_index = self.current_move_index + 1;
        if self
            .moves
            .mainline_at(next_index)
            .is_some_and(|r| r.uci == facts.uci)
        {
            self.move_next();
            return Ok(PlayOutcome::FollowedMainline);
        }

        let engine_line = [self.moves.pv1_at(next_index), self.moves.pv2_at(next_index)]
            .into_iter()
            .find(|pv| pv.first().is_some_and(|r| r.uci == facts.uci))
            .map(preview_copy);
        if let Some(line) = engine_line {
            self.open_preview(line, next_index, 0);
            return Ok(PlayOutcome::FollowedPv);
        }

        let id = self.allocate_id();
        let record = MoveRecord::from_facts(id, 0, next.fen(), &facts, LineContext::Preview);
        self.enter_preview_mode_with_move(record);
        Ok(PlayOutcome::Branched)
    }

    /// Ask the backend to analyse the whole game.
    pub fn request_full_analysis(&mut self) -> Result<(), ReviewError> {
        if !self.transport_open {
            return Err(ReviewError::NotConnected);
        }
        self.outbox.push(ClientRequest::GetFullGameAnalysis);
        self.full_analysis_running = true;
        self.progress = 0.0;
        Ok(())
    }

    // Session lifecycle

    /// Drop the session and every move.
    pub fn disconnect(&mut self) -> bool {
        info!(session = self.session_id.as_deref().unwrap_or("-"), "Disconnecting");
        self.session_id = None;
        self.reset_game();
        self.phase = SessionPhase::Disconnected;
        self.transport_open = false;
        self.ws_error = None;
        self.outbox.clear();
        true
    }

    /// The transport joined `session_id`; ask for the game.
    pub fn on_connected(&mut self, session_id: &str) {
        if self.session_id.as_deref() != Some(session_id) {
            self.reset_game();
        }
        info!(session = session_id, "Session connected, loading");
        self.session_id = Some(session_id.to_string());
        self.phase = SessionPhase::Loading;
        self.transport_open = true;
        self.ws_error = None;
        self.preview = None;
        self.outbox.push(ClientRequest::GetSessionMetadata);
        self.outbox.push(ClientRequest::GetMoveList);
    }

    pub fn on_connect_failed(&mut self, message: &str) {
        self.on_transport_error(message);
    }

    /// The connection is gone. In-flight analysis is forgotten; nothing
    /// retries.
    pub fn on_transport_error(&mut self, message: &str) {
        warn!("Transport lost: {}", message);
        self.phase = SessionPhase::Error;
        self.ws_error = Some(message.to_string());
        self.transport_open = false;
        self.full_analysis_running = false;
        self.pending_analysis.clear();
        self.outbox.clear();
    }

    /// An inbound frame could not be used. The transport stays up.
    pub fn on_malformed_message(&mut self, message: &str) {
        warn!("Malformed message: {}", message);
        self.phase = SessionPhase::Error;
        self.ws_error = Some(message.to_string());
    }

    /// The backend reported an error; browsing carries on.
    pub fn on_backend_error(&mut self, message: &str) {
        warn!("Backend error: {}", message);
        self.ws_error = Some(message.to_string());
    }

    pub fn on_session_metadata(&mut self, headers: BTreeMap<String, String>) {
        self.start_fen = start_fen_from(&headers);
        self.headers = headers;
        if self.phase == SessionPhase::Loading {
            self.phase = SessionPhase::Browsing;
            self.current_move_index = 0;
        }
    }

    /// Reconcile the full mainline. Nothing changes when a move is malformed.
    pub fn on_move_list(&mut self, moves: &[WireMove]) -> Result<(), ConvertError> {
        let records = records_from_wire(moves, LineContext::Mainline)?;
        info!(moves = records.len(), "Received move list");
        self.moves.merge_mainline(records);
        self.rebuild_tree();

        if self.phase == SessionPhase::Loading {
            self.preview = None;
            self.current_move_index = 0;
        } else {
            self.clamp_cursor();
        }
        self.phase = SessionPhase::Browsing;
        self.request_analysis_at_cursor();
        Ok(())
    }

    /// Fold one analysed move, plus PVs for the position after it, into the
    /// mainline and into the preview if the preview holds that id. Returns
    /// whether either line took it; an update neither knows is stale.
    ///
    /// A record keeps the context and ply of the line that holds it. Only an
    /// id that never belonged to a preview may take over a provisional
    /// mainline slot by position.
    pub fn on_analysis_update(
        &mut self,
        wire: &WireMove,
        pv1: Option<&[WireMove]>,
        pv2: Option<&[WireMove]>,
    ) -> Result<bool, ConvertError> {
        let in_mainline_at = wire
            .id
            .and_then(|id| self.moves.find_by_id(id))
            .and_then(|loc| self.moves.get(loc))
            .map(|r| (r.context, r.ply));
        let in_preview_at = wire.id.and_then(|id| {
            let preview = self.preview.as_ref()?;
            let loc = preview.moves.find_by_id(id)?;
            preview.moves.get(loc).map(|r| r.ply)
        });
        let branch_id = wire
            .id
            .is_some_and(|id| in_preview_at.is_some() || self.preview_ids.contains(&id));
        let (context, ply) = match (in_preview_at, in_mainline_at) {
            (Some(ply), _) => (LineContext::Preview, ply),
            (None, Some(found)) => found,
            (None, None) if branch_id => (LineContext::Preview, 0),
            (None, None) => (LineContext::Mainline, 0),
        };
        let record = record_from_wire(wire, context, ply)?;
        let pvs = match (pv1, pv2) {
            (None, None) => None,
            (pv1, pv2) => Some(PvPair::new(
                pv_from_wire(pv1.unwrap_or_default(), LineContext::Pv1)?,
                pv_from_wire(pv2.unwrap_or_default(), LineContext::Pv2)?,
            )),
        };

        let id = record.id;
        self.pending_analysis.remove(&id);
        self.id_watermark = self.id_watermark.max(id.saturating_add(1));

        let in_preview = match self.preview.as_mut() {
            Some(preview) if in_preview_at.is_some() => {
                let local = record.clone().with_context(LineContext::Preview);
                preview.moves.apply_analysis_update(id, local, None).is_applied()
            }
            _ => false,
        };
        let in_mainline = match in_mainline_at {
            Some((context, ply)) => {
                let mut local = record.with_context(context);
                if wire.ply.is_none() {
                    local.ply = ply;
                }
                self.moves.apply_analysis_update(id, local, pvs).is_applied()
            }
            None if branch_id => false,
            None => self.moves.apply_analysis_update(id, record, pvs).is_applied(),
        };

        if in_mainline {
            self.rebuild_tree();
        }
        if !in_mainline && !in_preview {
            debug!(id, "Dropping stale analysis update");
        }
        Ok(in_mainline || in_preview)
    }

    pub fn on_analysis_progress(&mut self, percentage: f64) -> bool {
        let percentage = if percentage.is_finite() {
            percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let changed = self.progress != percentage;
        self.progress = percentage;
        changed
    }

    /// Replace the mainline with the fully analysed game.
    pub fn on_full_analysis_complete(
        &mut self,
        moves: &[WireMove],
        pvs: &BTreeMap<String, WirePvPair>,
    ) -> Result<(), ConvertError> {
        let records = records_from_wire(moves, LineContext::Mainline)?;
        let mut by_parent = HashMap::with_capacity(pvs.len());
        for (key, pair) in pvs {
            let parent: MoveId = key.parse().map_err(|_| ConvertError::InvalidField {
                field: "pvs",
                value: key.clone(),
            })?;
            by_parent.insert(
                parent,
                PvPair::new(
                    pv_from_wire(&pair.pv1, LineContext::Pv1)?,
                    pv_from_wire(&pair.pv2, LineContext::Pv2)?,
                ),
            );
        }

        info!(moves = records.len(), "Full game analysis complete");
        self.moves.replace_all(records, by_parent);
        self.moves.apply_classification_pass();
        self.rebuild_tree();
        self.full_analysis_running = false;
        self.progress = 100.0;
        self.pending_analysis.clear();
        if self.phase == SessionPhase::Loading {
            self.phase = SessionPhase::Browsing;
        }
        self.clamp_cursor();
        Ok(())
    }

    /// Dispatch one inbound message. Unusable messages put the session in
    /// the error phase instead of failing.
    pub fn handle_message(&mut self, message: ServerMessage) -> bool {
        let kind = message.kind();
        let result = match message {
            ServerMessage::Error { message } => {
                self.on_backend_error(&message);
                Ok(true)
            }
            ServerMessage::SessionMetadata { headers } => {
                self.on_session_metadata(headers);
                Ok(true)
            }
            ServerMessage::MoveList { moves } => self.on_move_list(&moves).map(|()| true),
            ServerMessage::AnalysisUpdate { record, pv1, pv2 } => {
                self.on_analysis_update(&record, pv1.as_deref(), pv2.as_deref())
            }
            ServerMessage::AnalysisProgress { percentage } => Ok(self.on_analysis_progress(percentage)),
            ServerMessage::FullAnalysisComplete { moves, pvs } => {
                self.on_full_analysis_complete(&moves, &pvs).map(|()| true)
            }
        };
        match result {
            Ok(changed) => changed,
            Err(e) => {
                self.on_malformed_message(&format!("Malformed {kind} message: {e}"));
                true
            }
        }
    }

    /// Seed the review from the HTTP submission result.
    pub fn load_initial(&mut self, initial: &InitialAnalysis) -> Result<(), ReviewError> {
        let records = records_from_wire(&initial.moves, LineContext::Mainline)?;
        let tree = if initial.tree.is_empty() {
            None
        } else {
            Some(MoveTree::from_wire(&initial.tree)?)
        };

        self.load_records(records, initial.metadata.clone());
        if let Some(tree) = tree {
            self.tree = tree;
        }
        if self.session_id.is_none() {
            self.session_id = initial.session_id.clone();
        }
        Ok(())
    }

    /// Seed the review from moves replayed locally, e.g. a PGN file.
    pub fn load_local(&mut self, records: Vec<MoveRecord>, headers: BTreeMap<String, String>) {
        self.load_records(records, headers);
    }

    // Internals

    fn load_records(&mut self, records: Vec<MoveRecord>, headers: BTreeMap<String, String>) {
        info!(moves = records.len(), "Loading game");
        self.reset_game();
        self.moves = MoveList::from_records(records);
        self.moves.apply_classification_pass();
        self.rebuild_tree();
        self.start_fen = start_fen_from(&headers);
        self.headers = headers;
        self.phase = SessionPhase::Browsing;
        self.request_analysis_at_cursor();
    }

    fn reset_game(&mut self) {
        self.moves.clear();
        self.current_move_index = 0;
        self.preview = None;
        self.progress = 0.0;
        self.full_analysis_running = false;
        self.headers.clear();
        self.start_fen = START_FEN.to_string();
        self.tree.clear();
        self.pending_analysis.clear();
    }

    fn rebuild_tree(&mut self) {
        self.tree = MoveTree::from_move_list(&self.moves);
        self.id_watermark = self.id_watermark.max(self.moves.next_id());
    }

    fn clamp_cursor(&mut self) {
        self.current_move_index = self
            .current_move_index
            .min(self.moves.len().saturating_sub(1));
    }

    /// (cursor, length) of the active line.
    fn active_position(&self) -> (usize, usize) {
        match &self.preview {
            Some(preview) => (preview.cursor, preview.moves.len()),
            None => (self.current_move_index, self.moves.len()),
        }
    }

    fn set_active_index(&mut self, index: usize) -> bool {
        let (current, len) = self.active_position();
        if len == 0 {
            return false;
        }
        let target = index.min(len - 1);
        match self.preview.as_mut() {
            Some(preview) => preview.cursor = target,
            None => self.current_move_index = target,
        }
        self.request_analysis_at_cursor();
        target != current
    }

    fn open_preview(&mut self, line: Vec<MoveRecord>, anchor: usize, cursor: usize) {
        if let Some(max) = line.iter().map(|r| r.id).max() {
            self.id_watermark = self.id_watermark.max(max.saturating_add(1));
        }
        self.preview_ids.extend(line.iter().map(|r| r.id));
        let moves = MoveList::from_records(line);
        let cursor = cursor.min(moves.len().saturating_sub(1));
        debug!(anchor, len = moves.len(), "Entering preview");
        self.preview = Some(PreviewBranch { moves, cursor, anchor });
        self.request_analysis_at_cursor();
    }

    /// Queue a detailed-analysis request for the current move unless it is
    /// analysed, already requested, or there is no transport.
    fn request_analysis_at_cursor(&mut self) {
        if !self.transport_open {
            return;
        }
        let Some(record) = self.current_move() else {
            return;
        };
        if record.is_analyzed || self.pending_analysis.contains(&record.id) {
            return;
        }
        let request = ClientRequest::GetDetailedAnalysis {
            move_id: record.id,
            fen: record.fen.clone(),
            uci: record.uci.clone(),
            context: record.context.as_str().to_string(),
        };
        debug!(id = record.id, context = %record.context, "Requesting analysis");
        self.pending_analysis.insert(record.id);
        self.outbox.push(request);
    }
}

/// Fresh preview records copied from another line.
fn preview_copy(records: &[MoveRecord]) -> Vec<MoveRecord> {
    records
        .iter()
        .cloned()
        .enumerate()
        .map(|(ply, mut record)| {
            record.ply = ply as u32;
            record.with_context(LineContext::Preview)
        })
        .collect()
}

fn start_fen_from(headers: &BTreeMap<String, String>) -> String {
    headers
        .get("FEN")
        .cloned()
        .unwrap_or_else(|| START_FEN.to_string())
}
