use analysis_client::{AnalysisTransport, ClientResult, ServerMessage};
use tokio::sync::{broadcast, mpsc};
use tracing::Instrument;

use super::commands::ReviewCommand;
use super::events::ReviewEvent;
use crate::error::ReviewError;
use crate::navigation::Navigator;

/// The review actor loop.
/// Owns the navigator and the transport. Processes commands and inbound
/// messages one at a time, each to completion.
pub(crate) async fn run_review_actor<T: AnalysisTransport>(
    nav: Navigator,
    transport: T,
    cmd_rx: mpsc::Receiver<ReviewCommand>,
    event_tx: broadcast::Sender<ReviewEvent>,
) {
    let label = nav.session_id().unwrap_or("offline").to_string();
    run_review_actor_inner(nav, transport, cmd_rx, event_tx)
        .instrument(tracing::info_span!("review", session = %label))
        .await;
}

async fn run_review_actor_inner<T: AnalysisTransport>(
    mut nav: Navigator,
    mut transport: T,
    mut cmd_rx: mpsc::Receiver<ReviewCommand>,
    event_tx: broadcast::Sender<ReviewEvent>,
) {
    tracing::info!("Review actor started");

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ReviewCommand::Shutdown) | None => {
                        tracing::info!("Review actor shutting down");
                        if transport.is_open() {
                            let _ = transport.close().await;
                        }
                        break;
                    }
                    Some(cmd) => handle_command(&mut nav, &mut transport, cmd, &event_tx).await,
                }
            }

            inbound = transport.recv(), if transport.is_open() => {
                handle_inbound(&mut nav, &mut transport, inbound, &event_tx).await;
            }
        }
    }

    tracing::info!("Review actor exited");
}

async fn handle_command<T: AnalysisTransport>(
    nav: &mut Navigator,
    transport: &mut T,
    cmd: ReviewCommand,
    event_tx: &broadcast::Sender<ReviewEvent>,
) {
    match cmd {
        ReviewCommand::Connect { session_id, reply } => {
            if transport.is_open() {
                let _ = transport.close().await;
            }
            let result = match transport.connect(&session_id).await {
                Ok(()) => {
                    nav.on_connected(&session_id);
                    Ok(())
                }
                Err(e) => {
                    let message = format!("Failed to connect: {}", e);
                    nav.on_connect_failed(&message);
                    let _ = event_tx.send(ReviewEvent::Error(message.clone()));
                    Err(ReviewError::Transport(message))
                }
            };
            flush(nav, transport, event_tx, true).await;
            let _ = reply.send(result.map(|()| nav.snapshot()));
        }
        ReviewCommand::Disconnect { reply } => {
            if transport.is_open() {
                let _ = transport.close().await;
            }
            let changed = nav.disconnect();
            flush(nav, transport, event_tx, changed).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::GoToMove { index, reply } => {
            let changed = nav.go_to_move(index);
            flush(nav, transport, event_tx, changed).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::MoveNext { reply } => {
            let changed = nav.move_next();
            flush(nav, transport, event_tx, changed).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::MovePrev { reply } => {
            let changed = nav.move_prev();
            flush(nav, transport, event_tx, changed).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::GoToFirst { reply } => {
            let changed = nav.go_to_first();
            flush(nav, transport, event_tx, changed).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::GoToLast { reply } => {
            let changed = nav.go_to_last();
            flush(nav, transport, event_tx, changed).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::EnterPreview { from, reply } => {
            let changed = nav.enter_preview_mode(from);
            flush(nav, transport, event_tx, changed).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::EnterPreviewWithMove { record, reply } => {
            let changed = nav.enter_preview_mode_with_move(record);
            flush(nav, transport, event_tx, changed).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::EnterPreviewWithPvSequence { sequence, reply } => {
            let changed = nav.enter_preview_mode_with_pv_sequence(sequence);
            flush(nav, transport, event_tx, changed).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::AddPreviewMove { record, reply } => {
            let changed = nav.add_preview_move(record);
            flush(nav, transport, event_tx, changed).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::AddPvSequenceToPreview {
            sequence,
            anchor_index,
            reply,
        } => {
            let changed = nav.add_pv_sequence_to_preview(sequence, anchor_index);
            flush(nav, transport, event_tx, changed).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::ExitPreview { reply } => {
            let changed = nav.exit_preview_mode();
            flush(nav, transport, event_tx, changed).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::PlayMove { uci, reply } => {
            let result = nav.play_move(&uci);
            flush(nav, transport, event_tx, result.is_ok()).await;
            let _ = reply.send(result.map(|outcome| (outcome, nav.snapshot())));
        }
        ReviewCommand::RequestFullAnalysis { reply } => {
            let result = nav.request_full_analysis();
            flush(nav, transport, event_tx, result.is_ok()).await;
            let _ = reply.send(result.map(|()| nav.snapshot()));
        }
        ReviewCommand::LoadInitial { initial, reply } => {
            let result = nav.load_initial(&initial);
            flush(nav, transport, event_tx, result.is_ok()).await;
            let _ = reply.send(result.map(|()| nav.snapshot()));
        }
        ReviewCommand::LoadLocal {
            records,
            headers,
            reply,
        } => {
            nav.load_local(records, headers);
            flush(nav, transport, event_tx, true).await;
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::AllocateId { reply } => {
            let _ = reply.send(nav.allocate_id());
        }
        ReviewCommand::GetSnapshot { reply } => {
            let _ = reply.send(nav.snapshot());
        }
        ReviewCommand::Subscribe { reply } => {
            let snapshot = nav.snapshot();
            let rx = event_tx.subscribe();
            let _ = reply.send((snapshot, rx));
        }
        ReviewCommand::Shutdown => unreachable!(),
    }
}

async fn handle_inbound<T: AnalysisTransport>(
    nav: &mut Navigator,
    transport: &mut T,
    inbound: ClientResult<Option<ServerMessage>>,
    event_tx: &broadcast::Sender<ReviewEvent>,
) {
    let changed = match inbound {
        Ok(Some(message)) => {
            tracing::debug!(kind = message.kind(), "Inbound message");
            if let ServerMessage::Error { message } = &message {
                let _ = event_tx.send(ReviewEvent::Error(message.clone()));
            }
            nav.handle_message(message)
        }
        Ok(None) => {
            let message = "Connection closed by server".to_string();
            nav.on_transport_error(&message);
            let _ = event_tx.send(ReviewEvent::Error(message));
            true
        }
        Err(e) if !e.is_fatal() => {
            let message = e.to_string();
            nav.on_malformed_message(&message);
            let _ = event_tx.send(ReviewEvent::Error(message));
            true
        }
        Err(e) => {
            let message = e.to_string();
            nav.on_transport_error(&message);
            let _ = transport.close().await;
            let _ = event_tx.send(ReviewEvent::Error(message));
            true
        }
    };
    flush(nav, transport, event_tx, changed).await;
}

/// Send whatever the navigator queued, then publish a snapshot if anything
/// changed. A failed send takes the session to the error phase.
async fn flush<T: AnalysisTransport>(
    nav: &mut Navigator,
    transport: &mut T,
    event_tx: &broadcast::Sender<ReviewEvent>,
    mut changed: bool,
) {
    for request in nav.take_requests() {
        if !transport.is_open() {
            tracing::debug!(kind = request.kind(), "Dropping request, transport closed");
            continue;
        }
        tracing::debug!(kind = request.kind(), "Sending request");
        if let Err(e) = transport.send(request).await {
            let message = format!("Send failed: {}", e);
            nav.on_transport_error(&message);
            let _ = transport.close().await;
            let _ = event_tx.send(ReviewEvent::Error(message));
            changed = true;
            break;
        }
    }
    if changed {
        let _ = event_tx.send(ReviewEvent::StateChanged(nav.snapshot()));
    }
}
