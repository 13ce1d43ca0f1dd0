use std::collections::BTreeMap;
use std::time::Duration;

use analysis_client::{ClientError, ClientRequest, MockTransport, ServerMessage, WireMove};
use tokio::sync::broadcast;
use tokio::time::timeout;
use viewer::prelude::*;
use viewer::Navigator;

const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

fn wire(id: u64, fen: &str, uci: &str) -> WireMove {
    WireMove {
        id: Some(id),
        fen: Some(fen.into()),
        uci: Some(uci.into()),
        ..Default::default()
    }
}

fn game() -> Vec<WireMove> {
    vec![wire(0, AFTER_E4, "e2e4"), wire(1, AFTER_E5, "e7e5")]
}

/// A backend that knows a two-move game and analyses whatever is asked.
fn scripted_backend() -> MockTransport {
    MockTransport::new().with_responder(|request| match request {
        ClientRequest::GetSessionMetadata => vec![ServerMessage::SessionMetadata {
            headers: BTreeMap::from([("Event".to_string(), "Test".to_string())]),
        }],
        ClientRequest::GetMoveList => vec![ServerMessage::MoveList { moves: game() }],
        ClientRequest::GetDetailedAnalysis { move_id, .. } => {
            let Some(known) = game().into_iter().find(|m| m.id == Some(*move_id)) else {
                return vec![];
            };
            vec![ServerMessage::AnalysisUpdate {
                record: WireMove {
                    score: Some(25),
                    is_analyzed: true,
                    ..known
                },
                pv1: None,
                pv2: None,
            }]
        }
        _ => vec![],
    })
}

async fn wait_for(
    rx: &mut broadcast::Receiver<ReviewEvent>,
    pred: impl Fn(&ReviewSnapshot) -> bool,
) -> ReviewSnapshot {
    timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(ReviewEvent::StateChanged(snapshot)) if pred(&snapshot) => return snapshot,
                Ok(_) => continue,
                Err(e) => panic!("event stream ended: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for review state")
}

fn first_move_analysed(snapshot: &ReviewSnapshot) -> bool {
    snapshot.state == NavState::MainlineBrowsing
        && snapshot.current_move().is_some_and(|m| m.is_analyzed)
}

#[tokio::test]
async fn connect_loads_game_and_analyses_cursor() {
    let transport = scripted_backend();
    let remote = transport.remote();
    let handle = spawn_review_session(Navigator::default(), transport);
    let (initial, mut rx) = handle.subscribe().await.unwrap();
    assert_eq!(initial.state, NavState::Disconnected);

    let connected = handle.connect("s1").await.unwrap();
    assert_eq!(connected.state, NavState::Loading);

    let browsing = wait_for(&mut rx, first_move_analysed).await;
    assert_eq!(browsing.moves.len(), 2);
    assert_eq!(browsing.current_move().unwrap().score, Some(25));
    assert_eq!(browsing.headers.get("Event").map(String::as_str), Some("Test"));

    let sent = remote.sent_requests();
    assert_eq!(sent[0], ClientRequest::GetSessionMetadata);
    assert_eq!(sent[1], ClientRequest::GetMoveList);
    assert!(matches!(
        sent[2],
        ClientRequest::GetDetailedAnalysis { move_id: 0, .. }
    ));

    handle.shutdown().await;
}

#[tokio::test]
async fn played_mainline_move_advances_and_gets_analysed() {
    let transport = scripted_backend();
    let handle = spawn_review_session(Navigator::default(), transport);
    let (_, mut rx) = handle.subscribe().await.unwrap();
    handle.connect("s1").await.unwrap();
    wait_for(&mut rx, first_move_analysed).await;

    let (outcome, snapshot) = handle.play_move("e7e5").await.unwrap();
    assert_eq!(outcome, PlayOutcome::FollowedMainline);
    assert_eq!(snapshot.current_move_index, 1);

    let analysed = wait_for(&mut rx, |s| {
        s.moves.mainline_at(1).is_some_and(|m| m.is_analyzed)
    })
    .await;
    assert_eq!(analysed.current_move().unwrap().uci, "e7e5");

    let err = handle.play_move("e2e5").await.unwrap_err();
    assert!(matches!(err, ReviewError::IllegalMove(_)));

    handle.shutdown().await;
}

#[tokio::test]
async fn server_close_moves_to_error() {
    let transport = scripted_backend();
    let remote = transport.remote();
    let handle = spawn_review_session(Navigator::default(), transport);
    let (_, mut rx) = handle.subscribe().await.unwrap();
    handle.connect("s1").await.unwrap();
    wait_for(&mut rx, first_move_analysed).await;

    remote.close_from_server();

    let failed = wait_for(&mut rx, |s| s.state == NavState::Error).await;
    assert_eq!(failed.ws_error.as_deref(), Some("Connection closed by server"));
    assert_eq!(failed.moves.len(), 2);

    let err = handle.request_full_analysis().await.unwrap_err();
    assert_eq!(err, ReviewError::NotConnected);

    handle.shutdown().await;
}

#[tokio::test]
async fn malformed_frame_errors_then_recovers_on_next_move_list() {
    let transport = scripted_backend();
    let remote = transport.remote();
    let handle = spawn_review_session(Navigator::default(), transport);
    let (_, mut rx) = handle.subscribe().await.unwrap();
    handle.connect("s1").await.unwrap();
    wait_for(&mut rx, first_move_analysed).await;

    remote.push_error(ClientError::Protocol("unexpected token".into()));
    let failed = wait_for(&mut rx, |s| s.state == NavState::Error).await;
    assert!(failed.ws_error.unwrap().contains("unexpected token"));

    remote.push(ServerMessage::MoveList { moves: game() });
    let recovered = wait_for(&mut rx, |s| s.state == NavState::MainlineBrowsing).await;
    assert_eq!(recovered.moves.len(), 2);

    handle.shutdown().await;
}

#[tokio::test]
async fn connect_failure_is_reported() {
    let transport = MockTransport::new().with_connect_failure();
    let handle = spawn_review_session(Navigator::default(), transport);

    let err = handle.connect("s1").await.unwrap_err();
    assert!(matches!(err, ReviewError::Transport(_)));

    let snapshot = handle.get_snapshot().await.unwrap();
    assert_eq!(snapshot.state, NavState::Error);
    assert!(snapshot.ws_error.is_some());

    handle.shutdown().await;
}

#[tokio::test]
async fn failed_send_moves_to_error() {
    let transport = scripted_backend();
    let remote = transport.remote();
    let handle = spawn_review_session(Navigator::default(), transport);
    let (_, mut rx) = handle.subscribe().await.unwrap();
    handle.connect("s1").await.unwrap();
    wait_for(&mut rx, first_move_analysed).await;

    remote.fail_sends();
    let snapshot = handle.move_next().await.unwrap();

    assert_eq!(snapshot.state, NavState::Error);
    assert_eq!(snapshot.current_move_index, 1);
    assert!(snapshot.ws_error.unwrap().starts_with("Send failed"));

    handle.shutdown().await;
}

#[tokio::test]
async fn offline_session_browses_without_transport() {
    let handle = spawn_review_session(Navigator::default(), MockTransport::new());
    let records = vec![
        MoveRecord::new(0, 0, AFTER_E4, "e2e4", LineContext::Mainline),
        MoveRecord::new(1, 1, AFTER_E5, "e7e5", LineContext::Mainline),
    ];
    let loaded = handle.load_local(records, BTreeMap::new()).await.unwrap();
    assert_eq!(loaded.state, NavState::MainlineBrowsing);

    let last = handle.go_to_last().await.unwrap();
    assert_eq!(last.current_move_index, 1);

    let id = handle.allocate_id().await.unwrap();
    assert_eq!(id, 2);
    assert_eq!(handle.allocate_id().await.unwrap(), 3);

    handle.shutdown().await;
    assert!(handle.get_snapshot().await.is_err());
}
