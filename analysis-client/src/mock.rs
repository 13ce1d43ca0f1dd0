//! Mock AnalysisTransport implementation for testing

use crate::error::{ClientError, ClientResult};
use crate::protocol::{ClientRequest, ServerMessage};
use crate::traits::AnalysisTransport;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[cfg(any(test, feature = "mock"))]
type Responder = Box<dyn Fn(&ClientRequest) -> Vec<ServerMessage> + Send>;

/// Mock transport for testing - only compiled in test mode or with mock feature
///
/// Pushes are scripted through a [`MockRemote`], which stays usable after the
/// transport itself has been moved into a session task.
#[cfg(any(test, feature = "mock"))]
pub struct MockTransport {
    shared: Arc<Mutex<MockState>>,
    inbound_rx: mpsc::UnboundedReceiver<Inbound>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    open: bool,
}

#[cfg(any(test, feature = "mock"))]
#[derive(Default)]
struct MockState {
    call_log: Vec<MockCall>,
    responder: Option<Responder>,
    fail_connect: bool,
    fail_sends: bool,
}

#[cfg(any(test, feature = "mock"))]
enum Inbound {
    Message(ServerMessage),
    Error(ClientError),
    Closed,
}

#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Connect { session_id: String },
    Send(ClientRequest),
    Close,
}

/// Test-side handle onto a [`MockTransport`].
#[cfg(any(test, feature = "mock"))]
#[derive(Clone)]
pub struct MockRemote {
    shared: Arc<Mutex<MockState>>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
}

#[cfg(any(test, feature = "mock"))]
impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "mock"))]
impl MockTransport {
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Mutex::new(MockState::default())),
            inbound_rx,
            inbound_tx,
            open: false,
        }
    }

    /// Answer every sent request with the messages `f` returns.
    pub fn with_responder<F>(self, f: F) -> Self
    where
        F: Fn(&ClientRequest) -> Vec<ServerMessage> + Send + 'static,
    {
        self.shared.lock().unwrap().responder = Some(Box::new(f));
        self
    }

    /// Make `connect` fail as if the server were unreachable.
    pub fn with_connect_failure(self) -> Self {
        self.shared.lock().unwrap().fail_connect = true;
        self
    }

    pub fn remote(&self) -> MockRemote {
        MockRemote {
            shared: Arc::clone(&self.shared),
            inbound_tx: self.inbound_tx.clone(),
        }
    }

    fn log(&self, call: MockCall) {
        self.shared.lock().unwrap().call_log.push(call);
    }
}

#[cfg(any(test, feature = "mock"))]
impl MockRemote {
    /// Queue a server push.
    pub fn push(&self, message: ServerMessage) {
        let _ = self.inbound_tx.send(Inbound::Message(message));
    }

    /// Queue a receive error, e.g. a malformed frame.
    pub fn push_error(&self, error: ClientError) {
        let _ = self.inbound_tx.send(Inbound::Error(error));
    }

    /// Simulate the server closing the connection.
    pub fn close_from_server(&self) {
        let _ = self.inbound_tx.send(Inbound::Closed);
    }

    /// Make every following `send` fail.
    pub fn fail_sends(&self) {
        self.shared.lock().unwrap().fail_sends = true;
    }

    /// Get recorded calls for verification
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.shared.lock().unwrap().call_log.clone()
    }

    /// Only the requests that were sent, in order.
    pub fn sent_requests(&self) -> Vec<ClientRequest> {
        self.get_calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Send(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Clear call history
    pub fn clear_calls(&self) {
        self.shared.lock().unwrap().call_log.clear()
    }
}

#[cfg(any(test, feature = "mock"))]
#[async_trait]
impl AnalysisTransport for MockTransport {
    async fn connect(&mut self, session_id: &str) -> ClientResult<()> {
        self.log(MockCall::Connect {
            session_id: session_id.to_string(),
        });

        if self.shared.lock().unwrap().fail_connect {
            return Err(ClientError::ConnectionFailed {
                addr: "mock".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "mock"),
            });
        }
        self.open = true;
        Ok(())
    }

    async fn send(&mut self, request: ClientRequest) -> ClientResult<()> {
        if !self.open {
            return Err(ClientError::NotConnected);
        }
        self.log(MockCall::Send(request.clone()));

        let replies = {
            let state = self.shared.lock().unwrap();
            if state.fail_sends {
                return Err(ClientError::ConnectionClosed);
            }
            state
                .responder
                .as_ref()
                .map(|f| f(&request))
                .unwrap_or_default()
        };
        for reply in replies {
            let _ = self.inbound_tx.send(Inbound::Message(reply));
        }
        Ok(())
    }

    async fn recv(&mut self) -> ClientResult<Option<ServerMessage>> {
        if !self.open {
            return Err(ClientError::NotConnected);
        }
        // The transport holds a sender itself, so this only ends on Closed.
        match self.inbound_rx.recv().await {
            Some(Inbound::Message(message)) => Ok(Some(message)),
            Some(Inbound::Error(error)) => Err(error),
            Some(Inbound::Closed) | None => {
                self.open = false;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> ClientResult<()> {
        self.log(MockCall::Close);
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
