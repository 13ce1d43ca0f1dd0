//! AnalysisTransport trait abstraction for transport implementations

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::protocol::{ClientRequest, ServerMessage};

/// Session-scoped push/pull channel to the analysis backend.
/// Implemented by both the real TcpTransport and MockTransport.
///
/// The transport carries frames only: every inbound message is handed back
/// unmodified and replies are matched by move id, not by call.
#[async_trait]
pub trait AnalysisTransport: Send {
    /// Open the channel and join `session_id`.
    async fn connect(&mut self, session_id: &str) -> ClientResult<()>;

    /// Fire-and-forget send of one request.
    async fn send(&mut self, request: ClientRequest) -> ClientResult<()>;

    /// Next inbound message. `Ok(None)` means the server closed the channel.
    /// Must be cancel-safe: it is polled inside `tokio::select!`.
    async fn recv(&mut self) -> ClientResult<Option<ServerMessage>>;

    /// Close the channel. Closing an already closed transport is a no-op.
    async fn close(&mut self) -> ClientResult<()>;

    fn is_open(&self) -> bool;
}
