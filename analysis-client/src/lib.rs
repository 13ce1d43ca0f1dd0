//! Analysis backend client library
//!
//! Session-scoped transport to the analysis backend: the wire protocol, the
//! `AnalysisTransport` seam the review session is written against, a TCP
//! JSON-lines implementation, and the HTTP call that submits a game.
//!
//! # Example
//!
//! ```no_run
//! use analysis_client::{AnalysisTransport, ClientRequest, TcpTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut transport = TcpTransport::new("127.0.0.1:7878")?;
//!     transport.connect("session-1").await?;
//!     transport.send(ClientRequest::GetMoveList).await?;
//!     while let Some(message) = transport.recv().await? {
//!         println!("{}", message.kind());
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;
pub mod protocol;
mod traits;

pub use client::{pump_messages, write_request, TcpTransport};
pub use error::{ClientError, ClientResult};
pub use http::AnalysisApi;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockRemote, MockTransport};
pub use protocol::{
    ClientRequest, InitialAnalysis, MoveId, ServerMessage, WireCaptures, WireFeature, WireMove,
    WirePvPair,
};
pub use traits::AnalysisTransport;
