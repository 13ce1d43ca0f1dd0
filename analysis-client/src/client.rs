//! JSON-lines transport over TCP

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::protocol::{decode_message, encode_request, ClientRequest, ServerMessage};
use crate::traits::AnalysisTransport;

/// Inbound frames buffered between the reader task and `recv`.
const INBOUND_BUFFER: usize = 256;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Network transport for one analysis session.
///
/// A background task reads and decodes lines so that `recv` only waits on a
/// channel, which keeps it cancel-safe.
pub struct TcpTransport {
    addr: String,
    writer: Option<BoxedWriter>,
    inbound: Option<mpsc::Receiver<ClientResult<ServerMessage>>>,
    reader: Option<JoinHandle<()>>,
}

impl TcpTransport {
    /// `addr` is `host:port`; nothing is opened until `connect`.
    pub fn new(addr: impl Into<String>) -> ClientResult<Self> {
        let addr = addr.into();
        if addr.is_empty() || !addr.contains(':') {
            return Err(ClientError::InvalidAddress(addr));
        }
        Ok(Self {
            addr,
            writer: None,
            inbound: None,
            reader: None,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Take over an already open byte stream.
    pub fn attach<S>(&mut self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.teardown();
        let (read_half, write_half) = tokio::io::split(stream);
        let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
        self.reader = Some(tokio::spawn(pump_messages(read_half, tx)));
        self.inbound = Some(rx);
        self.writer = Some(Box::new(write_half));
    }

    fn teardown(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.inbound = None;
        self.writer = None;
    }
}

#[async_trait]
impl AnalysisTransport for TcpTransport {
    async fn connect(&mut self, session_id: &str) -> ClientResult<()> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|source| ClientError::ConnectionFailed {
                addr: self.addr.clone(),
                source,
            })?;
        info!(addr = %self.addr, session_id, "Connected to analysis server");
        self.attach(stream);
        self.send(ClientRequest::Join {
            session_id: session_id.to_string(),
        })
        .await
    }

    async fn send(&mut self, request: ClientRequest) -> ClientResult<()> {
        let writer = self.writer.as_mut().ok_or(ClientError::NotConnected)?;
        debug!(kind = request.kind(), "Sending request");
        write_request(writer, &request).await
    }

    async fn recv(&mut self) -> ClientResult<Option<ServerMessage>> {
        let inbound = self.inbound.as_mut().ok_or(ClientError::NotConnected)?;
        match inbound.recv().await {
            Some(frame) => frame.map(Some),
            None => {
                info!(addr = %self.addr, "Analysis server closed the connection");
                self.teardown();
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> ClientResult<()> {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("Shutdown of closed transport failed: {}", e);
            }
        }
        self.teardown();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Write one request as a JSON line and flush it.
pub async fn write_request<W>(writer: &mut W, request: &ClientRequest) -> ClientResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let line = encode_request(request)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Read JSON lines until EOF or an I/O error, forwarding each decoded frame.
/// A malformed line is forwarded as an error and reading continues.
pub async fn pump_messages<R>(reader: R, tx: mpsc::Sender<ClientResult<ServerMessage>>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        let frame = match lines.next_line().await {
            Ok(Some(line)) => match decode_message(&line) {
                Ok(Some(msg)) => Ok(msg),
                Ok(None) => continue,
                Err(e) => {
                    warn!("Dropping malformed frame: {}", e);
                    Err(e)
                }
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Transport read failed: {}", e);
                let _ = tx.send(Err(ClientError::Io(e))).await;
                break;
            }
        };
        if tx.send(frame).await.is_err() {
            break;
        }
    }
}
