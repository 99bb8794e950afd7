//! Point-to-point framed channel.
//!
//! A `Channel` wraps any ordered, reliable byte stream (a TCP connection between
//! processes, or an in-memory duplex pipe inside one process) and exchanges
//! whole frames over it. Both `send` and `receive` block the calling task until
//! the frame has been flushed or fully read.

use super::frame::{FRAME_END, Frame, FrameHeader, HEADER_LEN, MAX_PAYLOAD_LEN};
use crate::error::{ClusterError, Result};
use crate::unit::Unit;

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::net::{TcpListener, TcpStream};

/// Buffer size of each direction of an in-process channel.
pub const LOCAL_PIPE_CAPACITY: usize = 64 * 1024;

pub struct Channel<S> {
    stream: S,
    /// Human readable name of this end, e.g. "dispatcher->horror".
    endpoint: String,
    conversation: u32,
}

impl<S> Channel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, endpoint: impl Into<String>, conversation: u32) -> Self {
        Self {
            stream,
            endpoint: endpoint.into(),
            conversation,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one Data frame; returns once the bytes are flushed to the stream.
    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.send_frame(&Frame::Data(payload.to_vec())).await
    }

    /// Sends the zero-length terminator.
    pub async fn send_end(&mut self) -> Result<()> {
        self.send_frame(&Frame::End).await
    }

    /// Payloads over `MAX_PAYLOAD_LEN` are refused before anything is written.
    pub async fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        if let Frame::Data(payload) = frame
            && payload.len() > MAX_PAYLOAD_LEN as usize
        {
            return Err(ClusterError::protocol(
                &self.endpoint,
                format!(
                    "payload of {} bytes exceeds limit of {}",
                    payload.len(),
                    MAX_PAYLOAD_LEN
                ),
            ));
        }

        let encoded = frame.encode(self.conversation);

        self.stream
            .write_all(&encoded)
            .await
            .map_err(|e| ClusterError::transport(&self.endpoint, e))?;
        self.stream
            .flush()
            .await
            .map_err(|e| ClusterError::transport(&self.endpoint, e))?;

        tracing::trace!("{}: sent {} bytes", self.endpoint, encoded.len());
        Ok(())
    }

    /// Blocks until the next complete frame arrives.
    pub async fn receive(&mut self) -> Result<Frame> {
        let mut raw = [0u8; HEADER_LEN];
        self.stream
            .read_exact(&mut raw)
            .await
            .map_err(|e| ClusterError::transport(&self.endpoint, e))?;

        let header = FrameHeader::parse(&raw, self.conversation)
            .map_err(|reason| ClusterError::protocol(&self.endpoint, reason))?;

        if header.kind == FRAME_END {
            tracing::trace!("{}: received terminator", self.endpoint);
            return Ok(Frame::End);
        }

        let mut payload = vec![0u8; header.len as usize];
        self.stream
            .read_exact(&mut payload)
            .await
            .map_err(|e| ClusterError::transport(&self.endpoint, e))?;

        tracing::trace!("{}: received {} bytes", self.endpoint, payload.len());
        Ok(Frame::Data(payload))
    }

    pub async fn send_unit(&mut self, unit: &Unit) -> Result<()> {
        let payload = unit.encode(&self.endpoint)?;
        self.send(&payload).await
    }

    /// Receives a unit, or `None` when the peer sent the terminator.
    pub async fn receive_unit(&mut self) -> Result<Option<Unit>> {
        match self.receive().await? {
            Frame::Data(payload) => Unit::decode(&payload, &self.endpoint).map(Some),
            Frame::End => Ok(None),
        }
    }

    /// Sends `unit` and waits for the single reply it produces.
    pub async fn round_trip(&mut self, unit: &Unit) -> Result<Unit> {
        self.send_unit(unit).await?;
        match self.receive_unit().await? {
            Some(reply) => Ok(reply),
            None => Err(ClusterError::protocol(
                &self.endpoint,
                "peer terminated the conversation instead of replying",
            )),
        }
    }
}

/// Builds both ends of an in-process channel.
pub fn local_pair(
    left: &str,
    right: &str,
    conversation: u32,
) -> (Channel<DuplexStream>, Channel<DuplexStream>) {
    let (a, b) = tokio::io::duplex(LOCAL_PIPE_CAPACITY);
    (
        Channel::new(a, format!("{}->{}", left, right), conversation),
        Channel::new(b, format!("{}->{}", right, left), conversation),
    )
}

impl Channel<TcpStream> {
    /// Connects to a listening peer, retrying while it is still starting up.
    pub async fn connect(
        addr: SocketAddr,
        endpoint: impl Into<String>,
        conversation: u32,
        attempts: u32,
        backoff: Duration,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        let attempts = attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    stream
                        .set_nodelay(true)
                        .map_err(|e| ClusterError::transport(&endpoint, e))?;
                    tracing::debug!("{}: connected to {} (attempt {})", endpoint, addr, attempt);
                    return Ok(Self::new(stream, endpoint, conversation));
                }
                Err(e) => {
                    tracing::debug!(
                        "{}: connect to {} failed (attempt {}/{}): {}",
                        endpoint,
                        addr,
                        attempt,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        Err(ClusterError::Startup(format!(
            "{}: could not reach {} after {} attempts: {}",
            endpoint,
            addr,
            attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Waits for exactly one peer on `listener`.
    pub async fn accept(
        listener: &TcpListener,
        endpoint: impl Into<String>,
        conversation: u32,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| ClusterError::Startup(format!("{}: accept failed: {}", endpoint, e)))?;
        stream
            .set_nodelay(true)
            .map_err(|e| ClusterError::transport(&endpoint, e))?;

        tracing::debug!("{}: accepted peer {}", endpoint, peer);
        Ok(Self::new(stream, endpoint, conversation))
    }
}
