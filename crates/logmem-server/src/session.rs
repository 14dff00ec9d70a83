//! Per-connection session engine
//!
//! A session owns its socket and at most one cache binding. It starts
//! unbound, binds on a successful `connect`/`subscribe`, and closes on
//! `disconnect`, `unsubscribe`, EOF, or a transport error. Commands are
//! processed strictly in receipt order; every received command yields
//! exactly one logical reply.
//!
//! Per-command failures never terminate the connection — they become a
//! `FAILED: <reason>` reply and the loop continues. Only transport failures
//! end the session, and closing a session never removes its bound cache
//! from the registry; that is `unsubscribe`'s job alone.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument};

use logmem_core::command::validate_payload;
use logmem_core::{COMMAND_SIZE, Command, LINE_SIZE, LogLine, OpCode, ProtocolError, TIME_FORMAT, wire};
use logmem_storage::{CacheEntry, CacheRegistry, StorageError};

/// Errors reported to the client as `FAILED: <reason>` replies
#[derive(Debug, Error)]
pub enum SessionError {
    /// The command requires a bound cache and the session has none
    #[error("authentication required")]
    AuthRequired,

    /// Parse or validation failure
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Store or registry failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Whether the session keeps serving after the current reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// One logical reply: a single line frame, or a count followed by record
/// frames for GETLOGS
enum Reply {
    Line(String),
    Logs(Vec<LogLine>),
}

/// Per-connection state: the transport handle and at most one cache binding
pub struct Session {
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<CacheRegistry>,
    binding: Option<Arc<CacheEntry>>,
}

impl Session {
    /// Wrap an accepted connection
    pub fn new(stream: TcpStream, peer: SocketAddr, registry: Arc<CacheRegistry>) -> Self {
        Self {
            stream,
            peer,
            registry,
            binding: None,
        }
    }

    /// Serve the connection until it closes
    ///
    /// Consumes the session; the socket and any binding handle are released
    /// on every exit path.
    #[instrument(skip(self), fields(peer = %self.peer))]
    pub async fn run(mut self) {
        match self.command_loop().await {
            Ok(()) => debug!("Session closed"),
            Err(e) => debug!(error = %e, "Session ended on transport error"),
        }
    }

    async fn command_loop(&mut self) -> std::io::Result<()> {
        let mut buf = [0u8; COMMAND_SIZE];
        loop {
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Ok(());
            }

            let (reply, flow) = match self.dispatch(&buf[..n]).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    debug!(error = %e, "Command failed");
                    (Reply::Line(format!("FAILED: {e}")), Flow::Continue)
                }
            };

            self.send(reply).await?;
            if flow == Flow::Close {
                return Ok(());
            }
        }
    }

    /// Check and execute one received frame
    ///
    /// Evaluation order: length, auth, payload validation, dispatch. Nothing
    /// is written here; the reply travels back through the loop so that
    /// exactly one reply leaves per command.
    async fn dispatch(&mut self, frame: &[u8]) -> Result<(Reply, Flow), SessionError> {
        if frame.len() >= COMMAND_SIZE {
            return Err(ProtocolError::MessageTooLong.into());
        }
        let raw = wire::decode_request(frame).ok_or(ProtocolError::InvalidArgument)?;
        let cmd = Command::parse(raw);

        if let Some(payload) = &cmd.payload {
            if payload.len() > LINE_SIZE {
                return Err(ProtocolError::MessageTooLong.into());
            }
        }

        if cmd.op.requires_binding() && self.binding.is_none() {
            return Err(SessionError::AuthRequired);
        }

        if let Some(payload) = &cmd.payload {
            validate_payload(payload)?;
        }

        match cmd.op {
            OpCode::Connect | OpCode::Subscribe => self.bind(&cmd).await,
            OpCode::Stat => self.stat().await,
            OpCode::Add => self.add(&cmd).await,
            OpCode::Flush => self.flush().await,
            OpCode::GetLogs => self.get_logs().await,
            OpCode::Unsubscribe => self.unsubscribe(&cmd).await,
            OpCode::Disconnect => Ok((Reply::Line(cmd.op.ack().to_string()), Flow::Close)),
            OpCode::Unknown => Err(ProtocolError::UnknownCommand.into()),
        }
    }

    /// Bind (or rebind) this session to a named cache
    async fn bind(&mut self, cmd: &Command) -> Result<(Reply, Flow), SessionError> {
        let name = cmd.require_payload()?;
        let entry = self.registry.resolve_or_create(name).await?;
        info!(service = entry.name(), "Session bound");
        self.binding = Some(entry);
        Ok((Reply::Line(cmd.op.ack().to_string()), Flow::Continue))
    }

    /// Format the status string: server time, cached KBs, stored line count
    async fn stat(&self) -> Result<(Reply, Flow), SessionError> {
        let entry = self.bound()?;
        let (bytes_written, log_count) = entry.stats().await;
        let time = Utc::now().format(TIME_FORMAT);
        let stats = format!("{time}, {} KB, {log_count} lines", bytes_written / 1024);
        Ok((Reply::Line(stats), Flow::Continue))
    }

    /// Append one log line to the bound cache
    async fn add(&self, cmd: &Command) -> Result<(Reply, Flow), SessionError> {
        let entry = self.bound()?;
        let line = LogLine::parse(cmd.require_payload()?)?;
        entry.store().lock().await.append(&line)?;
        Ok((Reply::Line(cmd.op.ack().to_string()), Flow::Continue))
    }

    /// Sync the bound cache's written bytes to its backing file
    async fn flush(&self) -> Result<(Reply, Flow), SessionError> {
        let entry = self.bound()?;
        entry.store().lock().await.flush()?;
        Ok((Reply::Line(OpCode::Flush.ack().to_string()), Flow::Continue))
    }

    /// Snapshot the stored records under the per-entry lock, then stream
    /// them without holding it
    async fn get_logs(&self) -> Result<(Reply, Flow), SessionError> {
        let entry = self.bound()?;
        let logs = entry.store().lock().await.snapshot();
        Ok((Reply::Logs(logs), Flow::Continue))
    }

    /// Remove the bound cache from the registry and close the session
    async fn unsubscribe(&mut self, cmd: &Command) -> Result<(Reply, Flow), SessionError> {
        let entry = self.bound()?;
        let name = entry.name().to_string();
        self.registry.remove(&name).await?;
        self.binding = None;
        info!(service = %name, "Session unsubscribed");
        Ok((Reply::Line(cmd.op.ack().to_string()), Flow::Close))
    }

    fn bound(&self) -> Result<&Arc<CacheEntry>, SessionError> {
        // The auth check runs before dispatch; this is the backstop.
        self.binding.as_ref().ok_or(SessionError::AuthRequired)
    }

    async fn send(&mut self, reply: Reply) -> std::io::Result<()> {
        match reply {
            Reply::Line(text) => {
                self.stream.write_all(&wire::encode_reply(&text)).await?;
            }
            Reply::Logs(logs) => {
                self.stream
                    .write_all(&wire::encode_reply(&logs.len().to_string()))
                    .await?;
                for line in &logs {
                    self.stream
                        .write_all(&wire::encode_record(&line.to_bytes()))
                        .await?;
                }
            }
        }
        self.stream.flush().await
    }
}
