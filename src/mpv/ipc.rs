//! Short-lived IPC connections to MPV.
//!
//! Handles platform-specific socket/pipe connections. Every probe and command
//! opens a fresh connection and closes it again; nothing is pooled.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::endpoint::Endpoint;
use super::protocol::MpvCommand;

/// Default per-attempt connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(300);

/// Why a probe found no listener. Never escalated past [`probe`].
#[derive(Error, Debug)]
pub enum ProbeError {
  #[error("Endpoint unreachable: {0}")]
  Unreachable(#[from] std::io::Error),
  #[error("Connect timed out after {0:?}")]
  Timeout(Duration),
}

/// Failure to deliver a command. Logged by the caller, never fatal.
#[derive(Error, Debug)]
pub enum CommandSendError {
  #[error("Connection failed: {0}")]
  ConnectionFailed(std::io::Error),
  #[error("Write failed: {0}")]
  WriteFailed(std::io::Error),
  #[error("Timed out after {0:?}")]
  Timeout(Duration),
}

#[cfg(windows)]
async fn try_connect(
  endpoint: &Endpoint,
) -> std::io::Result<tokio::net::windows::named_pipe::NamedPipeClient> {
  use tokio::net::windows::named_pipe::ClientOptions;

  ClientOptions::new().open(endpoint.as_str())
}

#[cfg(not(windows))]
async fn try_connect(endpoint: &Endpoint) -> std::io::Result<tokio::net::UnixStream> {
  tokio::net::UnixStream::connect(endpoint.as_str()).await
}

/// Connect and immediately disconnect, reporting why it failed.
pub async fn try_probe(endpoint: &Endpoint, timeout: Duration) -> Result<(), ProbeError> {
  match tokio::time::timeout(timeout, try_connect(endpoint)).await {
    // Dropping the stream closes it without writing anything.
    Ok(Ok(_stream)) => Ok(()),
    Ok(Err(e)) => Err(ProbeError::Unreachable(e)),
    Err(_) => Err(ProbeError::Timeout(timeout)),
  }
}

/// Check whether a player is listening on `endpoint`.
pub async fn probe(endpoint: &Endpoint, timeout: Duration) -> bool {
  match try_probe(endpoint, timeout).await {
    Ok(()) => {
      log::debug!("Probe {}: live", endpoint);
      true
    }
    Err(e) => {
      log::debug!("Probe {}: {}", endpoint, e);
      false
    }
  }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
  writer.write_all(line.as_bytes()).await?;
  writer.flush().await?;
  writer.shutdown().await
}

/// Write a single command to `endpoint` and close the connection.
///
/// Fire-and-forget: the player's reply, if any, is never read.
pub async fn send_command(
  endpoint: &Endpoint,
  command: &MpvCommand,
  timeout: Duration,
) -> Result<(), CommandSendError> {
  let mut stream = match tokio::time::timeout(timeout, try_connect(endpoint)).await {
    Ok(Ok(stream)) => stream,
    Ok(Err(e)) => return Err(CommandSendError::ConnectionFailed(e)),
    Err(_) => return Err(CommandSendError::Timeout(timeout)),
  };

  let line = command.to_line();
  match tokio::time::timeout(timeout, write_line(&mut stream, &line)).await {
    Ok(Ok(())) => {
      log::info!("Sent to {}: {}", endpoint, line.trim_end());
      Ok(())
    }
    Ok(Err(e)) => Err(CommandSendError::WriteFailed(e)),
    Err(_) => Err(CommandSendError::Timeout(timeout)),
  }
}

/// Tests whether an endpoint has a listener.
#[async_trait]
pub trait Prober: Send + Sync {
  async fn probe(&self, endpoint: &Endpoint) -> bool;
}

/// Delivers a single command to an endpoint.
#[async_trait]
pub trait CommandChannel: Send + Sync {
  async fn send(&self, endpoint: &Endpoint, command: &MpvCommand) -> Result<(), CommandSendError>;
}

/// Probes real sockets/pipes with a per-attempt connect timeout.
#[derive(Debug, Clone)]
pub struct SocketProber {
  timeout: Duration,
}

impl SocketProber {
  pub fn new(timeout: Duration) -> Self {
    Self { timeout }
  }
}

impl Default for SocketProber {
  fn default() -> Self {
    Self::new(DEFAULT_CONNECT_TIMEOUT)
  }
}

#[async_trait]
impl Prober for SocketProber {
  async fn probe(&self, endpoint: &Endpoint) -> bool {
    probe(endpoint, self.timeout).await
  }
}

/// Sends commands over real sockets/pipes.
#[derive(Debug, Clone)]
pub struct IpcChannel {
  timeout: Duration,
}

impl IpcChannel {
  pub fn new(timeout: Duration) -> Self {
    Self { timeout }
  }
}

impl Default for IpcChannel {
  fn default() -> Self {
    Self::new(DEFAULT_CONNECT_TIMEOUT)
  }
}

#[async_trait]
impl CommandChannel for IpcChannel {
  async fn send(&self, endpoint: &Endpoint, command: &MpvCommand) -> Result<(), CommandSendError> {
    send_command(endpoint, command, self.timeout).await
  }
}
