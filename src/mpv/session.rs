//! Session manager - coordinates endpoint naming, player launches and seeking.
//!
//! A session is never tracked: whether a player is running for a link is
//! decided by probing its endpoint on every call. Two concurrent calls for the
//! same link may both see "not live" and both launch; the launch guard only
//! narrows that window within this process.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;

use super::endpoint::{Endpoint, EndpointNamer};
use super::ipc::{CommandChannel, IpcChannel, Prober, SocketProber};
use super::process::{LaunchOutcome, Launcher, ProcessLauncher, SpawnError};
use super::protocol::MpvCommand;
use crate::config::PlayerConfig;
use crate::media::{MediaReference, ReferenceError};

/// Failures that abort an open. Seek failures are never among them.
#[derive(Error, Debug)]
pub enum OpenError {
  #[error("Invalid media reference: {0}")]
  InvalidReference(#[from] ReferenceError),
  #[error("Could not start player: {0}")]
  Spawn(#[from] SpawnError),
}

/// Timing for the wait between launch and seek.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
  pub ready_retries: u32,
  pub ready_interval: Duration,
  pub launch_grace: Duration,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      ready_retries: 10,
      ready_interval: Duration::from_millis(10),
      launch_grace: Duration::from_millis(1500),
    }
  }
}

impl From<&PlayerConfig> for SessionConfig {
  fn from(config: &PlayerConfig) -> Self {
    Self {
      ready_retries: config.ready_retries,
      ready_interval: config.ready_interval(),
      launch_grace: config.launch_grace(),
    }
  }
}

/// What happened to the requested seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekStatus {
  /// No start offset was given.
  NotRequested,
  /// The command was written to the endpoint.
  Sent,
  /// Delivery failed; playback itself is unaffected.
  Failed,
}

/// Outcome of a successful open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenReport {
  pub endpoint: Endpoint,
  /// Whether this call started a new player.
  pub launched: bool,
  pub seek: SeekStatus,
}

/// Ensures one player per link and seeks it.
pub struct SessionManager<P = SocketProber, L = ProcessLauncher, C = IpcChannel> {
  namer: EndpointNamer,
  prober: P,
  launcher: L,
  channel: C,
  config: SessionConfig,
  recent_launches: Mutex<HashMap<Endpoint, Instant>>,
}

impl SessionManager<SocketProber, ProcessLauncher, IpcChannel> {
  /// Build a manager talking to real sockets and processes.
  pub fn from_config(config: &PlayerConfig) -> Self {
    Self::with_parts(
      EndpointNamer::new(config.socket_dir()),
      SocketProber::new(config.probe_timeout()),
      ProcessLauncher::new(config.mpv_path(), config.mpv_args.clone()),
      IpcChannel::new(config.probe_timeout()),
      SessionConfig::from(config),
    )
  }
}

impl<P, L, C> SessionManager<P, L, C>
where
  P: Prober,
  L: Launcher,
  C: CommandChannel,
{
  pub fn with_parts(
    namer: EndpointNamer,
    prober: P,
    launcher: L,
    channel: C,
    config: SessionConfig,
  ) -> Self {
    Self {
      namer,
      prober,
      launcher,
      channel,
      config,
      recent_launches: Mutex::new(HashMap::new()),
    }
  }

  /// The endpoint a player for `source` listens on.
  pub fn endpoint_for(&self, source: &str) -> Endpoint {
    self.namer.derive(source)
  }

  /// Open `reference` in its player, launching one if none is listening.
  ///
  /// Without a start offset this returns as soon as the reuse-or-launch
  /// decision is made. With one, it waits for the endpoint within the retry
  /// budget and then sends a single seek, even if the endpoint never came up.
  pub async fn open(&self, reference: &MediaReference) -> Result<OpenReport, OpenError> {
    let endpoint = self.endpoint_for(reference.source());
    log::info!("Opening {} (endpoint: {})", reference.source(), endpoint);

    let alive = self.prober.probe(&endpoint).await;

    let launched = if alive {
      log::info!("Reusing player on {}", endpoint);
      false
    } else if !self.claim_launch(&endpoint) {
      log::info!("Player for {} launched moments ago, not launching again", endpoint);
      false
    } else {
      match self.launcher.launch(reference, &endpoint).await {
        LaunchOutcome::Started { .. } => true,
        LaunchOutcome::Failed(e) => {
          self.release_launch(&endpoint);
          return Err(e.into());
        }
      }
    };

    let seek = match reference.start() {
      None => SeekStatus::NotRequested,
      Some(offset) => {
        if !alive && !self.wait_until_ready(&endpoint).await {
          log::warn!(
            "{} not ready after {} probes, seeking anyway",
            endpoint,
            self.config.ready_retries
          );
        }

        let command = MpvCommand::seek(offset.clone());
        match self.channel.send(&endpoint, &command).await {
          Ok(()) => SeekStatus::Sent,
          Err(e) => {
            log::warn!("Seek to {} on {} failed: {}", offset, endpoint, e);
            SeekStatus::Failed
          }
        }
      }
    };

    Ok(OpenReport {
      endpoint,
      launched,
      seek,
    })
  }

  /// Probe until the endpoint is live or the retry budget runs out.
  async fn wait_until_ready(&self, endpoint: &Endpoint) -> bool {
    for attempt in 1..=self.config.ready_retries {
      if self.prober.probe(endpoint).await {
        log::debug!("{} ready after {} probe(s)", endpoint, attempt);
        return true;
      }
      if attempt < self.config.ready_retries {
        tokio::time::sleep(self.config.ready_interval).await;
      }
    }
    false
  }

  /// Record a launch for `endpoint`, unless one happened within the grace window.
  fn claim_launch(&self, endpoint: &Endpoint) -> bool {
    let grace = self.config.launch_grace;
    if grace.is_zero() {
      return true;
    }

    let now = Instant::now();
    let mut recent = self.recent_launches.lock();
    recent.retain(|_, launched_at| now.duration_since(*launched_at) < grace);
    if recent.contains_key(endpoint) {
      return false;
    }
    recent.insert(endpoint.clone(), now);
    true
  }

  fn release_launch(&self, endpoint: &Endpoint) {
    self.recent_launches.lock().remove(endpoint);
  }
}
