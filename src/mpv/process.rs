//! MPV process detection and detached spawning.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use super::endpoint::Endpoint;
use crate::media::MediaReference;

#[derive(Error, Debug)]
pub enum SpawnError {
  #[error("MPV executable not found")]
  NotFound,
  #[error("Failed to spawn {}: {source}", path.display())]
  SpawnFailed {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Result of a launch attempt.
#[derive(Debug)]
pub enum LaunchOutcome {
  /// The OS created the process. It may not be listening yet.
  Started { pid: Option<u32> },
  /// The process could not be created.
  Failed(SpawnError),
}

impl LaunchOutcome {
  pub fn started(&self) -> bool {
    matches!(self, LaunchOutcome::Started { .. })
  }
}

/// Starts a player bound to an endpoint.
#[async_trait]
pub trait Launcher: Send + Sync {
  async fn launch(&self, reference: &MediaReference, endpoint: &Endpoint) -> LaunchOutcome;
}

/// Find MPV executable in common locations.
pub fn find_mpv() -> Option<PathBuf> {
  // Check PATH first
  if let Ok(path) = which::which("mpv") {
    return Some(path);
  }

  #[cfg(windows)]
  let common_paths: &[&str] = &[
    r"C:\Program Files\mpv\mpv.exe",
    r"C:\Program Files (x86)\mpv\mpv.exe",
    r"C:\mpv\mpv.exe",
  ];
  #[cfg(target_os = "macos")]
  let common_paths: &[&str] = &[
    "/opt/homebrew/bin/mpv",
    "/usr/local/bin/mpv",
    "/Applications/mpv.app/Contents/MacOS/mpv",
  ];
  #[cfg(not(any(windows, target_os = "macos")))]
  let common_paths: &[&str] = &["/usr/bin/mpv", "/usr/local/bin/mpv"];

  common_paths.iter().map(PathBuf::from).find(|p| p.exists())
}

/// Build the player argument list.
///
/// The source comes first, then the IPC binding, the optional start offset and
/// finally any user-supplied arguments.
pub fn build_args(
  reference: &MediaReference,
  endpoint: &Endpoint,
  extra_args: &[String],
) -> Vec<String> {
  let mut args = vec![
    reference.source().to_string(),
    format!("--input-ipc-server={}", endpoint),
  ];
  if let Some(start) = reference.start() {
    args.push(format!("--start={}", start));
  }
  args.extend(extra_args.iter().cloned());
  args
}

/// Spawn `exe` detached from this process.
///
/// The child gets its own process group (or console-less process group on
/// Windows) and null stdio. The handle is dropped without killing; tokio reaps
/// the child once it exits.
pub fn spawn_detached(exe: &Path, args: &[String]) -> std::io::Result<Option<u32>> {
  let mut cmd = Command::new(exe);
  cmd
    .args(args)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .kill_on_drop(false);

  #[cfg(unix)]
  cmd.process_group(0);

  #[cfg(windows)]
  {
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
  }

  let child = cmd.spawn()?;
  Ok(child.id())
}

/// Launches MPV processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
  mpv_path: Option<PathBuf>,
  extra_args: Vec<String>,
}

impl ProcessLauncher {
  /// Create a launcher. `None` auto-detects MPV on every launch.
  pub fn new(mpv_path: Option<PathBuf>, extra_args: Vec<String>) -> Self {
    Self {
      mpv_path,
      extra_args,
    }
  }

  fn resolve_executable(&self) -> Result<PathBuf, SpawnError> {
    self
      .mpv_path
      .clone()
      .or_else(find_mpv)
      .ok_or(SpawnError::NotFound)
  }

  fn try_launch(
    &self,
    reference: &MediaReference,
    endpoint: &Endpoint,
  ) -> Result<Option<u32>, SpawnError> {
    let mpv_exe = self.resolve_executable()?;
    let args = build_args(reference, endpoint, &self.extra_args);

    log::info!("Spawning MPV: {:?} with IPC: {}", mpv_exe, endpoint);
    log::debug!("MPV args: {:?}", args);

    spawn_detached(&mpv_exe, &args).map_err(|source| SpawnError::SpawnFailed {
      path: mpv_exe,
      source,
    })
  }
}

#[async_trait]
impl Launcher for ProcessLauncher {
  async fn launch(&self, reference: &MediaReference, endpoint: &Endpoint) -> LaunchOutcome {
    match self.try_launch(reference, endpoint) {
      Ok(pid) => {
        log::info!("MPV started (pid: {:?})", pid);
        LaunchOutcome::Started { pid }
      }
      Err(e) => {
        log::error!("Failed to launch MPV for {}: {}", reference.source(), e);
        LaunchOutcome::Failed(e)
      }
    }
  }
}
