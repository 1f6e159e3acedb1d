//! Player configuration with persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mpv::default_socket_dir;

const CONFIG_DIR_NAME: &str = "mpv-link";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("No configuration directory on this platform")]
  NoConfigDir,
  #[error("Failed to access {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Invalid JSON in {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("Failed to serialize config: {0}")]
  Serialize(#[from] serde_json::Error),
  #[error("Invalid configuration: {0}")]
  Invalid(String),
}

/// Player configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfig {
  /// Custom MPV executable path (None = auto-detect).
  #[serde(default)]
  pub mpv_path: Option<String>,

  /// Additional MPV command-line arguments.
  #[serde(default)]
  pub mpv_args: Vec<String>,

  /// Directory for unix sockets (None = runtime dir, else temp dir).
  #[serde(default)]
  pub socket_dir: Option<String>,

  /// Connect timeout for each probe or command, in milliseconds.
  #[serde(default = "default_probe_timeout_ms")]
  pub probe_timeout_ms: u64,

  /// Probes made while waiting for a new player before seeking.
  #[serde(default = "default_ready_retries")]
  pub ready_retries: u32,

  /// Delay between readiness probes, in milliseconds.
  #[serde(default = "default_ready_interval_ms")]
  pub ready_interval_ms: u64,

  /// Window after a launch during which the same link is not launched again
  /// by this process, in milliseconds. 0 disables the guard.
  #[serde(default = "default_launch_grace_ms")]
  pub launch_grace_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
  300
}

fn default_ready_retries() -> u32 {
  10
}

fn default_ready_interval_ms() -> u64 {
  10
}

fn default_launch_grace_ms() -> u64 {
  1500
}

impl Default for PlayerConfig {
  fn default() -> Self {
    Self {
      mpv_path: None,
      mpv_args: Vec::new(),
      socket_dir: None,
      probe_timeout_ms: default_probe_timeout_ms(),
      ready_retries: default_ready_retries(),
      ready_interval_ms: default_ready_interval_ms(),
      launch_grace_ms: default_launch_grace_ms(),
    }
  }
}

impl PlayerConfig {
  /// Default location: `<config dir>/mpv-link/config.json`.
  pub fn default_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
      .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
      .ok_or(ConfigError::NoConfigDir)
  }

  /// Load from `path`, or from the default location when `None`.
  ///
  /// A missing file at the default location yields defaults; a missing
  /// explicit file is an error.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let (path, explicit) = match path {
      Some(path) => (path.to_path_buf(), true),
      None => (Self::default_path()?, false),
    };

    let contents = match std::fs::read_to_string(&path) {
      Ok(contents) => contents,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Self::default());
      }
      Err(source) => return Err(ConfigError::Io { path, source }),
    };

    let config: Self =
      serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
      })?;
    config.validate()?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
  }

  /// Write as pretty JSON, creating parent directories.
  pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
    self.validate()?;
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }
    let json = serde_json::to_string_pretty(self)?;
    std::fs::write(path, json).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Validate configuration values.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if !(1..=5000).contains(&self.probe_timeout_ms) {
      return Err(ConfigError::Invalid(
        "Probe timeout must be between 1 and 5000 ms".to_string(),
      ));
    }
    if !(1..=1000).contains(&self.ready_retries) {
      return Err(ConfigError::Invalid(
        "Ready retries must be between 1 and 1000".to_string(),
      ));
    }
    if !(1..=10_000).contains(&self.ready_interval_ms) {
      return Err(ConfigError::Invalid(
        "Ready interval must be between 1 and 10000 ms".to_string(),
      ));
    }
    if self.mpv_args.iter().any(|arg| arg.starts_with("--input-ipc-server")) {
      return Err(ConfigError::Invalid(
        "--input-ipc-server is managed per link and cannot be overridden".to_string(),
      ));
    }
    Ok(())
  }

  /// Configured MPV path, treating an empty string as auto-detect.
  pub fn mpv_path(&self) -> Option<PathBuf> {
    self
      .mpv_path
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(PathBuf::from)
  }

  pub fn socket_dir(&self) -> PathBuf {
    self
      .socket_dir
      .as_deref()
      .filter(|s| !s.trim().is_empty())
      .map(PathBuf::from)
      .unwrap_or_else(default_socket_dir)
  }

  pub fn probe_timeout(&self) -> Duration {
    Duration::from_millis(self.probe_timeout_ms)
  }

  pub fn ready_interval(&self) -> Duration {
    Duration::from_millis(self.ready_interval_ms)
  }

  pub fn launch_grace(&self) -> Duration {
    Duration::from_millis(self.launch_grace_ms)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_are_valid() {
    let config = PlayerConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.ready_retries, 10);
    assert_eq!(config.ready_interval(), Duration::from_millis(10));
    assert_eq!(config.probe_timeout(), Duration::from_millis(300));
    assert!(config.mpv_path().is_none());
  }

  #[test]
  fn test_partial_json_fills_defaults() {
    let config: PlayerConfig =
      serde_json::from_str(r#"{"mpvPath":"/opt/mpv/bin/mpv","readyRetries":20}"#).unwrap();
    assert_eq!(config.mpv_path(), Some(PathBuf::from("/opt/mpv/bin/mpv")));
    assert_eq!(config.ready_retries, 20);
    assert_eq!(config.ready_interval_ms, 10);
    assert_eq!(config.launch_grace_ms, 1500);
  }

  #[test]
  fn test_empty_paths_mean_auto() {
    let config = PlayerConfig {
      mpv_path: Some("  ".to_string()),
      socket_dir: Some(String::new()),
      ..Default::default()
    };
    assert!(config.mpv_path().is_none());
    assert_eq!(config.socket_dir(), default_socket_dir());
  }

  #[test]
  fn test_validate_rejects_out_of_range() {
    let config = PlayerConfig {
      ready_retries: 0,
      ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let config = PlayerConfig {
      probe_timeout_ms: 60_000,
      ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let config = PlayerConfig {
      mpv_args: vec!["--input-ipc-server=/tmp/other".to_string()],
      ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
  }

  #[test]
  fn test_load_missing_explicit_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = PlayerConfig::load(Some(&dir.path().join("missing.json")));
    assert!(matches!(result, Err(ConfigError::Io { .. })));
  }

  #[test]
  fn test_load_malformed_json_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
      PlayerConfig::load(Some(&path)),
      Err(ConfigError::Parse { .. })
    ));
  }

  #[test]
  fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");
    let config = PlayerConfig {
      mpv_path: Some("/usr/bin/mpv".to_string()),
      mpv_args: vec!["--fs".to_string()],
      launch_grace_ms: 0,
      ..Default::default()
    };
    config.save(&path).unwrap();

    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("\"mpvArgs\""));
    assert_eq!(PlayerConfig::load(Some(&path)).unwrap(), config);
  }
}
