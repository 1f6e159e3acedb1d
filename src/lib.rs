//! Open media links in a dedicated mpv instance per link.
//!
//! Hosts call [`open_media`] with a resolved source and optional start offset.
//! If a player for that source is already listening on its IPC endpoint it is
//! reused, otherwise a detached one is launched; a start offset is applied
//! with a best-effort seek.

mod config;
pub mod link;
mod media;
pub mod mpv;

pub use config::{ConfigError, PlayerConfig};
pub use media::{MediaReference, ReferenceError, StartOffset};
pub use mpv::{OpenError, OpenReport, SeekStatus, SessionConfig, SessionManager};

/// Open `source` in its player, seeking to `start` when given.
///
/// Fails only when the reference is malformed or the player could not be
/// spawned; callers should fall back to their default handling then.
/// Long-running hosts should keep a [`SessionManager`] instead so its launch
/// guard spans calls.
pub async fn open_media(
  config: &PlayerConfig,
  source: &str,
  start: Option<&str>,
) -> Result<OpenReport, OpenError> {
  let reference = MediaReference::parse(source, start)?;
  SessionManager::from_config(config).open(&reference).await
}
