//! IPC endpoint naming.
//!
//! Every media source gets its own endpoint, so a player launched for one link
//! can be found again (and seeked) the next time that link is opened.
//!
//! The token is the lowercase hex of the source when it fits the platform's
//! name budget, otherwise a SHA-256 digest cut to what fits. Hex rather than
//! base64 because Windows pipe names and default macOS filesystems compare
//! case-insensitively.

use std::fmt;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

const NAME_PREFIX: &str = "mpv-link-";

/// Marker for a reversible (hex) token.
const ENCODED_MARKER: char = 'x';
/// Marker for a digest token.
const DIGEST_MARKER: char = 'h';
/// Shortest digest token body, in hex characters (128 bits).
const MIN_DIGEST_HEX: usize = 32;

#[cfg(windows)]
const PIPE_NAMESPACE: &str = r"\\.\pipe\";
/// Pipe names are limited to 256 characters including the namespace.
#[cfg(windows)]
const MAX_PIPE_NAME_LEN: usize = 256;

#[cfg(not(windows))]
const SOCKET_SUFFIX: &str = ".sock";
/// `sun_path` is 104 bytes on macOS and 108 on Linux, NUL included.
#[cfg(not(windows))]
const MAX_SOCKET_PATH_LEN: usize = 103;
/// Used when the configured socket directory leaves no room for a token.
#[cfg(not(windows))]
const FALLBACK_SOCKET_DIR: &str = "/tmp";

/// Address of a local IPC endpoint (named pipe or unix socket path).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for Endpoint {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// Default directory for unix sockets: the user runtime dir, else the temp dir.
pub fn default_socket_dir() -> PathBuf {
  dirs::runtime_dir().unwrap_or_else(std::env::temp_dir)
}

/// Derives endpoints from media sources.
#[derive(Debug, Clone)]
pub struct EndpointNamer {
  socket_dir: PathBuf,
}

impl Default for EndpointNamer {
  fn default() -> Self {
    Self::new(default_socket_dir())
  }
}

impl EndpointNamer {
  /// Create a namer placing unix sockets under `socket_dir`.
  ///
  /// The directory is ignored on Windows, where endpoints are named pipes.
  pub fn new(socket_dir: impl Into<PathBuf>) -> Self {
    Self {
      socket_dir: socket_dir.into(),
    }
  }

  /// Derive the endpoint for `source`. Pure and deterministic.
  #[cfg(windows)]
  pub fn derive(&self, source: &str) -> Endpoint {
    let budget = MAX_PIPE_NAME_LEN - PIPE_NAMESPACE.len() - NAME_PREFIX.len();
    let token = source_token(source, budget).unwrap_or_else(|| digest_token(source, budget));
    Endpoint(format!("{PIPE_NAMESPACE}{NAME_PREFIX}{token}"))
  }

  /// Derive the endpoint for `source`. Pure and deterministic.
  ///
  /// The result always fits `sun_path`. A socket directory too long to hold
  /// even a minimal digest token is swapped for `/tmp`.
  #[cfg(not(windows))]
  pub fn derive(&self, source: &str) -> Endpoint {
    let token_budget = |dir: &std::path::Path| {
      let fixed = dir.as_os_str().len() + 1 + NAME_PREFIX.len() + SOCKET_SUFFIX.len();
      MAX_SOCKET_PATH_LEN.saturating_sub(fixed)
    };

    let (dir, token) = match source_token(source, token_budget(self.socket_dir.as_path())) {
      Some(token) => (self.socket_dir.as_path(), token),
      None => {
        let dir = std::path::Path::new(FALLBACK_SOCKET_DIR);
        log::debug!(
          "Socket dir {} too long for an endpoint, using {}",
          self.socket_dir.display(),
          FALLBACK_SOCKET_DIR
        );
        let budget = token_budget(dir);
        let token = source_token(source, budget).unwrap_or_else(|| digest_token(source, budget));
        (dir, token)
      }
    };

    let path = dir.join(format!("{NAME_PREFIX}{token}{SOCKET_SUFFIX}"));
    Endpoint(path.to_string_lossy().into_owned())
  }
}

/// Encode `source` into a token of at most `budget` characters.
///
/// Returns `None` when not even a minimal digest token fits.
fn source_token(source: &str, budget: usize) -> Option<String> {
  if source.len() * 2 < budget {
    let mut token = String::with_capacity(source.len() * 2 + 1);
    token.push(ENCODED_MARKER);
    token.push_str(&hex::encode(source.as_bytes()));
    return Some(token);
  }
  if budget > MIN_DIGEST_HEX {
    return Some(digest_token(source, budget));
  }
  None
}

/// Digest token of at most `budget` characters, never shorter than the
/// minimal digest.
fn digest_token(source: &str, budget: usize) -> String {
  let digest = hex::encode(Sha256::digest(source.as_bytes()));
  let len = budget.saturating_sub(1).clamp(MIN_DIGEST_HEX, digest.len());
  let mut token = String::with_capacity(len + 1);
  token.push(DIGEST_MARKER);
  token.push_str(&digest[..len]);
  token
}

/// Recover the source from a reversible token, if it is one.
#[cfg(test)]
fn decode_token(token: &str) -> Option<String> {
  let hex = token.strip_prefix(ENCODED_MARKER)?;
  let bytes = hex::decode(hex).ok()?;
  String::from_utf8(bytes).ok()
}
