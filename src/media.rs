//! Media references handed to the session orchestrator.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
  #[error("Media source is empty")]
  EmptySource,
  #[error("Invalid media source: {0}")]
  InvalidSource(String),
  #[error("Invalid start offset: {0:?}")]
  InvalidOffset(String),
}

/// Playback start position in the player's time syntax.
///
/// Accepts `[+-][[hh:]mm:]ss[.frac]` and `<number>%`. The input text is
/// kept verbatim so the launch argument and the seek command agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOffset(String);

impl StartOffset {
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Whether the offset is a percentage of the file duration.
  pub fn is_percent(&self) -> bool {
    self.0.ends_with('%')
  }

  /// The offset without its trailing `%`, if any.
  pub fn value(&self) -> &str {
    self.0.strip_suffix('%').unwrap_or(&self.0)
  }
}

impl FromStr for StartOffset {
  type Err = ReferenceError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if is_valid_offset(s) {
      Ok(Self(s.to_string()))
    } else {
      Err(ReferenceError::InvalidOffset(s.to_string()))
    }
  }
}

impl fmt::Display for StartOffset {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

fn is_digits(s: &str) -> bool {
  !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal(s: &str) -> bool {
  match s.split_once('.') {
    Some((whole, frac)) => is_digits(whole) && is_digits(frac),
    None => is_digits(s),
  }
}

fn is_valid_offset(s: &str) -> bool {
  let unsigned = s.strip_prefix(&['+', '-'][..]).unwrap_or(s);

  if let Some(percent) = unsigned.strip_suffix('%') {
    return is_decimal(percent);
  }

  let parts: Vec<&str> = unsigned.split(':').collect();
  match parts.split_last() {
    Some((seconds, rest)) if rest.len() <= 2 => {
      is_decimal(seconds) && rest.iter().all(|part| is_digits(part))
    }
    _ => false,
  }
}

/// A media source with an optional start offset.
///
/// Built once per user action and consumed by a single `open` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
  source: String,
  start: Option<StartOffset>,
}

impl MediaReference {
  /// Create a reference that starts playback at the beginning.
  pub fn new(source: impl Into<String>) -> Result<Self, ReferenceError> {
    let source = source.into();
    if source.trim().is_empty() {
      return Err(ReferenceError::EmptySource);
    }
    if source.contains('\0') {
      return Err(ReferenceError::InvalidSource("contains NUL".into()));
    }
    // Would be read as a player option rather than a file.
    if source.starts_with('-') {
      return Err(ReferenceError::InvalidSource(source));
    }
    Ok(Self {
      source,
      start: None,
    })
  }

  /// Parse a source and optional start offset from raw strings.
  pub fn parse(source: &str, start: Option<&str>) -> Result<Self, ReferenceError> {
    let reference = Self::new(source)?;
    match start {
      Some(offset) => Ok(reference.with_start(offset.parse()?)),
      None => Ok(reference),
    }
  }

  pub fn with_start(mut self, start: StartOffset) -> Self {
    self.start = Some(start);
    self
  }

  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn start(&self) -> Option<&StartOffset> {
    self.start.as_ref()
  }
}
