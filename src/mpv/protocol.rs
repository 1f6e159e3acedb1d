//! MPV text command protocol.
//!
//! Commands are written to the IPC endpoint as single newline-terminated lines
//! in mpv's input.conf syntax, no JSON and no response handling.
//!
//! Reference: https://mpv.io/manual/master/#input-command-prefixes

use std::fmt;

use crate::media::StartOffset;

/// Command sent to MPV over IPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MpvCommand {
  /// Seek to an absolute position (or percentage of the duration).
  Seek(StartOffset),
}

impl MpvCommand {
  /// Seek to the same position the player would start at with `--start`.
  pub fn seek(offset: StartOffset) -> Self {
    Self::Seek(offset)
  }

  /// Serialize as a newline-terminated line ready to be written.
  pub fn to_line(&self) -> String {
    format!("{self}\n")
  }
}

impl fmt::Display for MpvCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MpvCommand::Seek(offset) if offset.is_percent() => {
        write!(f, "seek {} absolute-percent", offset.value())
      }
      MpvCommand::Seek(offset) => write!(f, "seek {} absolute", offset),
    }
  }
}
