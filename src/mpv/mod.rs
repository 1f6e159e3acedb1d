//! MPV session module - one detached MPV per link, controlled over IPC.
//!
//! Architecture:
//! - `endpoint.rs` - Per-link IPC endpoint names (Named Pipes on Windows, Unix Sockets elsewhere)
//! - `ipc.rs` - Liveness probes and one-shot command delivery
//! - `process.rs` - MPV binary detection and detached process spawning
//! - `protocol.rs` - Text command serialization
//! - `session.rs` - Reuse-or-launch decision, readiness wait and seek

mod endpoint;
mod ipc;
mod process;
mod protocol;
mod session;

pub use endpoint::{default_socket_dir, Endpoint, EndpointNamer};
pub use ipc::{
  probe, send_command, try_probe, CommandChannel, CommandSendError, IpcChannel, ProbeError, Prober,
  SocketProber, DEFAULT_CONNECT_TIMEOUT,
};
pub use process::{
  build_args, find_mpv, spawn_detached, LaunchOutcome, Launcher, ProcessLauncher, SpawnError,
};
pub use protocol::MpvCommand;
pub use session::{OpenError, OpenReport, SeekStatus, SessionConfig, SessionManager};
