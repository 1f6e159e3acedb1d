//! End-to-end open tests against real unix sockets.
//!
//! `/bin/sh` stands in for mpv: the media "source" is a shell script, so the
//! player arguments end up in its `$@` and are otherwise ignored.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::UnixListener;
use tokio::time::timeout;

use mpv_link::{open_media, OpenError, PlayerConfig, SeekStatus, SessionManager};

fn test_config(socket_dir: &Path, mpv_path: &Path) -> PlayerConfig {
  PlayerConfig {
    mpv_path: Some(mpv_path.to_string_lossy().into_owned()),
    socket_dir: Some(socket_dir.to_string_lossy().into_owned()),
    ready_retries: 5,
    ready_interval_ms: 5,
    launch_grace_ms: 0,
    ..Default::default()
  }
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  let path = dir.join(name);
  std::fs::write(&path, body).unwrap();
  path
}

/// Accept connections until one carries data, returning that data.
async fn next_command(listener: &UnixListener) -> String {
  loop {
    let (mut conn, _) = listener.accept().await.unwrap();
    let mut received = String::new();
    conn.read_to_string(&mut received).await.unwrap();
    if !received.is_empty() {
      return received;
    }
  }
}

#[tokio::test]
async fn test_live_player_is_reused_and_seeked() {
  let dir = tempfile::tempdir().unwrap();
  // Never executed: the player is already running.
  let config = test_config(dir.path(), &dir.path().join("no-such-mpv"));
  let source = "/videos/lecture.mkv";

  let endpoint = SessionManager::from_config(&config).endpoint_for(source);
  let listener = UnixListener::bind(endpoint.as_str()).unwrap();

  let report = open_media(&config, source, Some("30")).await.unwrap();
  assert!(!report.launched);
  assert_eq!(report.seek, SeekStatus::Sent);
  assert_eq!(report.endpoint, endpoint);

  // The probe connection arrives first and carries nothing.
  let (mut probe, _) = listener.accept().await.unwrap();
  let mut probed = Vec::new();
  probe.read_to_end(&mut probed).await.unwrap();
  assert!(probed.is_empty());

  let command = timeout(Duration::from_secs(2), next_command(&listener))
    .await
    .unwrap();
  assert_eq!(command, "seek 30 absolute\n");
}

#[tokio::test]
async fn test_seek_after_player_comes_up() {
  let dir = tempfile::tempdir().unwrap();
  let marker = dir.path().join("started");
  let script = write_script(
    dir.path(),
    "player.sh",
    &format!("touch '{}'\n", marker.display()),
  );
  let mut config = test_config(dir.path(), Path::new("/bin/sh"));
  config.ready_retries = 200;

  let source = script.to_string_lossy().into_owned();
  let endpoint = SessionManager::from_config(&config).endpoint_for(&source);

  // Plays the part of mpv's IPC server: listen once the process has run.
  let server = tokio::spawn({
    let marker = marker.clone();
    let endpoint = endpoint.clone();
    async move {
      while !marker.exists() {
        tokio::time::sleep(Duration::from_millis(2)).await;
      }
      let listener = UnixListener::bind(endpoint.as_str()).unwrap();
      next_command(&listener).await
    }
  });

  let report = open_media(&config, &source, Some("01:30")).await.unwrap();
  assert!(report.launched);
  assert_eq!(report.seek, SeekStatus::Sent);

  let command = timeout(Duration::from_secs(2), server)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(command, "seek 01:30 absolute\n");
}

#[tokio::test]
async fn test_player_that_never_listens_does_not_fail_open() {
  let dir = tempfile::tempdir().unwrap();
  let script = write_script(dir.path(), "silent.sh", "exit 0\n");
  let config = test_config(dir.path(), Path::new("/bin/sh"));

  let report = open_media(&config, &script.to_string_lossy(), Some("30"))
    .await
    .unwrap();
  assert!(report.launched);
  assert_eq!(report.seek, SeekStatus::Failed);
}

#[tokio::test]
async fn test_open_without_start_returns_after_launch() {
  let dir = tempfile::tempdir().unwrap();
  let script = write_script(dir.path(), "silent.sh", "exit 0\n");
  let config = test_config(dir.path(), Path::new("/bin/sh"));

  let report = open_media(&config, &script.to_string_lossy(), None)
    .await
    .unwrap();
  assert!(report.launched);
  assert_eq!(report.seek, SeekStatus::NotRequested);
}

#[tokio::test]
async fn test_spawn_failure_is_reported() {
  let dir = tempfile::tempdir().unwrap();
  let config = test_config(dir.path(), &dir.path().join("no-such-mpv"));

  let result = open_media(&config, "/videos/lecture.mkv", Some("30")).await;
  assert!(matches!(result, Err(OpenError::Spawn(_))));
}

#[tokio::test]
async fn test_invalid_offset_is_rejected_before_launch() {
  let dir = tempfile::tempdir().unwrap();
  let config = test_config(dir.path(), &dir.path().join("no-such-mpv"));

  let result = open_media(&config, "/videos/lecture.mkv", Some("30\nquit")).await;
  assert!(matches!(result, Err(OpenError::InvalidReference(_))));
}
