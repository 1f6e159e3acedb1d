//! Link classification for hosts that intercept clicks.
//!
//! Turns raw link text into a source and optional start offset, or `None` when
//! the host should handle the link itself.

use std::path::{Path, PathBuf};

const VIDEO_LINK_PREFIXES: &[&str] = &[
  "https://www.bilibili.com/video",
  "https://www.youtube.com/watch",
];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogv", "mov", "mkv", "avi", "flv", "m3u"];

/// Fragment carrying a start time on file links, e.g. `clip.mp4#t=90`.
const TIME_FRAGMENT: &str = "t=";

/// A link resolved to something the player can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
  pub source: String,
  pub start: Option<String>,
}

/// Whether `link` points at a supported video site.
pub fn is_video_link(link: &str) -> bool {
  VIDEO_LINK_PREFIXES
    .iter()
    .any(|prefix| link.starts_with(prefix))
}

/// Whether `ext` is a video file extension. Case-insensitive, leading dot allowed.
pub fn is_video_ext(ext: &str) -> bool {
  let ext = ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase();
  VIDEO_EXTENSIONS.contains(&ext.as_str())
}

fn is_url(link: &str) -> bool {
  link.contains("://")
}

/// Split a file link into its path and `#t=` start offset.
///
/// Other fragments (headings, blocks) are dropped. URLs are returned
/// untouched since their fragments belong to the site.
pub fn parse_link(text: &str) -> (&str, Option<&str>) {
  if is_url(text) {
    return (text, None);
  }
  match text.split_once('#') {
    Some((path, fragment)) => {
      let start = fragment
        .strip_prefix(TIME_FRAGMENT)
        .filter(|offset| !offset.is_empty());
      (path, start)
    }
    None => (text, None),
  }
}

/// Resolve link text against `base_dir` (the directory relative file links
/// are rooted at).
///
/// With `any_link` set, every URL and every file is accepted regardless of
/// site or extension.
pub fn resolve(text: &str, base_dir: &Path, any_link: bool) -> Option<ResolvedLink> {
  let text = text.trim();
  if text.is_empty() {
    return None;
  }

  if is_url(text) {
    if !any_link && !is_video_link(text) {
      log::debug!("Not a video link: {}", text);
      return None;
    }
    return Some(ResolvedLink {
      source: text.to_string(),
      start: None,
    });
  }

  let (path, start) = parse_link(text);
  let path = Path::new(path);
  let is_video = path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(is_video_ext);
  if !any_link && !is_video {
    log::debug!("Not a video file: {}", path.display());
    return None;
  }

  let absolute: PathBuf = if path.is_absolute() {
    path.to_path_buf()
  } else {
    base_dir.join(path)
  };

  Some(ResolvedLink {
    source: absolute.to_string_lossy().into_owned(),
    start: start.map(str::to_string),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_video_links() {
    assert!(is_video_link("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
    assert!(is_video_link("https://www.bilibili.com/video/BV1xx411c7mD"));
    assert!(!is_video_link("https://www.youtube.com/channel/abc"));
    assert!(!is_video_link("https://example.com/watch"));
  }

  #[test]
  fn test_video_extensions() {
    for ext in ["mp4", ".mkv", "WEBM", ".M3U"] {
      assert!(is_video_ext(ext), "{ext}");
    }
    for ext in ["md", "png", "", "."] {
      assert!(!is_video_ext(ext), "{ext}");
    }
  }

  #[test]
  fn test_parse_time_fragment() {
    assert_eq!(parse_link("clips/a.mp4#t=90"), ("clips/a.mp4", Some("90")));
    assert_eq!(parse_link("clips/a.mp4#t=01:30"), ("clips/a.mp4", Some("01:30")));
    assert_eq!(parse_link("clips/a.mp4#heading"), ("clips/a.mp4", None));
    assert_eq!(parse_link("clips/a.mp4#t="), ("clips/a.mp4", None));
    assert_eq!(parse_link("clips/a.mp4"), ("clips/a.mp4", None));
    assert_eq!(
      parse_link("https://www.youtube.com/watch?v=x#t=30"),
      ("https://www.youtube.com/watch?v=x#t=30", None)
    );
  }

  #[cfg(unix)]
  #[test]
  fn test_resolve_relative_file() {
    let resolved = resolve("clips/a.mp4#t=90", Path::new("/vault"), false).unwrap();
    assert_eq!(resolved.source, "/vault/clips/a.mp4");
    assert_eq!(resolved.start.as_deref(), Some("90"));

    let resolved = resolve("/media/b.MKV", Path::new("/vault"), false).unwrap();
    assert_eq!(resolved.source, "/media/b.MKV");
    assert!(resolved.start.is_none());
  }

  #[test]
  fn test_resolve_rejects_non_video() {
    let base = Path::new("/vault");
    assert!(resolve("notes/todo.md", base, false).is_none());
    assert!(resolve("https://example.com/page", base, false).is_none());
    assert!(resolve("   ", base, false).is_none());
    assert!(resolve("https://example.com/page", base, true).is_some());
  }

  #[test]
  fn test_resolve_video_url() {
    let resolved = resolve(
      " https://www.youtube.com/watch?v=dQw4w9WgXcQ ",
      Path::new("/vault"),
      false,
    )
    .unwrap();
    assert_eq!(resolved.source, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    assert!(resolved.start.is_none());
  }
}
