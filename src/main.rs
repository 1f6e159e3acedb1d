//! mpv-link CLI
//!
//! Opens a media link in its own mpv instance, reusing the one already
//! running for that link. Exits with status 2 when the host should handle the
//! link itself instead.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use mpv_link::link;
use mpv_link::{MediaReference, OpenError, PlayerConfig, SeekStatus, SessionManager};

/// Exit status asking the caller to fall back to its default link handling.
const EXIT_FALLBACK: u8 = 2;

#[derive(Parser)]
#[command(name = "mpv-link")]
#[command(version, about = "Open media links in a per-link mpv instance")]
struct Cli {
  /// URL or file path, optionally ending in `#t=<offset>`
  link: String,

  /// Start offset: seconds, [[hh:]mm:]ss or a percentage. Overrides `#t=`
  #[arg(short, long)]
  start: Option<String>,

  /// Path to configuration file
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// MPV executable (overrides the configuration)
  #[arg(long)]
  mpv: Option<PathBuf>,

  /// Directory relative file links are resolved against (default: cwd)
  #[arg(long)]
  base_dir: Option<PathBuf>,

  /// Open any URL or file, not only known video links
  #[arg(short, long)]
  force: bool,

  /// Print the IPC endpoint for the link and exit
  #[arg(long)]
  print_endpoint: bool,

  /// Enable verbose output
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  match run(cli).await {
    Ok(code) => code,
    Err(e) => {
      eprintln!("Error: {:#}", e);
      ExitCode::FAILURE
    }
  }
}

async fn run(cli: Cli) -> Result<ExitCode> {
  let mut config =
    PlayerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
  if let Some(mpv) = &cli.mpv {
    config.mpv_path = Some(mpv.to_string_lossy().into_owned());
  }

  let base_dir = match cli.base_dir {
    Some(dir) => dir,
    None => std::env::current_dir().context("Failed to read current directory")?,
  };

  let Some(resolved) = link::resolve(&cli.link, &base_dir, cli.force) else {
    eprintln!("Not a playable link: {}", cli.link);
    return Ok(ExitCode::from(EXIT_FALLBACK));
  };
  let start = cli.start.or(resolved.start);

  let manager = SessionManager::from_config(&config);
  if cli.print_endpoint {
    println!("{}", manager.endpoint_for(&resolved.source));
    return Ok(ExitCode::SUCCESS);
  }

  let opened = match MediaReference::parse(&resolved.source, start.as_deref()) {
    Ok(reference) => manager.open(&reference).await,
    Err(e) => Err(OpenError::from(e)),
  };

  match opened {
    Ok(report) => {
      log::info!(
        "{} {} on {}",
        if report.launched { "Launched" } else { "Reused" },
        resolved.source,
        report.endpoint
      );
      if report.seek == SeekStatus::Failed {
        log::warn!("Player opened but the seek was not delivered");
      }
      Ok(ExitCode::SUCCESS)
    }
    Err(e) => {
      eprintln!("{}", e);
      Ok(ExitCode::from(EXIT_FALLBACK))
    }
  }
}
