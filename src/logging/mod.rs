//! Tracing initialisation for the `vibe-review` binary.
//!
//! `VIBE_REVIEW_LOG` takes precedence over the verbosity flags. Safe to call
//! more than once; only the first call installs a subscriber.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "VIBE_REVIEW_LOG";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    /// Used by the TUI so log output does not draw over the screen.
    File(PathBuf),
}

/// Default level for the given flags.
pub fn default_level(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Default log file for interactive mode.
pub fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("vibe-review")
        .join("vibe-review.log")
}

pub fn init_tracing(quiet: bool, verbose: u8, sink: LogSink) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level(quiet, verbose)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    // try_init fails only when a subscriber is already installed.
    match sink {
        LogSink::Stderr => {
            builder.with_writer(std::io::stderr).try_init().ok();
        }
        LogSink::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = File::options().create(true).append(true).open(&path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .ok();
        }
    }
    Ok(())
}
