//! Tracing setup for the chapsync binary.
//!
//! Runs log to an append-only file in the XDG state directory. When that file
//! cannot be opened, the CLI falls back to stderr.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Debug for our own crates, info for curl/tokio noise. `RUST_LOG` overrides.
const DEFAULT_FILTER: &str = "info,chapsync=debug,chapsync_core=debug";

pub const LOG_FILE_NAME: &str = "chapsync.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `$XDG_STATE_HOME/chapsync`, usually `~/.local/state/chapsync`.
pub fn log_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chapsync")?;
    Ok(xdg_dirs.get_state_home().join("chapsync"))
}

/// Installs the global subscriber, appending to [`LOG_FILE_NAME`] in [`log_dir`].
/// Returns the log file path.
pub fn init_logging() -> Result<PathBuf> {
    init_logging_in(&log_dir()?)
}

/// Like [`init_logging`] but with an explicit directory. Fails without
/// touching the global subscriber if `dir` or the file cannot be opened.
pub fn init_logging_in(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    let path = dir.join(LOG_FILE_NAME);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))?;

    tracing::info!(log = %path.display(), "chapsync {} logging", env!("CARGO_PKG_VERSION"));
    Ok(path)
}

/// Stderr-only logging. Ignores an already-installed subscriber.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_is_namespaced() {
        if let Ok(dir) = log_dir() {
            assert!(dir.ends_with("chapsync"));
        }
    }

    #[test]
    fn unusable_log_dir_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("state");
        std::fs::write(&blocker, "file").unwrap();
        let err = init_logging_in(&blocker).unwrap_err();
        assert!(format!("{:#}", err).contains("create log dir"));
        assert!(!blocker.join(LOG_FILE_NAME).exists());
    }
}
