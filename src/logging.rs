//! Logging init: file under the user's state dir so log lines never mix with
//! the interactive prompts, or stderr (warnings only) when that fails.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,osf_upload=debug";

fn log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("osf-upload")
}

/// Initialize structured logging to `<state dir>/osf-upload/osf-upload.log`.
/// Returns the log file path on success.
pub fn init_logging() -> std::io::Result<PathBuf> {
    let dir = log_dir();
    fs::create_dir_all(&dir)?;
    let path = dir.join("osf-upload.log");

    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!("osf-upload logging initialized at {}", path.display());
    Ok(path)
}

/// Fallback when the log file cannot be opened.
pub fn init_logging_stderr() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
