//! File logging. The terminal belongs to the UI, so nothing is ever written
//! to stdout or stderr while it runs.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use color_eyre::eyre::{Result, WrapErr, eyre};
use tickcounter_config::{Config, LogConfig};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV: &str = "TICKCOUNTER_LOG";

/// Where log lines go: the configured file, else the platform data dir.
pub fn log_path(config: &LogConfig) -> Option<PathBuf> {
    config.file.clone().or_else(Config::default_log_path)
}

fn filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. Returns the log file in use, if any.
pub fn init(config: &LogConfig) -> Result<Option<PathBuf>> {
    let Some(path) = log_path(config) else {
        return Ok(None);
    };
    let file = open(&path)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter(config))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| eyre!("failed to install the log subscriber: {e}"))?;
    Ok(Some(path))
}

fn open(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("cannot create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("cannot open log file {}", path.display()))
}
