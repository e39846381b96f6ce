use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::core::Config;

pub fn debug_log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("perspace")
        .join("debug.log")
}

/// Install the subscriber for the daemon. Stderr output follows `RUST_LOG`;
/// with `debug` set in the config, everything at debug level and above is
/// also appended to the debug log.
pub fn init(config: &Config) -> Result<()> {
    let debug_layer = if config.debug {
        let path = debug_log_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open debug log {}", path.display()))?;
        Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::DEBUG),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(EnvFilter::from_default_env()))
        .with(debug_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if config.debug {
        tracing::info!("Debug log enabled at {}", debug_log_path().display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_log_path() {
        let path = debug_log_path();
        assert!(path.ends_with("perspace/debug.log"));
    }
}
