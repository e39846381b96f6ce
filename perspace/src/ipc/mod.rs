mod bridge;
mod client;
mod event_server;
mod server;

use std::path::Path;

use anyhow::{Context, Result};
use tokio::net::UnixListener;

pub use bridge::HostBridge;
pub use client::{subscribe_and_print, IpcClient};
pub use event_server::{EventBroadcaster, EventServer, EVENT_SOCKET_PATH};
pub use server::{IpcServer, SOCKET_PATH};

/// Bind a listener, replacing a stale socket file left by an earlier run.
fn bind_socket(path: &Path) -> Result<UnixListener> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove stale socket {}", path.display()))?;
    }
    UnixListener::bind(path).with_context(|| format!("Failed to bind {}", path.display()))
}
