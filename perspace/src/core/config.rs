use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use perspace_ipc::{Modifier, SwitchMode};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "config.json";

/// Directory holding config.json and the persisted state files.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("perspace")
}

/// User-facing settings, read from config.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Modifier for the workspace digit shortcuts. Shift is added for move-window.
    pub modifier: Modifier,
    pub switch_mode: SwitchMode,
    pub warp_pointer_to_focus: bool,
    pub raise_on_cycle_focus: bool,
    /// Mirror log output into the debug log file.
    pub debug: bool,
    /// Accelerator overrides keyed by shortcut name.
    pub bindings: BTreeMap<String, Vec<String>>,
    pub delays: SettleDelays,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modifier: Modifier::default(),
            switch_mode: SwitchMode::default(),
            warp_pointer_to_focus: false,
            raise_on_cycle_focus: true,
            debug: false,
            bindings: BTreeMap::new(),
            delays: SettleDelays::default(),
        }
    }
}

impl Config {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read the config file, falling back to defaults when absent or malformed.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Invalid config {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn default_path() -> PathBuf {
        config_dir().join(CONFIG_FILE)
    }
}

/// Settling delays the host needs before follow-up checks, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleDelays {
    pub pointer_recheck_ms: [u64; 2],
    pub refocus_ms: u64,
    pub maximize_restore_ms: u64,
    pub snapshot_restore_ms: u64,
    pub unlock_refresh_ms: u64,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            pointer_recheck_ms: [50, 150],
            refocus_ms: 100,
            maximize_restore_ms: 150,
            snapshot_restore_ms: 300,
            unlock_refresh_ms: 500,
        }
    }
}

impl SettleDelays {
    /// Pointer position checks: once on the next idle tick, then after each recheck delay.
    pub fn pointer_checks(&self) -> [Duration; 3] {
        [
            Duration::ZERO,
            Duration::from_millis(self.pointer_recheck_ms[0]),
            Duration::from_millis(self.pointer_recheck_ms[1]),
        ]
    }

    pub fn refocus(&self) -> Duration {
        Duration::from_millis(self.refocus_ms)
    }

    pub fn maximize_restore(&self) -> Duration {
        Duration::from_millis(self.maximize_restore_ms)
    }

    pub fn snapshot_restore(&self) -> Duration {
        Duration::from_millis(self.snapshot_restore_ms)
    }

    pub fn unlock_refresh(&self) -> Duration {
        Duration::from_millis(self.unlock_refresh_ms)
    }
}
