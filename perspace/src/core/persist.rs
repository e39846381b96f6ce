use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{config_dir, WorkspaceIndex};

pub const SAVED_BINDINGS_FILE: &str = "saved-bindings.json";
pub const WALLPAPER_GROUPS_FILE: &str = "wallpaper-groups.json";

/// Host keybindings displaced while enabled, restored verbatim on disable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedBindings(pub BTreeMap<String, Vec<String>>);

impl SavedBindings {
    pub fn default_path() -> PathBuf {
        config_dir().join(SAVED_BINDINGS_FILE)
    }

    /// Missing or malformed files read as empty.
    pub fn load(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    pub fn remove(path: &Path) -> std::io::Result<()> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallpaperGroup {
    pub workspaces: Vec<WorkspaceIndex>,
    pub image: String,
}

/// Which wallpaper belongs to which workspaces. Read-only for the daemon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WallpaperGroups(pub Vec<WallpaperGroup>);

impl WallpaperGroups {
    pub fn default_path() -> PathBuf {
        config_dir().join(WALLPAPER_GROUPS_FILE)
    }

    pub fn load(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// First group listing the workspace wins.
    pub fn image_for(&self, workspace: WorkspaceIndex) -> Option<&str> {
        self.0
            .iter()
            .find(|g| g.workspaces.contains(&workspace))
            .map(|g| g.image.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("perspace-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_saved_bindings_round_trip_on_disk() {
        let path = temp_path("saved-bindings.json");
        let mut saved = SavedBindings::default();
        saved.0.insert(
            "switch-to-workspace-1".to_string(),
            vec!["<Super>Home".to_string()],
        );
        saved.save(&path).unwrap();
        assert_eq!(SavedBindings::load(&path), saved);
        SavedBindings::remove(&path).unwrap();
        assert!(SavedBindings::load(&path).is_empty());
        // Removing twice is fine
        SavedBindings::remove(&path).unwrap();
    }

    #[test]
    fn test_saved_bindings_malformed_reads_empty() {
        let path = temp_path("bad-bindings.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(SavedBindings::load(&path).is_empty());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_wallpaper_lookup() {
        let groups: WallpaperGroups = serde_json::from_str(
            r#"[{"workspaces":[0,1],"image":"/a.png"},{"workspaces":[1,4],"image":"/b.png"}]"#,
        )
        .unwrap();
        assert_eq!(groups.image_for(0), Some("/a.png"));
        assert_eq!(groups.image_for(1), Some("/a.png"));
        assert_eq!(groups.image_for(4), Some("/b.png"));
        assert_eq!(groups.image_for(7), None);
    }

    #[test]
    fn test_wallpaper_missing_file() {
        let groups = WallpaperGroups::load(&temp_path("missing-wallpapers.json"));
        assert_eq!(groups.image_for(0), None);
    }
}
