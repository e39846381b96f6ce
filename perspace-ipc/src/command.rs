use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Workspace operations
    SwitchToWorkspace { workspace: usize },
    MoveWindowToWorkspace { workspace: usize },

    // Monitor operations
    WarpToMonitor { monitor: usize },

    // Window operations
    CycleFocus { direction: Direction },
    SwapWindow { direction: Direction },

    // Queries
    GetState,
    ListMonitors,
    ListWindows,

    // Control
    ReloadConfig,
    Quit,
}

impl Command {
    /// Commands that rearrange windows or the mapping and therefore must not
    /// interleave with another in-flight operation.
    pub fn is_switch_class(&self) -> bool {
        matches!(
            self,
            Command::SwitchToWorkspace { .. }
                | Command::MoveWindowToWorkspace { .. }
                | Command::SwapWindow { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchMode {
    /// Exchange workspaces between the acting monitor and the one showing the target.
    #[default]
    Swap,
    /// Move the pointer to the monitor already showing the target.
    Warp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Alt,
    #[default]
    Super,
    Ctrl,
}

impl Modifier {
    pub fn accelerator_prefix(self) -> &'static str {
        match self {
            Modifier::Alt => "<Alt>",
            Modifier::Super => "<Super>",
            Modifier::Ctrl => "<Control>",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { message: String },
    State { state: StateInfo },
    Monitors { monitors: Vec<MonitorInfo> },
    Windows { windows: Vec<WindowInfo> },
}

/// One monitor's entry in the monitor -> workspace mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappingInfo {
    pub monitor: usize,
    pub workspace: usize,
    pub is_primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallpaper: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorInfo {
    pub index: usize,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub is_primary: bool,
    pub workspace: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowInfo {
    pub id: u64,
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Monitor containing the window's centre, if any.
    pub monitor: Option<usize>,
    /// Logical workspace the window belongs to.
    pub workspace: Option<usize>,
    pub is_focused: bool,
    #[serde(default)]
    pub is_pending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateInfo {
    pub enabled: bool,
    pub mappings: Vec<MappingInfo>,
    pub active_workspace: usize,
    pub focused_window_id: Option<u64>,
    pub operation_in_flight: bool,
    pub queued_requests: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_switch_serialization() {
        let cmd = Command::SwitchToWorkspace { workspace: 3 };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"type\":\"switch_to_workspace\""));
        assert!(json.contains("\"workspace\":3"));

        let deserialized: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, cmd);
    }

    #[test]
    fn test_command_with_direction() {
        let json = r#"{"type":"cycle_focus","direction":"backward"}"#;
        let cmd: Command = serde_json::from_str(json).unwrap();
        assert_eq!(
            cmd,
            Command::CycleFocus {
                direction: Direction::Backward
            }
        );
    }

    #[test]
    fn test_unit_commands_parse() {
        let cmd: Command = serde_json::from_str(r#"{"type":"get_state"}"#).unwrap();
        assert_eq!(cmd, Command::GetState);
        let cmd: Command = serde_json::from_str(r#"{"type":"reload_config"}"#).unwrap();
        assert_eq!(cmd, Command::ReloadConfig);
    }

    #[test]
    fn test_switch_class() {
        assert!(Command::SwitchToWorkspace { workspace: 1 }.is_switch_class());
        assert!(Command::SwapWindow {
            direction: Direction::Forward
        }
        .is_switch_class());
        assert!(!Command::WarpToMonitor { monitor: 0 }.is_switch_class());
        assert!(!Command::GetState.is_switch_class());
    }

    #[test]
    fn test_modifier_prefix() {
        assert_eq!(Modifier::Alt.accelerator_prefix(), "<Alt>");
        assert_eq!(Modifier::Super.accelerator_prefix(), "<Super>");
        assert_eq!(Modifier::Ctrl.accelerator_prefix(), "<Control>");
        assert_eq!(Modifier::default(), Modifier::Super);
    }

    #[test]
    fn test_switch_mode_default_is_swap() {
        assert_eq!(SwitchMode::default(), SwitchMode::Swap);
        let mode: SwitchMode = serde_json::from_str("\"warp\"").unwrap();
        assert_eq!(mode, SwitchMode::Warp);
    }

    #[test]
    fn test_response_error_serialization() {
        let resp = Response::Error {
            message: "no such monitor".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("no such monitor"));
    }

    #[test]
    fn test_mapping_info_omits_missing_wallpaper() {
        let info = MappingInfo {
            monitor: 0,
            workspace: 2,
            is_primary: true,
            wallpaper: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("wallpaper"));
    }
}
