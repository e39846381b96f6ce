//! Wire protocol between the daemon and the compositor-side bridge.
//!
//! The bridge connects to the host socket, announces itself with
//! [`HostEvent::Hello`], follows with a [`HostEvent::Snapshot`] and then
//! streams incremental events. The daemon answers with [`HostRequest`]s.
//! Both directions are newline-delimited JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Host setting that confines workspaces to the primary monitor.
pub const SETTING_WORKSPACES_ONLY_ON_PRIMARY: &str = "workspaces-only-on-primary";
/// Host setting that lets the compositor add and remove workspaces on its own.
pub const SETTING_DYNAMIC_WORKSPACES: &str = "dynamic-workspaces";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub index: usize,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    #[default]
    Normal,
    Dialog,
    Utility,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaximizeState {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl MaximizeState {
    pub fn is_maximized(self) -> bool {
        self != MaximizeState::None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    /// Compositor-assigned stable sequence number.
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub workspace: usize,
    #[serde(default)]
    pub on_all_workspaces: bool,
    #[serde(default)]
    pub kind: WindowKind,
    #[serde(default)]
    pub skip_taskbar: bool,
    #[serde(default)]
    pub minimized: bool,
    #[serde(default)]
    pub maximized: MaximizeState,
    #[serde(default)]
    pub fullscreen: bool,
    /// Position in the stacking order, higher is closer to the top.
    #[serde(default)]
    pub stack_order: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSettings {
    pub workspaces_only_on_primary: bool,
    pub dynamic_workspaces: bool,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            workspaces_only_on_primary: false,
            dynamic_workspaces: true,
        }
    }
}

impl HostSettings {
    /// Setting keys whose current value blocks per-monitor workspaces.
    pub fn unmet_prerequisites(&self) -> Vec<String> {
        let mut unmet = Vec::new();
        if !self.workspaces_only_on_primary {
            unmet.push(SETTING_WORKSPACES_ONLY_ON_PRIMARY.to_string());
        }
        if self.dynamic_workspaces {
            unmet.push(SETTING_DYNAMIC_WORKSPACES.to_string());
        }
        unmet
    }
}

/// Optional host methods. Absent methods degrade to no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub set_window_monitor: bool,
    #[serde(default)]
    pub raise_window: bool,
    #[serde(default)]
    pub ensure_workspaces: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    User,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Windows,
    Focus,
    Workspace,
    Monitors,
    Session,
    Pointer,
    Shortcuts,
}

impl Topic {
    pub const ALL: [Topic; 7] = [
        Topic::Windows,
        Topic::Focus,
        Topic::Workspace,
        Topic::Monitors,
        Topic::Session,
        Topic::Pointer,
        Topic::Shortcuts,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Hello {
        #[serde(default)]
        capabilities: Capabilities,
    },
    Snapshot {
        monitors: Vec<MonitorSnapshot>,
        windows: Vec<WindowSnapshot>,
        pointer_x: i32,
        pointer_y: i32,
        active_workspace: usize,
        #[serde(default)]
        focused_window_id: Option<u64>,
        #[serde(default)]
        settings: HostSettings,
        #[serde(default)]
        bindings: BTreeMap<String, Vec<String>>,
        #[serde(default)]
        session_mode: SessionMode,
    },
    WindowCreated {
        window: WindowSnapshot,
    },
    WindowChanged {
        window: WindowSnapshot,
    },
    WindowDestroyed {
        window_id: u64,
    },
    FocusChanged {
        window_id: Option<u64>,
    },
    ActiveWorkspaceChanged {
        workspace: usize,
    },
    MonitorsChanged {
        monitors: Vec<MonitorSnapshot>,
    },
    SessionModeChanged {
        mode: SessionMode,
    },
    PointerMoved {
        x: i32,
        y: i32,
    },
    ShortcutActivated {
        name: String,
    },
    ConsentReply {
        accepted: bool,
    },
    Enable,
    Disable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostRequest {
    MoveResizeWindow {
        window_id: u64,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    SetWindowMonitor {
        window_id: u64,
        monitor: usize,
    },
    SetWindowWorkspace {
        window_id: u64,
        workspace: usize,
    },
    ActivateWorkspace {
        workspace: usize,
    },
    EnsureWorkspaces {
        count: usize,
    },
    FocusWindow {
        window_id: u64,
    },
    RaiseWindow {
        window_id: u64,
    },
    WarpPointer {
        x: i32,
        y: i32,
    },
    SetMaximized {
        window_id: u64,
        state: MaximizeState,
    },
    SetFullscreen {
        window_id: u64,
        fullscreen: bool,
    },
    BindShortcut {
        name: String,
        accelerators: Vec<String>,
    },
    UnbindShortcut {
        name: String,
    },
    SetHostBinding {
        key: String,
        accelerators: Vec<String>,
    },
    SetSetting {
        key: String,
        value: bool,
    },
    PromptPrerequisites {
        settings: Vec<String>,
    },
    Subscribe {
        topic: Topic,
    },
    Unsubscribe {
        topic: Topic,
    },
    DisableSelf,
}
