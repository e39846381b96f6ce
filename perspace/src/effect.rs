use std::time::Duration;

use perspace_ipc::{MaximizeState, Response, StateEvent};

use crate::core::{
    DeferredTask, MonitorIndex, Point, Rect, SavedBindings, ShortcutBinding, WindowId,
    WorkspaceIndex,
};
use crate::platform::WindowManipulator;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    MoveResizeWindow {
        window_id: WindowId,
        rect: Rect,
    },
    SetWindowMonitor {
        window_id: WindowId,
        monitor: MonitorIndex,
    },
    SetWindowWorkspace {
        window_id: WindowId,
        workspace: WorkspaceIndex,
    },
    ActivateWorkspace {
        workspace: WorkspaceIndex,
    },
    EnsureWorkspaces {
        count: usize,
    },
    FocusWindow {
        window_id: WindowId,
    },
    RaiseWindow {
        window_id: WindowId,
    },
    WarpPointer {
        point: Point,
    },
    SetMaximized {
        window_id: WindowId,
        state: MaximizeState,
    },
    SetFullscreen {
        window_id: WindowId,
        fullscreen: bool,
    },
    BindShortcuts(Vec<ShortcutBinding>),
    UnbindShortcuts(Vec<String>),
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
    DisableSelf,
    Schedule {
        delay: Duration,
        task: DeferredTask,
    },
    /// Drop every task still waiting in the scheduler.
    CancelScheduled,
    AcquireSubscriptions,
    ReleaseSubscriptions,
    /// Write the displaced host bindings to disk, or delete the file on `None`.
    PersistSavedBindings(Option<SavedBindings>),
    Notify(StateEvent),
}

impl Effect {
    /// Moving a window is a move-resize followed by re-homing it on the target monitor.
    pub fn relocate(window_id: WindowId, rect: Rect, monitor: MonitorIndex) -> [Effect; 2] {
        [
            Effect::MoveResizeWindow { window_id, rect },
            Effect::SetWindowMonitor { window_id, monitor },
        ]
    }

    /// Perform a host-facing effect. Returns false for effects the daemon
    /// loop handles itself.
    pub fn apply_to<M: WindowManipulator>(&self, manipulator: &M) -> bool {
        match self {
            Effect::MoveResizeWindow { window_id, rect } => {
                manipulator.move_resize_window(*window_id, *rect)
            }
            Effect::SetWindowMonitor { window_id, monitor } => {
                manipulator.set_window_monitor(*window_id, *monitor)
            }
            Effect::SetWindowWorkspace {
                window_id,
                workspace,
            } => manipulator.set_window_workspace(*window_id, *workspace),
            Effect::ActivateWorkspace { workspace } => manipulator.activate_workspace(*workspace),
            Effect::EnsureWorkspaces { count } => manipulator.ensure_workspaces(*count),
            Effect::FocusWindow { window_id } => manipulator.focus_window(*window_id),
            Effect::RaiseWindow { window_id } => manipulator.raise_window(*window_id),
            Effect::WarpPointer { point } => manipulator.warp_pointer(*point),
            Effect::SetMaximized { window_id, state } => {
                manipulator.set_maximized(*window_id, *state)
            }
            Effect::SetFullscreen {
                window_id,
                fullscreen,
            } => manipulator.set_fullscreen(*window_id, *fullscreen),
            Effect::BindShortcuts(bindings) => {
                for binding in bindings {
                    manipulator.bind_shortcut(&binding.name, &binding.accelerators);
                }
            }
            Effect::UnbindShortcuts(names) => {
                for name in names {
                    manipulator.unbind_shortcut(name);
                }
            }
            Effect::SetHostBinding { key, accelerators } => {
                manipulator.set_host_binding(key, accelerators)
            }
            Effect::SetSetting { key, value } => manipulator.set_setting(key, *value),
            Effect::PromptPrerequisites { settings } => manipulator.prompt_prerequisites(settings),
            Effect::DisableSelf => manipulator.disable_self(),
            Effect::Schedule { .. }
            | Effect::CancelScheduled
            | Effect::AcquireSubscriptions
            | Effect::ReleaseSubscriptions
            | Effect::PersistSavedBindings(_)
            | Effect::Notify(_) => return false,
        }
        true
    }
}

pub struct CommandResult {
    pub response: Response,
    pub effects: Vec<Effect>,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            response: Response::Ok,
            effects: vec![],
        }
    }

    pub fn ok_with_effects(effects: Vec<Effect>) -> Self {
        Self {
            response: Response::Ok,
            effects,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            response: Response::Error {
                message: message.into(),
            },
            effects: vec![],
        }
    }

    pub fn with_response(response: Response) -> Self {
        Self {
            response,
            effects: vec![],
        }
    }
}
