//! Per-monitor workspace engine.
//!
//! The host only knows one global workspace. The engine keeps a
//! monitor -> workspace mapping on top of it: the primary monitor shows the
//! host's active workspace, every secondary monitor shows its own mapped
//! workspace, and windows are physically moved between monitors whenever the
//! mapping changes. All entry points are pure with respect to the host: they
//! read through [`WindowSystem`] and return [`Effect`]s for the caller to run.

mod focus;
mod lifecycle;
mod placement;
mod query;
mod switch;
mod tasks;
mod window_ops;


pub use tasks::*;

use std::collections::VecDeque;
use std::time::Duration;

use perspace_ipc::{Command, HostEvent, Response, StateEvent};

use super::{
    is_valid_workspace, Config, FocusTracker, MonitorIndex, MonitorRegistry, PlacementEngine,
    SavedBindings, ShortcutAction, WallpaperGroups, WindowId, WorkspaceIndex, WorkspaceMapper,
    WORKSPACE_COUNT,
};
use crate::effect::{CommandResult, Effect};
use crate::platform::WindowSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Disabled,
    /// Waiting for the user to accept the required host settings.
    AwaitingConsent,
    Enabled,
}

pub struct MappingEngine {
    config: Config,
    registry: MonitorRegistry,
    mapper: WorkspaceMapper,
    placement: PlacementEngine,
    focus: FocusTracker,
    gate: OperationGate,
    lifecycle: Lifecycle,
    /// Cleared by a host Disable, set again by Enable.
    host_wants_enabled: bool,
    saved_bindings: SavedBindings,
    wallpapers: WallpaperGroups,
    /// Workspaces we asked the host to activate, oldest first. Their echoes
    /// are not external changes.
    expected_activations: VecDeque<WorkspaceIndex>,
    ensured_workspaces: usize,
    bound_shortcuts: Vec<String>,
}

impl MappingEngine {
    pub fn new(config: Config, saved_bindings: SavedBindings, wallpapers: WallpaperGroups) -> Self {
        Self {
            config,
            registry: MonitorRegistry::default(),
            mapper: WorkspaceMapper::new(),
            placement: PlacementEngine::new(),
            focus: FocusTracker::new(),
            gate: OperationGate::new(),
            lifecycle: Lifecycle::Disabled,
            host_wants_enabled: true,
            saved_bindings,
            wallpapers,
            expected_activations: VecDeque::new(),
            ensured_workspaces: 0,
            bound_shortcuts: Vec::new(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_enabled(&self) -> bool {
        self.lifecycle == Lifecycle::Enabled
    }

    pub fn registry(&self) -> &MonitorRegistry {
        &self.registry
    }

    pub fn mapper(&self) -> &WorkspaceMapper {
        &self.mapper
    }

    pub fn placement(&self) -> &PlacementEngine {
        &self.placement
    }

    pub fn focus(&self) -> &FocusTracker {
        &self.focus
    }

    pub fn gate(&self) -> &OperationGate {
        &self.gate
    }

    pub fn saved_bindings(&self) -> &SavedBindings {
        &self.saved_bindings
    }

    pub fn set_wallpapers(&mut self, wallpapers: WallpaperGroups) {
        self.wallpapers = wallpapers;
    }

    pub fn handle_host_event<W: WindowSystem>(&mut self, ws: &W, event: &HostEvent) -> Vec<Effect> {
        match event {
            HostEvent::Enable => {
                self.host_wants_enabled = true;
                self.enable(ws)
            }
            HostEvent::Disable => {
                self.host_wants_enabled = false;
                self.disable(ws)
            }
            HostEvent::ConsentReply { accepted } => self.on_consent_reply(ws, *accepted),
            HostEvent::Snapshot { .. } => match self.lifecycle {
                Lifecycle::Disabled if self.host_wants_enabled => self.enable(ws),
                // Bridge reconnected: resynchronize like a hot-plug
                Lifecycle::Enabled => self.on_monitors_changed(ws),
                _ => vec![],
            },
            _ if !self.is_enabled() => vec![],
            HostEvent::WindowCreated { window } => self.on_window_created(ws, window.id),
            HostEvent::WindowDestroyed { window_id } => {
                self.on_window_destroyed(*window_id);
                vec![]
            }
            HostEvent::FocusChanged { window_id } => self.on_focus_changed(ws, *window_id),
            HostEvent::ActiveWorkspaceChanged { workspace } => {
                self.on_active_workspace_changed(ws, *workspace)
            }
            HostEvent::MonitorsChanged { .. } => self.on_monitors_changed(ws),
            HostEvent::SessionModeChanged { mode } => self.on_session_mode_changed(ws, *mode),
            HostEvent::ShortcutActivated { name } => self.on_shortcut(ws, name),
            HostEvent::Hello { .. } | HostEvent::WindowChanged { .. } | HostEvent::PointerMoved { .. } => {
                vec![]
            }
        }
    }

    pub fn process_command<W: WindowSystem>(&mut self, ws: &W, cmd: &Command) -> CommandResult {
        match cmd {
            Command::GetState => CommandResult::with_response(Response::State {
                state: self.state_info(ws),
            }),
            Command::ListMonitors => CommandResult::with_response(Response::Monitors {
                monitors: self.monitor_info(),
            }),
            Command::ListWindows => CommandResult::with_response(Response::Windows {
                windows: self.window_info(ws),
            }),
            // Handled by the daemon loop
            Command::ReloadConfig | Command::Quit => CommandResult::ok(),
            _ if !self.is_enabled() => CommandResult::error("perspace is disabled"),
            _ if cmd.is_switch_class() && self.gate.is_busy() => {
                self.gate.enqueue(QueuedRequest::Command(cmd.clone()));
                CommandResult::ok()
            }
            _ => self.run_command(ws, cmd),
        }
    }

    fn run_command<W: WindowSystem>(&mut self, ws: &W, cmd: &Command) -> CommandResult {
        match cmd {
            Command::SwitchToWorkspace { workspace } => {
                if !is_valid_workspace(*workspace) {
                    return CommandResult::error(format!(
                        "Workspace {} out of range (0-{})",
                        workspace,
                        WORKSPACE_COUNT - 1
                    ));
                }
                let Some(monitor) = self.acting_monitor(ws) else {
                    return CommandResult::error("No monitors");
                };
                CommandResult::ok_with_effects(self.switch_workspace(
                    ws,
                    monitor,
                    *workspace,
                    SwitchOrigin::Request,
                ))
            }
            Command::MoveWindowToWorkspace { workspace } => {
                if !is_valid_workspace(*workspace) {
                    return CommandResult::error(format!(
                        "Workspace {} out of range (0-{})",
                        workspace,
                        WORKSPACE_COUNT - 1
                    ));
                }
                CommandResult::ok_with_effects(self.move_window_to_workspace(ws, *workspace))
            }
            Command::WarpToMonitor { monitor } => {
                if self.registry.get(*monitor).is_none() {
                    return CommandResult::error(format!("Monitor {} not found", monitor));
                }
                CommandResult::ok_with_effects(self.warp_to_monitor(ws, *monitor))
            }
            Command::CycleFocus { direction } => {
                CommandResult::ok_with_effects(self.cycle_focus(ws, *direction))
            }
            Command::SwapWindow { direction } => {
                CommandResult::ok_with_effects(self.swap_window(ws, *direction))
            }
            Command::GetState
            | Command::ListMonitors
            | Command::ListWindows
            | Command::ReloadConfig
            | Command::Quit => CommandResult::ok(),
        }
    }

    pub fn run_task<W: WindowSystem>(&mut self, ws: &W, task: DeferredTask) -> Vec<Effect> {
        if !self.is_enabled() {
            tracing::debug!("Dropping {:?} while disabled", task);
            return vec![];
        }
        let op = task.op();
        let mut effects = match task {
            DeferredTask::PlaceNewWindow { window_id, target } => {
                self.place_new_window(ws, window_id, target)
            }
            DeferredTask::RestorePointer { point, .. } => self.restore_pointer(ws, point),
            DeferredTask::RefocusAfterSwitch { monitor, .. } => {
                self.refocus_after_switch(ws, monitor)
            }
            DeferredTask::RestoreWindowState {
                window_id,
                maximized,
                fullscreen,
                ..
            } => self.restore_window_state(ws, window_id, maximized, fullscreen),
            DeferredTask::RestorePreserved => self.restore_preserved(ws),
            DeferredTask::RefreshAfterUnlock => self.refresh_after_unlock(ws),
        };
        if let Some(op) = op {
            if self.gate.complete(op) {
                effects.extend(self.finish_operation(ws));
            }
        }
        effects
    }

    /// The operation ended: release the focus guard and start queued requests
    /// until one of them goes in flight.
    fn finish_operation<W: WindowSystem>(&mut self, ws: &W) -> Vec<Effect> {
        self.focus.end_internal_switch();
        let mut effects = Vec::new();
        while !self.gate.is_busy() {
            let Some(request) = self.gate.pop() else {
                break;
            };
            tracing::debug!("Running queued {:?}", request);
            match request {
                QueuedRequest::Command(cmd) => {
                    let result = self.run_command(ws, &cmd);
                    if let Response::Error { message } = &result.response {
                        tracing::warn!("Queued {:?} failed: {}", cmd, message);
                    }
                    effects.extend(result.effects);
                }
                QueuedRequest::ExternalSwitch(workspace) => {
                    effects.extend(self.on_external_switch(ws, workspace));
                }
            }
        }
        effects
    }

    /// End `op` immediately when it scheduled no follow-up work.
    fn settle_operation<W: WindowSystem>(&mut self, ws: &W, op: OpId, effects: &mut Vec<Effect>) {
        if self.gate.settle(op) {
            effects.extend(self.finish_operation(ws));
        }
    }

    fn schedule(&mut self, delay: Duration, task: DeferredTask) -> Effect {
        if let Some(op) = task.op() {
            self.gate.track(op);
        }
        Effect::Schedule { delay, task }
    }

    /// Monitor under the pointer, else the focused window's, else the primary.
    fn acting_monitor<W: WindowSystem>(&self, ws: &W) -> Option<MonitorIndex> {
        if let Some(m) = self.registry.at_point(ws.pointer()) {
            return Some(m.index);
        }
        ws.focused_window()
            .and_then(|id| ws.window(id))
            .and_then(|w| self.registry.at_point(w.center()))
            .map(|m| m.index)
            .or_else(|| self.registry.primary_index())
    }

    /// Workspace shown on the primary monitor, which the host treats as active.
    fn primary_workspace(&self) -> Option<WorkspaceIndex> {
        self.registry
            .primary_index()
            .map(|p| self.mapper.workspace_for_monitor(p))
    }

    fn mapping_changed<W: WindowSystem>(&self, ws: &W) -> Effect {
        Effect::Notify(StateEvent::MappingChanged {
            mappings: self.mapping_info(),
            active_workspace: self
                .primary_workspace()
                .unwrap_or_else(|| ws.active_workspace()),
        })
    }

    fn on_window_destroyed(&mut self, window_id: WindowId) {
        tracing::debug!("Window {} destroyed", window_id);
        self.placement.forget_window(window_id);
        self.focus.forget_window(window_id);
    }

    fn on_shortcut<W: WindowSystem>(&mut self, ws: &W, name: &str) -> Vec<Effect> {
        let Some(action) = ShortcutAction::parse(name) else {
            tracing::warn!("Unknown shortcut: {}", name);
            return vec![];
        };
        tracing::debug!("Shortcut {} -> {:?}", name, action);
        let result = self.process_command(ws, &action.to_command());
        if let Response::Error { message } = &result.response {
            tracing::warn!("Shortcut {} failed: {}", name, message);
        }
        result.effects
    }
}

/// Who initiated a workspace switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwitchOrigin {
    /// Our own shortcut or command; we activate the workspace ourselves.
    Request,
    /// The host already changed its active workspace.
    External,
}
