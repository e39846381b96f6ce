use perspace_ipc::{MaximizeState, SwitchMode};

use super::{DeferredTask, MappingEngine, OpId, QueuedRequest, SwitchOrigin};
use crate::core::{
    is_valid_workspace, relocate, Monitor, MonitorIndex, Point, Window, WindowLocator,
    WorkspaceIndex,
};
use crate::effect::Effect;
use crate::platform::WindowSystem;

/// Pointer drift tolerated after a switch before it is put back.
const POINTER_DRIFT_THRESHOLD: i32 = 5;

/// Unconfirmed activations kept around; older ones are assumed lost.
const MAX_EXPECTED_ACTIVATIONS: usize = 8;

impl MappingEngine {
    pub(super) fn switch_workspace<W: WindowSystem>(
        &mut self,
        ws: &W,
        monitor: MonitorIndex,
        target: WorkspaceIndex,
        origin: SwitchOrigin,
    ) -> Vec<Effect> {
        let current = self.mapper.workspace_for_monitor(monitor);
        if current == target {
            tracing::debug!("Workspace {} already on monitor {}", target, monitor);
            return vec![];
        }

        match self.mapper.monitor_for_workspace(target) {
            Some(other) if other != monitor => {
                if origin == SwitchOrigin::Request && self.config.switch_mode == SwitchMode::Warp {
                    tracing::info!(
                        "Workspace {} shown on monitor {}, warping there",
                        target,
                        other
                    );
                    return self.warp_to_monitor(ws, other);
                }
                self.swap_monitors(ws, monitor, other, origin)
            }
            _ => self.simple_switch(ws, monitor, target, origin),
        }
    }

    /// Exchange the workspaces shown on two monitors, carrying their windows across.
    fn swap_monitors<W: WindowSystem>(
        &mut self,
        ws: &W,
        a: MonitorIndex,
        b: MonitorIndex,
        origin: SwitchOrigin,
    ) -> Vec<Effect> {
        let (Some(mon_a), Some(mon_b)) = (
            self.registry.get(a).cloned(),
            self.registry.get(b).cloned(),
        ) else {
            return vec![];
        };
        let ws_a = self.mapper.workspace_for_monitor(a);
        let ws_b = self.mapper.workspace_for_monitor(b);
        tracing::info!(
            "Swapping workspace {} (monitor {}) with workspace {} (monitor {})",
            ws_a,
            a,
            ws_b,
            b
        );

        let op = self.begin_switch();
        let pointer = ws.pointer();
        let windows = ws.windows();
        let locator = WindowLocator::new(&self.registry, &windows);
        let from_a = cloned(locator.windows_visible_on_monitor_for_workspace(a, ws_a));
        let from_b = cloned(locator.windows_visible_on_monitor_for_workspace(b, ws_b));

        let mut effects = Vec::new();
        for window in &from_a {
            effects.extend(carry_window(window, &mon_a, &mon_b, ws_a));
        }
        for window in &from_b {
            effects.extend(carry_window(window, &mon_b, &mon_a, ws_b));
        }

        self.mapper.swap(a, b);
        if origin == SwitchOrigin::Request {
            if let Some(primary) = [&mon_a, &mon_b].into_iter().find(|m| m.is_primary) {
                let workspace = self.mapper.workspace_for_monitor(primary.index);
                effects.extend(self.activate(workspace));
            }
        }

        effects.extend(self.finish_switch(ws, op, a, pointer));
        effects
    }

    /// Replace the workspace on one monitor with one that is not shown anywhere.
    fn simple_switch<W: WindowSystem>(
        &mut self,
        ws: &W,
        monitor: MonitorIndex,
        target: WorkspaceIndex,
        origin: SwitchOrigin,
    ) -> Vec<Effect> {
        let Some(mon) = self.registry.get(monitor).cloned() else {
            return vec![];
        };
        let Some(primary) = self.registry.primary().cloned() else {
            return vec![];
        };
        let previous = self.mapper.workspace_for_monitor(monitor);
        tracing::info!(
            "Switching monitor {} from workspace {} to {}",
            monitor,
            previous,
            target
        );

        let op = self.begin_switch();
        let pointer = ws.pointer();
        let windows = ws.windows();
        let locator = WindowLocator::new(&self.registry, &windows);
        let leaving = cloned(locator.windows_visible_on_monitor_for_workspace(monitor, previous));
        let arriving = cloned(locator.parked_windows(target));

        let mut effects = self.ensure_workspace(target);
        if mon.is_primary {
            // The host hides and shows primary windows itself once the
            // workspace is activated; only positions need restoring.
            for window in &leaving {
                self.placement.stash_position(window, &mon, previous);
            }
            for window in &arriving {
                let origin_point = self.placement.restore_position(window, &mon, target);
                if origin_point != window.frame.origin() {
                    effects.extend(Effect::relocate(
                        window.id,
                        window.frame.with_origin(origin_point),
                        mon.index,
                    ));
                }
            }
        } else {
            let active = self.primary_workspace().unwrap_or_else(|| ws.active_workspace());
            for window in &leaving {
                self.placement.stash_position(window, &mon, previous);
                effects.extend(Effect::relocate(
                    window.id,
                    relocate(&window.frame, &mon, &primary),
                    primary.index,
                ));
                effects.push(Effect::SetWindowWorkspace {
                    window_id: window.id,
                    workspace: previous,
                });
            }
            for window in &arriving {
                let rect = match self.placement.take_cached(window.id, target) {
                    Some(offset) => window
                        .frame
                        .with_origin(mon.absolute(offset.x, offset.y))
                        .clamped_within(&mon.frame),
                    None => relocate(&window.frame, &primary, &mon),
                };
                effects.extend(release_constraints(window));
                effects.extend(Effect::relocate(window.id, rect, mon.index));
                // Secondary monitors are exempt from workspace switching,
                // so any workspace keeps the window visible there.
                effects.push(Effect::SetWindowWorkspace {
                    window_id: window.id,
                    workspace: active,
                });
            }
        }

        self.mapper.set_mapping(monitor, target);
        if mon.is_primary && origin == SwitchOrigin::Request {
            effects.extend(self.activate(target));
        }

        effects.extend(self.finish_switch(ws, op, monitor, pointer));
        effects
    }

    fn begin_switch(&mut self) -> OpId {
        self.focus.begin_internal_switch();
        self.gate.begin()
    }

    fn activate(&mut self, workspace: WorkspaceIndex) -> Vec<Effect> {
        if self.expected_activations.len() == MAX_EXPECTED_ACTIVATIONS {
            self.expected_activations.pop_front();
        }
        self.expected_activations.push_back(workspace);
        let mut effects = self.ensure_workspace(workspace);
        effects.push(Effect::ActivateWorkspace { workspace });
        effects
    }

    /// Make sure the host has created workspaces up to `workspace`.
    pub(super) fn ensure_workspace(&mut self, workspace: WorkspaceIndex) -> Vec<Effect> {
        if workspace < self.ensured_workspaces {
            return vec![];
        }
        self.ensured_workspaces = workspace + 1;
        vec![Effect::EnsureWorkspaces {
            count: self.ensured_workspaces,
        }]
    }

    fn finish_switch<W: WindowSystem>(
        &mut self,
        ws: &W,
        op: OpId,
        monitor: MonitorIndex,
        pointer: Point,
    ) -> Vec<Effect> {
        let mut effects = vec![self.mapping_changed(ws)];
        for delay in self.config.delays.pointer_checks() {
            effects.push(self.schedule(delay, DeferredTask::RestorePointer { op, point: pointer }));
        }
        let refocus = self.config.delays.refocus();
        effects.push(self.schedule(refocus, DeferredTask::RefocusAfterSwitch { op, monitor }));
        self.settle_operation(ws, op, &mut effects);
        effects
    }

    pub(super) fn restore_pointer<W: WindowSystem>(&self, ws: &W, point: Point) -> Vec<Effect> {
        let current = ws.pointer();
        if current.drifted_from(point, POINTER_DRIFT_THRESHOLD) {
            tracing::debug!("Pointer drifted to {:?}, restoring {:?}", current, point);
            return vec![Effect::WarpPointer { point }];
        }
        vec![]
    }

    /// Give focus back to the monitor the switch happened on.
    pub(super) fn refocus_after_switch<W: WindowSystem>(
        &self,
        ws: &W,
        monitor: MonitorIndex,
    ) -> Vec<Effect> {
        let workspace = self.mapper.workspace_for_monitor(monitor);
        let windows = ws.windows();
        let locator = WindowLocator::new(&self.registry, &windows);
        let visible = locator.windows_visible_on_monitor_for_workspace(monitor, workspace);

        let remembered = self
            .focus
            .last_focused(workspace)
            .filter(|id| visible.iter().any(|w| w.id == *id));
        let active = self.primary_workspace().unwrap_or_else(|| ws.active_workspace());
        let candidate = remembered.or_else(|| {
            locator
                .window_at_point(ws.pointer(), active)
                .filter(|w| locator.monitor_of(w) == Some(monitor))
                .map(|w| w.id)
        });

        match candidate {
            Some(window_id) if ws.focused_window() != Some(window_id) => {
                tracing::debug!("Refocusing window {} on monitor {}", window_id, monitor);
                vec![Effect::FocusWindow { window_id }]
            }
            _ => vec![],
        }
    }

    pub(super) fn on_active_workspace_changed<W: WindowSystem>(
        &mut self,
        ws: &W,
        workspace: WorkspaceIndex,
    ) -> Vec<Effect> {
        if !is_valid_workspace(workspace) {
            tracing::warn!("Ignoring host switch to workspace {} outside the pool", workspace);
            return vec![];
        }
        if self.confirm_activation(workspace) {
            tracing::debug!("Activation of workspace {} confirmed", workspace);
            return vec![];
        }
        if self.gate.is_busy() {
            self.gate.enqueue(QueuedRequest::ExternalSwitch(workspace));
            return vec![];
        }
        self.on_external_switch(ws, workspace)
    }

    /// Match a host echo against our own activations. Echoes arrive in
    /// request order, so anything queued before the match was superseded.
    fn confirm_activation(&mut self, workspace: WorkspaceIndex) -> bool {
        let Some(pos) = self.expected_activations.iter().position(|w| *w == workspace) else {
            return false;
        };
        self.expected_activations.drain(..=pos);
        true
    }

    /// The host switched workspaces on its own; bring the mapping along.
    pub(super) fn on_external_switch<W: WindowSystem>(
        &mut self,
        ws: &W,
        workspace: WorkspaceIndex,
    ) -> Vec<Effect> {
        let Some(primary) = self.registry.primary_index() else {
            return vec![];
        };
        if self.mapper.workspace_for_monitor(primary) == workspace {
            return vec![];
        }
        tracing::info!("Host activated workspace {} externally", workspace);
        self.switch_workspace(ws, primary, workspace, SwitchOrigin::External)
    }
}

fn cloned(windows: Vec<&Window>) -> Vec<Window> {
    windows.into_iter().cloned().collect()
}

/// Clear maximize and fullscreen; the host refuses to move constrained windows.
pub(super) fn release_constraints(window: &Window) -> Vec<Effect> {
    let mut effects = Vec::new();
    if window.fullscreen {
        effects.push(Effect::SetFullscreen {
            window_id: window.id,
            fullscreen: false,
        });
    }
    if window.maximized.is_maximized() {
        effects.push(Effect::SetMaximized {
            window_id: window.id,
            state: MaximizeState::None,
        });
    }
    effects
}

/// Move a window to another monitor as part of its workspace.
fn carry_window(
    window: &Window,
    from: &Monitor,
    to: &Monitor,
    workspace: WorkspaceIndex,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    if !to.is_primary {
        effects.extend(release_constraints(window));
    }
    effects.extend(Effect::relocate(
        window.id,
        relocate(&window.frame, from, to),
        to.index,
    ));
    if to.is_primary {
        effects.push(Effect::SetWindowWorkspace {
            window_id: window.id,
            workspace,
        });
    }
    effects
}
