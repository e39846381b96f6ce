use perspace_ipc::{Direction, MaximizeState};

use super::switch::release_constraints;
use super::{DeferredTask, MappingEngine};
use crate::core::{
    raster_sort, relocate, MonitorIndex, Window, WindowId, WindowLocator, WorkspaceIndex,
};
use crate::effect::Effect;
use crate::platform::WindowSystem;

impl MappingEngine {
    /// Send the focused window to another workspace, wherever that workspace lives.
    pub(super) fn move_window_to_workspace<W: WindowSystem>(
        &mut self,
        ws: &W,
        target: WorkspaceIndex,
    ) -> Vec<Effect> {
        let Some(window) = ws.focused_window().and_then(|id| ws.window(id)) else {
            tracing::debug!("No focused window to move");
            return vec![];
        };
        let Some(primary) = self.registry.primary().cloned() else {
            return vec![];
        };
        let windows = ws.windows();
        let locator = WindowLocator::new(&self.registry, &windows);
        let Some(source) = locator
            .monitor_of(&window)
            .and_then(|m| self.registry.get(m))
            .cloned()
        else {
            tracing::debug!("Window {} is off-screen, not moving", window.id);
            return vec![];
        };
        if window.on_all_workspaces && source.is_primary {
            tracing::debug!("Window {} is on all workspaces, not moving", window.id);
            return vec![];
        }
        if locator.owning_workspace(&window, &self.mapper) == Some(target) {
            return vec![];
        }
        tracing::info!("Moving window {} to workspace {}", window.id, target);

        let op = self.gate.begin();
        let mut effects = self.ensure_workspace(target);
        match self
            .mapper
            .monitor_for_workspace(target)
            .and_then(|m| self.registry.get(m))
            .cloned()
        {
            Some(dest) => {
                if !dest.is_primary {
                    effects.extend(release_constraints(&window));
                }
                effects.extend(Effect::relocate(
                    window.id,
                    relocate(&window.frame, &source, &dest),
                    dest.index,
                ));
                let workspace = if dest.is_primary {
                    target
                } else {
                    self.primary_workspace().unwrap_or_else(|| ws.active_workspace())
                };
                effects.push(Effect::SetWindowWorkspace {
                    window_id: window.id,
                    workspace,
                });
            }
            None => {
                // Park it on the primary under the hidden workspace and remember
                // where it sat so it comes back there.
                self.placement.stash_position(&window, &source, target);
                if !source.is_primary {
                    effects.extend(Effect::relocate(
                        window.id,
                        relocate(&window.frame, &source, &primary),
                        primary.index,
                    ));
                }
                effects.push(Effect::SetWindowWorkspace {
                    window_id: window.id,
                    workspace: target,
                });
            }
        }

        let refocus = self.config.delays.refocus();
        effects.push(self.schedule(
            refocus,
            DeferredTask::RefocusAfterSwitch {
                op,
                monitor: source.index,
            },
        ));
        self.settle_operation(ws, op, &mut effects);
        effects
    }

    /// Move the pointer to a monitor and focus something there.
    pub(super) fn warp_to_monitor<W: WindowSystem>(
        &mut self,
        ws: &W,
        monitor: MonitorIndex,
    ) -> Vec<Effect> {
        let Some(mon) = self.registry.get(monitor).cloned() else {
            return vec![];
        };
        let workspace = self.mapper.workspace_for_monitor(monitor);
        let windows = ws.windows();
        let locator = WindowLocator::new(&self.registry, &windows);
        let visible = locator.windows_visible_on_monitor_for_workspace(monitor, workspace);

        let target = self
            .focus
            .last_focused(workspace)
            .and_then(|id| visible.iter().find(|w| w.id == id).copied())
            .or_else(|| visible.iter().max_by_key(|w| w.stack_order).copied());

        match target {
            Some(window) => {
                tracing::info!("Warping to monitor {} (window {})", monitor, window.id);
                vec![
                    Effect::WarpPointer {
                        point: window.center(),
                    },
                    Effect::FocusWindow {
                        window_id: window.id,
                    },
                ]
            }
            None => {
                tracing::info!("Warping to empty monitor {}", monitor);
                vec![Effect::WarpPointer {
                    point: mon.frame.center(),
                }]
            }
        }
    }

    /// Focus the next or previous window on the pointer's monitor in raster order.
    pub(super) fn cycle_focus<W: WindowSystem>(
        &mut self,
        ws: &W,
        direction: Direction,
    ) -> Vec<Effect> {
        let Some(monitor) = self.acting_monitor(ws) else {
            return vec![];
        };
        let workspace = self.mapper.workspace_for_monitor(monitor);
        let windows = ws.windows();
        let locator = WindowLocator::new(&self.registry, &windows);
        let mut visible = locator.windows_visible_on_monitor_for_workspace(monitor, workspace);
        raster_sort(&mut visible);

        let Some(target) = neighbour(&visible, ws.focused_window(), direction) else {
            return vec![];
        };
        tracing::debug!("Cycling focus to window {}", target.id);
        let mut effects = vec![Effect::FocusWindow {
            window_id: target.id,
        }];
        if self.config.raise_on_cycle_focus {
            effects.push(Effect::RaiseWindow {
                window_id: target.id,
            });
        }
        effects
    }

    /// Exchange frames between the focused window and its raster neighbour.
    pub(super) fn swap_window<W: WindowSystem>(
        &mut self,
        ws: &W,
        direction: Direction,
    ) -> Vec<Effect> {
        let Some(focused) = ws.focused_window().and_then(|id| ws.window(id)) else {
            return vec![];
        };
        let windows = ws.windows();
        let locator = WindowLocator::new(&self.registry, &windows);
        let Some(monitor) = locator.monitor_of(&focused) else {
            return vec![];
        };
        let workspace = self.mapper.workspace_for_monitor(monitor);
        let mut visible = locator.windows_visible_on_monitor_for_workspace(monitor, workspace);
        if visible.len() < 2 {
            return vec![];
        }
        raster_sort(&mut visible);
        let Some(other) = neighbour(&visible, Some(focused.id), direction).cloned() else {
            return vec![];
        };
        if other.id == focused.id {
            return vec![];
        }
        tracing::info!("Swapping window {} with window {}", focused.id, other.id);

        let op = self.gate.begin();
        let mut effects = Vec::new();
        for (window, dest) in [(&focused, &other), (&other, &focused)] {
            effects.extend(release_constraints(window));
            effects.push(Effect::MoveResizeWindow {
                window_id: window.id,
                rect: dest.frame,
            });
        }
        // Maximize and fullscreen trade places along with the frames
        let delay = self.config.delays.maximize_restore();
        for (window, source) in [(&focused, &other), (&other, &focused)] {
            if source.is_constrained() {
                effects.push(self.schedule(
                    delay,
                    DeferredTask::RestoreWindowState {
                        op,
                        window_id: window.id,
                        maximized: source.maximized,
                        fullscreen: source.fullscreen,
                    },
                ));
            }
        }
        self.settle_operation(ws, op, &mut effects);
        effects
    }

    pub(super) fn restore_window_state<W: WindowSystem>(
        &self,
        ws: &W,
        window_id: WindowId,
        maximized: MaximizeState,
        fullscreen: bool,
    ) -> Vec<Effect> {
        if ws.window(window_id).is_none() {
            tracing::debug!("Window {} gone before state restore", window_id);
            return vec![];
        }
        let mut effects = Vec::new();
        if maximized.is_maximized() {
            effects.push(Effect::SetMaximized {
                window_id,
                state: maximized,
            });
        }
        if fullscreen {
            effects.push(Effect::SetFullscreen {
                window_id,
                fullscreen: true,
            });
        }
        effects
    }
}

/// Next window after `current` in `direction`, wrapping around. Without a
/// current window in the list, forward starts at the first and backward at the last.
fn neighbour<'a>(
    windows: &[&'a Window],
    current: Option<WindowId>,
    direction: Direction,
) -> Option<&'a Window> {
    if windows.is_empty() {
        return None;
    }
    let len = windows.len();
    let index = match current.and_then(|id| windows.iter().position(|w| w.id == id)) {
        Some(pos) => match direction {
            Direction::Forward => (pos + 1) % len,
            Direction::Backward => (pos + len - 1) % len,
        },
        None => match direction {
            Direction::Forward => 0,
            Direction::Backward => len - 1,
        },
    };
    windows.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::create_test_window;

    #[test]
    fn test_neighbour_wraps() {
        let a = create_test_window(1, 0, 0, 10, 10, 0);
        let b = create_test_window(2, 100, 0, 10, 10, 0);
        let c = create_test_window(3, 200, 0, 10, 10, 0);
        let list = vec![&a, &b, &c];
        assert_eq!(neighbour(&list, Some(3), Direction::Forward).map(|w| w.id), Some(1));
        assert_eq!(neighbour(&list, Some(1), Direction::Backward).map(|w| w.id), Some(3));
        assert_eq!(neighbour(&list, Some(2), Direction::Forward).map(|w| w.id), Some(3));
        assert_eq!(neighbour(&list, None, Direction::Forward).map(|w| w.id), Some(1));
        assert_eq!(neighbour(&list, Some(9), Direction::Backward).map(|w| w.id), Some(3));
        assert!(neighbour(&[], None, Direction::Forward).is_none());
    }
}
