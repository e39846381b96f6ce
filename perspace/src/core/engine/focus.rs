use perspace_ipc::StateEvent;

use super::MappingEngine;
use crate::core::{WindowId, WindowLocator};
use crate::effect::Effect;
use crate::platform::WindowSystem;

impl MappingEngine {
    pub(super) fn on_focus_changed<W: WindowSystem>(
        &mut self,
        ws: &W,
        window_id: Option<WindowId>,
    ) -> Vec<Effect> {
        let windows = ws.windows();
        let locator = WindowLocator::new(&self.registry, &windows);
        let window = window_id.and_then(|id| locator.window(id));
        let workspace = window.and_then(|w| locator.owning_workspace(w, &self.mapper));

        let mut effects = vec![Effect::Notify(StateEvent::WindowFocused {
            window_id,
            workspace,
        })];
        let Some(window) = window else {
            return effects;
        };

        let internal = self.focus.in_internal_switch();
        if !internal {
            if let Some(ws_index) = workspace {
                self.focus.record(ws_index, window.id);
            }
        }
        // Placement focuses the window itself once it has landed
        if self.placement.is_pending(window.id) {
            return effects;
        }

        let pointer = ws.pointer();
        if self.config.warp_pointer_to_focus {
            if window.is_normal() && !window.frame.contains(pointer) {
                tracing::debug!("Warping pointer to focused window {}", window.id);
                effects.push(Effect::WarpPointer {
                    point: window.center(),
                });
            }
            return effects;
        }
        if internal {
            return effects;
        }

        // Keyboard focus drifted to another monitor than the pointer's;
        // give it back to the window under the pointer.
        let window_monitor = locator.monitor_of(window);
        let pointer_monitor = self.registry.at_point(pointer).map(|m| m.index);
        if window_monitor.is_none() || pointer_monitor.is_none() || window_monitor == pointer_monitor {
            return effects;
        }
        let active = self.primary_workspace().unwrap_or_else(|| ws.active_workspace());
        if let Some(under) = locator
            .window_at_point(pointer, active)
            .filter(|w| w.id != window.id && locator.monitor_of(w) == pointer_monitor)
        {
            tracing::debug!(
                "Focus drifted to window {} on monitor {:?}, refocusing window {}",
                window.id,
                window_monitor,
                under.id
            );
            effects.push(Effect::FocusWindow { window_id: under.id });
        }
        effects
    }
}
