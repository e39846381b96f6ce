use std::time::Duration;

use super::{DeferredTask, MappingEngine};
use crate::core::{relocate, MonitorIndex, WindowId, WindowLocator};
use crate::effect::Effect;
use crate::platform::WindowSystem;

impl MappingEngine {
    /// New windows open on the monitor the pointer is on. The host is still
    /// setting the window up when it reports it, so placement waits a tick.
    pub(super) fn on_window_created<W: WindowSystem>(
        &mut self,
        ws: &W,
        window_id: WindowId,
    ) -> Vec<Effect> {
        let Some(window) = ws.window(window_id) else {
            return vec![];
        };
        if !window.is_normal() {
            return vec![];
        }
        let Some(target) = self
            .registry
            .at_point(ws.pointer())
            .or_else(|| self.registry.primary())
            .map(|m| m.index)
        else {
            return vec![];
        };
        tracing::debug!("Window {} created, placing on monitor {}", window_id, target);
        self.placement.mark_pending(window_id, target);
        vec![self.schedule(
            Duration::ZERO,
            DeferredTask::PlaceNewWindow { window_id, target },
        )]
    }

    pub(super) fn place_new_window<W: WindowSystem>(
        &mut self,
        ws: &W,
        window_id: WindowId,
        target: MonitorIndex,
    ) -> Vec<Effect> {
        if self.placement.clear_pending(window_id).is_none() {
            tracing::debug!("Placement of window {} no longer pending", window_id);
            return vec![];
        }
        let Some(window) = ws.window(window_id) else {
            tracing::debug!("Window {} gone before placement", window_id);
            return vec![];
        };
        let Some(dest) = self.registry.get(target).cloned() else {
            return vec![];
        };

        let windows = ws.windows();
        let locator = WindowLocator::new(&self.registry, &windows);
        let current = locator.monitor_of(&window).and_then(|m| self.registry.get(m));

        let mut effects = Vec::new();
        let mut frame = window.frame;
        if current.map(|m| m.index) != Some(dest.index) {
            frame = match current {
                Some(from) => relocate(&window.frame, from, &dest),
                None => window
                    .frame
                    .with_origin(dest.frame.quarter_point())
                    .clamped_within(&dest.frame),
            };
            effects.extend(Effect::relocate(window_id, frame, dest.index));
        }

        let workspace = if dest.is_primary {
            self.mapper.workspace_for_monitor(dest.index)
        } else {
            self.primary_workspace().unwrap_or_else(|| ws.active_workspace())
        };
        tracing::info!(
            "Placed window {} on monitor {} (workspace {})",
            window_id,
            dest.index,
            workspace
        );
        effects.push(Effect::SetWindowWorkspace {
            window_id,
            workspace,
        });
        effects.push(Effect::FocusWindow { window_id });
        if self.config.warp_pointer_to_focus {
            effects.push(Effect::WarpPointer {
                point: frame.center(),
            });
        }
        effects
    }
}
