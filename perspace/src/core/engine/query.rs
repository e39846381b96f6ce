use perspace_ipc::{MappingInfo, MonitorInfo, StateEvent, StateInfo, WindowInfo};

use super::MappingEngine;
use crate::core::WindowLocator;
use crate::platform::WindowSystem;

impl MappingEngine {
    pub fn mapping_info(&self) -> Vec<MappingInfo> {
        self.mapper
            .all_mappings()
            .into_iter()
            .map(|(monitor, workspace)| MappingInfo {
                monitor,
                workspace,
                is_primary: self.registry.is_primary(monitor),
                wallpaper: self.wallpapers.image_for(workspace).map(str::to_string),
            })
            .collect()
    }

    pub fn monitor_info(&self) -> Vec<MonitorInfo> {
        self.registry
            .iter()
            .map(|m| MonitorInfo {
                index: m.index,
                x: m.frame.x,
                y: m.frame.y,
                width: m.frame.width,
                height: m.frame.height,
                is_primary: m.is_primary,
                workspace: self
                    .is_enabled()
                    .then(|| self.mapper.workspace_for_monitor(m.index)),
            })
            .collect()
    }

    pub fn window_info<W: WindowSystem>(&self, ws: &W) -> Vec<WindowInfo> {
        let windows = ws.windows();
        let locator = WindowLocator::new(&self.registry, &windows);
        let focused = ws.focused_window();
        windows
            .iter()
            .filter(|w| w.is_normal())
            .map(|w| WindowInfo {
                id: w.id,
                title: w.title.clone(),
                x: w.frame.x,
                y: w.frame.y,
                width: w.frame.width,
                height: w.frame.height,
                monitor: locator.monitor_of(w),
                workspace: locator.owning_workspace(w, &self.mapper),
                is_focused: focused == Some(w.id),
                is_pending: self.placement.is_pending(w.id),
            })
            .collect()
    }

    pub fn state_info<W: WindowSystem>(&self, ws: &W) -> StateInfo {
        StateInfo {
            enabled: self.is_enabled(),
            mappings: self.mapping_info(),
            active_workspace: ws.active_workspace(),
            focused_window_id: ws.focused_window(),
            operation_in_flight: self.gate.is_busy(),
            queued_requests: self.gate.queued(),
        }
    }

    pub fn snapshot<W: WindowSystem>(&self, ws: &W) -> StateEvent {
        StateEvent::Snapshot {
            enabled: self.is_enabled(),
            mappings: self.mapping_info(),
            monitors: self.monitor_info(),
            active_workspace: ws.active_workspace(),
            focused_window_id: ws.focused_window(),
        }
    }
}
