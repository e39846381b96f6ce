use super::{
    MonitorIndex, MonitorRegistry, Point, Window, WindowId, WorkspaceIndex, WorkspaceMapper,
};

/// Height of the rows used when ordering windows top-to-bottom, left-to-right.
pub const RASTER_BAND: i32 = 50;

/// Answers "which monitor / which workspace" for a set of windows.
/// A window belongs to the monitor containing its centre; edges and
/// title bars never decide membership.
pub struct WindowLocator<'a> {
    registry: &'a MonitorRegistry,
    windows: &'a [Window],
}

impl<'a> WindowLocator<'a> {
    pub fn new(registry: &'a MonitorRegistry, windows: &'a [Window]) -> Self {
        Self { registry, windows }
    }

    pub fn window(&self, id: WindowId) -> Option<&'a Window> {
        self.windows.iter().find(|w| w.id == id)
    }

    pub fn monitor_of(&self, window: &Window) -> Option<MonitorIndex> {
        self.registry.at_point(window.center()).map(|m| m.index)
    }

    pub fn is_on_secondary(&self, window: &Window) -> bool {
        self.monitor_of(window)
            .is_some_and(|m| !self.registry.is_primary(m))
    }

    /// Logical workspace owning the window. Windows on a secondary monitor
    /// belong to that monitor's mapped workspace; everything else keeps the
    /// host's own attribute. Sticky windows on the primary own none.
    pub fn owning_workspace(
        &self,
        window: &Window,
        mapper: &WorkspaceMapper,
    ) -> Option<WorkspaceIndex> {
        match self.monitor_of(window) {
            Some(m) if !self.registry.is_primary(m) => Some(mapper.workspace_for_monitor(m)),
            _ if window.on_all_workspaces => None,
            _ => Some(window.workspace),
        }
    }

    /// Normal windows whose centre lies on `monitor`.
    pub fn windows_on_monitor(&self, monitor: MonitorIndex, include_hidden: bool) -> Vec<&'a Window> {
        let registry = self.registry;
        self.windows
            .iter()
            .filter(|w| w.is_normal())
            .filter(|w| include_hidden || !w.is_hidden())
            .filter(|w| registry.at_point(w.center()).is_some_and(|m| m.index == monitor))
            .collect()
    }

    /// Normal windows the host tags with `workspace`, wherever they sit.
    pub fn windows_on_workspace(&self, workspace: WorkspaceIndex) -> Vec<&'a Window> {
        self.windows
            .iter()
            .filter(|w| w.is_normal() && !w.on_all_workspaces && w.workspace == workspace)
            .collect()
    }

    /// Windows of `workspace` parked off-screen on the primary: tagged with it
    /// and not resident on any secondary monitor.
    pub fn parked_windows(&self, workspace: WorkspaceIndex) -> Vec<&'a Window> {
        self.windows_on_workspace(workspace)
            .into_iter()
            .filter(|w| !self.is_on_secondary(w))
            .collect()
    }

    /// Windows currently shown on `monitor` as part of `workspace`.
    /// The primary trusts the host's workspace attribute; a secondary shows
    /// everything resident on it.
    pub fn windows_visible_on_monitor_for_workspace(
        &self,
        monitor: MonitorIndex,
        workspace: WorkspaceIndex,
    ) -> Vec<&'a Window> {
        let on_monitor = self.windows_on_monitor(monitor, false);
        if self.registry.is_primary(monitor) {
            on_monitor
                .into_iter()
                .filter(|w| !w.on_all_workspaces && w.workspace == workspace)
                .collect()
        } else {
            on_monitor
        }
    }

    /// Whether the host is currently drawing the window.
    pub fn is_showing(&self, window: &Window, active: WorkspaceIndex) -> bool {
        !window.is_hidden()
            && (self.is_on_secondary(window)
                || window.on_all_workspaces
                || window.workspace == active)
    }

    /// Topmost showing window under the point.
    pub fn window_at_point(&self, point: Point, active: WorkspaceIndex) -> Option<&'a Window> {
        self.windows
            .iter()
            .filter(|w| w.is_normal() && w.frame.contains(point) && self.is_showing(w, active))
            .max_by_key(|w| w.stack_order)
    }
}

/// Order windows top-to-bottom in 50 pixel bands, then left-to-right.
pub fn raster_sort(windows: &mut [&Window]) {
    windows.sort_by_key(|w| (w.frame.y.div_euclid(RASTER_BAND), w.frame.x, w.id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Monitor, Rect};
    use crate::platform::mock::create_test_window;
    use perspace_ipc::WindowKind;

    fn dual_registry() -> MonitorRegistry {
        MonitorRegistry::new(vec![
            Monitor::new(0, Rect::new(0, 0, 1920, 1080), true),
            Monitor::new(1, Rect::new(1920, 0, 1920, 1080), false),
        ])
    }

    #[test]
    fn test_monitor_of_uses_center() {
        let registry = dual_registry();
        // Mostly on the primary, title bar poking into the secondary
        let left = create_test_window(1, 1000, 100, 1000, 500, 0);
        // Straddles with centre on the secondary
        let right = create_test_window(2, 1800, 100, 600, 500, 0);
        let windows = vec![left, right];
        let locator = WindowLocator::new(&registry, &windows);
        assert_eq!(locator.monitor_of(&windows[0]), Some(0));
        assert_eq!(locator.monitor_of(&windows[1]), Some(1));
    }

    #[test]
    fn test_owning_workspace() {
        let registry = dual_registry();
        let mut mapper = WorkspaceMapper::new();
        mapper.set_mapping(0, 0);
        mapper.set_mapping(1, 4);
        let mut sticky = create_test_window(3, 100, 100, 200, 200, 0);
        sticky.on_all_workspaces = true;
        let windows = vec![
            create_test_window(1, 100, 100, 200, 200, 2),
            create_test_window(2, 2000, 100, 200, 200, 0),
            sticky,
        ];
        let locator = WindowLocator::new(&registry, &windows);
        assert_eq!(locator.owning_workspace(&windows[0], &mapper), Some(2));
        assert_eq!(locator.owning_workspace(&windows[1], &mapper), Some(4));
        assert_eq!(locator.owning_workspace(&windows[2], &mapper), None);
    }

    #[test]
    fn test_visible_on_primary_trusts_workspace_attribute() {
        let registry = dual_registry();
        let windows = vec![
            create_test_window(1, 100, 100, 200, 200, 0),
            create_test_window(2, 100, 100, 200, 200, 3),
            create_test_window(3, 2000, 100, 200, 200, 7),
        ];
        let locator = WindowLocator::new(&registry, &windows);
        let ids = |v: Vec<&Window>| v.iter().map(|w| w.id).collect::<Vec<_>>();
        assert_eq!(ids(locator.windows_visible_on_monitor_for_workspace(0, 0)), vec![1]);
        assert_eq!(ids(locator.windows_visible_on_monitor_for_workspace(0, 3)), vec![2]);
        // Secondary shows whatever sits on it
        assert_eq!(ids(locator.windows_visible_on_monitor_for_workspace(1, 1)), vec![3]);
    }

    #[test]
    fn test_filters_hidden_and_non_normal() {
        let registry = dual_registry();
        let mut minimized = create_test_window(2, 2000, 100, 200, 200, 0);
        minimized.minimized = true;
        let mut dialog = create_test_window(3, 2000, 100, 200, 200, 0);
        dialog.kind = WindowKind::Dialog;
        let mut panel = create_test_window(4, 2000, 100, 200, 200, 0);
        panel.skip_taskbar = true;
        let windows = vec![
            create_test_window(1, 2000, 100, 200, 200, 0),
            minimized,
            dialog,
            panel,
        ];
        let locator = WindowLocator::new(&registry, &windows);
        assert_eq!(locator.windows_on_monitor(1, false).len(), 1);
        assert_eq!(locator.windows_on_monitor(1, true).len(), 2);
    }

    #[test]
    fn test_parked_windows_exclude_secondary_residents() {
        let registry = dual_registry();
        let windows = vec![
            create_test_window(1, 100, 100, 200, 200, 5),
            create_test_window(2, 2000, 100, 200, 200, 5),
        ];
        let locator = WindowLocator::new(&registry, &windows);
        let parked: Vec<_> = locator.parked_windows(5).iter().map(|w| w.id).collect();
        assert_eq!(parked, vec![1]);
    }

    #[test]
    fn test_window_at_point_prefers_top() {
        let registry = dual_registry();
        let mut lower = create_test_window(1, 0, 0, 800, 600, 0);
        lower.stack_order = 1;
        let mut upper = create_test_window(2, 100, 100, 800, 600, 0);
        upper.stack_order = 2;
        let mut other_ws = create_test_window(3, 100, 100, 800, 600, 1);
        other_ws.stack_order = 3;
        let windows = vec![lower, upper, other_ws];
        let locator = WindowLocator::new(&registry, &windows);
        assert_eq!(
            locator.window_at_point(Point::new(200, 200), 0).map(|w| w.id),
            Some(2)
        );
        assert_eq!(
            locator.window_at_point(Point::new(50, 50), 0).map(|w| w.id),
            Some(1)
        );
        assert!(locator.window_at_point(Point::new(1000, 900), 0).is_none());
    }

    #[test]
    fn test_raster_sort_bands() {
        let a = create_test_window(1, 500, 10, 100, 100, 0);
        let b = create_test_window(2, 100, 40, 100, 100, 0);
        let c = create_test_window(3, 50, 60, 100, 100, 0);
        let mut windows = vec![&c, &a, &b];
        raster_sort(&mut windows);
        let ids: Vec<_> = windows.iter().map(|w| w.id).collect();
        // a and b share the first band, c starts the second
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
