use std::collections::HashMap;

use super::{Monitor, MonitorIndex, Point, Rect, Window, WindowId, WorkspaceIndex};

/// Offset of a window's origin from its monitor's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeOffset {
    pub x: i32,
    pub y: i32,
}

/// Where a window sat relative to its monitor, for restoring after a disable or lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreservedWindow {
    pub monitor: MonitorIndex,
    pub workspace: WorkspaceIndex,
    pub offset: RelativeOffset,
    pub width: u32,
    pub height: u32,
}

impl PreservedWindow {
    pub fn rect_on(&self, monitor: &Monitor) -> Rect {
        let origin = monitor.absolute(self.offset.x, self.offset.y);
        Rect::new(origin.x, origin.y, self.width, self.height).clamped_within(&monitor.frame)
    }
}

/// Position memory for windows moving between monitors and workspaces.
#[derive(Debug, Default)]
pub struct PlacementEngine {
    /// Consumed by the next restore for the same workspace.
    relative: HashMap<(WindowId, WorkspaceIndex), RelativeOffset>,
    pending: HashMap<WindowId, MonitorIndex>,
    preserved: HashMap<WindowId, PreservedWindow>,
    lock_records: HashMap<WindowId, PreservedWindow>,
}

impl PlacementEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stash_position(&mut self, window: &Window, monitor: &Monitor, workspace: WorkspaceIndex) {
        let (x, y) = monitor.relative(window.frame.origin());
        tracing::debug!(
            "Stash window {} for workspace {} at +{}+{} on monitor {}",
            window.id,
            workspace,
            x,
            y,
            monitor.index
        );
        self.relative
            .insert((window.id, workspace), RelativeOffset { x, y });
    }

    pub fn remember_offset(
        &mut self,
        window_id: WindowId,
        workspace: WorkspaceIndex,
        offset: RelativeOffset,
    ) {
        self.relative.insert((window_id, workspace), offset);
    }

    /// Consume the cached offset for this window and workspace, if any.
    pub fn take_cached(
        &mut self,
        window_id: WindowId,
        workspace: WorkspaceIndex,
    ) -> Option<RelativeOffset> {
        self.relative.remove(&(window_id, workspace))
    }

    #[cfg(test)]
    pub fn cached(&self, window_id: WindowId, workspace: WorkspaceIndex) -> Option<RelativeOffset> {
        self.relative.get(&(window_id, workspace)).copied()
    }

    /// Target origin for a window reappearing on `monitor` as part of `workspace`.
    /// Cache hits are consumed. Without one, a window already on the monitor
    /// keeps its origin rather than jumping to the quarter point; anything
    /// else lands at the quarter point.
    pub fn restore_position(
        &mut self,
        window: &Window,
        monitor: &Monitor,
        workspace: WorkspaceIndex,
    ) -> Point {
        let origin = match self.take_cached(window.id, workspace) {
            Some(offset) => monitor.absolute(offset.x, offset.y),
            None if monitor.frame.contains(window.center()) => window.frame.origin(),
            None => monitor.frame.quarter_point(),
        };
        window
            .frame
            .with_origin(origin)
            .clamped_within(&monitor.frame)
            .origin()
    }

    pub fn mark_pending(&mut self, window_id: WindowId, target: MonitorIndex) {
        self.pending.insert(window_id, target);
    }

    pub fn clear_pending(&mut self, window_id: WindowId) -> Option<MonitorIndex> {
        self.pending.remove(&window_id)
    }

    pub fn is_pending(&self, window_id: WindowId) -> bool {
        self.pending.contains_key(&window_id)
    }

    #[cfg(test)]
    pub fn pending_target(&self, window_id: WindowId) -> Option<MonitorIndex> {
        self.pending.get(&window_id).copied()
    }

    pub fn clear_all_pending(&mut self) {
        self.pending.clear();
    }

    pub fn preserve(&mut self, window_id: WindowId, record: PreservedWindow) {
        self.preserved.insert(window_id, record);
    }

    pub fn has_preserved(&self) -> bool {
        !self.preserved.is_empty()
    }

    pub fn take_preserved(&mut self) -> Vec<(WindowId, PreservedWindow)> {
        let mut records: Vec<_> = self.preserved.drain().collect();
        records.sort_by_key(|(id, _)| *id);
        records
    }

    pub fn record_lock(&mut self, records: Vec<(WindowId, PreservedWindow)>) {
        self.lock_records = records.into_iter().collect();
    }

    pub fn has_lock_records(&self) -> bool {
        !self.lock_records.is_empty()
    }

    pub fn take_lock_records(&mut self) -> Vec<(WindowId, PreservedWindow)> {
        let mut records: Vec<_> = self.lock_records.drain().collect();
        records.sort_by_key(|(id, _)| *id);
        records
    }

    /// Drop everything remembered about a destroyed window.
    pub fn forget_window(&mut self, window_id: WindowId) {
        self.relative.retain(|(id, _), _| *id != window_id);
        self.pending.remove(&window_id);
        self.preserved.remove(&window_id);
        self.lock_records.remove(&window_id);
    }
}

/// Carry a frame from one monitor to another at the same relative offset,
/// clamped so it ends up fully inside the destination.
pub fn relocate(frame: &Rect, from: &Monitor, to: &Monitor) -> Rect {
    let (rel_x, rel_y) = from.relative(frame.origin());
    frame
        .with_origin(to.absolute(rel_x, rel_y))
        .clamped_within(&to.frame)
}

/// Snapshot of a window relative to the monitor it sits on.
pub fn preserve_record(window: &Window, monitor: &Monitor, workspace: WorkspaceIndex) -> PreservedWindow {
    let (x, y) = monitor.relative(window.frame.origin());
    PreservedWindow {
        monitor: monitor.index,
        workspace,
        offset: RelativeOffset { x, y },
        width: window.frame.width,
        height: window.frame.height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::create_test_window;

    fn primary() -> Monitor {
        Monitor::new(0, Rect::new(0, 0, 1920, 1080), true)
    }

    fn small_secondary() -> Monitor {
        Monitor::new(1, Rect::new(1920, 0, 1280, 1024), false)
    }

    #[test]
    fn test_relocate_keeps_relative_offset() {
        let frame = Rect::new(100, 200, 400, 300);
        assert_eq!(
            relocate(&frame, &primary(), &small_secondary()),
            Rect::new(2020, 200, 400, 300)
        );
    }

    #[test]
    fn test_relocate_clamps_to_smaller_monitor() {
        // Near the bottom-right corner of the larger monitor
        let frame = Rect::new(1500, 800, 400, 260);
        let moved = relocate(&frame, &primary(), &small_secondary());
        assert_eq!(moved, Rect::new(2800, 764, 400, 260));
        assert!(moved.right() <= 3200);
        assert!(moved.bottom() <= 1024);
    }

    #[test]
    fn test_restore_position_consumes_cache() {
        let mut placement = PlacementEngine::new();
        let window = create_test_window(1, 2120, 100, 400, 300, 0);
        placement.stash_position(&window, &small_secondary(), 3);
        assert_eq!(placement.cached(1, 3), Some(RelativeOffset { x: 200, y: 100 }));

        let parked = create_test_window(1, 100, 100, 400, 300, 3);
        assert_eq!(
            placement.restore_position(&parked, &primary(), 3),
            Point::new(200, 100)
        );
        assert_eq!(placement.cached(1, 3), None);
    }

    #[test]
    fn test_restore_position_without_cache() {
        let mut placement = PlacementEngine::new();
        // Already on the monitor: stays put
        let window = create_test_window(1, 300, 300, 400, 300, 2);
        assert_eq!(
            placement.restore_position(&window, &primary(), 2),
            Point::new(300, 300)
        );
        // Elsewhere: quarter point of the monitor
        let window = create_test_window(2, 100, 100, 400, 300, 2);
        assert_eq!(
            placement.restore_position(&window, &small_secondary(), 2),
            Point::new(2240, 256)
        );
    }

    #[test]
    fn test_cache_is_per_workspace() {
        let mut placement = PlacementEngine::new();
        let window = create_test_window(1, 100, 100, 400, 300, 0);
        placement.stash_position(&window, &primary(), 0);
        assert_eq!(placement.take_cached(1, 1), None);
        assert!(placement.take_cached(1, 0).is_some());
    }

    #[test]
    fn test_pending_lifecycle() {
        let mut placement = PlacementEngine::new();
        placement.mark_pending(5, 1);
        assert!(placement.is_pending(5));
        assert_eq!(placement.pending_target(5), Some(1));
        assert_eq!(placement.clear_pending(5), Some(1));
        assert!(!placement.is_pending(5));
    }

    #[test]
    fn test_forget_window() {
        let mut placement = PlacementEngine::new();
        let window = create_test_window(1, 100, 100, 400, 300, 0);
        placement.stash_position(&window, &primary(), 0);
        placement.stash_position(&window, &primary(), 4);
        placement.mark_pending(1, 0);
        placement.preserve(1, preserve_record(&window, &primary(), 0));
        placement.forget_window(1);
        assert_eq!(placement.cached(1, 0), None);
        assert_eq!(placement.cached(1, 4), None);
        assert!(!placement.is_pending(1));
        assert!(!placement.has_preserved());
    }

    #[test]
    fn test_preserved_rect_clamped() {
        let window = create_test_window(1, 1500, 800, 400, 260, 0);
        let record = preserve_record(&window, &primary(), 0);
        assert_eq!(record.offset, RelativeOffset { x: 1500, y: 800 });
        assert_eq!(
            record.rect_on(&small_secondary()),
            Rect::new(2800, 764, 400, 260)
        );
    }
}
