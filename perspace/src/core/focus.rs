use std::collections::HashMap;

use super::{WindowId, WorkspaceIndex};

/// Focus memory per logical workspace.
#[derive(Debug, Default)]
pub struct FocusTracker {
    last_focused: HashMap<WorkspaceIndex, WindowId>,
    /// Set while a workspace switch rearranges windows; focus changes seen
    /// meanwhile are side effects and are neither recorded nor corrected.
    internal_switch: bool,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, workspace: WorkspaceIndex, window_id: WindowId) {
        self.last_focused.insert(workspace, window_id);
    }

    pub fn last_focused(&self, workspace: WorkspaceIndex) -> Option<WindowId> {
        self.last_focused.get(&workspace).copied()
    }

    pub fn forget_window(&mut self, window_id: WindowId) {
        self.last_focused.retain(|_, id| *id != window_id);
    }

    pub fn begin_internal_switch(&mut self) {
        self.internal_switch = true;
    }

    pub fn end_internal_switch(&mut self) {
        self.internal_switch = false;
    }

    pub fn in_internal_switch(&self) -> bool {
        self.internal_switch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_forget() {
        let mut tracker = FocusTracker::new();
        tracker.record(0, 10);
        tracker.record(1, 11);
        tracker.record(0, 12);
        assert_eq!(tracker.last_focused(0), Some(12));
        assert_eq!(tracker.last_focused(1), Some(11));

        tracker.forget_window(11);
        assert_eq!(tracker.last_focused(1), None);
        assert_eq!(tracker.last_focused(0), Some(12));
    }

    #[test]
    fn test_internal_switch_flag() {
        let mut tracker = FocusTracker::new();
        assert!(!tracker.in_internal_switch());
        tracker.begin_internal_switch();
        assert!(tracker.in_internal_switch());
        tracker.end_internal_switch();
        assert!(!tracker.in_internal_switch());
    }
}
