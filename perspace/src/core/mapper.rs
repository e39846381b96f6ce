use std::collections::BTreeMap;

use super::{is_valid_workspace, MonitorIndex, MonitorRegistry, WorkspaceIndex, WORKSPACE_COUNT};

/// Bijection between connected monitors and the logical workspaces they display.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceMapper {
    map: BTreeMap<MonitorIndex, WorkspaceIndex>,
}

impl WorkspaceMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary shows the host's active workspace; secondaries take the lowest
    /// unused indices in monitor order. An active index outside the pool
    /// falls back to workspace 0.
    pub fn initialize(&mut self, registry: &MonitorRegistry, active: WorkspaceIndex) {
        self.map.clear();
        let active = if is_valid_workspace(active) {
            active
        } else {
            tracing::warn!("Host reports active workspace {} outside the pool", active);
            0
        };
        let Some(primary) = registry.primary_index() else {
            return;
        };
        self.map.insert(primary, active);
        let mut next = 0;
        for monitor in registry.secondaries() {
            while next < WORKSPACE_COUNT && next == active {
                next += 1;
            }
            if next >= WORKSPACE_COUNT {
                tracing::warn!("No workspace left for monitor {}", monitor.index);
                break;
            }
            self.map.insert(monitor.index, next);
            next += 1;
        }
        tracing::info!("Initialized mapping: {:?}", self.map);
    }

    pub fn set_mapping(&mut self, monitor: MonitorIndex, workspace: WorkspaceIndex) {
        self.map.insert(monitor, workspace);
    }

    /// Unmapped monitors fall back to workspace 0.
    pub fn workspace_for_monitor(&self, monitor: MonitorIndex) -> WorkspaceIndex {
        self.map.get(&monitor).copied().unwrap_or(0)
    }

    pub fn monitor_for_workspace(&self, workspace: WorkspaceIndex) -> Option<MonitorIndex> {
        self.map
            .iter()
            .find(|(_, ws)| **ws == workspace)
            .map(|(m, _)| *m)
    }

    pub fn is_displayed(&self, workspace: WorkspaceIndex) -> bool {
        self.monitor_for_workspace(workspace).is_some()
    }

    pub fn all_mappings(&self) -> Vec<(MonitorIndex, WorkspaceIndex)> {
        self.map.iter().map(|(m, ws)| (*m, *ws)).collect()
    }

    pub fn swap(&mut self, a: MonitorIndex, b: MonitorIndex) {
        let ws_a = self.workspace_for_monitor(a);
        let ws_b = self.workspace_for_monitor(b);
        self.map.insert(a, ws_b);
        self.map.insert(b, ws_a);
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Highest workspace index referenced by the mapping.
    pub fn highest_workspace(&self) -> Option<WorkspaceIndex> {
        self.map.values().copied().max()
    }

    /// No workspace is shown on two monitors at once.
    pub fn is_consistent(&self) -> bool {
        let mut seen = [false; WORKSPACE_COUNT];
        self.map.values().all(|&ws| {
            if ws >= WORKSPACE_COUNT || seen[ws] {
                return false;
            }
            seen[ws] = true;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Monitor, Rect};

    fn registry(count: usize) -> MonitorRegistry {
        MonitorRegistry::new(
            (0..count)
                .map(|i| Monitor::new(i, Rect::new(i as i32 * 1920, 0, 1920, 1080), i == 0))
                .collect(),
        )
    }

    #[test]
    fn test_initialize_sequential() {
        let mut mapper = WorkspaceMapper::new();
        mapper.initialize(&registry(3), 0);
        assert_eq!(mapper.all_mappings(), vec![(0, 0), (1, 1), (2, 2)]);
        assert!(mapper.is_consistent());
    }

    #[test]
    fn test_initialize_skips_active() {
        let mut mapper = WorkspaceMapper::new();
        mapper.initialize(&registry(3), 1);
        assert_eq!(mapper.all_mappings(), vec![(0, 1), (1, 0), (2, 2)]);
        assert!(mapper.is_consistent());
    }

    #[test]
    fn test_initialize_with_active_outside_pool() {
        let mut mapper = WorkspaceMapper::new();
        mapper.initialize(&registry(2), 12);
        assert_eq!(mapper.all_mappings(), vec![(0, 0), (1, 1)]);
        assert!(mapper.is_consistent());
    }

    #[test]
    fn test_unmapped_defaults_to_zero() {
        let mapper = WorkspaceMapper::new();
        assert_eq!(mapper.workspace_for_monitor(5), 0);
        assert_eq!(mapper.monitor_for_workspace(0), None);
    }

    #[test]
    fn test_swap() {
        let mut mapper = WorkspaceMapper::new();
        mapper.initialize(&registry(2), 0);
        mapper.swap(0, 1);
        assert_eq!(mapper.workspace_for_monitor(0), 1);
        assert_eq!(mapper.workspace_for_monitor(1), 0);
        assert_eq!(mapper.monitor_for_workspace(1), Some(0));
        assert!(mapper.is_consistent());
    }

    #[test]
    fn test_is_displayed_and_clear() {
        let mut mapper = WorkspaceMapper::new();
        mapper.set_mapping(0, 3);
        assert!(mapper.is_displayed(3));
        assert!(!mapper.is_displayed(4));
        assert_eq!(mapper.highest_workspace(), Some(3));
        mapper.clear();
        assert!(mapper.is_empty());
        assert!(!mapper.is_displayed(3));
    }

    #[test]
    fn test_inconsistent_mapping_detected() {
        let mut mapper = WorkspaceMapper::new();
        mapper.set_mapping(0, 2);
        mapper.set_mapping(1, 2);
        assert!(!mapper.is_consistent());
    }
}
