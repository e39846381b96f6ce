use serde::{Deserialize, Serialize};

use crate::{MappingInfo, MonitorInfo};

/// Event filter for subscribing to specific event types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Subscribe to monitor -> workspace mapping changes
    #[serde(default)]
    pub mapping: bool,
    /// Subscribe to monitor hot-plug rebuilds
    #[serde(default)]
    pub monitors: bool,
    /// Subscribe to focus events
    #[serde(default)]
    pub focus: bool,
    /// Subscribe to enable/disable transitions
    #[serde(default)]
    pub lifecycle: bool,
}

impl EventFilter {
    /// Create a filter that subscribes to all events
    pub fn all() -> Self {
        Self {
            mapping: true,
            monitors: true,
            focus: true,
            lifecycle: true,
        }
    }

    /// Check if the filter matches a given event
    pub fn matches(&self, event: &StateEvent) -> bool {
        match event {
            StateEvent::MappingChanged { .. } => self.mapping,
            StateEvent::MonitorsRebuilt { .. } => self.monitors,
            StateEvent::WindowFocused { .. } => self.focus,
            StateEvent::LifecycleChanged { .. } => self.lifecycle,
            StateEvent::Snapshot { .. } => true, // Snapshots always pass filter
        }
    }

    /// Check if any filter is set
    pub fn any(&self) -> bool {
        self.mapping || self.monitors || self.focus || self.lifecycle
    }
}

/// Request to subscribe to state events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Whether to send a snapshot on connection
    #[serde(default)]
    pub snapshot: bool,
    /// Event filter (if not set or all false, subscribes to all events)
    #[serde(default)]
    pub filter: EventFilter,
}

impl SubscribeRequest {
    /// Create a subscribe request with snapshot enabled
    pub fn with_snapshot() -> Self {
        Self {
            snapshot: true,
            filter: EventFilter::default(),
        }
    }

    /// Get the effective filter (all if none specified)
    pub fn effective_filter(&self) -> EventFilter {
        if self.filter.any() {
            self.filter.clone()
        } else {
            EventFilter::all()
        }
    }
}

/// Notifications for the indicator, overlay, banner and wallpaper collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    MappingChanged {
        mappings: Vec<MappingInfo>,
        active_workspace: usize,
    },

    /// Monitors were hot-plugged; per-monitor widgets must be rebuilt.
    MonitorsRebuilt {
        monitors: Vec<MonitorInfo>,
    },

    WindowFocused {
        window_id: Option<u64>,
        workspace: Option<usize>,
    },

    LifecycleChanged {
        enabled: bool,
    },

    // Full snapshot
    Snapshot {
        enabled: bool,
        mappings: Vec<MappingInfo>,
        monitors: Vec<MonitorInfo>,
        active_workspace: usize,
        focused_window_id: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_filter_all() {
        let filter = EventFilter::all();
        assert!(filter.mapping);
        assert!(filter.monitors);
        assert!(filter.focus);
        assert!(filter.lifecycle);
    }

    #[test]
    fn test_event_filter_matches() {
        let mapping_filter = EventFilter {
            mapping: true,
            ..Default::default()
        };

        assert!(mapping_filter.matches(&StateEvent::MappingChanged {
            mappings: vec![],
            active_workspace: 0,
        }));
        assert!(!mapping_filter.matches(&StateEvent::WindowFocused {
            window_id: Some(1),
            workspace: Some(0),
        }));
        assert!(!mapping_filter.matches(&StateEvent::MonitorsRebuilt { monitors: vec![] }));
        assert!(mapping_filter.matches(&StateEvent::Snapshot {
            enabled: true,
            mappings: vec![],
            monitors: vec![],
            active_workspace: 0,
            focused_window_id: None,
        }));
    }

    #[test]
    fn test_subscribe_request_effective_filter() {
        let req = SubscribeRequest::default();
        let effective = req.effective_filter();
        assert!(effective.mapping);
        assert!(effective.focus);

        let req = SubscribeRequest {
            snapshot: false,
            filter: EventFilter {
                monitors: true,
                ..Default::default()
            },
        };
        let effective = req.effective_filter();
        assert!(!effective.mapping);
        assert!(effective.monitors);
    }

    #[test]
    fn test_mapping_changed_serialization() {
        let event = StateEvent::MappingChanged {
            mappings: vec![MappingInfo {
                monitor: 1,
                workspace: 4,
                is_primary: false,
                wallpaper: Some("/walls/four.png".to_string()),
            }],
            active_workspace: 0,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"mapping_changed\""));
        assert!(json.contains("\"workspace\":4"));
        assert!(json.contains("four.png"));

        let deserialized: StateEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_subscribe_request_serialization() {
        let req = SubscribeRequest {
            snapshot: true,
            filter: EventFilter {
                focus: true,
                mapping: true,
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"snapshot\":true"));

        let deserialized: SubscribeRequest = serde_json::from_str(&json).unwrap();
        assert!(deserialized.snapshot);
        assert!(deserialized.filter.focus);
        assert!(deserialized.filter.mapping);
        assert!(!deserialized.filter.lifecycle);
    }

    #[test]
    fn test_subscribe_request_missing_fields_default() {
        let req: SubscribeRequest = serde_json::from_str("{}").unwrap();
        assert!(!req.snapshot);
        assert!(!req.filter.any());
    }
}
