use perspace_ipc::MonitorSnapshot;

use super::{Point, Rect};

pub type MonitorIndex = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub index: MonitorIndex,
    pub frame: Rect,
    pub is_primary: bool,
}

impl Monitor {
    pub fn new(index: MonitorIndex, frame: Rect, is_primary: bool) -> Self {
        Self {
            index,
            frame,
            is_primary,
        }
    }

    pub fn from_snapshot(snapshot: &MonitorSnapshot) -> Self {
        Self {
            index: snapshot.index,
            frame: Rect::new(snapshot.x, snapshot.y, snapshot.width, snapshot.height),
            is_primary: snapshot.is_primary,
        }
    }

    /// Translate an offset relative to this monitor's origin into absolute coordinates.
    pub fn absolute(&self, rel_x: i32, rel_y: i32) -> Point {
        Point::new(self.frame.x + rel_x, self.frame.y + rel_y)
    }

    pub fn relative(&self, point: Point) -> (i32, i32) {
        (point.x - self.frame.x, point.y - self.frame.y)
    }
}

/// Connected displays, rebuilt wholesale on hot-plug.
#[derive(Debug, Clone, Default)]
pub struct MonitorRegistry {
    monitors: Vec<Monitor>,
}

impl MonitorRegistry {
    pub fn new(mut monitors: Vec<Monitor>) -> Self {
        monitors.sort_by_key(|m| m.index);
        // Exactly one primary: keep the first flagged, else promote the lowest index
        let primary = monitors
            .iter()
            .position(|m| m.is_primary)
            .unwrap_or_default();
        for (pos, monitor) in monitors.iter_mut().enumerate() {
            monitor.is_primary = pos == primary;
        }
        Self { monitors }
    }

    pub fn rebuild(&mut self, monitors: Vec<Monitor>) {
        *self = Self::new(monitors);
        tracing::info!("Monitor registry rebuilt with {} monitors", self.len());
        for m in &self.monitors {
            tracing::debug!(
                "  Monitor {}: {:?}{}",
                m.index,
                m.frame,
                if m.is_primary { " (primary)" } else { "" }
            );
        }
    }

    pub fn get(&self, index: MonitorIndex) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.index == index)
    }

    pub fn primary(&self) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.is_primary)
    }

    pub fn primary_index(&self) -> Option<MonitorIndex> {
        self.primary().map(|m| m.index)
    }

    pub fn is_primary(&self, index: MonitorIndex) -> bool {
        self.get(index).is_some_and(|m| m.is_primary)
    }

    pub fn secondaries(&self) -> impl Iterator<Item = &Monitor> {
        self.monitors.iter().filter(|m| !m.is_primary)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monitor> {
        self.monitors.iter()
    }

    pub fn at_point(&self, point: Point) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.frame.contains(point))
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}
