use perspace_ipc::{MaximizeState, WindowKind, WindowSnapshot};

use super::WorkspaceIndex;

pub type WindowId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub id: WindowId,
    pub title: String,
    pub frame: Rect,
    /// Workspace attribute as tracked by the host.
    pub workspace: WorkspaceIndex,
    pub on_all_workspaces: bool,
    pub kind: WindowKind,
    pub skip_taskbar: bool,
    pub minimized: bool,
    pub maximized: MaximizeState,
    pub fullscreen: bool,
    pub stack_order: u32,
}

impl Window {
    pub fn from_snapshot(snapshot: &WindowSnapshot) -> Self {
        Self {
            id: snapshot.id,
            title: snapshot.title.clone(),
            frame: Rect::new(snapshot.x, snapshot.y, snapshot.width, snapshot.height),
            workspace: snapshot.workspace,
            on_all_workspaces: snapshot.on_all_workspaces,
            kind: snapshot.kind,
            skip_taskbar: snapshot.skip_taskbar,
            minimized: snapshot.minimized,
            maximized: snapshot.maximized,
            fullscreen: snapshot.fullscreen,
            stack_order: snapshot.stack_order,
        }
    }

    pub fn center(&self) -> Point {
        self.frame.center()
    }

    pub fn is_hidden(&self) -> bool {
        self.minimized
    }

    /// Normal application window that shows up in the taskbar.
    pub fn is_normal(&self) -> bool {
        self.kind == WindowKind::Normal && !self.skip_taskbar
    }

    /// Maximized or fullscreen; both must be cleared before the host lets the window move.
    pub fn is_constrained(&self) -> bool {
        self.fullscreen || self.maximized.is_maximized()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True when either axis moved by more than `threshold` pixels.
    pub fn drifted_from(&self, other: Point, threshold: i32) -> bool {
        (self.x - other.x).abs() > threshold || (self.y - other.y).abs() > threshold
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x + self.width as i32 / 2,
            self.y + self.height as i32 / 2,
        )
    }

    /// Half-open containment: the right and bottom edges belong to the neighbour.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Default placement inside this rect: a quarter of the way in on both axes.
    pub fn quarter_point(&self) -> Point {
        Point::new(
            self.x + self.width as i32 / 4,
            self.y + self.height as i32 / 4,
        )
    }

    pub fn with_origin(&self, origin: Point) -> Rect {
        Rect::new(origin.x, origin.y, self.width, self.height)
    }

    /// Shrink to fit and shift so the whole rect lies inside `bounds`.
    pub fn clamped_within(&self, bounds: &Rect) -> Rect {
        let width = self.width.min(bounds.width);
        let height = self.height.min(bounds.height);
        let max_x = bounds.right() - width as i32;
        let max_y = bounds.bottom() - height as i32;
        Rect::new(
            self.x.clamp(bounds.x, max_x),
            self.y.clamp(bounds.y, max_y),
            width,
            height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_and_contains() {
        let rect = Rect::new(100, 50, 200, 100);
        assert_eq!(rect.center(), Point::new(200, 100));
        assert!(rect.contains(Point::new(100, 50)));
        assert!(rect.contains(Point::new(299, 149)));
        assert!(!rect.contains(Point::new(300, 100)));
        assert!(!rect.contains(Point::new(200, 150)));
    }

    #[test]
    fn test_quarter_point() {
        let rect = Rect::new(1920, 0, 1280, 1024);
        assert_eq!(rect.quarter_point(), Point::new(2240, 256));
    }

    #[test]
    fn test_clamped_within_shifts_inside() {
        let bounds = Rect::new(1920, 0, 1280, 1024);
        let rect = Rect::new(3000, 900, 400, 300);
        assert_eq!(rect.clamped_within(&bounds), Rect::new(2800, 724, 400, 300));

        let rect = Rect::new(1800, -20, 400, 300);
        assert_eq!(rect.clamped_within(&bounds), Rect::new(1920, 0, 400, 300));
    }

    #[test]
    fn test_clamped_within_shrinks_oversized() {
        let bounds = Rect::new(0, 0, 800, 600);
        let rect = Rect::new(-100, -100, 1920, 1080);
        assert_eq!(rect.clamped_within(&bounds), bounds);
    }

    #[test]
    fn test_drift_threshold() {
        let origin = Point::new(100, 100);
        assert!(!Point::new(105, 95).drifted_from(origin, 5));
        assert!(Point::new(106, 100).drifted_from(origin, 5));
        assert!(Point::new(100, 94).drifted_from(origin, 5));
    }
}
