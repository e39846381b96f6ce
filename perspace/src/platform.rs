use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use perspace_ipc::{
    Capabilities, HostEvent, HostRequest, HostSettings, MaximizeState, SessionMode,
    SETTING_DYNAMIC_WORKSPACES, SETTING_WORKSPACES_ONLY_ON_PRIMARY,
};
use tokio::sync::mpsc;

use crate::core::{Monitor, Point, Rect, Window, WindowId, WorkspaceIndex};

/// Trait for querying window, monitor and pointer state from the host.
/// This abstraction allows mocking in tests.
pub trait WindowSystem {
    fn monitors(&self) -> Vec<Monitor>;
    fn windows(&self) -> Vec<Window>;
    fn window(&self, window_id: WindowId) -> Option<Window>;
    fn pointer(&self) -> Point;
    fn active_workspace(&self) -> WorkspaceIndex;
    fn focused_window(&self) -> Option<WindowId>;
    fn settings(&self) -> HostSettings;
    fn host_binding(&self, key: &str) -> Option<Vec<String>>;
    fn session_mode(&self) -> SessionMode;
}

/// Trait for side effects on the host.
/// The last three are optional host methods and default to no-ops.
pub trait WindowManipulator {
    fn move_resize_window(&self, window_id: WindowId, rect: Rect);
    fn set_window_workspace(&self, window_id: WindowId, workspace: WorkspaceIndex);
    fn activate_workspace(&self, workspace: WorkspaceIndex);
    fn focus_window(&self, window_id: WindowId);
    fn warp_pointer(&self, point: Point);
    fn set_maximized(&self, window_id: WindowId, state: MaximizeState);
    fn set_fullscreen(&self, window_id: WindowId, fullscreen: bool);
    fn bind_shortcut(&self, name: &str, accelerators: &[String]);
    fn unbind_shortcut(&self, name: &str);
    fn set_host_binding(&self, key: &str, accelerators: &[String]);
    fn set_setting(&self, key: &str, value: bool);
    fn prompt_prerequisites(&self, settings: &[String]);
    fn disable_self(&self);

    fn set_window_monitor(&self, _window_id: WindowId, _monitor: usize) {}
    fn raise_window(&self, _window_id: WindowId) {}
    fn ensure_workspaces(&self, _count: usize) {}
}

/// Outbound channel for host requests.
pub trait RequestSink {
    fn send_request(&self, request: HostRequest);
}

impl RequestSink for mpsc::UnboundedSender<HostRequest> {
    fn send_request(&self, request: HostRequest) {
        if let Err(e) = self.send(request) {
            tracing::debug!("Host bridge gone, dropping request: {:?}", e.0);
        }
    }
}

/// Local model of host state. Fed by host events and updated optimistically
/// whenever a request goes out, so queries made right after an operation
/// already see its result.
#[derive(Debug, Clone, Default)]
pub struct HostMirror {
    pub monitors: Vec<Monitor>,
    pub windows: BTreeMap<WindowId, Window>,
    pub pointer: Point,
    pub active_workspace: WorkspaceIndex,
    pub focused: Option<WindowId>,
    pub settings: HostSettings,
    pub bindings: BTreeMap<String, Vec<String>>,
    pub session_mode: SessionMode,
}

impl HostMirror {
    pub fn apply_event(&mut self, event: &HostEvent) {
        match event {
            HostEvent::Snapshot {
                monitors,
                windows,
                pointer_x,
                pointer_y,
                active_workspace,
                focused_window_id,
                settings,
                bindings,
                session_mode,
            } => {
                self.monitors = monitors.iter().map(Monitor::from_snapshot).collect();
                self.windows = windows
                    .iter()
                    .map(|w| (w.id, Window::from_snapshot(w)))
                    .collect();
                self.pointer = Point::new(*pointer_x, *pointer_y);
                self.active_workspace = *active_workspace;
                self.focused = *focused_window_id;
                self.settings = *settings;
                self.bindings = bindings.clone();
                self.session_mode = *session_mode;
            }
            HostEvent::WindowCreated { window } | HostEvent::WindowChanged { window } => {
                self.windows.insert(window.id, Window::from_snapshot(window));
            }
            HostEvent::WindowDestroyed { window_id } => {
                self.windows.remove(window_id);
                if self.focused == Some(*window_id) {
                    self.focused = None;
                }
            }
            HostEvent::FocusChanged { window_id } => self.focused = *window_id,
            HostEvent::ActiveWorkspaceChanged { workspace } => self.active_workspace = *workspace,
            HostEvent::MonitorsChanged { monitors } => {
                self.monitors = monitors.iter().map(Monitor::from_snapshot).collect();
            }
            HostEvent::SessionModeChanged { mode } => self.session_mode = *mode,
            HostEvent::PointerMoved { x, y } => self.pointer = Point::new(*x, *y),
            HostEvent::Hello { .. }
            | HostEvent::ShortcutActivated { .. }
            | HostEvent::ConsentReply { .. }
            | HostEvent::Enable
            | HostEvent::Disable => {}
        }
    }

    pub fn apply_request(&mut self, request: &HostRequest) {
        match request {
            HostRequest::MoveResizeWindow {
                window_id,
                x,
                y,
                width,
                height,
            } => {
                if let Some(w) = self.windows.get_mut(window_id) {
                    w.frame = Rect::new(*x, *y, *width, *height);
                }
            }
            HostRequest::SetWindowWorkspace {
                window_id,
                workspace,
            } => {
                if let Some(w) = self.windows.get_mut(window_id) {
                    w.workspace = *workspace;
                }
            }
            HostRequest::ActivateWorkspace { workspace } => self.active_workspace = *workspace,
            HostRequest::FocusWindow { window_id } => {
                self.raise(*window_id);
                if let Some(w) = self.windows.get_mut(window_id) {
                    w.minimized = false;
                    self.focused = Some(*window_id);
                }
            }
            HostRequest::RaiseWindow { window_id } => self.raise(*window_id),
            HostRequest::WarpPointer { x, y } => self.pointer = Point::new(*x, *y),
            HostRequest::SetMaximized { window_id, state } => {
                if let Some(w) = self.windows.get_mut(window_id) {
                    w.maximized = *state;
                }
            }
            HostRequest::SetFullscreen {
                window_id,
                fullscreen,
            } => {
                if let Some(w) = self.windows.get_mut(window_id) {
                    w.fullscreen = *fullscreen;
                }
            }
            HostRequest::SetHostBinding { key, accelerators } => {
                self.bindings.insert(key.clone(), accelerators.clone());
            }
            HostRequest::SetSetting { key, value } => match key.as_str() {
                SETTING_WORKSPACES_ONLY_ON_PRIMARY => {
                    self.settings.workspaces_only_on_primary = *value
                }
                SETTING_DYNAMIC_WORKSPACES => self.settings.dynamic_workspaces = *value,
                _ => {}
            },
            HostRequest::SetWindowMonitor { .. }
            | HostRequest::EnsureWorkspaces { .. }
            | HostRequest::BindShortcut { .. }
            | HostRequest::UnbindShortcut { .. }
            | HostRequest::PromptPrerequisites { .. }
            | HostRequest::Subscribe { .. }
            | HostRequest::Unsubscribe { .. }
            | HostRequest::DisableSelf => {}
        }
    }

    fn raise(&mut self, window_id: WindowId) {
        let top = self
            .windows
            .values()
            .map(|w| w.stack_order)
            .max()
            .unwrap_or(0);
        if let Some(w) = self.windows.get_mut(&window_id) {
            if w.stack_order != top || top == 0 {
                w.stack_order = top + 1;
            }
        }
    }
}

/// Host handle: answers queries from the mirror and forwards side effects
/// through a request sink.
pub struct HostProxy<S: RequestSink> {
    mirror: RefCell<HostMirror>,
    sink: S,
    capabilities: Cell<Capabilities>,
}

/// The live host, reached through the bridge socket.
pub type BridgeHost = HostProxy<mpsc::UnboundedSender<HostRequest>>;

impl<S: RequestSink> HostProxy<S> {
    pub fn new(sink: S) -> Self {
        Self {
            mirror: RefCell::new(HostMirror::default()),
            sink,
            capabilities: Cell::new(Capabilities::default()),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities.get()
    }

    /// Optional methods are selected once per bridge connection.
    pub fn set_capabilities(&self, capabilities: Capabilities) {
        tracing::info!("Host capabilities: {:?}", capabilities);
        self.capabilities.set(capabilities);
    }

    pub fn apply_event(&self, event: &HostEvent) {
        if let HostEvent::Hello { capabilities } = event {
            self.set_capabilities(*capabilities);
        }
        self.mirror.borrow_mut().apply_event(event);
    }

    pub fn submit(&self, request: HostRequest) {
        tracing::trace!("Host request: {:?}", request);
        self.mirror.borrow_mut().apply_request(&request);
        self.sink.send_request(request);
    }
}

impl<S: RequestSink> WindowSystem for HostProxy<S> {
    fn monitors(&self) -> Vec<Monitor> {
        self.mirror.borrow().monitors.clone()
    }

    fn windows(&self) -> Vec<Window> {
        self.mirror.borrow().windows.values().cloned().collect()
    }

    fn window(&self, window_id: WindowId) -> Option<Window> {
        self.mirror.borrow().windows.get(&window_id).cloned()
    }

    fn pointer(&self) -> Point {
        self.mirror.borrow().pointer
    }

    fn active_workspace(&self) -> WorkspaceIndex {
        self.mirror.borrow().active_workspace
    }

    fn focused_window(&self) -> Option<WindowId> {
        self.mirror.borrow().focused
    }

    fn settings(&self) -> HostSettings {
        self.mirror.borrow().settings
    }

    fn host_binding(&self, key: &str) -> Option<Vec<String>> {
        self.mirror.borrow().bindings.get(key).cloned()
    }

    fn session_mode(&self) -> SessionMode {
        self.mirror.borrow().session_mode
    }
}

impl<S: RequestSink> WindowManipulator for HostProxy<S> {
    fn move_resize_window(&self, window_id: WindowId, rect: Rect) {
        self.submit(HostRequest::MoveResizeWindow {
            window_id,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        });
    }

    fn set_window_workspace(&self, window_id: WindowId, workspace: WorkspaceIndex) {
        self.submit(HostRequest::SetWindowWorkspace {
            window_id,
            workspace,
        });
    }

    fn activate_workspace(&self, workspace: WorkspaceIndex) {
        self.submit(HostRequest::ActivateWorkspace { workspace });
    }

    fn focus_window(&self, window_id: WindowId) {
        self.submit(HostRequest::FocusWindow { window_id });
    }

    fn warp_pointer(&self, point: Point) {
        self.submit(HostRequest::WarpPointer {
            x: point.x,
            y: point.y,
        });
    }

    fn set_maximized(&self, window_id: WindowId, state: MaximizeState) {
        self.submit(HostRequest::SetMaximized { window_id, state });
    }

    fn set_fullscreen(&self, window_id: WindowId, fullscreen: bool) {
        self.submit(HostRequest::SetFullscreen {
            window_id,
            fullscreen,
        });
    }

    fn bind_shortcut(&self, name: &str, accelerators: &[String]) {
        self.submit(HostRequest::BindShortcut {
            name: name.to_string(),
            accelerators: accelerators.to_vec(),
        });
    }

    fn unbind_shortcut(&self, name: &str) {
        self.submit(HostRequest::UnbindShortcut {
            name: name.to_string(),
        });
    }

    fn set_host_binding(&self, key: &str, accelerators: &[String]) {
        self.submit(HostRequest::SetHostBinding {
            key: key.to_string(),
            accelerators: accelerators.to_vec(),
        });
    }

    fn set_setting(&self, key: &str, value: bool) {
        self.submit(HostRequest::SetSetting {
            key: key.to_string(),
            value,
        });
    }

    fn prompt_prerequisites(&self, settings: &[String]) {
        self.submit(HostRequest::PromptPrerequisites {
            settings: settings.to_vec(),
        });
    }

    fn disable_self(&self) {
        self.submit(HostRequest::DisableSelf);
    }

    fn set_window_monitor(&self, window_id: WindowId, monitor: usize) {
        if self.capabilities().set_window_monitor {
            self.submit(HostRequest::SetWindowMonitor { window_id, monitor });
        }
    }

    fn raise_window(&self, window_id: WindowId) {
        if self.capabilities().raise_window {
            self.submit(HostRequest::RaiseWindow { window_id });
        }
    }

    fn ensure_workspaces(&self, count: usize) {
        if self.capabilities().ensure_workspaces {
            self.submit(HostRequest::EnsureWorkspaces { count });
        }
    }
}

#[cfg(test)]
pub mod mock {
    use std::rc::Rc;

    use super::*;
    use perspace_ipc::WindowKind;

    /// Records every request instead of sending it anywhere.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingSink {
        pub requests: Rc<RefCell<Vec<HostRequest>>>,
    }

    impl RequestSink for RecordingSink {
        fn send_request(&self, request: HostRequest) {
            self.requests.borrow_mut().push(request);
        }
    }

    pub type MockHost = HostProxy<RecordingSink>;

    impl MockHost {
        /// A host that already satisfies the prerequisites and offers every optional method.
        pub fn mock() -> Self {
            let host = HostProxy::new(RecordingSink::default());
            host.set_capabilities(Capabilities {
                set_window_monitor: true,
                raise_window: true,
                ensure_workspaces: true,
            });
            host.mirror.borrow_mut().settings = HostSettings {
                workspaces_only_on_primary: true,
                dynamic_workspaces: false,
            };
            host
        }

        pub fn with_monitors(self, monitors: Vec<Monitor>) -> Self {
            self.mirror.borrow_mut().monitors = monitors;
            self
        }

        pub fn with_windows(self, windows: Vec<Window>) -> Self {
            self.mirror.borrow_mut().windows = windows.into_iter().map(|w| (w.id, w)).collect();
            self
        }

        pub fn with_pointer(self, x: i32, y: i32) -> Self {
            self.mirror.borrow_mut().pointer = Point::new(x, y);
            self
        }

        pub fn with_active_workspace(self, workspace: WorkspaceIndex) -> Self {
            self.mirror.borrow_mut().active_workspace = workspace;
            self
        }

        pub fn with_focused(self, window_id: Option<WindowId>) -> Self {
            self.mirror.borrow_mut().focused = window_id;
            self
        }

        pub fn with_settings(self, settings: HostSettings) -> Self {
            self.mirror.borrow_mut().settings = settings;
            self
        }

        pub fn with_binding(self, key: &str, accelerators: &[&str]) -> Self {
            self.mirror.borrow_mut().bindings.insert(
                key.to_string(),
                accelerators.iter().map(|s| s.to_string()).collect(),
            );
            self
        }

        pub fn update_window(&self, window_id: WindowId, f: impl FnOnce(&mut Window)) {
            if let Some(w) = self.mirror.borrow_mut().windows.get_mut(&window_id) {
                f(w);
            }
        }

        pub fn set_pointer(&self, x: i32, y: i32) {
            self.mirror.borrow_mut().pointer = Point::new(x, y);
        }

        pub fn requests(&self) -> Vec<HostRequest> {
            self.sink.requests.borrow().clone()
        }

        pub fn clear_requests(&self) {
            self.sink.requests.borrow_mut().clear();
        }

        pub fn frame_of(&self, window_id: WindowId) -> Option<Rect> {
            self.window(window_id).map(|w| w.frame)
        }
    }

    pub fn create_test_monitor(
        index: usize,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        is_primary: bool,
    ) -> Monitor {
        Monitor::new(index, Rect::new(x, y, width, height), is_primary)
    }

    pub fn create_test_window(
        id: WindowId,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        workspace: WorkspaceIndex,
    ) -> Window {
        Window {
            id,
            title: format!("Window {}", id),
            frame: Rect::new(x, y, width, height),
            workspace,
            on_all_workspaces: false,
            kind: WindowKind::Normal,
            skip_taskbar: false,
            minimized: false,
            maximized: MaximizeState::None,
            fullscreen: false,
            stack_order: id as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;
    use perspace_ipc::{MonitorSnapshot, WindowKind, WindowSnapshot};

    #[test]
    fn test_mirror_applies_snapshot_and_incremental_events() {
        let mut mirror = HostMirror::default();
        mirror.apply_event(&HostEvent::Snapshot {
            monitors: vec![MonitorSnapshot {
                index: 0,
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
                is_primary: true,
            }],
            windows: vec![WindowSnapshot {
                id: 1,
                title: "term".to_string(),
                x: 10,
                y: 20,
                width: 300,
                height: 200,
                workspace: 0,
                on_all_workspaces: false,
                kind: WindowKind::Normal,
                skip_taskbar: false,
                minimized: false,
                maximized: MaximizeState::None,
                fullscreen: false,
                stack_order: 1,
            }],
            pointer_x: 5,
            pointer_y: 6,
            active_workspace: 2,
            focused_window_id: Some(1),
            settings: HostSettings::default(),
            bindings: BTreeMap::new(),
            session_mode: SessionMode::User,
        });
        assert_eq!(mirror.monitors.len(), 1);
        assert_eq!(mirror.active_workspace, 2);
        assert_eq!(mirror.pointer, Point::new(5, 6));

        mirror.apply_event(&HostEvent::WindowDestroyed { window_id: 1 });
        assert!(mirror.windows.is_empty());
        assert_eq!(mirror.focused, None);

        mirror.apply_event(&HostEvent::PointerMoved { x: 50, y: 60 });
        assert_eq!(mirror.pointer, Point::new(50, 60));
    }

    #[test]
    fn test_requests_update_mirror_optimistically() {
        let host = MockHost::mock().with_windows(vec![create_test_window(1, 0, 0, 100, 100, 0)]);
        host.move_resize_window(1, Rect::new(50, 60, 200, 100));
        host.set_window_workspace(1, 3);
        host.activate_workspace(3);
        host.warp_pointer(Point::new(7, 8));

        let window = host.window(1).unwrap();
        assert_eq!(window.frame, Rect::new(50, 60, 200, 100));
        assert_eq!(window.workspace, 3);
        assert_eq!(host.active_workspace(), 3);
        assert_eq!(host.pointer(), Point::new(7, 8));
        assert_eq!(host.requests().len(), 4);
    }

    #[test]
    fn test_focus_raises_window() {
        let host = MockHost::mock().with_windows(vec![
            create_test_window(1, 0, 0, 100, 100, 0),
            create_test_window(2, 0, 0, 100, 100, 0),
        ]);
        host.focus_window(1);
        assert_eq!(host.focused_window(), Some(1));
        assert!(host.window(1).unwrap().stack_order > host.window(2).unwrap().stack_order);
    }

    #[test]
    fn test_optional_methods_follow_capabilities() {
        let host = HostProxy::new(RecordingSink::default());
        host.set_window_monitor(1, 1);
        host.raise_window(1);
        host.ensure_workspaces(4);
        assert!(host.sink().requests.borrow().is_empty());

        host.apply_event(&HostEvent::Hello {
            capabilities: Capabilities {
                set_window_monitor: true,
                raise_window: false,
                ensure_workspaces: false,
            },
        });
        host.set_window_monitor(1, 1);
        host.raise_window(1);
        assert_eq!(
            *host.sink().requests.borrow(),
            vec![HostRequest::SetWindowMonitor {
                window_id: 1,
                monitor: 1
            }]
        );
    }

    #[test]
    fn test_set_setting_updates_mirror() {
        let host = HostProxy::new(RecordingSink::default());
        assert!(!host.settings().unmet_prerequisites().is_empty());
        host.set_setting(SETTING_WORKSPACES_ONLY_ON_PRIMARY, true);
        host.set_setting(SETTING_DYNAMIC_WORKSPACES, false);
        assert!(host.settings().unmet_prerequisites().is_empty());
    }
}
