pub mod command;
pub mod event;
pub mod host;

pub use command::{
    Command, Direction, MappingInfo, Modifier, MonitorInfo, Response, StateInfo, SwitchMode,
    WindowInfo,
};
pub use event::{EventFilter, StateEvent, SubscribeRequest};
pub use host::{
    Capabilities, HostEvent, HostRequest, HostSettings, MaximizeState, MonitorSnapshot,
    SessionMode, Topic, WindowKind, WindowSnapshot, SETTING_DYNAMIC_WORKSPACES,
    SETTING_WORKSPACES_ONLY_ON_PRIMARY,
};
