use perspace_ipc::StateEvent;

use crate::ipc::EventBroadcaster;

/// Event emitter for pushing engine notifications to event subscribers.
/// The indicator, overlay, banner and wallpaper collaborators all listen here.
pub struct EventEmitter {
    broadcaster: EventBroadcaster,
}

impl EventEmitter {
    pub fn new(broadcaster: EventBroadcaster) -> Self {
        Self { broadcaster }
    }

    /// Send an event to subscribers
    pub fn emit(&self, event: StateEvent) {
        if let StateEvent::MappingChanged { mappings, .. } = &event {
            for mapping in mappings {
                tracing::debug!(
                    "Monitor {} shows workspace {}",
                    mapping.monitor,
                    mapping.workspace
                );
            }
        }
        self.broadcaster.send(event);
    }
}
