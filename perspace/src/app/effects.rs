use std::cell::RefCell;
use std::path::Path;

use tokio::time::Instant;

use crate::core::SavedBindings;
use crate::effect::Effect;
use crate::event_emitter::EventEmitter;
use crate::platform::{HostProxy, RequestSink};

use super::scheduler::Scheduler;
use super::subscriptions::Subscriptions;

/// Everything outside the engine that effects can touch.
pub struct EffectContext<'a, S: RequestSink + Clone> {
    pub host: &'a HostProxy<S>,
    pub scheduler: &'a RefCell<Scheduler>,
    pub subscriptions: &'a RefCell<Subscriptions<S>>,
    pub emitter: &'a EventEmitter,
    pub bindings_path: &'a Path,
}

/// Execute side effects in order.
pub fn execute_effects<S: RequestSink + Clone>(effects: Vec<Effect>, ctx: &EffectContext<'_, S>) {
    for effect in effects {
        if effect.apply_to(ctx.host) {
            continue;
        }
        match effect {
            Effect::Schedule { delay, task } => {
                ctx.scheduler
                    .borrow_mut()
                    .schedule(Instant::now(), delay, task);
            }
            Effect::CancelScheduled => ctx.scheduler.borrow_mut().clear(),
            Effect::AcquireSubscriptions => {
                ctx.subscriptions.borrow_mut().acquire(ctx.host.sink());
            }
            Effect::ReleaseSubscriptions => ctx.subscriptions.borrow_mut().release(),
            Effect::PersistSavedBindings(saved) => persist_bindings(saved, ctx.bindings_path),
            Effect::Notify(event) => ctx.emitter.emit(event),
            other => tracing::warn!("Effect not handled by the host: {:?}", other),
        }
    }
}

fn persist_bindings(saved: Option<SavedBindings>, path: &Path) {
    match saved {
        Some(bindings) => match bindings.save(path) {
            Ok(()) => tracing::info!("Saved host bindings to {}", path.display()),
            Err(e) => tracing::error!("Failed to save host bindings: {}", e),
        },
        None => {
            if let Err(e) = SavedBindings::remove(path) {
                tracing::error!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use perspace_ipc::{HostRequest, StateEvent, Topic};

    use super::*;
    use crate::core::DeferredTask;
    use crate::ipc::EventBroadcaster;
    use crate::platform::mock::MockHost;

    struct Fixture {
        host: MockHost,
        scheduler: RefCell<Scheduler>,
        subscriptions: RefCell<Subscriptions<crate::platform::mock::RecordingSink>>,
        emitter: EventEmitter,
        broadcaster: EventBroadcaster,
        bindings_path: std::path::PathBuf,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let broadcaster = EventBroadcaster::new(16);
            Self {
                host: MockHost::mock(),
                scheduler: RefCell::new(Scheduler::new()),
                subscriptions: RefCell::new(Subscriptions::new()),
                emitter: EventEmitter::new(broadcaster.clone()),
                broadcaster,
                bindings_path: std::env::temp_dir().join(format!(
                    "perspace-effects-{}-{}.json",
                    name,
                    std::process::id()
                )),
            }
        }

        fn run(&self, effects: Vec<Effect>) {
            let ctx = EffectContext {
                host: &self.host,
                scheduler: &self.scheduler,
                subscriptions: &self.subscriptions,
                emitter: &self.emitter,
                bindings_path: &self.bindings_path,
            };
            execute_effects(effects, &ctx);
        }
    }

    #[test]
    fn test_host_effects_become_requests() {
        let fixture = Fixture::new("host");
        fixture.run(vec![Effect::ActivateWorkspace { workspace: 3 }]);
        assert_eq!(
            fixture.host.requests(),
            vec![HostRequest::ActivateWorkspace { workspace: 3 }]
        );
    }

    #[test]
    fn test_schedule_and_cancel() {
        let fixture = Fixture::new("schedule");
        fixture.run(vec![
            Effect::Schedule {
                delay: Duration::from_millis(500),
                task: DeferredTask::RefreshAfterUnlock,
            },
            Effect::Schedule {
                delay: Duration::ZERO,
                task: DeferredTask::RestorePreserved,
            },
        ]);
        assert_eq!(fixture.scheduler.borrow().len(), 2);
        assert!(fixture.host.requests().is_empty());

        fixture.run(vec![Effect::CancelScheduled]);
        assert!(fixture.scheduler.borrow().is_empty());
    }

    #[test]
    fn test_subscriptions_follow_effects() {
        let fixture = Fixture::new("subscriptions");
        fixture.run(vec![Effect::AcquireSubscriptions]);
        assert!(fixture.subscriptions.borrow().is_active());
        assert_eq!(fixture.host.requests().len(), Topic::ALL.len());

        fixture.host.clear_requests();
        fixture.run(vec![Effect::ReleaseSubscriptions]);
        assert!(!fixture.subscriptions.borrow().is_active());
        assert!(fixture
            .host
            .requests()
            .iter()
            .all(|r| matches!(r, HostRequest::Unsubscribe { .. })));
    }

    #[test]
    fn test_notify_broadcasts() {
        let fixture = Fixture::new("notify");
        let mut rx = fixture.broadcaster.subscribe();
        fixture.run(vec![Effect::Notify(StateEvent::LifecycleChanged {
            enabled: true,
        })]);
        assert_eq!(
            rx.try_recv().ok(),
            Some(StateEvent::LifecycleChanged { enabled: true })
        );
    }

    #[test]
    fn test_persist_and_remove_bindings() {
        let fixture = Fixture::new("persist");
        let mut saved = SavedBindings::default();
        saved.0.insert(
            "switch-to-workspace-1".to_string(),
            vec!["<Super>Home".to_string()],
        );

        fixture.run(vec![Effect::PersistSavedBindings(Some(saved.clone()))]);
        assert_eq!(SavedBindings::load(&fixture.bindings_path), saved);

        fixture.run(vec![Effect::PersistSavedBindings(None)]);
        assert!(!fixture.bindings_path.exists());
    }
}
