use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::core::DeferredTask;

/// Deadline-ordered deferred tasks. Equal deadlines run in the order they
/// were scheduled; a zero delay runs on the next loop iteration.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BTreeMap<(Instant, u64), DeferredTask>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, task: DeferredTask) {
        tracing::trace!("Scheduling {:?} in {:?}", task, delay);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((now + delay, seq), task);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Take the earliest task if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<DeferredTask> {
        let entry = self.queue.first_entry()?;
        if entry.key().0 > now {
            return None;
        }
        Some(entry.remove())
    }

    pub fn clear(&mut self) {
        if !self.queue.is_empty() {
            tracing::debug!("Dropping {} scheduled tasks", self.queue.len());
        }
        self.queue.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
