use perspace_ipc::{HostRequest, Topic};

use crate::platform::RequestSink;

/// A host event topic held open; unsubscribes when dropped.
pub struct Subscription<S: RequestSink> {
    topic: Topic,
    sink: S,
}

impl<S: RequestSink> Drop for Subscription<S> {
    fn drop(&mut self) {
        tracing::debug!("Unsubscribing from {:?}", self.topic);
        self.sink.send_request(HostRequest::Unsubscribe { topic: self.topic });
    }
}

/// Host event topics acquired on enable and released together on disable.
pub struct Subscriptions<S: RequestSink + Clone> {
    active: Vec<Subscription<S>>,
}

impl<S: RequestSink + Clone> Subscriptions<S> {
    pub fn new() -> Self {
        Self { active: Vec::new() }
    }

    pub fn acquire(&mut self, sink: &S) {
        if !self.active.is_empty() {
            return;
        }
        for topic in Topic::ALL {
            sink.send_request(HostRequest::Subscribe { topic });
            self.active.push(Subscription {
                topic,
                sink: sink.clone(),
            });
        }
        tracing::info!("Subscribed to {} host topics", self.active.len());
    }

    pub fn release(&mut self) {
        self.active.clear();
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        !self.active.is_empty()
    }
}

impl<S: RequestSink + Clone> Default for Subscriptions<S> {
    fn default() -> Self {
        Self::new()
    }
}
