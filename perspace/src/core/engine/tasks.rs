use std::collections::VecDeque;

use perspace_ipc::{Command, MaximizeState};

use crate::core::{MonitorIndex, Point, WindowId, WorkspaceIndex};

/// Identifies one workspace operation and the deferred tasks it spawned.
pub type OpId = u64;

/// Work that has to wait for the host to settle.
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredTask {
    PlaceNewWindow {
        window_id: WindowId,
        target: MonitorIndex,
    },
    RestorePointer {
        op: OpId,
        point: Point,
    },
    RefocusAfterSwitch {
        op: OpId,
        monitor: MonitorIndex,
    },
    RestoreWindowState {
        op: OpId,
        window_id: WindowId,
        maximized: MaximizeState,
        fullscreen: bool,
    },
    RestorePreserved,
    RefreshAfterUnlock,
}

impl DeferredTask {
    pub fn op(&self) -> Option<OpId> {
        match self {
            DeferredTask::RestorePointer { op, .. }
            | DeferredTask::RefocusAfterSwitch { op, .. }
            | DeferredTask::RestoreWindowState { op, .. } => Some(*op),
            DeferredTask::PlaceNewWindow { .. }
            | DeferredTask::RestorePreserved
            | DeferredTask::RefreshAfterUnlock => None,
        }
    }
}

/// Requests that arrived while another operation was in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum QueuedRequest {
    Command(Command),
    ExternalSwitch(WorkspaceIndex),
}

/// Serializes switch-class operations. An operation stays in flight until
/// every deferred task it scheduled has run; requests arriving meanwhile
/// wait in FIFO order.
#[derive(Debug, Default)]
pub struct OperationGate {
    next_op: OpId,
    in_flight: Option<(OpId, usize)>,
    queue: VecDeque<QueuedRequest>,
}

impl OperationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> OpId {
        self.next_op += 1;
        self.in_flight = Some((self.next_op, 0));
        self.next_op
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn current(&self) -> Option<OpId> {
        self.in_flight.map(|(op, _)| op)
    }

    /// Count a task scheduled on behalf of `op`.
    pub fn track(&mut self, op: OpId) {
        if let Some((current, outstanding)) = self.in_flight.as_mut() {
            if *current == op {
                *outstanding += 1;
            }
        }
    }

    /// Record a finished task. Returns true when this ends the operation.
    pub fn complete(&mut self, op: OpId) -> bool {
        match self.in_flight.as_mut() {
            Some((current, outstanding)) if *current == op => {
                *outstanding = outstanding.saturating_sub(1);
                if *outstanding == 0 {
                    self.in_flight = None;
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    /// End `op` right away if it scheduled nothing.
    pub fn settle(&mut self, op: OpId) -> bool {
        if self.in_flight == Some((op, 0)) {
            self.in_flight = None;
            return true;
        }
        false
    }

    pub fn enqueue(&mut self, request: QueuedRequest) {
        tracing::debug!("Operation in flight, queueing {:?}", request);
        self.queue.push_back(request);
    }

    pub fn pop(&mut self) -> Option<QueuedRequest> {
        self.queue.pop_front()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn reset(&mut self) {
        self.in_flight = None;
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_tracks_outstanding_tasks() {
        let mut gate = OperationGate::new();
        let op = gate.begin();
        gate.track(op);
        gate.track(op);
        assert!(gate.is_busy());
        assert!(!gate.complete(op));
        assert!(gate.complete(op));
        assert!(!gate.is_busy());
    }

    #[test]
    fn test_gate_ignores_stale_ops() {
        let mut gate = OperationGate::new();
        let old = gate.begin();
        gate.track(old);
        let new = gate.begin();
        gate.track(new);
        assert!(!gate.complete(old));
        assert_eq!(gate.current(), Some(new));
    }

    #[test]
    fn test_settle_only_when_nothing_scheduled() {
        let mut gate = OperationGate::new();
        let op = gate.begin();
        assert!(gate.settle(op));
        let op = gate.begin();
        gate.track(op);
        assert!(!gate.settle(op));
        assert!(gate.is_busy());
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut gate = OperationGate::new();
        gate.enqueue(QueuedRequest::ExternalSwitch(3));
        gate.enqueue(QueuedRequest::Command(Command::SwitchToWorkspace { workspace: 1 }));
        assert_eq!(gate.queued(), 2);
        assert_eq!(gate.pop(), Some(QueuedRequest::ExternalSwitch(3)));
        gate.reset();
        assert_eq!(gate.pop(), None);
    }

    #[test]
    fn test_task_op() {
        let task = DeferredTask::RefocusAfterSwitch { op: 4, monitor: 1 };
        assert_eq!(task.op(), Some(4));
        assert_eq!(DeferredTask::RestorePreserved.op(), None);
    }
}
