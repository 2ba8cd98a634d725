use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

/// Events emitted while a batch runs. Completion order follows worker
/// scheduling, not discovery order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    TaskStarted {
        task_id: String,
        input_file: String,
    },
    TaskCompleted {
        task_id: String,
        input_file: String,
        processing_time: f64,
        output_size: Option<u64>,
    },
    TaskFailed {
        task_id: String,
        input_file: String,
        error: String,
    },
    TaskCancelled {
        task_id: String,
        input_file: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: BatchEvent);
}

/// No-op reporter for unit tests and callers that don't stream.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: BatchEvent) {}
}

/// Bridges batch events onto a broadcast channel for live consumers
/// (status UIs, log streamers). Send failures mean nobody is listening
/// and are deliberately ignored.
pub struct BroadcastProgress {
    sender: Arc<broadcast::Sender<BatchEvent>>,
}

impl BroadcastProgress {
    pub fn new(sender: Arc<broadcast::Sender<BatchEvent>>) -> Self {
        Self { sender }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: BatchEvent) {
        let _ = self.sender.send(event);
    }
}
