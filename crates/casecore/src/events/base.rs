use crate::{RouteOutcome, StageName, Status, Target};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

pub type ExecutionId = Uuid;

/// Events emitted while a case moves through the workflow
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum RunEvent {
    RunStarted {
        execution_id: ExecutionId,
        graph: String,
        subject: String,
        timestamp: DateTime<Utc>,
    },
    RunCompleted {
        execution_id: ExecutionId,
        success: bool,
        final_status: Option<Status>,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    StageStarted {
        execution_id: ExecutionId,
        stage: StageName,
        timestamp: DateTime<Utc>,
    },
    StageCompleted {
        execution_id: ExecutionId,
        stage: StageName,
        status: Status,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    StageFailed {
        execution_id: ExecutionId,
        stage: StageName,
        error: String,
        timestamp: DateTime<Utc>,
    },
    Routed {
        execution_id: ExecutionId,
        from: StageName,
        outcome: RouteOutcome,
        to: Target,
        timestamp: DateTime<Utc>,
    },
}

impl RunEvent {
    pub fn execution_id(&self) -> ExecutionId {
        match self {
            RunEvent::RunStarted { execution_id, .. }
            | RunEvent::RunCompleted { execution_id, .. }
            | RunEvent::StageStarted { execution_id, .. }
            | RunEvent::StageCompleted { execution_id, .. }
            | RunEvent::StageFailed { execution_id, .. }
            | RunEvent::Routed { execution_id, .. } => *execution_id,
        }
    }
}

/// Broadcast bus shared by every run of a runtime.
///
/// Sending never blocks and never fails the run; events are dropped when
/// nobody is subscribed.
pub struct EventBus {
    sender: broadcast::Sender<RunEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: RunEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}
