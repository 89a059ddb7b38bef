//! Progress stream supervision as an explicit, transport-independent state machine.
//!
//! ```text
//! Idle -> Connecting -> Streaming -> { Completed, Failed, Disconnected }
//! ```
//!
//! The supervisor never touches the feed or the task slot itself: every
//! transition returns a [`Dispatch`] describing what the controller must do.

use crate::{Epoch, ProgressRecord, TaskId, TaskStatus, UnitId, UnitStatus};

pub const GENERATION_FAILED: &str = "generation failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamPhase {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Completed,
    Failed,
    Disconnected,
}

impl StreamPhase {
    /// A subscription is open or being opened.
    pub fn is_live(self) -> bool {
        matches!(self, StreamPhase::Connecting | StreamPhase::Streaming)
    }
}

/// Handle of one subscription; closing it means closing its epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub task_id: TaskId,
    pub epoch: Epoch,
}

/// Completion signal of a subscription, produced at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Resolved,
    Rejected(String),
}

/// Work the controller performs after an accepted transition.
///
/// Any settlement implies: close the subscription and clear the task slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dispatch {
    pub units: Vec<(UnitId, UnitStatus)>,
    pub progress: Option<u8>,
    pub alert: Option<String>,
    pub settlement: Option<Settlement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    /// Subscription that was active before; it must be closed first.
    pub previous: Option<Subscription>,
    pub current: Subscription,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSupervisor {
    phase: StreamPhase,
    subscription: Option<Subscription>,
    connected: bool,
}

impl StreamSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    /// The transport has confirmed the current subscription.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn accepts(&self, epoch: Epoch) -> bool {
        self.phase.is_live()
            && self
                .subscription
                .as_ref()
                .is_some_and(|subscription| subscription.epoch == epoch)
    }

    pub fn start(&mut self, task_id: TaskId, epoch: Epoch) -> Started {
        let previous = self.subscription.take();
        let current = Subscription { task_id, epoch };
        self.subscription = Some(current.clone());
        self.phase = StreamPhase::Connecting;
        self.connected = false;
        Started { previous, current }
    }

    pub fn on_opened(&mut self, epoch: Epoch) -> bool {
        if !self.accepts(epoch) {
            return false;
        }
        self.connected = true;
        true
    }

    /// Returns `None` when the record belongs to a stale or finished subscription.
    pub fn on_record(&mut self, epoch: Epoch, record: ProgressRecord) -> Option<Dispatch> {
        if !self.accepts(epoch) {
            return None;
        }
        self.phase = StreamPhase::Streaming;
        self.connected = true;

        if let Some(message) = record.error {
            self.phase = StreamPhase::Failed;
            return Some(Dispatch {
                alert: Some(message.clone()),
                settlement: Some(Settlement::Rejected(message)),
                ..Dispatch::default()
            });
        }

        let mut dispatch = Dispatch {
            units: record.units.into_iter().collect(),
            progress: record.progress,
            ..Dispatch::default()
        };
        match record.status {
            Some(TaskStatus::Completed) => {
                self.phase = StreamPhase::Completed;
                dispatch.settlement = Some(Settlement::Resolved);
            }
            Some(TaskStatus::Error) => {
                self.phase = StreamPhase::Failed;
                dispatch.alert = Some(GENERATION_FAILED.to_string());
                dispatch.settlement = Some(Settlement::Rejected(GENERATION_FAILED.to_string()));
            }
            Some(TaskStatus::Pending | TaskStatus::Running | TaskStatus::Unknown) | None => {}
        }
        Some(dispatch)
    }

    /// Connection dropped without a terminal record. The task may still be
    /// running server-side, so nothing is settled.
    pub fn on_transport_lost(&mut self, epoch: Epoch) -> bool {
        if !self.accepts(epoch) {
            return false;
        }
        self.phase = StreamPhase::Disconnected;
        self.connected = false;
        true
    }

    /// The server refused the subscription outright (unknown or invalid task).
    pub fn on_rejected(&mut self, epoch: Epoch, reason: String) -> Option<Dispatch> {
        if !self.accepts(epoch) {
            return None;
        }
        self.phase = StreamPhase::Failed;
        self.connected = false;
        Some(Dispatch {
            alert: Some(reason.clone()),
            settlement: Some(Settlement::Rejected(reason)),
            ..Dispatch::default()
        })
    }

    /// Drops the subscription whatever the current phase and returns it for teardown.
    pub fn abort(&mut self) -> Option<Subscription> {
        self.phase = StreamPhase::Idle;
        self.connected = false;
        self.subscription.take()
    }
}
