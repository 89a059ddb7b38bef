use crate::feed::{Slot, SlotId, SlotTone};
use crate::supervisor::StreamPhase;
use crate::{RunPhase, TaskId, TaskOutcome, UnitId, UnitKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionIndicator {
    #[default]
    Ready,
    Connecting,
    Live,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: RunPhase,
    pub stream: StreamPhase,
    pub connection: ConnectionIndicator,
    pub task_id: Option<TaskId>,
    pub progress: u8,
    /// Newest first.
    pub slots: Vec<SlotView>,
    /// Task whose artifact can be downloaded.
    pub completed_task: Option<TaskId>,
    pub artifact: Option<String>,
    pub outcome: Option<TaskOutcome>,
    pub notice: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub id: SlotId,
    pub unit: UnitId,
    pub kind: UnitKind,
    pub label: String,
    pub text: String,
    pub step: Option<String>,
    pub tone: SlotTone,
}

impl From<&Slot> for SlotView {
    fn from(slot: &Slot) -> Self {
        let label = match slot.kind {
            UnitKind::Scene => format!("scene {}", slot.unit),
            UnitKind::System => "system engine".to_string(),
            UnitKind::Notice => "system notice".to_string(),
            UnitKind::Alert => "system alert".to_string(),
        };
        Self {
            id: slot.id,
            unit: slot.unit.clone(),
            kind: slot.kind,
            label,
            text: slot.status.text.clone().unwrap_or_default(),
            step: slot.status.step.clone().filter(|step| !step.is_empty()),
            tone: slot.tone(),
        }
    }
}
