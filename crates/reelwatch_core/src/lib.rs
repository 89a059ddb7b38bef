//! Reelwatch core: task lifecycle state machine, feed reconciliation and view-model helpers.
mod controller;
mod effect;
pub mod feed;
mod msg;
mod record;
mod slot;
mod state;
pub mod supervisor;
mod update;
mod view_model;

pub use controller::TaskController;
pub use effect::Effect;
pub use feed::{Feed, RenderEffect, Slot, SlotId, SlotTone};
pub use msg::Msg;
pub use record::{
    Epoch, ImageConfig, InvalidTaskId, JobOptions, JobRequest, ProgressRecord, TaskId,
    TaskStatus, UnitId, UnitKind, UnitStatus, FAILURE_MARKER,
};
pub use slot::{MemoryTaskSlot, SlotError, TaskSlot};
pub use state::{AppState, RunPhase, TaskOutcome};
pub use supervisor::{Dispatch, Settlement, StreamPhase, StreamSupervisor, Subscription};
pub use update::update;
pub use view_model::{AppViewModel, ConnectionIndicator, SlotView};
