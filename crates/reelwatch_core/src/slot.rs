use crate::TaskId;

#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("failed to persist active task: {0}")]
    Write(String),
    #[error("failed to remove active task: {0}")]
    Remove(String),
}

/// Single-slot durable store for the active task id.
///
/// At most one id is stored; `set` replaces whatever was there.
pub trait TaskSlot {
    /// Returns the stored id. Unreadable storage counts as empty.
    fn get(&self) -> Option<TaskId>;

    fn set(&mut self, task_id: &TaskId) -> Result<(), SlotError>;

    /// Removes the stored id; clearing an empty slot succeeds.
    fn clear(&mut self) -> Result<(), SlotError>;
}

/// Process-local slot, used by tests and embedders without a state directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTaskSlot {
    current: Option<TaskId>,
}

impl MemoryTaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(task_id: TaskId) -> Self {
        Self {
            current: Some(task_id),
        }
    }
}

impl TaskSlot for MemoryTaskSlot {
    fn get(&self) -> Option<TaskId> {
        self.current.clone()
    }

    fn set(&mut self, task_id: &TaskId) -> Result<(), SlotError> {
        self.current = Some(task_id.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SlotError> {
        self.current = None;
        Ok(())
    }
}

impl<S: TaskSlot + ?Sized> TaskSlot for Box<S> {
    fn get(&self) -> Option<TaskId> {
        (**self).get()
    }

    fn set(&mut self, task_id: &TaskId) -> Result<(), SlotError> {
        (**self).set(task_id)
    }

    fn clear(&mut self) -> Result<(), SlotError> {
        (**self).clear()
    }
}
