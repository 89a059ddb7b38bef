use crate::{Epoch, JobRequest, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitJob { epoch: Epoch, request: JobRequest },
    /// Store `task_id` as the only active task.
    PersistTask { task_id: TaskId },
    ClearTask,
    OpenStream { epoch: Epoch, task_id: TaskId },
    CloseStream { epoch: Epoch },
    RequestAbort { task_id: TaskId },
    /// Emitted exactly once per successfully finished task.
    TaskCompleted { task_id: TaskId },
}
