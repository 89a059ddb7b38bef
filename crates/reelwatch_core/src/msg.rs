use crate::{Epoch, JobOptions, ProgressRecord, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Client start-up with whatever the task slot held.
    Startup { persisted: Option<TaskId> },
    /// User edited the script text.
    InputChanged(String),
    /// User changed voice, resolution, music or subtitle options.
    OptionsChanged(JobOptions),
    /// User asked to generate a video from the current input.
    GenerateClicked,
    /// Backend accepted the submission made under `epoch`.
    SubmissionAccepted { epoch: Epoch, task_id: TaskId },
    /// Backend (or the network) refused the submission made under `epoch`.
    SubmissionRejected { epoch: Epoch, message: String },
    /// Progress stream for `epoch` is connected.
    StreamOpened { epoch: Epoch },
    /// One decoded progress record.
    StreamRecord { epoch: Epoch, record: ProgressRecord },
    /// Progress stream ended without a terminal record.
    StreamLost { epoch: Epoch, reason: String },
    /// Server refused to stream this task (e.g. unknown id).
    StreamRejected { epoch: Epoch, reason: String },
    /// Reopen the stream of a task whose connection was lost.
    ResumeRequested,
    /// User clicked abort.
    AbortClicked,
    /// Outcome of the best-effort abort request.
    AbortSettled {
        task_id: TaskId,
        result: Result<(), String>,
    },
    /// Outcome of downloading the finished artifact; `Ok` carries the saved path.
    ArtifactSettled {
        task_id: TaskId,
        result: Result<String, String>,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
