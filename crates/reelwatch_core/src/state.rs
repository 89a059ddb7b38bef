use crate::feed::{Feed, RenderEffect};
use crate::supervisor::{StreamPhase, StreamSupervisor};
use crate::view_model::{AppViewModel, ConnectionIndicator, SlotView};
use crate::{Epoch, JobOptions, TaskId, UnitId, UnitStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Failed(String),
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    input: String,
    options: JobOptions,
    phase: RunPhase,
    epoch: Epoch,
    pending_submission: Option<Epoch>,
    pending_abort: Option<(TaskId, Epoch)>,
    supervisor: StreamSupervisor,
    feed: Feed,
    progress: u8,
    completed_task: Option<TaskId>,
    artifact: Option<String>,
    outcome: Option<TaskOutcome>,
    notice: Option<String>,
    redraws: Vec<RenderEffect>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase,
            stream: self.supervisor.phase(),
            connection: self.connection(),
            task_id: self
                .supervisor
                .subscription()
                .map(|subscription| subscription.task_id.clone()),
            progress: self.progress,
            slots: self.feed.newest_first().map(SlotView::from).collect(),
            completed_task: self.completed_task.clone(),
            artifact: self.artifact.clone(),
            outcome: self.outcome.clone(),
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    fn connection(&self) -> ConnectionIndicator {
        match self.supervisor.phase() {
            StreamPhase::Disconnected => ConnectionIndicator::Degraded,
            StreamPhase::Connecting | StreamPhase::Streaming if self.supervisor.is_connected() => {
                ConnectionIndicator::Live
            }
            StreamPhase::Connecting | StreamPhase::Streaming => ConnectionIndicator::Connecting,
            StreamPhase::Idle | StreamPhase::Completed | StreamPhase::Failed => {
                if self.pending_submission.is_some() {
                    ConnectionIndicator::Connecting
                } else {
                    ConnectionIndicator::Ready
                }
            }
        }
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn stream_phase(&self) -> StreamPhase {
        self.supervisor.phase()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    /// Returns and resets the dirty flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Feed redraw instructions accumulated since the last call.
    pub fn take_redraws(&mut self) -> Vec<RenderEffect> {
        std::mem::take(&mut self.redraws)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_input(&mut self, input: String) {
        self.input = input;
    }

    pub(crate) fn set_options(&mut self, options: JobOptions) {
        self.options = options;
    }

    pub(crate) fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
        self.dirty = true;
    }

    pub(crate) fn supervisor_mut(&mut self) -> &mut StreamSupervisor {
        &mut self.supervisor
    }

    pub(crate) fn supervisor(&self) -> &StreamSupervisor {
        &self.supervisor
    }

    pub(crate) fn pending_submission(&self) -> Option<Epoch> {
        self.pending_submission
    }

    pub(crate) fn take_pending_submission(&mut self) -> Option<Epoch> {
        self.pending_submission.take()
    }

    pub(crate) fn set_pending_abort(&mut self, task_id: TaskId, epoch: Epoch) {
        self.pending_abort = Some((task_id, epoch));
    }

    /// Takes the pending abort if it belongs to `task_id` and nothing newer
    /// has been submitted or streamed since.
    pub(crate) fn settle_pending_abort(&mut self, task_id: &TaskId) -> bool {
        let current = matches!(
            &self.pending_abort,
            Some((pending, epoch)) if pending == task_id && *epoch == self.epoch
        );
        if current {
            self.pending_abort = None;
        }
        current
    }

    pub(crate) fn next_epoch(&mut self) -> Epoch {
        self.epoch = self.epoch.next();
        self.epoch
    }

    /// Running UI for a fresh submission: empty feed, no previous result.
    pub(crate) fn begin_submission(&mut self, epoch: Epoch) {
        self.pending_submission = Some(epoch);
        self.feed = Feed::new();
        self.redraws.clear();
        self.enter_running();
    }

    pub(crate) fn enter_running(&mut self) {
        self.phase = RunPhase::Running;
        self.progress = 0;
        self.completed_task = None;
        self.artifact = None;
        self.outcome = None;
        self.notice = None;
        self.dirty = true;
    }

    pub(crate) fn enter_idle(&mut self, outcome: Option<TaskOutcome>) {
        self.phase = RunPhase::Idle;
        self.outcome = outcome;
        self.dirty = true;
    }

    pub(crate) fn set_progress(&mut self, progress: u8) {
        if self.progress != progress {
            self.progress = progress;
            self.dirty = true;
        }
    }

    pub(crate) fn set_completed_task(&mut self, task_id: TaskId) {
        self.completed_task = Some(task_id);
    }

    pub(crate) fn completed_task(&self) -> Option<&TaskId> {
        self.completed_task.as_ref()
    }

    pub(crate) fn set_artifact(&mut self, path: String) {
        self.artifact = Some(path);
        self.dirty = true;
    }

    pub(crate) fn apply_unit(&mut self, unit: UnitId, status: UnitStatus) {
        let effect = self.feed.apply(unit, status);
        if !matches!(effect, RenderEffect::Unchanged { .. }) {
            self.dirty = true;
            self.redraws.push(effect);
        }
    }
}
