use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::supervisor::{Dispatch, Settlement, StreamPhase, Subscription};
use crate::{
    AppState, Effect, Epoch, FAILURE_MARKER, JobRequest, Msg, RunPhase, TaskId, TaskOutcome,
    UnitId, UnitStatus,
};

const ALERT_TEXT: &str = "system alert";
const NOTICE_TEXT: &str = "system notice";
const ABORTED_STEP: &str = "🛑 task aborted";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Startup { persisted } => match persisted {
            Some(task_id) => {
                engine_info!("Resuming persisted task {}", task_id);
                state.enter_running();
                let epoch = state.next_epoch();
                start_stream(&mut state, task_id, epoch)
            }
            None => Vec::new(),
        },
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::OptionsChanged(options) => {
            state.set_options(options);
            Vec::new()
        }
        Msg::GenerateClicked => submit(&mut state),
        Msg::SubmissionAccepted { epoch, task_id } => {
            if state.pending_submission() != Some(epoch) {
                // Aborted or superseded while the request was in flight.
                engine_warn!("Dropping orphaned task {} from submission {}", task_id, epoch);
                return (state, vec![Effect::RequestAbort { task_id }]);
            }
            state.take_pending_submission();
            let mut effects = vec![Effect::PersistTask {
                task_id: task_id.clone(),
            }];
            effects.extend(start_stream(&mut state, task_id, epoch));
            effects
        }
        Msg::SubmissionRejected { epoch, message } => {
            if state.pending_submission() == Some(epoch) {
                state.take_pending_submission();
                state.apply_unit(UnitId::alert(), UnitStatus::new(ALERT_TEXT, &*message, false));
                state.enter_idle(Some(TaskOutcome::Failed(message)));
            }
            Vec::new()
        }
        Msg::StreamOpened { epoch } => {
            if state.supervisor_mut().on_opened(epoch) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StreamRecord { epoch, record } => {
            match state.supervisor_mut().on_record(epoch, record) {
                Some(dispatch) => apply_dispatch(&mut state, epoch, dispatch),
                None => {
                    engine_debug!("Ignoring record for inactive subscription {}", epoch);
                    Vec::new()
                }
            }
        }
        Msg::StreamLost { epoch, reason } => {
            if state.supervisor_mut().on_transport_lost(epoch) {
                engine_warn!("Progress stream lost ({}); task stays resumable", reason);
                state.mark_dirty();
                vec![Effect::CloseStream { epoch }]
            } else {
                Vec::new()
            }
        }
        Msg::StreamRejected { epoch, reason } => {
            match state.supervisor_mut().on_rejected(epoch, reason) {
                Some(dispatch) => apply_dispatch(&mut state, epoch, dispatch),
                None => Vec::new(),
            }
        }
        Msg::ResumeRequested => resume(&mut state),
        Msg::AbortClicked => abort(&mut state),
        Msg::AbortSettled { task_id, result } => {
            if let Err(message) = &result {
                engine_warn!("Abort request for {} failed: {}", task_id, message);
            }
            if !state.settle_pending_abort(&task_id) {
                engine_debug!("Abort reply for {} no longer shown", task_id);
                return (state, Vec::new());
            }
            let step = match result {
                Ok(()) => ABORTED_STEP.to_string(),
                Err(message) => format!("{FAILURE_MARKER} abort request failed: {message}"),
            };
            state.apply_unit(UnitId::notice(), UnitStatus::new(NOTICE_TEXT, step, false));
            Vec::new()
        }
        Msg::ArtifactSettled { task_id, result } => {
            if state.completed_task() == Some(&task_id) {
                match result {
                    Ok(path) => state.set_artifact(path),
                    Err(message) => state.apply_unit(
                        UnitId::notice(),
                        UnitStatus::new(
                            NOTICE_TEXT,
                            format!("{FAILURE_MARKER} download failed: {message}"),
                            false,
                        ),
                    ),
                }
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    let stream_phase = state.supervisor().phase();
    let busy = state.pending_submission().is_some()
        || (state.phase() == RunPhase::Running && stream_phase != StreamPhase::Disconnected);
    if busy {
        state.set_notice("a task is already running");
        return Vec::new();
    }

    let text = state.input().trim().to_string();
    if text.is_empty() {
        state.set_notice("enter the script text first");
        return Vec::new();
    }

    let mut effects = Vec::new();
    // A lost connection does not block a new job; the new handle supersedes the old one.
    if let Some(previous) = state.supervisor_mut().abort() {
        if stream_phase.is_live() || stream_phase == StreamPhase::Disconnected {
            effects.push(Effect::CloseStream {
                epoch: previous.epoch,
            });
        }
    }

    let epoch = state.next_epoch();
    state.begin_submission(epoch);
    effects.push(Effect::SubmitJob {
        epoch,
        request: JobRequest {
            text,
            options: state.options().clone(),
        },
    });
    effects
}

fn start_stream(state: &mut AppState, task_id: TaskId, epoch: Epoch) -> Vec<Effect> {
    let started = state.supervisor_mut().start(task_id.clone(), epoch);
    let mut effects = Vec::with_capacity(2);
    if let Some(Subscription { epoch: previous, .. }) = started.previous {
        effects.push(Effect::CloseStream { epoch: previous });
    }
    effects.push(Effect::OpenStream { epoch, task_id });
    state.mark_dirty();
    effects
}

fn resume(state: &mut AppState) -> Vec<Effect> {
    if state.supervisor().phase() != StreamPhase::Disconnected {
        return Vec::new();
    }
    let Some(task_id) = state
        .supervisor()
        .subscription()
        .map(|subscription| subscription.task_id.clone())
    else {
        return Vec::new();
    };
    engine_info!("Reconnecting to task {}", task_id);
    let epoch = state.next_epoch();
    start_stream(state, task_id, epoch)
}

fn abort(state: &mut AppState) -> Vec<Effect> {
    if state.phase() != RunPhase::Running {
        return Vec::new();
    }

    let mut effects = Vec::new();
    if state.take_pending_submission().is_some() {
        // No task id yet; a late acceptance is aborted on arrival.
        state.apply_unit(UnitId::notice(), UnitStatus::new(NOTICE_TEXT, ABORTED_STEP, false));
    }
    if let Some(subscription) = state.supervisor_mut().abort() {
        state.set_pending_abort(subscription.task_id.clone(), subscription.epoch);
        effects.push(Effect::CloseStream {
            epoch: subscription.epoch,
        });
        effects.push(Effect::RequestAbort {
            task_id: subscription.task_id,
        });
    }
    effects.push(Effect::ClearTask);
    state.enter_idle(Some(TaskOutcome::Aborted));
    effects
}

fn apply_dispatch(state: &mut AppState, epoch: Epoch, dispatch: Dispatch) -> Vec<Effect> {
    for (unit, status) in dispatch.units {
        state.apply_unit(unit, status);
    }
    if let Some(progress) = dispatch.progress {
        state.set_progress(progress);
    }
    if let Some(message) = dispatch.alert {
        state.apply_unit(UnitId::alert(), UnitStatus::new(ALERT_TEXT, message, false));
    }

    let Some(settlement) = dispatch.settlement else {
        return Vec::new();
    };
    let mut effects = vec![Effect::CloseStream { epoch }, Effect::ClearTask];
    match settlement {
        Settlement::Resolved => {
            let task_id = state
                .supervisor()
                .subscription()
                .map(|subscription| subscription.task_id.clone());
            if let Some(task_id) = task_id {
                engine_info!("Task {} completed", task_id);
                state.set_completed_task(task_id.clone());
                effects.push(Effect::TaskCompleted { task_id });
            }
            state.enter_idle(Some(TaskOutcome::Completed));
        }
        Settlement::Rejected(message) => {
            engine_warn!("Task failed: {}", message);
            state.enter_idle(Some(TaskOutcome::Failed(message)));
        }
    }
    effects
}
