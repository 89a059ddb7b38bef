use engine_logging::{
    clear_task_context, engine_debug, engine_error, set_task_context,
};

use crate::feed::RenderEffect;
use crate::{update, AppState, AppViewModel, Effect, Msg, TaskSlot};

/// Task controller: owns the app state and the injected task slot.
///
/// Slot effects (`PersistTask`, `ClearTask`) are carried out here; every
/// other effect is returned to the caller for IO.
#[derive(Debug)]
pub struct TaskController<S: TaskSlot> {
    state: AppState,
    slot: S,
}

impl<S: TaskSlot> TaskController<S> {
    pub fn new(slot: S) -> Self {
        Self {
            state: AppState::new(),
            slot,
        }
    }

    /// Start-up resumption: picks up whatever task the slot still holds.
    pub fn boot(&mut self) -> Vec<Effect> {
        let persisted = self.slot.get();
        self.dispatch(Msg::Startup { persisted })
    }

    pub fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        effects
            .into_iter()
            .filter_map(|effect| self.perform_slot_effect(effect))
            .collect()
    }

    fn perform_slot_effect(&mut self, effect: Effect) -> Option<Effect> {
        match effect {
            Effect::PersistTask { task_id } => {
                if let Err(err) = self.slot.set(&task_id) {
                    engine_error!("{}", err);
                    self.state
                        .set_notice(format!("task {task_id} will not survive a restart: {err}"));
                }
                None
            }
            Effect::ClearTask => {
                if let Err(err) = self.slot.clear() {
                    engine_error!("{}", err);
                }
                clear_task_context();
                None
            }
            Effect::OpenStream { epoch, ref task_id } => {
                set_task_context(task_id.as_str());
                engine_debug!("Opening progress stream {}", epoch);
                Some(effect)
            }
            other => Some(other),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn consume_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    pub fn take_redraws(&mut self) -> Vec<RenderEffect> {
        self.state.take_redraws()
    }
}
