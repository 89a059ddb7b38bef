use std::path::PathBuf;

use engine_logging::{engine_debug, engine_info, engine_warn};
use reelwatch_core::{Effect, Msg};
use reelwatch_engine::{EngineEvent, EngineHandle};

/// Carries controller effects out on the engine and tracks which replies
/// the session still has to wait for.
pub struct EffectRunner {
    engine: EngineHandle,
    output_dir: Option<PathBuf>,
    pending_submits: usize,
    pending_aborts: usize,
    pending_downloads: usize,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, output_dir: Option<PathBuf>) -> Self {
        Self {
            engine,
            output_dir,
            pending_submits: 0,
            pending_aborts: 0,
            pending_downloads: 0,
        }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitJob { epoch, request } => {
                    engine_info!(
                        "SubmitJob epoch={} text_len={} voice={}",
                        epoch,
                        request.text.len(),
                        request.options.voice
                    );
                    self.pending_submits += 1;
                    self.engine.submit(epoch, request);
                }
                Effect::OpenStream { epoch, task_id } => {
                    self.engine.open_stream(epoch, task_id);
                }
                Effect::CloseStream { epoch } => {
                    self.engine.close_stream(epoch);
                }
                Effect::RequestAbort { task_id } => {
                    engine_info!("RequestAbort task_id={}", task_id);
                    self.pending_aborts += 1;
                    self.engine.abort(task_id);
                }
                Effect::TaskCompleted { task_id } => match &self.output_dir {
                    Some(dir) => {
                        engine_info!("Downloading {} into {:?}", task_id, dir);
                        self.pending_downloads += 1;
                        self.engine.download(task_id, dir.clone());
                    }
                    None => engine_debug!("Task {} completed; no output dir given", task_id),
                },
                Effect::PersistTask { .. } | Effect::ClearTask => {
                    // handled by the controller
                }
            }
        }
    }

    /// Translates an engine event, settling any reply the session waits on.
    pub fn translate(&mut self, event: EngineEvent) -> Option<Msg> {
        let msg = match event {
            EngineEvent::Submitted { epoch, result } => {
                self.pending_submits = self.pending_submits.saturating_sub(1);
                match result {
                    Ok(task_id) => Msg::SubmissionAccepted { epoch, task_id },
                    Err(err) => {
                        engine_warn!("Submission {} failed: {}", epoch, err);
                        Msg::SubmissionRejected {
                            epoch,
                            message: err.user_message(),
                        }
                    }
                }
            }
            EngineEvent::StreamOpened { epoch } => Msg::StreamOpened { epoch },
            EngineEvent::StreamRecord { epoch, record } => Msg::StreamRecord { epoch, record },
            EngineEvent::StreamLost { epoch, reason } => Msg::StreamLost { epoch, reason },
            EngineEvent::StreamRejected { epoch, reason } => Msg::StreamRejected { epoch, reason },
            EngineEvent::AbortFinished { task_id, result } => {
                self.pending_aborts = self.pending_aborts.saturating_sub(1);
                Msg::AbortSettled {
                    task_id,
                    result: result.map_err(|err| err.user_message()),
                }
            }
            EngineEvent::DownloadFinished { task_id, result } => {
                self.pending_downloads = self.pending_downloads.saturating_sub(1);
                Msg::ArtifactSettled {
                    task_id,
                    result: result
                        .map(|path| path.display().to_string())
                        .map_err(|err| err.user_message()),
                }
            }
            EngineEvent::CatalogLoaded(_) => return None,
        };
        Some(msg)
    }

    pub fn awaiting_replies(&self) -> bool {
        self.pending_submits > 0 || self.pending_aborts > 0 || self.pending_downloads > 0
    }
}
