use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use reelwatch_core::{Epoch, JobRequest, TaskId};
use tokio_util::sync::CancellationToken;

use engine_logging::{engine_debug, engine_info};

use crate::backend::{ClientSettings, ReqwestBackend, TaskBackend};
use crate::stream::{run_progress_stream, ChannelEventSink};
use crate::types::{ClientError, EngineEvent, FailureKind};

enum EngineCommand {
    Submit { epoch: Epoch, request: JobRequest },
    OpenStream { epoch: Epoch, task_id: TaskId },
    CloseStream { epoch: Epoch },
    Abort { task_id: TaskId },
    Download { task_id: TaskId, dir: PathBuf },
    LoadCatalog,
}

/// Runs backend IO on its own thread and reports back through [`EngineEvent`]s.
///
/// At most one progress stream is live; opening another cancels the previous one.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let backend = ReqwestBackend::new(settings)?;
        Self::with_backend(Arc::new(backend))
    }

    pub fn with_backend(backend: Arc<dyn TaskBackend>) -> Result<Self, ClientError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| ClientError::new(FailureKind::Io, err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let mut active: Option<(Epoch, CancellationToken)> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::OpenStream { epoch, task_id } => {
                        if let Some((previous, token)) = active.take() {
                            engine_debug!("Cancelling stream {} for {}", previous, epoch);
                            token.cancel();
                        }
                        let token = CancellationToken::new();
                        active = Some((epoch, token.clone()));
                        let backend = backend.clone();
                        let sink = ChannelEventSink::new(event_tx.clone());
                        runtime.spawn(async move {
                            run_progress_stream(backend.as_ref(), &task_id, epoch, &sink, token)
                                .await;
                        });
                    }
                    EngineCommand::CloseStream { epoch } => {
                        if matches!(&active, Some((current, _)) if *current == epoch) {
                            if let Some((_, token)) = active.take() {
                                token.cancel();
                            }
                        }
                    }
                    command => {
                        let backend = backend.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            handle_request(backend.as_ref(), command, event_tx).await;
                        });
                    }
                }
            }
            if let Some((_, token)) = active {
                token.cancel();
            }
            engine_debug!("Engine command channel closed");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn submit(&self, epoch: Epoch, request: JobRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Submit { epoch, request });
    }

    pub fn open_stream(&self, epoch: Epoch, task_id: TaskId) {
        let _ = self.cmd_tx.send(EngineCommand::OpenStream { epoch, task_id });
    }

    /// Only cancels the stream if it is still the one opened under `epoch`.
    pub fn close_stream(&self, epoch: Epoch) {
        let _ = self.cmd_tx.send(EngineCommand::CloseStream { epoch });
    }

    pub fn abort(&self, task_id: TaskId) {
        let _ = self.cmd_tx.send(EngineCommand::Abort { task_id });
    }

    pub fn download(&self, task_id: TaskId, dir: PathBuf) {
        let _ = self.cmd_tx.send(EngineCommand::Download { task_id, dir });
    }

    pub fn load_catalog(&self) {
        let _ = self.cmd_tx.send(EngineCommand::LoadCatalog);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_request(
    backend: &dyn TaskBackend,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::Submit { epoch, request } => {
            engine_info!("Submitting job ({} chars)", request.text.chars().count());
            let result = backend.submit(&request).await;
            EngineEvent::Submitted { epoch, result }
        }
        EngineCommand::Abort { task_id } => {
            let result = backend.abort(&task_id).await;
            EngineEvent::AbortFinished { task_id, result }
        }
        EngineCommand::Download { task_id, dir } => {
            let result = backend.download(&task_id, &dir).await;
            EngineEvent::DownloadFinished { task_id, result }
        }
        EngineCommand::LoadCatalog => EngineEvent::CatalogLoaded(backend.catalog().await),
        EngineCommand::OpenStream { .. } | EngineCommand::CloseStream { .. } => return,
    };
    let _ = event_tx.send(event);
}
