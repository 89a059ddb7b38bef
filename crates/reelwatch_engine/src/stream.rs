use std::sync::mpsc;

use futures_util::StreamExt;
use reelwatch_core::{Epoch, ProgressRecord, TaskId};
use tokio_util::sync::CancellationToken;

use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::backend::TaskBackend;
use crate::sse::SseParser;
use crate::types::EngineEvent;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Follows one task's progress stream until a terminal record, the end of
/// the transport, or cancellation. Cancellation emits nothing.
pub async fn run_progress_stream(
    backend: &dyn TaskBackend,
    task_id: &TaskId,
    epoch: Epoch,
    sink: &dyn EventSink,
    cancel: CancellationToken,
) {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        opened = backend.open_progress(task_id) => opened,
    };
    let mut stream = match opened {
        Ok(stream) => stream,
        Err(err) if err.is_client_rejection() => {
            engine_warn!("Progress stream for {} rejected: {}", task_id, err);
            sink.emit(EngineEvent::StreamRejected {
                epoch,
                reason: err.user_message(),
            });
            return;
        }
        Err(err) => {
            engine_warn!("Progress stream for {} failed to open: {}", task_id, err);
            sink.emit(EngineEvent::StreamLost {
                epoch,
                reason: err.user_message(),
            });
            return;
        }
    };
    sink.emit(EngineEvent::StreamOpened { epoch });

    let mut parser = SseParser::new();
    let mut records = 0usize;
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                engine_debug!("Progress stream {} cancelled", epoch);
                return;
            }
            next = stream.next() => next,
        };
        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(err)) => {
                engine_warn!("Progress stream for {} broke: {}", task_id, err);
                sink.emit(EngineEvent::StreamLost {
                    epoch,
                    reason: err.user_message(),
                });
                return;
            }
            None if records == 0 => {
                // The backend ends the stream at once for a task it does not know.
                engine_warn!("Progress stream for {} closed before any record", task_id);
                sink.emit(EngineEvent::StreamRejected {
                    epoch,
                    reason: format!("unknown task {task_id}"),
                });
                return;
            }
            None => {
                engine_info!("Progress stream for {} ended without a terminal record", task_id);
                sink.emit(EngineEvent::StreamLost {
                    epoch,
                    reason: "stream closed by server".to_string(),
                });
                return;
            }
        };

        for event in parser.feed(&chunk) {
            if !event.is_message() {
                continue;
            }
            let record = match serde_json::from_str::<ProgressRecord>(&event.data) {
                Ok(record) => record,
                Err(err) => {
                    engine_warn!("Skipping malformed progress record: {}", err);
                    continue;
                }
            };
            records += 1;
            let terminal = record.is_terminal();
            sink.emit(EngineEvent::StreamRecord { epoch, record });
            if terminal {
                engine_debug!("Progress stream {} reached a terminal record", epoch);
                return;
            }
        }
    }
}
