use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use reelwatch_core::{Epoch, JobOptions, JobRequest, TaskId};
use reelwatch_engine::{
    ByteStream, Catalog, ClientError, EngineEvent, EngineHandle, FailureKind, TaskBackend,
};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Streams for "hang" never produce data; every other task completes at once.
struct FakeBackend;

fn unavailable() -> ClientError {
    ClientError {
        kind: FailureKind::Network,
        message: "offline".to_string(),
    }
}

#[async_trait::async_trait]
impl TaskBackend for FakeBackend {
    async fn submit(&self, request: &JobRequest) -> Result<TaskId, ClientError> {
        TaskId::new(format!("task-{}", request.text)).ok_or_else(unavailable)
    }

    async fn abort(&self, _task_id: &TaskId) -> Result<(), ClientError> {
        Err(unavailable())
    }

    async fn open_progress(&self, task_id: &TaskId) -> Result<ByteStream, ClientError> {
        if task_id.as_str() == "hang" {
            return Ok(stream::pending().boxed());
        }
        let body = Bytes::from_static(b"data: {\"progress\":100,\"status\":\"completed\"}\n\n");
        Ok(stream::iter(vec![Ok(body)]).chain(stream::pending()).boxed())
    }

    async fn download(&self, _task_id: &TaskId, dir: &Path) -> Result<PathBuf, ClientError> {
        Ok(dir.join("video.mp4"))
    }

    async fn catalog(&self) -> Catalog {
        Catalog {
            voices: Err(unavailable()),
            resolutions: Ok(Vec::new()),
            bgm: Ok(Vec::new()),
            subtitles: Err(unavailable()),
        }
    }
}

fn collect_until(
    engine: &EngineHandle,
    mut done: impl FnMut(&EngineEvent) -> bool,
) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        if let Some(event) = engine.recv_timeout(Duration::from_millis(50)) {
            let finished = done(&event);
            events.push(event);
            if finished {
                return events;
            }
        }
    }
    panic!("timed out; saw {events:?}");
}

#[test]
fn submit_reports_back_with_its_epoch() {
    init_logging();
    let engine = EngineHandle::with_backend(Arc::new(FakeBackend)).unwrap();
    engine.submit(
        Epoch(3),
        JobRequest {
            text: "a".to_string(),
            options: JobOptions::default(),
        },
    );
    let events = collect_until(&engine, |event| matches!(event, EngineEvent::Submitted { .. }));
    assert_eq!(
        events.last(),
        Some(&EngineEvent::Submitted {
            epoch: Epoch(3),
            result: Ok(TaskId::new("task-a").unwrap()),
        })
    );
}

#[test]
fn opening_a_stream_cancels_the_previous_one() {
    init_logging();
    let engine = EngineHandle::with_backend(Arc::new(FakeBackend)).unwrap();
    engine.open_stream(Epoch(1), TaskId::new("hang").unwrap());
    engine.open_stream(Epoch(2), TaskId::new("t-2").unwrap());

    let events = collect_until(&engine, |event| {
        matches!(event, EngineEvent::StreamRecord { epoch: Epoch(2), .. })
    });
    assert!(events.iter().all(|event| !matches!(
        event,
        EngineEvent::StreamLost { .. } | EngineEvent::StreamRecord { epoch: Epoch(1), .. }
    )));

    // A stale close must not touch the live stream.
    engine.close_stream(Epoch(1));
    engine.abort(TaskId::new("t-2").unwrap());
    let events = collect_until(&engine, |event| matches!(event, EngineEvent::AbortFinished { .. }));
    assert!(matches!(
        events.last(),
        Some(EngineEvent::AbortFinished { result: Err(_), .. })
    ));
}

#[test]
fn catalog_and_download_round_through_the_engine() {
    init_logging();
    let engine = EngineHandle::with_backend(Arc::new(FakeBackend)).unwrap();
    engine.load_catalog();
    engine.download(TaskId::new("t-1").unwrap(), PathBuf::from("out"));

    let mut seen = BTreeMap::new();
    collect_until(&engine, |event| {
        match event {
            EngineEvent::CatalogLoaded(catalog) => {
                seen.insert("catalog", catalog.voices.is_err() && catalog.bgm.is_ok());
            }
            EngineEvent::DownloadFinished { result, .. } => {
                seen.insert("download", result.as_deref() == Ok(Path::new("out/video.mp4")));
            }
            _ => {}
        }
        seen.len() == 2
    });
    assert_eq!(seen.get("catalog"), Some(&true));
    assert_eq!(seen.get("download"), Some(&true));
}
