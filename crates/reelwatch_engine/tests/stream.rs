use std::sync::{Arc, Mutex, Once};

use pretty_assertions::assert_eq;
use reelwatch_core::{Epoch, TaskId, TaskStatus};
use reelwatch_engine::{
    run_progress_stream, ClientSettings, EngineEvent, EventSink, ReqwestBackend,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

async fn serve_progress(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/api/progress/t-1"))
        .respond_with(
            ResponseTemplate::new(status).set_body_raw(body.as_bytes().to_vec(), "text/event-stream"),
        )
        .mount(server)
        .await;
}

async fn follow(server: &MockServer, cancel: CancellationToken) -> Vec<EngineEvent> {
    let backend = ReqwestBackend::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .unwrap();
    let sink = TestSink::default();
    let task_id = TaskId::new("t-1").unwrap();
    run_progress_stream(&backend, &task_id, Epoch(4), &sink, cancel).await;
    sink.take()
}

#[tokio::test]
async fn records_flow_until_the_terminal_one() {
    init_logging();
    let server = MockServer::start().await;
    serve_progress(
        &server,
        200,
        concat!(
            ": hello\n\n",
            "data: {\"progress\":30,\"scenes_status\":{\"1\":{\"text\":\"t1\",\"step\":\"rendering\",\"done\":false}}}\n\n",
            "data: {\"progress\":100,\"status\":\"completed\"}\n\n",
            "data: {\"progress\":5}\n\n",
        ),
    )
    .await;

    let events = follow(&server, CancellationToken::new()).await;
    assert_eq!(events.len(), 3, "{events:?}");
    assert_eq!(events[0], EngineEvent::StreamOpened { epoch: Epoch(4) });
    match &events[1] {
        EngineEvent::StreamRecord { epoch, record } => {
            assert_eq!(*epoch, Epoch(4));
            assert_eq!(record.progress, Some(30));
            assert_eq!(record.units.len(), 1);
        }
        other => panic!("unexpected {other:?}"),
    }
    match &events[2] {
        EngineEvent::StreamRecord { record, .. } => {
            assert_eq!(record.status, Some(TaskStatus::Completed));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn eof_without_terminal_record_is_a_lost_stream() {
    init_logging();
    let server = MockServer::start().await;
    serve_progress(&server, 200, "data: {\"progress\":40}\n\n").await;

    let events = follow(&server, CancellationToken::new()).await;
    assert_eq!(events.len(), 3, "{events:?}");
    assert!(matches!(events[2], EngineEvent::StreamLost { epoch: Epoch(4), .. }));
}

#[tokio::test]
async fn empty_stream_means_the_task_is_unknown() {
    init_logging();
    let server = MockServer::start().await;
    serve_progress(&server, 200, "").await;

    let events = follow(&server, CancellationToken::new()).await;
    assert_eq!(events.len(), 2, "{events:?}");
    assert!(matches!(events[0], EngineEvent::StreamOpened { epoch: Epoch(4) }));
    assert!(matches!(events[1], EngineEvent::StreamRejected { epoch: Epoch(4), .. }));
}

#[tokio::test]
async fn malformed_records_are_skipped() {
    init_logging();
    let server = MockServer::start().await;
    serve_progress(
        &server,
        200,
        "data: not json\n\nevent: ping\ndata: {}\n\ndata: {\"error\":\"quota exceeded\"}\n\n",
    )
    .await;

    let events = follow(&server, CancellationToken::new()).await;
    assert_eq!(events.len(), 2, "{events:?}");
    match &events[1] {
        EngineEvent::StreamRecord { record, .. } => {
            assert_eq!(record.error.as_deref(), Some("quota exceeded"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn client_error_on_open_is_a_rejection() {
    init_logging();
    let server = MockServer::start().await;
    serve_progress(&server, 404, "").await;

    let events = follow(&server, CancellationToken::new()).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], EngineEvent::StreamRejected { epoch: Epoch(4), .. }));
}

#[tokio::test]
async fn server_error_on_open_keeps_the_task() {
    init_logging();
    let server = MockServer::start().await;
    serve_progress(&server, 503, "").await;

    let events = follow(&server, CancellationToken::new()).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], EngineEvent::StreamLost { epoch: Epoch(4), .. }));
}

#[tokio::test]
async fn cancelled_stream_emits_nothing() {
    init_logging();
    let server = MockServer::start().await;
    serve_progress(&server, 200, "data: {\"progress\":1}\n\n").await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    assert_eq!(follow(&server, cancel).await, Vec::new());
}
