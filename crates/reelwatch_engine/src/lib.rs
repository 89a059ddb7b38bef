//! Reelwatch engine: backend client, progress streaming and on-disk state.
mod backend;
mod engine;
mod filename;
mod persist;
mod slot;
mod sse;
mod stream;
mod types;

pub use backend::{ByteStream, ClientSettings, ReqwestBackend, TaskBackend};
pub use engine::EngineHandle;
pub use filename::artifact_filename;
pub use persist::{ensure_dir, AtomicFileWriter, PersistError, StagedFile};
pub use slot::{FileTaskSlot, ACTIVE_TASK_FILENAME};
pub use sse::{SseEvent, SseParser};
pub use stream::{run_progress_stream, ChannelEventSink, EventSink};
pub use types::{
    Catalog, CatalogEntry, ClientError, EngineEvent, FailureKind, SubtitleCatalog, VoiceOption,
};
