use std::fmt;
use std::path::PathBuf;

use reelwatch_core::{Epoch, ProgressRecord, TaskId};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Submitted {
        epoch: Epoch,
        result: Result<TaskId, ClientError>,
    },
    StreamOpened {
        epoch: Epoch,
    },
    StreamRecord {
        epoch: Epoch,
        record: ProgressRecord,
    },
    /// Transport ended or failed before a terminal record.
    StreamLost {
        epoch: Epoch,
        reason: String,
    },
    /// The server refused the subscription with a client error.
    StreamRejected {
        epoch: Epoch,
        reason: String,
    },
    AbortFinished {
        task_id: TaskId,
        result: Result<(), ClientError>,
    },
    DownloadFinished {
        task_id: TaskId,
        result: Result<PathBuf, ClientError>,
    },
    CatalogLoaded(Catalog),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Text shown to the user: the server's own words when it gave any.
    pub fn user_message(&self) -> String {
        match self.kind {
            FailureKind::Rejected => self.message.clone(),
            _ => self.to_string(),
        }
    }

    /// 4xx: the request itself is wrong and retrying will not help.
    pub fn is_client_rejection(&self) -> bool {
        match self.kind {
            FailureKind::HttpStatus(code) => (400..500).contains(&code),
            FailureKind::Rejected => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    /// Backend answered with an `error` message.
    Rejected,
    Timeout,
    Network,
    Decode,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Rejected => write!(f, "rejected by server"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoiceOption {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SubtitleCatalog {
    #[serde(default)]
    pub presets: Vec<CatalogEntry>,
    #[serde(default)]
    pub fonts: Vec<String>,
}

/// Option lists offered by the backend; each list fails independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub voices: Result<Vec<VoiceOption>, ClientError>,
    pub resolutions: Result<Vec<CatalogEntry>, ClientError>,
    pub bgm: Result<Vec<CatalogEntry>, ClientError>,
    pub subtitles: Result<SubtitleCatalog, ClientError>,
}
