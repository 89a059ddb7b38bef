use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Step labels containing this marker are rendered as failures.
pub const FAILURE_MARKER: char = '❌';

/// Opaque identifier of a generation job, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("task id must not be blank")]
pub struct InvalidTaskId;

impl TaskId {
    /// Trims `raw`; blank ids are rejected.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskId {
    type Error = InvalidTaskId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidTaskId)
    }
}

impl From<TaskId> for String {
    fn from(value: TaskId) -> Self {
        value.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic generation counter tagging submissions and subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(pub u64);

impl Epoch {
    pub fn next(self) -> Self {
        Epoch(self.0 + 1)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Key of a unit in `scenes_status`.
///
/// Ordered numerically for numeric ids (`"2" < "10"`), then lexically for the rest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    pub const SYSTEM: &'static str = "0";
    pub const NOTICE: &'static str = "sys";
    pub const ALERT: &'static str = "err";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn notice() -> Self {
        Self::new(Self::NOTICE)
    }

    pub fn alert() -> Self {
        Self::new(Self::ALERT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> UnitKind {
        match self.0.as_str() {
            Self::SYSTEM => UnitKind::System,
            Self::NOTICE => UnitKind::Notice,
            Self::ALERT => UnitKind::Alert,
            _ => UnitKind::Scene,
        }
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl PartialOrd for UnitId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UnitId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// A numbered generation unit.
    Scene,
    /// The backend's own engine messages (`"0"`).
    System,
    /// Client-side notices such as an abort confirmation (`"sys"`).
    Notice,
    /// Client-side error channel (`"err"`).
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitStatus {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub step: Option<String>,
    #[serde(default)]
    pub done: bool,
}

impl UnitStatus {
    pub fn new(text: impl Into<String>, step: impl Into<String>, done: bool) -> Self {
        Self {
            text: Some(text.into()),
            step: Some(step.into()),
            done,
        }
    }

    pub fn has_failure_marker(&self) -> bool {
        self.step
            .as_deref()
            .is_some_and(|step| step.contains(FAILURE_MARKER))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Error,
    #[serde(other)]
    Unknown,
}

/// One server-pushed progress event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ProgressRecord {
    #[serde(default, deserialize_with = "percent")]
    pub progress: Option<u8>,
    #[serde(default, deserialize_with = "non_blank")]
    pub error: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(rename = "scenes_status", default, deserialize_with = "nullable_units")]
    pub units: BTreeMap<UnitId, UnitStatus>,
}

impl ProgressRecord {
    /// Whether this record ends the stream for its task.
    pub fn is_terminal(&self) -> bool {
        self.error.is_some()
            || matches!(
                self.status,
                Some(TaskStatus::Completed) | Some(TaskStatus::Error)
            )
    }
}

fn percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, 100.0).round() as u8))
}

fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|message| !message.trim().is_empty()))
}

fn nullable_units<'de, D>(deserializer: D) -> Result<BTreeMap<UnitId, UnitStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

/// Generation parameters other than the script text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptions {
    pub voice: String,
    pub resolution: String,
    pub bgm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            voice: "zh-CN-XiaoxiaoNeural".to_string(),
            resolution: "9:16".to_string(),
            bgm: "none".to_string(),
            subtitle_style: Some("classic_yellow".to_string()),
            font_name: Some("PingFang SC".to_string()),
            image_config: None,
        }
    }
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    pub text: String,
    #[serde(flatten)]
    pub options: JobOptions,
}
