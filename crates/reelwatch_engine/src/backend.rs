use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reelwatch_core::{JobRequest, TaskId};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use engine_logging::{engine_debug, engine_info};

use crate::filename::artifact_filename;
use crate::persist::AtomicFileWriter;
use crate::types::{Catalog, CatalogEntry, ClientError, FailureKind, SubtitleCatalog, VoiceOption};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to submit, abort and catalog calls. The progress stream and
    /// the artifact download run without one.
    pub request_timeout: Duration,
    pub max_artifact_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8888".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_artifact_bytes: 2 * 1024 * 1024 * 1024,
        }
    }
}

pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// The generation backend as seen by the engine.
#[async_trait::async_trait]
pub trait TaskBackend: Send + Sync {
    async fn submit(&self, request: &JobRequest) -> Result<TaskId, ClientError>;

    async fn abort(&self, task_id: &TaskId) -> Result<(), ClientError>;

    /// Opens the event stream; the returned bytes are raw `text/event-stream`.
    async fn open_progress(&self, task_id: &TaskId) -> Result<ByteStream, ClientError>;

    /// Saves the finished artifact into `dir` and returns its path.
    async fn download(&self, task_id: &TaskId, dir: &Path) -> Result<PathBuf, ClientError>;

    async fn catalog(&self) -> Catalog;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::new(
                FailureKind::InvalidUrl,
                format!("{base} cannot carry a path"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Appends `segments` to the base path; each one is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::new(FailureKind::InvalidUrl, "base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        let response = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl TaskBackend for ReqwestBackend {
    async fn submit(&self, request: &JobRequest) -> Result<TaskId, ClientError> {
        let url = self.endpoint(&["api", "generate"])?;
        let response = self
            .client
            .post(url)
            .timeout(self.settings.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed = serde_json::from_slice::<SubmitResponse>(&body);

        if let Ok(SubmitResponse {
            error: Some(error), ..
        }) = &parsed
        {
            if !error.trim().is_empty() {
                return Err(ClientError::new(FailureKind::Rejected, error.trim()));
            }
        }
        if !status.is_success() {
            return Err(ClientError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let parsed =
            parsed.map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))?;
        let task_id = parsed.task_id.and_then(TaskId::new).ok_or_else(|| {
            ClientError::new(FailureKind::Decode, "response carried no task_id")
        })?;
        engine_info!("Backend accepted task {}", task_id);
        Ok(task_id)
    }

    async fn abort(&self, task_id: &TaskId) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "abort", task_id.as_str()])?;
        let response = self
            .client
            .post(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(())
    }

    async fn open_progress(&self, task_id: &TaskId) -> Result<ByteStream, ClientError> {
        let url = self.endpoint(&["api", "progress", task_id.as_str()])?;
        engine_debug!("Opening progress stream {}", url);
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_reqwest_error))
            .boxed())
    }

    async fn download(&self, task_id: &TaskId, dir: &Path) -> Result<PathBuf, ClientError> {
        let url = self.endpoint(&["api", "download", task_id.as_str()])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|body| body.error)
                .filter(|error| !error.trim().is_empty());
            return Err(match message {
                Some(error) => ClientError::new(FailureKind::Rejected, error.trim()),
                None => ClientError::new(
                    FailureKind::HttpStatus(status.as_u16()),
                    status.to_string(),
                ),
            });
        }

        let max_bytes = self.settings.max_artifact_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let writer = AtomicFileWriter::new(dir.to_path_buf());
        let mut staged = writer.stage().map_err(io_error)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = staged.written() + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            staged.write_chunk(&chunk).map_err(io_error)?;
        }
        let written = staged.written();
        let path = staged
            .commit(&artifact_filename(task_id))
            .map_err(io_error)?;
        engine_info!("Saved {} bytes to {:?}", written, path);
        Ok(path)
    }

    async fn catalog(&self) -> Catalog {
        let (voices, resolutions, bgm, subtitles) = tokio::join!(
            self.get_json::<Vec<VoiceOption>>(&["api", "voices"]),
            self.get_json::<Vec<CatalogEntry>>(&["api", "resolutions"]),
            self.get_json::<Vec<CatalogEntry>>(&["api", "bgm"]),
            self.get_json::<SubtitleCatalog>(&["api", "subtitle_presets"]),
        );
        Catalog {
            voices,
            resolutions,
            bgm,
            subtitles,
        }
    }
}

fn too_large(max_bytes: u64, actual: u64) -> ClientError {
    ClientError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "artifact too large",
    )
}

fn io_error(err: crate::persist::PersistError) -> ClientError {
    ClientError::new(FailureKind::Io, err.to_string())
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ClientError::new(FailureKind::Decode, err.to_string());
    }
    ClientError::new(FailureKind::Network, err.to_string())
}
