//! reqwest-backed [`FileTransfer`] implementation.
//!
//! # Design
//!
//! - Every operation runs under [`with_deadline`], which drops the in-flight
//!   request when the deadline elapses and logs the outcome.
//! - Upload bodies are streamed in chunks through a [`ProgressGate`]; the gate
//!   is closed before the outcome is returned, so progress never outlives the
//!   call.
//! - Downloads stream into a part file that is created before the deadline
//!   starts, renamed on success, and removed on every other path.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{StreamExt, stream};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::TransferConfig;
use crate::error::{TransferError, TransferResult};
use crate::model::{
    FileName, FilePayload, RemoteFileEntry, SavedFile, ServerMessage, TransferRequest,
    TransferTimeout,
};
use crate::outcome::{FailureKind, TransferFailure, TransferOutcome};
use crate::progress::{Percent, ProgressGate, ProgressSink};
use crate::save::{PartFile, SaveError, target_path};
use crate::transport::FileTransfer;

/// Header carrying the per-invocation request identifier.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Size of each upload body chunk handed to the transport.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// HTTP client for the file service.
#[derive(Clone)]
pub struct HttpTransferClient {
    client: Client,
    base_url: Url,
    download_dir: PathBuf,
}

impl HttpTransferClient {
    /// Build a client from validated configuration.
    ///
    /// `request_id`, when given, is sent as `x-request-id` on every request.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidConfig`] for invalid configuration or
    /// request identifiers, and [`TransferError::ClientBuild`] when reqwest
    /// cannot construct the client.
    pub fn from_config(config: &TransferConfig, request_id: Option<&str>) -> TransferResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        if let Some(request_id) = request_id {
            let value =
                HeaderValue::from_str(request_id).map_err(|_| TransferError::InvalidConfig {
                    field: "request_id",
                    value: Some(request_id.to_string()),
                    reason: "contains invalid header characters",
                })?;
            default_headers.insert(HEADER_REQUEST_ID, value);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(default_headers)
            .build()
            .map_err(|source| TransferError::ClientBuild { source })?;

        Ok(Self::with_client(
            client,
            config.base_url()?,
            config.download_dir.clone(),
        ))
    }

    /// Wrap an existing reqwest client.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url, download_dir: PathBuf) -> Self {
        Self {
            client,
            base_url,
            download_dir,
        }
    }

    /// Service base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Directory downloads are saved into.
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Absolute URL for `request`.
    ///
    /// # Errors
    ///
    /// Returns an input failure when the joined URL does not parse.
    pub fn endpoint(&self, request: &TransferRequest) -> Result<Url, TransferFailure> {
        endpoint_url(&self.base_url, request)
    }

    async fn send_upload(
        &self,
        request: &TransferRequest,
        file: &FilePayload,
        gate: Arc<ProgressGate>,
    ) -> Result<ServerMessage, TransferFailure> {
        let url = self.endpoint(request)?;
        let part = Part::stream_with_length(
            progress_body(file.bytes.clone(), gate),
            file.size_bytes(),
        )
        .file_name(file.name.as_str().to_string());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| transport_failure(&err))?;
        let response = ensure_upload_accepted(response)?;
        decode_json(response, "upload response").await
    }

    async fn send_list(
        &self,
        request: &TransferRequest,
    ) -> Result<Vec<RemoteFileEntry>, TransferFailure> {
        let url = self.endpoint(request)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| transport_failure(&err))?;
        let response = ensure_success(response)?;
        let names: Vec<String> = decode_json(response, "file listing").await?;
        Ok(entries_from_listing(names))
    }

    async fn send_delete(&self, request: &TransferRequest) -> Result<ServerMessage, TransferFailure> {
        let url = self.endpoint(request)?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|err| transport_failure(&err))?;
        let response = ensure_success(response)?;
        decode_json(response, "delete response").await
    }

    /// Create the download directory and the part file.
    ///
    /// Runs before the deadline starts so a cancelled create can never leave
    /// a part file behind.
    async fn prepare_part(&self, name: &FileName) -> Result<(PathBuf, PartFile), TransferFailure> {
        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|err| {
                TransferFailure::new(
                    FailureKind::Io,
                    format!(
                        "failed to create download directory '{}': {err}",
                        self.download_dir.display()
                    ),
                )
            })?;
        let path = target_path(&self.download_dir, name.as_str());
        let part = PartFile::create(path.clone())
            .await
            .map_err(|err| save_failure(&err))?;
        Ok((path, part))
    }

    async fn fetch_and_save(
        &self,
        request: &TransferRequest,
        name: &FileName,
        path: PathBuf,
        part: PartFile,
    ) -> Result<SavedFile, TransferFailure> {
        let url = self.endpoint(request)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| transport_failure(&err))?;
        let response = ensure_success(response)?;

        let size_bytes = part
            .write_all(response.bytes_stream())
            .await
            .map_err(|err| save_failure(&err))?;

        Ok(SavedFile {
            name: name.clone(),
            path,
            size_bytes,
        })
    }
}

#[async_trait]
impl FileTransfer for HttpTransferClient {
    async fn upload(
        &self,
        file: &FilePayload,
        progress: Arc<dyn ProgressSink>,
        timeout: TransferTimeout,
    ) -> TransferOutcome<ServerMessage> {
        let request = TransferRequest::upload(file.name.clone(), timeout);
        let gate = ProgressGate::new(progress);
        let outcome = with_deadline(
            &request,
            self.send_upload(&request, file, Arc::clone(&gate)),
        )
        .await;
        gate.close();
        outcome
    }

    async fn list(&self, timeout: TransferTimeout) -> TransferOutcome<Vec<RemoteFileEntry>> {
        let request = TransferRequest::list(timeout);
        with_deadline(&request, self.send_list(&request)).await
    }

    async fn delete(
        &self,
        name: &FileName,
        timeout: TransferTimeout,
    ) -> TransferOutcome<ServerMessage> {
        let request = TransferRequest::delete(name.clone(), timeout);
        with_deadline(&request, self.send_delete(&request)).await
    }

    async fn download(&self, name: &FileName, timeout: TransferTimeout) -> TransferOutcome<SavedFile> {
        let request = TransferRequest::download(name.clone(), timeout);
        if !name.is_safe_local_name() {
            warn!(file = %name, "refusing to save download under an unsafe name");
            return TransferOutcome::failure(
                FailureKind::Input,
                format!("'{name}' cannot be saved as a local file"),
            );
        }
        let (path, part) = match self.prepare_part(name).await {
            Ok(prepared) => prepared,
            Err(failure) => {
                warn!(file = %name, detail = %failure.detail, "download target unavailable");
                return TransferOutcome::Failure(failure);
            }
        };
        with_deadline(&request, self.fetch_and_save(&request, name, path, part)).await
    }
}

/// Run `fut` under the request deadline and log the outcome.
///
/// On expiry the future is dropped, which aborts the underlying request.
async fn with_deadline<T, F>(request: &TransferRequest, fut: F) -> TransferOutcome<T>
where
    F: Future<Output = Result<T, TransferFailure>>,
{
    let operation = request.operation().as_str();
    let file = request.target_label();
    let timeout_ms = request.timeout().as_millis();
    debug!(operation, file, timeout_ms, "transfer dispatched");

    let started = Instant::now();
    let outcome = match tokio::time::timeout(request.timeout().as_duration(), fut).await {
        Ok(result) => TransferOutcome::from(result),
        Err(_) => TransferOutcome::TimedOut,
    };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match &outcome {
        TransferOutcome::Success(_) => info!(operation, file, elapsed_ms, "transfer completed"),
        TransferOutcome::Failure(failure) => warn!(
            operation,
            file,
            elapsed_ms,
            kind = failure.kind.as_str(),
            detail = %failure.detail,
            "transfer failed"
        ),
        TransferOutcome::TimedOut => warn!(
            operation,
            file,
            timeout_ms,
            "transfer deadline exceeded; request aborted"
        ),
    }
    outcome
}

fn endpoint_url(base_url: &Url, request: &TransferRequest) -> Result<Url, TransferFailure> {
    let base = base_url.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/{}", request.path())).map_err(|err| {
        TransferFailure::new(FailureKind::Input, format!("invalid endpoint URL: {err}"))
    })
}

/// Stream `bytes` in chunks, reporting progress as each chunk is handed over.
///
/// A zero-length payload yields one empty chunk so progress still reaches 100%.
fn progress_body(bytes: Bytes, gate: Arc<ProgressGate>) -> Body {
    let total = bytes.len();
    let chunks: Vec<Bytes> = if total == 0 {
        vec![Bytes::new()]
    } else {
        (0..total)
            .step_by(UPLOAD_CHUNK_BYTES)
            .map(|start| bytes.slice(start..total.min(start + UPLOAD_CHUNK_BYTES)))
            .collect()
    };

    let total = total as u64;
    let mut sent: u64 = 0;
    let body = stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        if gate.report(Percent::of(sent, total)) {
            Ok::<Bytes, io::Error>(chunk)
        } else {
            Err(io::Error::new(io::ErrorKind::Interrupted, "upload cancelled"))
        }
    });
    Body::wrap_stream(body)
}

/// Keep every listed name that validates; invalid rows are logged and skipped.
fn entries_from_listing(names: Vec<String>) -> Vec<RemoteFileEntry> {
    names
        .into_iter()
        .filter_map(|raw| match FileName::new(raw) {
            Ok(name) => Some(RemoteFileEntry::new(name)),
            Err(err) => {
                warn!(error = %err.detail(), "skipping invalid listing row");
                None
            }
        })
        .collect()
}

fn save_failure(err: &SaveError) -> TransferFailure {
    let kind = if err.is_io() {
        FailureKind::Io
    } else {
        FailureKind::Network
    };
    TransferFailure::new(kind, err.detail())
}

fn transport_failure(err: &reqwest::Error) -> TransferFailure {
    TransferFailure::new(
        FailureKind::Network,
        format!("server response not received: {err}"),
    )
}

fn status_failure(status: StatusCode) -> TransferFailure {
    let text = status
        .canonical_reason()
        .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string);
    TransferFailure::new(
        FailureKind::Http {
            status: status.as_u16(),
        },
        text,
    )
}

fn ensure_success(response: Response) -> Result<Response, TransferFailure> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(status_failure(status))
    }
}

/// Uploads are accepted only with `200 OK`; any other status is a rejection.
fn ensure_upload_accepted(response: Response) -> Result<Response, TransferFailure> {
    let status = response.status();
    if status == StatusCode::OK {
        Ok(response)
    } else {
        Err(status_failure(status))
    }
}

async fn decode_json<T: DeserializeOwned>(
    response: Response,
    what: &str,
) -> Result<T, TransferFailure> {
    response.json::<T>().await.map_err(|err| {
        let kind = if err.is_decode() {
            FailureKind::InvalidResponse
        } else {
            FailureKind::Network
        };
        TransferFailure::new(kind, format!("failed to parse {what}: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout() -> TransferTimeout {
        TransferTimeout::from_millis(1_000).expect("timeout")
    }

    #[test]
    fn endpoint_appends_to_base_path() {
        let base: Url = "http://127.0.0.1:5500/api".parse().expect("url");
        let name = FileName::new("my notes.txt").expect("name");

        let url = endpoint_url(&base, &TransferRequest::delete(name, timeout())).expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:5500/api/delete/my%20notes.txt");

        let trailing: Url = "http://files.example/api/".parse().expect("url");
        let url = endpoint_url(&trailing, &TransferRequest::list(timeout())).expect("url");
        assert_eq!(url.as_str(), "http://files.example/api/files");

        let root: Url = "http://files.example".parse().expect("url");
        let url = endpoint_url(&root, &TransferRequest::list(timeout())).expect("url");
        assert_eq!(url.as_str(), "http://files.example/files");
    }

    #[test]
    fn status_failure_uses_reason_phrase() {
        let failure = status_failure(StatusCode::NOT_FOUND);
        assert_eq!(failure.kind, FailureKind::Http { status: 404 });
        assert_eq!(failure.detail, "Not Found");

        let custom = StatusCode::from_u16(599).expect("status");
        assert_eq!(status_failure(custom).detail, "HTTP 599");
    }

    #[test]
    fn invalid_listing_rows_are_skipped() {
        let entries = entries_from_listing(vec![
            "a.txt".into(),
            " ".into(),
            String::new(),
            "b.txt".into(),
        ]);
        let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt"]);
    }

    #[test]
    fn client_rejects_invalid_request_id() {
        let err = HttpTransferClient::from_config(&TransferConfig::default(), Some("bad\nid"))
            .err()
            .expect("invalid header");
        assert!(matches!(
            err,
            TransferError::InvalidConfig {
                field: "request_id",
                ..
            }
        ));
    }
}
