use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use futures_util::TryStreamExt;
use reqwest::{Body, Client, Method};
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::debug;
use uptree_core::{CellsClient, RemoteError};

use super::item::ItemId;
use super::session::ProgressSink;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("item {0} has no local source")]
    MissingSource(ItemId),
    #[error("upload link requires unsupported method {0}")]
    UnsupportedMethod(String),
    #[error("upload of {path} rejected with status {status}")]
    Rejected { path: String, status: u16 },
}

#[derive(Debug, Clone)]
pub struct UploadJob {
    pub id: ItemId,
    pub remote_path: String,
    pub local_path: Option<PathBuf>,
    pub overwrite: bool,
}

/// Moves the bytes of one file. The session decides when and where; the
/// transport only reports progress through the sink it is handed.
pub trait Transport: Send + Sync {
    fn upload(
        &self,
        job: &UploadJob,
        progress: &ProgressSink,
    ) -> impl Future<Output = Result<(), TransferError>> + Send;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: CellsClient,
    http: Client,
}

impl HttpTransport {
    pub fn new(client: CellsClient) -> Self {
        Self::with_http(client, Client::new())
    }

    pub fn with_http(client: CellsClient, http: Client) -> Self {
        Self { client, http }
    }

    pub async fn upload_from_path(
        &self,
        job: &UploadJob,
        source: &Path,
        progress: &ProgressSink,
    ) -> Result<(), TransferError> {
        let link = self
            .client
            .get_upload_link(&job.remote_path, job.overwrite)
            .await?;
        let method = upload_method(&link.method)?;

        let file = tokio::fs::File::open(source).await?;
        let total = file.metadata().await?.len();
        let sink = progress.clone();
        let mut sent = 0u64;
        let stream = ReaderStream::new(file).inspect_ok(move |chunk| {
            sent += chunk.len() as u64;
            sink.bytes(sent, total);
        });

        debug!(path = %job.remote_path, bytes = total, "uploading");
        let response = self
            .http
            .request(method, link.href)
            .body(Body::wrap_stream(stream))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TransferError::Rejected {
                path: job.remote_path.clone(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

impl Transport for HttpTransport {
    async fn upload(&self, job: &UploadJob, progress: &ProgressSink) -> Result<(), TransferError> {
        let source = job
            .local_path
            .as_deref()
            .ok_or(TransferError::MissingSource(job.id))?;
        self.upload_from_path(job, source, progress).await
    }
}

fn upload_method(name: &str) -> Result<Method, TransferError> {
    match Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes()) {
        Ok(method) if method == Method::PUT || method == Method::POST => Ok(method),
        _ => Err(TransferError::UnsupportedMethod(name.to_string())),
    }
}
