use std::collections::HashMap;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::remote::RemoteTree;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("remote node already exists: {path}")]
    AlreadyExists { path: String },
    #[error("remote tree unavailable: {0}")]
    Unavailable(String),
}

#[derive(Clone)]
pub struct CellsClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl CellsClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, RemoteError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
            token: token.into(),
        })
    }

    pub async fn stat(&self, paths: &[String]) -> Result<Vec<NodeStat>, RemoteError> {
        let url = self.endpoint("/v1/tree/stat")?;
        let response = self
            .http
            .post(url)
            .header("Authorization", self.auth_header_value())
            .json(&StatRequest { paths })
            .send()
            .await?;
        let payload: StatResponse = Self::handle_response(response).await?;

        // Servers may leave out paths they do not know; report those as absent.
        let mut by_path: HashMap<String, StatEntry> = payload
            .nodes
            .into_iter()
            .map(|entry| (entry.path.clone(), entry))
            .collect();
        Ok(paths
            .iter()
            .map(|path| match by_path.remove(path) {
                Some(entry) => entry.into_stat(),
                None => NodeStat::absent(path),
            })
            .collect())
    }

    pub async fn create_folder(&self, path: &str) -> Result<(), RemoteError> {
        let mut url = self.endpoint("/v1/tree/nodes")?;
        url.query_pairs_mut().append_pair("path", path);
        let response = self
            .http
            .put(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(RemoteError::AlreadyExists {
                path: path.to_string(),
            });
        }
        Self::check_status(response).await
    }

    pub async fn get_upload_link(
        &self,
        path: &str,
        overwrite: bool,
    ) -> Result<UploadLink, RemoteError> {
        let mut url = self.endpoint("/v1/tree/upload")?;
        url.query_pairs_mut()
            .append_pair("path", path)
            .append_pair("overwrite", if overwrite { "true" } else { "false" });
        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    fn auth_header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        Ok(self.base_url.join(path)?)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::Api { status, body })
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<(), RemoteError> {
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::Api { status, body })
        }
    }
}

impl RemoteTree for CellsClient {
    async fn stat_paths(&self, paths: &[String]) -> Result<Vec<NodeStat>, RemoteError> {
        self.stat(paths).await
    }

    async fn create_container(&self, path: &str) -> Result<(), RemoteError> {
        self.create_folder(path).await
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Folder,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct NodeMetadata {
    #[serde(default, rename = "type")]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStat {
    pub path: String,
    pub exists: bool,
    pub metadata: Option<NodeMetadata>,
}

impl NodeStat {
    pub fn absent(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            exists: false,
            metadata: None,
        }
    }

    pub fn present(path: impl Into<String>, metadata: Option<NodeMetadata>) -> Self {
        Self {
            path: path.into(),
            exists: true,
            metadata,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatRequest<'a> {
    paths: &'a [String],
}

#[derive(Debug, Deserialize)]
struct StatResponse {
    #[serde(default)]
    nodes: Vec<StatEntry>,
}

#[derive(Debug, Deserialize)]
struct StatEntry {
    path: String,
    #[serde(default = "default_exists")]
    exists: bool,
    #[serde(flatten)]
    metadata: NodeMetadata,
}

fn default_exists() -> bool {
    true
}

impl StatEntry {
    fn into_stat(self) -> NodeStat {
        if self.exists {
            NodeStat::present(self.path, Some(self.metadata))
        } else {
            NodeStat::absent(self.path)
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UploadLink {
    pub href: Url,
    pub method: String,
}
