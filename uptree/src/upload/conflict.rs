use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uptree_core::{NodeStat, RemoteError, RemoteTree};

use super::item::{ItemId, KindFilter};

pub const DEFAULT_STAT_BATCH_SIZE: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    Overwrite,
    Rename,
    RenameFolders,
    Alert,
}

impl ConflictPolicy {
    /// Which items get checked against the remote tree. `None` skips the
    /// lookup altogether.
    pub fn candidate_filter(self) -> Option<KindFilter> {
        match self {
            ConflictPolicy::Overwrite => None,
            ConflictPolicy::Rename => Some(KindFilter::File),
            ConflictPolicy::RenameFolders | ConflictPolicy::Alert => Some(KindFilter::Both),
        }
    }

    /// Policies that never check folders write into existing ones.
    pub fn merges_existing_folders(self) -> bool {
        matches!(self, ConflictPolicy::Overwrite | ConflictPolicy::Rename)
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictPolicy::Overwrite => "overwrite",
            ConflictPolicy::Rename => "rename",
            ConflictPolicy::RenameFolders => "rename-folders",
            ConflictPolicy::Alert => "alert",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown conflict policy: {0}")]
pub struct UnknownPolicy(String);

impl FromStr for ConflictPolicy {
    type Err = UnknownPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(ConflictPolicy::Overwrite),
            "rename" => Ok(ConflictPolicy::Rename),
            "rename-folders" | "rename_folders" => Ok(ConflictPolicy::RenameFolders),
            "alert" => Ok(ConflictPolicy::Alert),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenameError {
    #[error("no free name for {path} after {attempts} candidates")]
    Exhausted { path: String, attempts: u32 },
}

/// Splits a basename at its last `.`. A leading dot does not start an
/// extension, so `.profile` has none.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

pub fn basename(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

pub fn suffixed_path(path: &str, counter: u32) -> String {
    let dir = match path.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/"),
        None => String::new(),
    };
    let (stem, ext) = split_extension(basename(path));
    format!("{dir}{stem}-{counter}{ext}")
}

/// Stats `paths` with one request per slice of at most `batch_size` entries.
pub async fn stat_in_slices<R: RemoteTree>(
    remote: &R,
    paths: &[String],
    batch_size: usize,
) -> Result<Vec<NodeStat>, RemoteError> {
    let mut stats = Vec::with_capacity(paths.len());
    for slice in paths.chunks(batch_size.max(1)) {
        stats.extend(remote.stat_paths(slice).await?);
    }
    Ok(stats)
}

async fn probe_exists<R: RemoteTree>(remote: &R, path: &str) -> bool {
    let request = [path.to_string()];
    match remote.stat_paths(&request).await {
        Ok(stats) => stats.iter().any(|stat| stat.path == path && stat.exists),
        Err(err) => {
            warn!(path, error = %err, "rename probe failed, treating candidate as free");
            false
        }
    }
}

/// Finds the first of `path`, `stem-1.ext`, `stem-2.ext`, ... that is free
/// remotely and whose basename is not in `taken`.
pub async fn resolve_free_path<R: RemoteTree>(
    remote: &R,
    path: &str,
    taken: &HashSet<String>,
    max_attempts: u32,
) -> Result<String, RenameError> {
    let mut candidate = path.to_string();
    let mut counter = 0u32;
    loop {
        if taken.contains(basename(&candidate)) {
            debug!(candidate = %candidate, "candidate reserved by a local sibling");
        } else if !probe_exists(remote, &candidate).await {
            return Ok(candidate);
        }
        if counter >= max_attempts {
            return Err(RenameError::Exhausted {
                path: path.to_string(),
                attempts: counter,
            });
        }
        counter += 1;
        candidate = suffixed_path(path, counter);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameJob {
    pub id: ItemId,
    pub path: String,
}

/// Conflicting files sharing one parent folder. They are resolved one after
/// another so two siblings never settle on the same suffix.
#[derive(Debug, Clone, Default)]
pub struct DirectoryBatch {
    pub taken: HashSet<String>,
    pub jobs: Vec<RenameJob>,
}

pub async fn resolve_directory<R: RemoteTree>(
    remote: &R,
    batch: DirectoryBatch,
    max_attempts: u32,
) -> Vec<(RenameJob, Result<String, RenameError>)> {
    let DirectoryBatch { mut taken, jobs } = batch;
    let mut resolved = Vec::with_capacity(jobs.len());
    for job in jobs {
        let outcome = resolve_free_path(remote, &job.path, &taken, max_attempts).await;
        if let Ok(path) = &outcome {
            taken.insert(basename(path).to_string());
        }
        resolved.push((job, outcome));
    }
    resolved
}
