use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use uptree_core::{NodeStat, RemoteError, RemoteTree};

use super::session::ProgressSink;
use super::transfer::{Transport, TransferError, UploadJob};

/// In-memory remote tree recording every request it receives.
#[derive(Default)]
pub struct FakeRemote {
    existing: Mutex<HashSet<String>>,
    stat_requests: Mutex<Vec<Vec<String>>>,
    created: Mutex<Vec<String>>,
    failing_creates: Mutex<HashSet<String>>,
    fail_stats: AtomicBool,
    stat_budget: Mutex<Option<usize>>,
}

impl FakeRemote {
    pub fn with_existing<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let remote = Self::default();
        lock(&remote.existing).extend(paths.into_iter().map(Into::into));
        remote
    }

    pub fn fail_stats(&self, fail: bool) {
        self.fail_stats.store(fail, Ordering::SeqCst);
    }

    /// Answers the first `served` stat requests, then fails every later one.
    pub fn fail_stats_after(&self, served: usize) {
        *lock(&self.stat_budget) = Some(served);
    }

    pub fn fail_create(&self, path: &str) {
        lock(&self.failing_creates).insert(path.to_string());
    }

    pub fn stat_requests(&self) -> Vec<Vec<String>> {
        lock(&self.stat_requests).clone()
    }

    pub fn stat_batch_sizes(&self) -> Vec<usize> {
        lock(&self.stat_requests).iter().map(Vec::len).collect()
    }

    pub fn created(&self) -> Vec<String> {
        lock(&self.created).clone()
    }
}

impl RemoteTree for FakeRemote {
    async fn stat_paths(&self, paths: &[String]) -> Result<Vec<NodeStat>, RemoteError> {
        let served = {
            let mut requests = lock(&self.stat_requests);
            requests.push(paths.to_vec());
            requests.len()
        };
        let over_budget = lock(&self.stat_budget).is_some_and(|budget| served > budget);
        if over_budget || self.fail_stats.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("stat disabled".to_string()));
        }
        let existing = lock(&self.existing);
        Ok(paths
            .iter()
            .map(|path| {
                if existing.contains(path) {
                    NodeStat::present(path.clone(), None)
                } else {
                    NodeStat::absent(path.clone())
                }
            })
            .collect())
    }

    async fn create_container(&self, path: &str) -> Result<(), RemoteError> {
        if lock(&self.failing_creates).contains(path) {
            return Err(RemoteError::Unavailable(format!("cannot create {path}")));
        }
        if !lock(&self.existing).insert(path.to_string()) {
            return Err(RemoteError::AlreadyExists {
                path: path.to_string(),
            });
        }
        lock(&self.created).push(path.to_string());
        Ok(())
    }
}

/// Transport that reports half progress, then succeeds unless the remote
/// path was marked as failing.
#[derive(Default)]
pub struct RecordingTransport {
    uploaded: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingTransport {
    pub fn fail(&self, path: &str) {
        lock(&self.failing).insert(path.to_string());
    }

    pub fn uploaded(&self) -> Vec<String> {
        lock(&self.uploaded).clone()
    }
}

impl Transport for RecordingTransport {
    async fn upload(&self, job: &UploadJob, progress: &ProgressSink) -> Result<(), TransferError> {
        progress.update(50.0);
        tokio::task::yield_now().await;
        if lock(&self.failing).contains(&job.remote_path) {
            return Err(TransferError::Rejected {
                path: job.remote_path.clone(),
                status: 500,
            });
        }
        lock(&self.uploaded).push(job.remote_path.clone());
        Ok(())
    }
}

/// Transport whose uploads never finish on their own.
#[derive(Default)]
pub struct StalledTransport;

impl Transport for StalledTransport {
    async fn upload(&self, _job: &UploadJob, progress: &ProgressSink) -> Result<(), TransferError> {
        progress.update(10.0);
        std::future::pending::<()>().await;
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
