use std::future::Future;
use std::sync::Arc;

use crate::client::{NodeStat, RemoteError};

/// The two operations the upload engine needs from the remote namespace.
///
/// `stat_paths` must answer every requested path exactly once; a path that does
/// not exist is a normal `exists: false` result, never an error.
/// `create_container` is not idempotent: calling it for an existing path
/// reports [`RemoteError::AlreadyExists`].
pub trait RemoteTree: Send + Sync {
    fn stat_paths(
        &self,
        paths: &[String],
    ) -> impl Future<Output = Result<Vec<NodeStat>, RemoteError>> + Send;

    fn create_container(&self, path: &str)
    -> impl Future<Output = Result<(), RemoteError>> + Send;
}

impl<T: RemoteTree> RemoteTree for Arc<T> {
    fn stat_paths(
        &self,
        paths: &[String],
    ) -> impl Future<Output = Result<Vec<NodeStat>, RemoteError>> + Send {
        self.as_ref().stat_paths(paths)
    }

    fn create_container(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        self.as_ref().create_container(path)
    }
}
