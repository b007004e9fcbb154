use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join_all};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Semaphore, broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uptree_core::{RemoteError, RemoteTree};

use super::conflict::{self, ConflictPolicy, DirectoryBatch, RenameError, RenameJob};
use super::item::{
    ItemEvent, ItemId, ItemKind, ItemStatus, ItemTree, KindFilter, PathError, TreeError,
};
use super::transfer::{Transport, UploadJob};
use crate::config::ReconcileConfig;

const EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("conflict lookup failed: {0}")]
    Lookup(#[from] RemoteError),
    #[error("session is not ready to process (root is {0:?})")]
    NotReady(ItemStatus),
    #[error("session was aborted")]
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepareOutcome {
    Ready,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub id: ItemId,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrepareReport {
    pub policy: ConflictPolicy,
    pub outcome: PrepareOutcome,
    pub checked: usize,
    pub conflicts: Vec<String>,
    pub renamed: Vec<Rename>,
    /// Conflicting paths kept unchanged because the re-check could not
    /// reach the remote tree.
    pub unverified: Vec<String>,
    pub failed: Vec<ItemId>,
}

impl PrepareReport {
    fn new(policy: ConflictPolicy) -> Self {
        Self {
            policy,
            outcome: PrepareOutcome::Ready,
            checked: 0,
            conflicts: Vec::new(),
            renamed: Vec::new(),
            unverified: Vec::new(),
            failed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessReport {
    pub loaded: usize,
    pub failed: usize,
    pub aborted: usize,
    /// Items that never started, e.g. below a folder that failed.
    pub blocked: usize,
    pub progress: f64,
}

struct Shared {
    tree: Mutex<ItemTree>,
    progress: watch::Sender<f64>,
    events: broadcast::Sender<ItemEvent>,
}

impl Shared {
    fn new(tree: ItemTree) -> Self {
        let (progress, _) = watch::channel(0.0);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            tree: Mutex::new(tree),
            progress,
            events,
        }
    }

    /// Runs `f` under the tree lock, then publishes the status changes and
    /// root progress it produced. The lock is never held across an await.
    fn with_tree<T>(&self, f: impl FnOnce(&mut ItemTree) -> T) -> T {
        let (out, events, progress) = {
            let mut tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
            let out = f(&mut tree);
            (out, tree.take_events(), tree.progress(ItemId::ROOT))
        };
        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
        self.progress.send_if_modified(|current| {
            if *current == progress {
                false
            } else {
                *current = progress;
                true
            }
        });
        out
    }
}

/// Handed to a [`Transport`] so it can report how far one file got.
#[derive(Clone)]
pub struct ProgressSink {
    shared: Arc<Shared>,
    id: ItemId,
}

impl ProgressSink {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn update(&self, percent: f64) {
        self.shared
            .with_tree(|tree| tree.set_leaf_progress(self.id, percent));
    }

    pub fn bytes(&self, sent: u64, total: u64) {
        if total == 0 {
            return;
        }
        self.update(sent as f64 * 100.0 / total as f64);
    }

    pub fn current(&self) -> f64 {
        self.shared.with_tree(|tree| tree.progress(self.id))
    }

    #[cfg(test)]
    pub(crate) fn detached_file() -> Self {
        let mut tree = ItemTree::new("test", "/test");
        let id = tree
            .add_child(ItemId::ROOT, "file.bin", ItemKind::File, None)
            .expect("fresh tree accepts children");
        tree.set_status(id, ItemStatus::Ready);
        tree.set_status(id, ItemStatus::Processing);
        Self {
            shared: Arc::new(Shared::new(tree)),
            id,
        }
    }
}

struct ProcessContext<'a, T> {
    transport: &'a T,
    limiter: Semaphore,
    policy: ConflictPolicy,
}

/// Root of one upload batch: owns the item tree, the conflict policy and the
/// remote anchor every item path is built from.
pub struct Session<R> {
    repository_id: String,
    target_node: String,
    remote: R,
    config: ReconcileConfig,
    shared: Arc<Shared>,
    policy: Mutex<Option<ConflictPolicy>>,
    cancel: CancellationToken,
}

impl<R: RemoteTree> Session<R> {
    pub fn new(
        repository_id: impl Into<String>,
        target_node: impl Into<String>,
        remote: R,
        config: ReconcileConfig,
    ) -> Self {
        let repository_id = repository_id.into();
        let target_node = target_node.into();
        let root_path = anchor_path(&repository_id, &target_node);
        let root_label = conflict::basename(&root_path).to_string();
        Self {
            shared: Arc::new(Shared::new(ItemTree::new(root_label, root_path))),
            repository_id,
            target_node,
            remote,
            config,
            policy: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    pub fn repository_id(&self) -> &str {
        &self.repository_id
    }

    pub fn target_node(&self) -> &str {
        &self.target_node
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn policy(&self) -> Option<ConflictPolicy> {
        *self.policy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_item(
        &self,
        parent: ItemId,
        label: impl Into<String>,
        kind: ItemKind,
        local_path: Option<PathBuf>,
    ) -> Result<ItemId, TreeError> {
        self.shared
            .with_tree(|tree| tree.add_child(parent, label, kind, local_path))
    }

    pub fn inspect<T>(&self, f: impl FnOnce(&ItemTree) -> T) -> T {
        self.shared.with_tree(|tree| f(tree))
    }

    pub fn status(&self, id: ItemId) -> Option<ItemStatus> {
        self.inspect(|tree| tree.status(id))
    }

    pub fn label(&self, id: ItemId) -> Option<String> {
        self.inspect(|tree| tree.get(id).map(|item| item.label().to_string()))
    }

    pub fn effective_path(&self, id: ItemId) -> Result<String, PathError> {
        self.inspect(|tree| tree.effective_path(id))
    }

    pub fn progress(&self) -> f64 {
        *self.shared.progress.borrow()
    }

    pub fn progress_of(&self, id: ItemId) -> f64 {
        self.inspect(|tree| tree.progress(id))
    }

    pub fn watch_progress(&self) -> watch::Receiver<f64> {
        self.shared.progress.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ItemEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Checks the tree against the remote namespace and applies `policy`.
    ///
    /// After an `Alert` pass left items in `Confirm`, calling this again only
    /// revisits those items.
    pub async fn prepare(&self, policy: ConflictPolicy) -> Result<PrepareReport, SessionError> {
        if self.cancel.is_cancelled() {
            return Err(SessionError::Aborted);
        }
        *self.policy.lock().unwrap_or_else(PoisonError::into_inner) = Some(policy);
        let mut report = PrepareReport::new(policy);

        let scope = self.shared.with_tree(|tree| {
            let confirm: Vec<ItemId> = tree
                .walk(ItemId::ROOT, KindFilter::Both)
                .filter(|id| tree.status(*id) == Some(ItemStatus::Confirm))
                .collect();
            let scope = if confirm.is_empty() {
                tree.walk(ItemId::ROOT, KindFilter::Both)
                    .filter(|id| tree.status(*id) == Some(ItemStatus::New))
                    .collect()
            } else {
                confirm
            };
            tree.set_status_all(&scope, ItemStatus::Analysing);
            scope
        });
        info!(policy = %policy, items = scope.len(), "preparing upload session");

        let filter = policy.candidate_filter();
        let (candidates, duplicates) = self.shared.with_tree(|tree| {
            let mut candidates = Vec::new();
            for &id in &scope {
                match tree.effective_path(id) {
                    Ok(path) => {
                        let kind = tree.item(id).kind();
                        if id != ItemId::ROOT && filter.is_some_and(|filter| filter.matches(kind)) {
                            candidates.push((id, kind, path));
                        }
                    }
                    Err(err) => {
                        warn!(item = %id, error = %err, "cannot resolve remote path");
                        tree.set_status(id, ItemStatus::Error);
                        report.failed.push(id);
                    }
                }
            }
            (candidates, shadowed_siblings(tree, &scope))
        });

        if filter.is_none() {
            if !duplicates.is_empty() {
                self.shared.with_tree(|tree| {
                    for (id, _, path) in &duplicates {
                        warn!(item = %id, path = %path, "another selected item has the same name");
                        tree.set_status(*id, ItemStatus::Error);
                        report.failed.push(*id);
                    }
                });
            }
            self.finish_prepare(&scope, &mut report);
            return Ok(report);
        }

        let paths: Vec<String> = candidates.iter().map(|(_, _, path)| path.clone()).collect();
        report.checked = paths.len();
        let lookup = self
            .cancellable(conflict::stat_in_slices(
                &self.remote,
                &paths,
                self.config.stat_batch_size,
            ))
            .await?;
        let existing: HashSet<String> = match lookup {
            Ok(stats) => stats
                .into_iter()
                .filter(|stat| stat.exists)
                .map(|stat| stat.path)
                .collect(),
            Err(err) => {
                warn!(error = %err, paths = paths.len(), "conflict lookup failed");
                self.shared
                    .with_tree(|tree| tree.set_status_all(&scope, ItemStatus::Error));
                return Err(SessionError::Lookup(err));
            }
        };

        report.conflicts = paths
            .iter()
            .filter(|path| existing.contains(*path))
            .cloned()
            .collect();
        for (_, _, path) in &duplicates {
            if !report.conflicts.contains(path) {
                report.conflicts.push(path.clone());
            }
        }
        if report.conflicts.is_empty() {
            self.finish_prepare(&scope, &mut report);
            return Ok(report);
        }

        if policy == ConflictPolicy::Alert {
            self.shared
                .with_tree(|tree| tree.set_status_all(&scope, ItemStatus::Confirm));
            report.outcome = PrepareOutcome::Confirm;
            info!(
                conflicts = report.conflicts.len(),
                "conflicts need a decision"
            );
            return Ok(report);
        }

        let shadowed: HashSet<ItemId> = duplicates.iter().map(|(id, _, _)| *id).collect();
        // Folder candidates only exist under RenameFolders; duplicated folder
        // names are resolved under every renaming policy.
        let folders: HashSet<ItemId> = candidates
            .iter()
            .chain(&duplicates)
            .filter(|(_, kind, _)| *kind == ItemKind::Folder)
            .map(|(id, _, _)| *id)
            .collect();
        let folders: Vec<ItemId> = scope
            .iter()
            .copied()
            .filter(|id| folders.contains(id))
            .collect();
        self.rename_folders(&folders, &existing, &shadowed, &mut report)
            .await?;
        let files: Vec<ItemId> = candidates
            .iter()
            .filter(|(_, kind, _)| *kind == ItemKind::File)
            .map(|(id, _, _)| *id)
            .collect();
        self.rename_files(&files, &existing, &shadowed, &mut report)
            .await?;

        self.finish_prepare(&scope, &mut report);
        Ok(report)
    }

    /// Folder renames move every descendant, so they run one at a time in
    /// tree order and each path is rebuilt right before its check.
    async fn rename_folders(
        &self,
        folders: &[ItemId],
        existing: &HashSet<String>,
        shadowed: &HashSet<ItemId>,
        report: &mut PrepareReport,
    ) -> Result<(), SessionError> {
        for &id in folders {
            let lookup = self.shared.with_tree(|tree| {
                if tree.status(id) != Some(ItemStatus::Analysing) {
                    return None;
                }
                let path = tree.effective_path(id).ok()?;
                Some((path, sibling_labels(tree, id)))
            });
            let Some((path, taken)) = lookup else {
                continue;
            };
            if !existing.contains(&path) && !shadowed.contains(&id) {
                continue;
            }
            let outcome = self
                .cancellable(conflict::resolve_free_path(
                    &self.remote,
                    &path,
                    &taken,
                    self.config.max_rename_attempts,
                ))
                .await?;
            self.apply_rename(id, &path, outcome, report);
        }
        Ok(())
    }

    /// File renames are grouped by parent folder: groups run concurrently,
    /// files inside a group one after another.
    async fn rename_files(
        &self,
        files: &[ItemId],
        existing: &HashSet<String>,
        shadowed: &HashSet<ItemId>,
        report: &mut PrepareReport,
    ) -> Result<(), SessionError> {
        let batches: Vec<DirectoryBatch> = self.shared.with_tree(|tree| {
            let mut by_parent: BTreeMap<ItemId, DirectoryBatch> = BTreeMap::new();
            for &id in files {
                if tree.status(id) != Some(ItemStatus::Analysing) {
                    continue;
                }
                let (Ok(path), Some(parent)) = (tree.effective_path(id), tree.item(id).parent())
                else {
                    continue;
                };
                if existing.contains(&path) || shadowed.contains(&id) {
                    by_parent
                        .entry(parent)
                        .or_default()
                        .jobs
                        .push(RenameJob { id, path });
                }
            }
            for (parent, batch) in by_parent.iter_mut() {
                let renaming: HashSet<ItemId> = batch.jobs.iter().map(|job| job.id).collect();
                batch.taken = tree
                    .children(*parent)
                    .iter()
                    .filter(|child| !renaming.contains(*child))
                    .map(|child| tree.item(*child).label().to_string())
                    .collect();
            }
            by_parent.into_values().collect()
        });
        if batches.is_empty() {
            return Ok(());
        }

        let max_attempts = self.config.max_rename_attempts;
        let resolved = self
            .cancellable(join_all(batches.into_iter().map(|batch| {
                conflict::resolve_directory(&self.remote, batch, max_attempts)
            })))
            .await?;
        for (job, outcome) in resolved.into_iter().flatten() {
            self.apply_rename(job.id, &job.path, outcome, report);
        }
        Ok(())
    }

    fn apply_rename(
        &self,
        id: ItemId,
        path: &str,
        outcome: Result<String, RenameError>,
        report: &mut PrepareReport,
    ) {
        self.shared.with_tree(|tree| match outcome {
            // Only conflicting items get here, so keeping the name means the
            // existence check failed open.
            Ok(resolved) if resolved == path => {
                warn!(item = %id, path, "keeping name of a conflicting item");
                report.unverified.push(resolved);
            }
            Ok(resolved) => match tree.rename(id, conflict::basename(&resolved)) {
                Ok(()) => {
                    debug!(item = %id, from = path, to = %resolved, "renamed to avoid conflict");
                    report.renamed.push(Rename {
                        id,
                        from: path.to_string(),
                        to: resolved,
                    });
                }
                Err(err) => warn!(item = %id, error = %err, "rename failed"),
            },
            Err(err) => {
                warn!(item = %id, error = %err, "no free name");
                tree.set_status(id, ItemStatus::Error);
                report.failed.push(id);
            }
        });
    }

    fn finish_prepare(&self, scope: &[ItemId], report: &mut PrepareReport) {
        let ready = self
            .shared
            .with_tree(|tree| tree.set_status_all(scope, ItemStatus::Ready));
        report.outcome = PrepareOutcome::Ready;
        info!(
            ready,
            renamed = report.renamed.len(),
            failed = report.failed.len(),
            "upload session prepared"
        );
    }

    /// Materializes the prepared tree: folders are created before any of
    /// their children start, siblings run concurrently.
    pub async fn process<T: Transport>(
        &self,
        transport: &T,
    ) -> Result<ProcessReport, SessionError> {
        if self.cancel.is_cancelled() {
            return Err(SessionError::Aborted);
        }
        let Some(policy) = self.policy() else {
            let status = self.status(ItemId::ROOT).unwrap_or(ItemStatus::New);
            return Err(SessionError::NotReady(status));
        };
        let children = self.shared.with_tree(|tree| {
            let status = tree.status(ItemId::ROOT).unwrap_or(ItemStatus::Error);
            if status != ItemStatus::Ready {
                return Err(SessionError::NotReady(status));
            }
            // The anchor already exists remotely.
            tree.set_status(ItemId::ROOT, ItemStatus::Processing);
            tree.set_status(ItemId::ROOT, ItemStatus::Loaded);
            Ok(tree.children(ItemId::ROOT).to_vec())
        })?;
        info!(top_level = children.len(), "processing upload session");

        let ctx = ProcessContext {
            transport,
            limiter: Semaphore::new(self.config.max_concurrent_transfers.max(1)),
            policy,
        };
        join_all(children.into_iter().map(|id| self.process_node(id, &ctx))).await;

        if self.cancel.is_cancelled() {
            self.shared
                .with_tree(|tree| tree.abort_subtree(ItemId::ROOT));
        }
        let report = self.report();
        info!(
            loaded = report.loaded,
            failed = report.failed,
            aborted = report.aborted,
            blocked = report.blocked,
            "upload session processed"
        );
        Ok(report)
    }

    fn process_node<'a, T: Transport>(
        &'a self,
        id: ItemId,
        ctx: &'a ProcessContext<'a, T>,
    ) -> BoxFuture<'a, ()> {
        async move {
            let Some(kind) = self.inspect(|tree| tree.get(id).map(|item| item.kind())) else {
                return;
            };
            match kind {
                ItemKind::Folder => self.process_folder(id, ctx).await,
                ItemKind::File => self.process_file(id, ctx).await,
            }
        }
        .boxed()
    }

    async fn process_folder<T: Transport>(&self, id: ItemId, ctx: &ProcessContext<'_, T>) {
        let Some(path) = self.shared.with_tree(|tree| begin_processing(tree, id)) else {
            return;
        };
        let created = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            outcome = self.remote.create_container(&path) => Some(outcome),
        };
        let loaded = self.shared.with_tree(|tree| match created {
            None => {
                tree.set_status(id, ItemStatus::Aborted);
                false
            }
            Some(Ok(())) => tree.set_status(id, ItemStatus::Loaded),
            Some(Err(RemoteError::AlreadyExists { .. })) if ctx.policy.merges_existing_folders() => {
                debug!(path = %path, "folder already exists, merging");
                tree.set_status(id, ItemStatus::Loaded)
            }
            Some(Err(err)) => {
                warn!(item = %id, path = %path, error = %err, "folder creation failed");
                tree.set_status(id, ItemStatus::Error);
                false
            }
        });
        if !loaded {
            return;
        }

        let children = self.inspect(|tree| tree.children(id).to_vec());
        join_all(children.into_iter().map(|child| self.process_node(child, ctx))).await;
    }

    async fn process_file<T: Transport>(&self, id: ItemId, ctx: &ProcessContext<'_, T>) {
        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            permit = ctx.limiter.acquire() => permit.ok(),
        };
        let Some(_permit) = permit else {
            self.shared.with_tree(|tree| tree.abort_subtree(id));
            return;
        };

        let job = self.shared.with_tree(|tree| {
            let remote_path = begin_processing(tree, id)?;
            Some(UploadJob {
                id,
                remote_path,
                local_path: tree.item(id).local_path().map(Path::to_path_buf),
                overwrite: ctx.policy == ConflictPolicy::Overwrite,
            })
        });
        let Some(job) = job else {
            return;
        };

        let sink = ProgressSink {
            shared: Arc::clone(&self.shared),
            id,
        };
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            outcome = ctx.transport.upload(&job, &sink) => Some(outcome),
        };
        self.shared.with_tree(|tree| match outcome {
            None => {
                tree.set_status(id, ItemStatus::Aborted);
            }
            Some(Ok(())) => {
                tree.set_status(id, ItemStatus::Loaded);
            }
            Some(Err(err)) => {
                warn!(item = %id, path = %job.remote_path, error = %err, "upload failed");
                tree.set_status(id, ItemStatus::Error);
            }
        });
    }

    /// Cancels the whole batch. In-flight remote calls are no longer awaited.
    pub fn abort(&self) {
        self.cancel.cancel();
        let aborted = self
            .shared
            .with_tree(|tree| tree.abort_subtree(ItemId::ROOT));
        info!(aborted, "upload session aborted");
    }

    /// Aborts one item and whatever below it has not started yet.
    pub fn abort_item(&self, id: ItemId) -> usize {
        let aborted = self.shared.with_tree(|tree| tree.abort_subtree(id));
        debug!(item = %id, aborted, "aborted subtree");
        aborted
    }

    pub fn report(&self) -> ProcessReport {
        self.inspect(|tree| {
            let mut report = ProcessReport {
                progress: tree.progress(ItemId::ROOT),
                ..ProcessReport::default()
            };
            for id in tree.walk(ItemId::ROOT, KindFilter::Both).skip(1) {
                match tree.item(id).status() {
                    ItemStatus::Loaded => report.loaded += 1,
                    ItemStatus::Error => report.failed += 1,
                    ItemStatus::Aborted => report.aborted += 1,
                    _ => report.blocked += 1,
                }
            }
            report
        })
    }

    async fn cancellable<F: Future>(&self, fut: F) -> Result<F::Output, SessionError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SessionError::Aborted),
            out = fut => Ok(out),
        }
    }
}

/// Moves a ready item whose parent is loaded into `Processing` and returns
/// its remote path.
fn begin_processing(tree: &mut ItemTree, id: ItemId) -> Option<String> {
    let item = tree.get(id)?;
    if item.status() != ItemStatus::Ready {
        return None;
    }
    let parent = item.parent()?;
    if tree.status(parent) != Some(ItemStatus::Loaded) {
        return None;
    }
    match tree.effective_path(id) {
        Ok(path) => {
            tree.set_status(id, ItemStatus::Processing);
            Some(path)
        }
        Err(err) => {
            warn!(item = %id, error = %err, "cannot resolve remote path");
            tree.set_status(id, ItemStatus::Error);
            None
        }
    }
}

/// Items in `scope` whose label is already held by an earlier sibling, with
/// their kind and the path they would share.
fn shadowed_siblings(tree: &ItemTree, scope: &[ItemId]) -> Vec<(ItemId, ItemKind, String)> {
    let in_scope: HashSet<ItemId> = scope
        .iter()
        .copied()
        .filter(|id| tree.status(*id) == Some(ItemStatus::Analysing))
        .collect();
    let mut seen_parents = HashSet::new();
    let mut shadowed = Vec::new();
    for &id in scope {
        let Some(parent) = tree.get(id).and_then(|item| item.parent()) else {
            continue;
        };
        if !in_scope.contains(&id) || !seen_parents.insert(parent) {
            continue;
        }
        let mut labels = HashSet::new();
        for &child in tree.children(parent) {
            let item = tree.item(child);
            if !labels.insert(item.label()) && in_scope.contains(&child)
                && let Ok(path) = tree.effective_path(child)
            {
                shadowed.push((child, item.kind(), path));
            }
        }
    }
    shadowed
}

fn sibling_labels(tree: &ItemTree, id: ItemId) -> HashSet<String> {
    let Some(parent) = tree.get(id).and_then(|item| item.parent()) else {
        return HashSet::new();
    };
    tree.children(parent)
        .iter()
        .filter(|child| **child != id)
        .map(|child| tree.item(*child).label().to_string())
        .collect()
}

fn anchor_path(repository_id: &str, target_node: &str) -> String {
    let slug = repository_id.trim_matches('/');
    let target = target_node.trim_matches('/');
    let mut path = String::from("/");
    path.push_str(slug);
    if !target.is_empty() {
        if !slug.is_empty() {
            path.push('/');
        }
        path.push_str(target);
    }
    path
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
