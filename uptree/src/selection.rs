use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use uptree_core::RemoteTree;
use walkdir::WalkDir;

use crate::upload::{ItemId, ItemKind, Session, TreeError};

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("selected path not found: {0}")]
    NotFound(PathBuf),
    #[error("two selected paths share the name {0:?}")]
    DuplicateLabel(String),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionSummary {
    pub files: usize,
    pub folders: usize,
    pub skipped: usize,
}

/// Adds every selected local path, and everything below selected folders,
/// under the session root. Symlinks and special files are skipped.
pub fn build_selection<R: RemoteTree>(
    session: &Session<R>,
    paths: &[PathBuf],
) -> Result<SelectionSummary, SelectionError> {
    let mut summary = SelectionSummary::default();
    let mut labels = HashSet::new();
    for path in paths {
        let root = path
            .canonicalize()
            .map_err(|_| SelectionError::NotFound(path.clone()))?;
        let label = label_of(&root).ok_or_else(|| SelectionError::NotFound(path.clone()))?;
        if !labels.insert(label.clone()) {
            return Err(SelectionError::DuplicateLabel(label));
        }
        add_root(session, &root, &mut summary)?;
    }
    debug!(
        files = summary.files,
        folders = summary.folders,
        skipped = summary.skipped,
        "local selection built"
    );
    Ok(summary)
}

fn add_root<R: RemoteTree>(
    session: &Session<R>,
    root: &Path,
    summary: &mut SelectionSummary,
) -> Result<(), SelectionError> {
    // parents[d] is the item created for the folder at walk depth d.
    let mut parents: Vec<ItemId> = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                summary.skipped += 1;
                continue;
            }
        };
        parents.truncate(entry.depth());
        let parent = parents.last().copied().unwrap_or(ItemId::ROOT);
        let Some(label) = label_of(entry.path()) else {
            summary.skipped += 1;
            continue;
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            let id = session.add_item(parent, label, ItemKind::Folder, None)?;
            parents.push(id);
            summary.folders += 1;
        } else if file_type.is_file() {
            session.add_item(parent, label, ItemKind::File, Some(entry.into_path()))?;
            summary.files += 1;
        } else {
            debug!(path = %entry.path().display(), "skipping symlink or special file");
            summary.skipped += 1;
        }
    }
    Ok(())
}

fn label_of(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
