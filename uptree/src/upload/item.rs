use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(usize);

impl ItemId {
    /// The session folder every other item hangs from.
    pub const ROOT: ItemId = ItemId(0);
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    File,
    Folder,
    Both,
}

impl KindFilter {
    pub fn matches(self, kind: ItemKind) -> bool {
        match self {
            KindFilter::File => kind == ItemKind::File,
            KindFilter::Folder => kind == ItemKind::Folder,
            KindFilter::Both => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    New,
    Analysing,
    Confirm,
    Ready,
    Processing,
    Loaded,
    Error,
    Aborted,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ItemStatus::Loaded | ItemStatus::Error | ItemStatus::Aborted
        )
    }

    /// Forward-only lifecycle. `Confirm` may go back to analysis when the
    /// session is prepared again with a resolved policy.
    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        use ItemStatus::*;
        match (self, next) {
            (current, Aborted) => !current.is_terminal(),
            (New, Analysing | Ready | Error) => true,
            (Analysing, Confirm | Ready | Error) => true,
            (Confirm, Analysing | Ready) => true,
            (Ready, Processing | Error) => true,
            (Processing, Loaded | Error) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemEvent {
    pub id: ItemId,
    pub status: ItemStatus,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("unknown item {0}")]
    UnknownItem(ItemId),
    #[error("item {0} is not a folder")]
    NotAFolder(ItemId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("item {0} is not attached to the session")]
    Orphaned(ItemId),
    #[error("label {label:?} of item {id} is not a valid path segment")]
    InvalidLabel { id: ItemId, label: String },
}

#[derive(Debug, Clone)]
pub struct Item {
    pub(crate) id: ItemId,
    pub(crate) label: String,
    pub(crate) kind: ItemKind,
    pub(crate) status: ItemStatus,
    pub(crate) parent: Option<ItemId>,
    pub(crate) children: Vec<ItemId>,
    pub(crate) progress: BTreeMap<ItemId, f64>,
    pub(crate) local_path: Option<PathBuf>,
}

impl Item {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }
}

/// Arena holding a session's items. Index 0 is the session folder; parents
/// are referenced by id only, children are owned by the arena in creation
/// order.
#[derive(Debug, Clone)]
pub struct ItemTree {
    root_path: String,
    items: Vec<Item>,
    pending: Vec<ItemEvent>,
}

impl ItemTree {
    pub fn new(root_label: impl Into<String>, root_path: impl Into<String>) -> Self {
        let root = Item {
            id: ItemId::ROOT,
            label: root_label.into(),
            kind: ItemKind::Folder,
            status: ItemStatus::New,
            parent: None,
            children: Vec::new(),
            progress: BTreeMap::new(),
            local_path: None,
        };
        Self {
            root_path: root_path.into(),
            items: vec![root],
            pending: Vec::new(),
        }
    }

    pub fn root(&self) -> ItemId {
        ItemId::ROOT
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Number of items below the session folder; the root is not counted.
    pub fn len(&self) -> usize {
        self.items.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.0)
    }

    pub fn status(&self, id: ItemId) -> Option<ItemStatus> {
        self.get(id).map(|item| item.status)
    }

    pub fn children(&self, id: ItemId) -> &[ItemId] {
        self.get(id).map(Item::children).unwrap_or_default()
    }

    pub fn child_by_label(&self, parent: ItemId, label: &str) -> Option<ItemId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|child| self.items[child.0].label == label)
    }

    pub fn add_child(
        &mut self,
        parent: ItemId,
        label: impl Into<String>,
        kind: ItemKind,
        local_path: Option<PathBuf>,
    ) -> Result<ItemId, TreeError> {
        let parent_item = self
            .items
            .get(parent.0)
            .ok_or(TreeError::UnknownItem(parent))?;
        if parent_item.kind != ItemKind::Folder {
            return Err(TreeError::NotAFolder(parent));
        }

        let id = ItemId(self.items.len());
        self.items.push(Item {
            id,
            label: label.into(),
            kind,
            status: ItemStatus::New,
            parent: Some(parent),
            children: Vec::new(),
            progress: BTreeMap::new(),
            local_path,
        });
        let parent_item = &mut self.items[parent.0];
        parent_item.children.push(id);
        parent_item.progress.insert(id, 0.0);
        Ok(id)
    }

    pub fn rename(&mut self, id: ItemId, label: impl Into<String>) -> Result<(), TreeError> {
        let item = self
            .items
            .get_mut(id.0)
            .ok_or(TreeError::UnknownItem(id))?;
        item.label = label.into();
        Ok(())
    }

    /// Remote path of an item, rebuilt from the label chain on every call so
    /// renames of any ancestor are always reflected.
    pub fn effective_path(&self, id: ItemId) -> Result<String, PathError> {
        let mut segments = Vec::new();
        let mut current = id;
        loop {
            let item = self.items.get(current.0).ok_or(PathError::Orphaned(id))?;
            match item.parent {
                Some(parent) => {
                    if !is_valid_label(&item.label) {
                        return Err(PathError::InvalidLabel {
                            id: current,
                            label: item.label.clone(),
                        });
                    }
                    segments.push(item.label.as_str());
                    current = parent;
                }
                None if current == ItemId::ROOT => break,
                None => return Err(PathError::Orphaned(id)),
            }
        }

        let mut path = self.root_path.trim_end_matches('/').to_string();
        for segment in segments.iter().rev() {
            path.push('/');
            path.push_str(segment);
        }
        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }

    pub fn walk(&self, from: ItemId, filter: KindFilter) -> Walk<'_> {
        let stack = if self.items.get(from.0).is_some() {
            vec![from]
        } else {
            Vec::new()
        };
        Walk {
            tree: self,
            stack,
            filter,
        }
    }

    /// Applies a status change if the lifecycle allows it. Returns whether
    /// the item changed.
    pub fn set_status(&mut self, id: ItemId, next: ItemStatus) -> bool {
        let Some(item) = self.items.get_mut(id.0) else {
            return false;
        };
        let current = item.status;
        if current == next {
            return false;
        }
        if !current.can_transition_to(next) {
            debug!(item = %id, from = ?current, to = ?next, "ignoring status change");
            return false;
        }
        item.status = next;
        self.pending.push(ItemEvent { id, status: next });
        self.on_status_changed(id, next);
        true
    }

    pub fn set_status_all(&mut self, ids: &[ItemId], next: ItemStatus) -> usize {
        ids.iter()
            .filter(|id| self.set_status(**id, next))
            .count()
    }

    /// Aborts an item and every descendant that has not started yet.
    /// Descendants already processing or loaded keep their state.
    pub fn abort_subtree(&mut self, id: ItemId) -> usize {
        let mut aborted = usize::from(self.set_status(id, ItemStatus::Aborted));
        let descendants: Vec<ItemId> = self.walk(id, KindFilter::Both).skip(1).collect();
        for descendant in descendants {
            if matches!(
                self.items[descendant.0].status,
                ItemStatus::Processing | ItemStatus::Loaded
            ) {
                continue;
            }
            if self.set_status(descendant, ItemStatus::Aborted) {
                aborted += 1;
            }
        }
        aborted
    }

    pub fn take_events(&mut self) -> Vec<ItemEvent> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn item(&self, id: ItemId) -> &Item {
        &self.items[id.0]
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> &mut Item {
        &mut self.items[id.0]
    }
}

pub struct Walk<'a> {
    tree: &'a ItemTree,
    stack: Vec<ItemId>,
    filter: KindFilter,
}

impl Iterator for Walk<'_> {
    type Item = ItemId;

    fn next(&mut self) -> Option<ItemId> {
        loop {
            let id = self.stack.pop()?;
            let item = self.tree.item(id);
            self.stack.extend(item.children.iter().rev().copied());
            if self.filter.matches(item.kind) {
                return Some(id);
            }
        }
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty() && label != "." && label != ".." && !label.contains(['/', '\0'])
}
