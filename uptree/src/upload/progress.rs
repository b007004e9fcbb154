use super::item::{Item, ItemId, ItemKind, ItemStatus, ItemTree};

impl ItemTree {
    /// Completion percentage of any item. Files read the value their parent
    /// holds for them; folders average their children.
    pub fn progress(&self, id: ItemId) -> f64 {
        let Some(item) = self.get(id) else {
            return 0.0;
        };
        match item.kind() {
            ItemKind::File => item
                .parent()
                .and_then(|parent| self.item(parent).progress.get(&id).copied())
                .unwrap_or(0.0),
            ItemKind::Folder => folder_value(item),
        }
    }

    /// Records a transfer percentage for a processing file and propagates
    /// it to the root. Values are clamped and never move backwards.
    pub fn set_leaf_progress(&mut self, id: ItemId, percent: f64) -> bool {
        let Some(item) = self.get(id) else {
            return false;
        };
        if item.kind() != ItemKind::File || item.status() != ItemStatus::Processing {
            return false;
        }
        let Some(parent) = item.parent() else {
            return false;
        };
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        let slot = self.item_mut(parent).progress.entry(id).or_insert(0.0);
        if percent <= *slot {
            return false;
        }
        *slot = percent;
        self.recompute_progress(parent);
        true
    }

    /// Rewrites this item's entry in its parent's map and repeats for every
    /// ancestor. Safe to call redundantly.
    pub fn recompute_progress(&mut self, id: ItemId) {
        let mut current = id;
        while let Some(item) = self.get(current) {
            let Some(parent) = item.parent() else {
                break;
            };
            let value = match item.kind() {
                ItemKind::Folder => folder_value(item),
                ItemKind::File => self.progress(current),
            };
            self.item_mut(parent).progress.insert(current, value);
            current = parent;
        }
    }

    pub(crate) fn on_status_changed(&mut self, id: ItemId, status: ItemStatus) {
        match status {
            ItemStatus::Loaded => {
                let item = self.item(id);
                if item.kind() == ItemKind::File
                    && let Some(parent) = item.parent()
                {
                    self.item_mut(parent).progress.insert(id, 100.0);
                }
                self.recompute_progress(id);
            }
            ItemStatus::Error => self.recompute_progress(id),
            _ => {}
        }
    }
}

fn folder_value(item: &Item) -> f64 {
    if item.progress.is_empty() {
        return if item.status() == ItemStatus::Loaded {
            100.0
        } else {
            0.0
        };
    }
    item.progress.values().sum::<f64>() / item.progress.len() as f64
}

#[cfg(test)]
mod tests {
    use crate::upload::item::{ItemId, ItemKind, ItemStatus, ItemTree};

    fn processing(tree: &mut ItemTree, id: ItemId) {
        tree.set_status(id, ItemStatus::Ready);
        tree.set_status(id, ItemStatus::Processing);
    }

    #[test]
    fn folder_progress_is_mean_of_children() {
        let mut tree = ItemTree::new("a", "/a");
        let docs = tree
            .add_child(ItemId::ROOT, "docs", ItemKind::Folder, None)
            .unwrap();
        let files: Vec<_> = ["a.txt", "b.txt", "c.txt"]
            .into_iter()
            .map(|name| tree.add_child(docs, name, ItemKind::File, None).unwrap())
            .collect();
        for id in &files {
            processing(&mut tree, *id);
        }

        tree.set_leaf_progress(files[1], 50.0);
        tree.set_leaf_progress(files[2], 100.0);

        assert_eq!(tree.progress(docs), 50.0);
        assert_eq!(tree.progress(ItemId::ROOT), 50.0);
    }

    #[test]
    fn aggregation_is_recursive_to_the_root() {
        let mut tree = ItemTree::new("a", "/a");
        let top = tree
            .add_child(ItemId::ROOT, "top", ItemKind::Folder, None)
            .unwrap();
        let loose = tree
            .add_child(ItemId::ROOT, "loose.bin", ItemKind::File, None)
            .unwrap();
        let nested = tree.add_child(top, "nested", ItemKind::Folder, None).unwrap();
        let deep = tree.add_child(nested, "deep.bin", ItemKind::File, None).unwrap();
        let shallow = tree.add_child(top, "shallow.bin", ItemKind::File, None).unwrap();
        for id in [deep, shallow, loose] {
            processing(&mut tree, id);
        }

        tree.set_leaf_progress(deep, 80.0);
        assert_eq!(tree.progress(nested), 80.0);
        assert_eq!(tree.progress(top), 40.0);
        assert_eq!(tree.progress(ItemId::ROOT), 20.0);

        tree.set_status(loose, ItemStatus::Loaded);
        assert_eq!(tree.progress(loose), 100.0);
        assert_eq!(tree.progress(ItemId::ROOT), 70.0);
    }

    #[test]
    fn leaf_progress_is_clamped_and_monotonic() {
        let mut tree = ItemTree::new("a", "/a");
        let file = tree
            .add_child(ItemId::ROOT, "f.bin", ItemKind::File, None)
            .unwrap();
        assert!(!tree.set_leaf_progress(file, 10.0));

        processing(&mut tree, file);
        assert!(tree.set_leaf_progress(file, 140.0));
        assert_eq!(tree.progress(file), 100.0);
        assert!(!tree.set_leaf_progress(file, 30.0));
        assert_eq!(tree.progress(file), 100.0);
    }

    #[test]
    fn empty_folder_counts_as_done_once_loaded() {
        let mut tree = ItemTree::new("a", "/a");
        let empty = tree
            .add_child(ItemId::ROOT, "empty", ItemKind::Folder, None)
            .unwrap();
        let file = tree
            .add_child(ItemId::ROOT, "f.bin", ItemKind::File, None)
            .unwrap();
        processing(&mut tree, empty);
        assert_eq!(tree.progress(ItemId::ROOT), 0.0);

        tree.set_status(empty, ItemStatus::Loaded);
        assert_eq!(tree.progress(ItemId::ROOT), 50.0);

        processing(&mut tree, file);
        tree.set_status(file, ItemStatus::Error);
        assert_eq!(tree.progress(ItemId::ROOT), 50.0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut tree = ItemTree::new("a", "/a");
        let docs = tree
            .add_child(ItemId::ROOT, "docs", ItemKind::Folder, None)
            .unwrap();
        let file = tree.add_child(docs, "f.bin", ItemKind::File, None).unwrap();
        processing(&mut tree, file);
        tree.set_leaf_progress(file, 40.0);

        tree.recompute_progress(file);
        tree.recompute_progress(docs);
        tree.recompute_progress(ItemId::ROOT);

        assert_eq!(tree.progress(file), 40.0);
        assert_eq!(tree.progress(ItemId::ROOT), 40.0);
    }
}
