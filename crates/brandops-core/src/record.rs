//! The system of record behind the executor.
//!
//! The executor decides *what* happens to each item; a [`SystemOfRecord`]
//! makes it stick. Every call can fail, and a failure is always scoped to
//! the one item it was about (except [`SystemOfRecord::begin_batch`], which
//! fails the whole operation before any item is touched).
//!
//! [`MemoryStore`] keeps the authoritative catalog in process. It is what the
//! CLI drives and what the tests assert against.

use crate::action::ActionKind;
use crate::model::item::Item;

/// Errors a system of record can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The item does not exist in the store.
    #[error("item '{0}' not found")]
    NotFound(String),

    /// The store refused the change.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The store could not be reached or is not accepting work.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait SystemOfRecord {
    /// Called once before the first item of an operation.
    ///
    /// # Errors
    ///
    /// Any error aborts the operation before any item is processed.
    fn begin_batch(
        &mut self,
        _operation_id: &str,
        _kind: ActionKind,
        _total: usize,
    ) -> Result<(), RecordError> {
        Ok(())
    }

    /// Persist an item whose fields were changed by the executor.
    ///
    /// # Errors
    ///
    /// The item is reported as failed and keeps its previous state.
    fn commit(&mut self, item: &Item) -> Result<(), RecordError>;

    /// Remove an item.
    ///
    /// # Errors
    ///
    /// The item is reported as failed.
    fn delete(&mut self, item: &Item) -> Result<(), RecordError>;

    /// Create a copy of an item, returning the copy.
    ///
    /// # Errors
    ///
    /// The item is reported as failed.
    fn duplicate(&mut self, item: &Item) -> Result<Item, RecordError>;

    /// Add an item to the export artifact.
    ///
    /// # Errors
    ///
    /// The item is reported as failed.
    fn export(&mut self, item: &Item) -> Result<(), RecordError>;

    /// Put every item of a pre-operation snapshot back.
    ///
    /// # Errors
    ///
    /// The undo is reported as unsuccessful and stays available.
    fn restore(&mut self, snapshot: &[Item]) -> Result<(), RecordError>;
}

/// In-process catalog, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Vec<Item>,
    exports: Vec<Item>,
}

impl MemoryStore {
    #[must_use]
    pub const fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            exports: Vec::new(),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items exported since the last call, in export order.
    pub fn take_exports(&mut self) -> Vec<Item> {
        std::mem::take(&mut self.exports)
    }

    #[must_use]
    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    /// First free id of the form `<id>-copy`, `<id>-copy-2`, ...
    fn copy_id(&self, id: &str) -> String {
        let base = format!("{id}-copy");
        if self.position(&base).is_none() {
            return base;
        }
        (2_usize..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| self.position(candidate).is_none())
            .unwrap_or(base)
    }
}

impl SystemOfRecord for MemoryStore {
    fn commit(&mut self, item: &Item) -> Result<(), RecordError> {
        let idx = self
            .position(&item.id)
            .ok_or_else(|| RecordError::NotFound(item.id.clone()))?;
        self.items[idx] = item.clone();
        Ok(())
    }

    fn delete(&mut self, item: &Item) -> Result<(), RecordError> {
        let idx = self
            .position(&item.id)
            .ok_or_else(|| RecordError::NotFound(item.id.clone()))?;
        self.items.remove(idx);
        Ok(())
    }

    fn duplicate(&mut self, item: &Item) -> Result<Item, RecordError> {
        let idx = self
            .position(&item.id)
            .ok_or_else(|| RecordError::NotFound(item.id.clone()))?;
        let mut copy = self.items[idx].clone();
        copy.id = self.copy_id(&item.id);
        self.items.insert(idx + 1, copy.clone());
        Ok(copy)
    }

    fn export(&mut self, item: &Item) -> Result<(), RecordError> {
        if self.position(&item.id).is_none() {
            return Err(RecordError::NotFound(item.id.clone()));
        }
        self.exports.push(item.clone());
        Ok(())
    }

    fn restore(&mut self, snapshot: &[Item]) -> Result<(), RecordError> {
        for original in snapshot {
            match self.position(&original.id) {
                Some(idx) => self.items[idx] = original.clone(),
                None => self.items.push(original.clone()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(vec![Item::new("a"), Item::new("b"), Item::new("c")])
    }

    #[test]
    fn commit_replaces_existing_item() {
        let mut store = store();
        let changed = Item::new("b").with_status("validated");
        store.commit(&changed).unwrap();
        assert_eq!(store.get("b").unwrap().status.as_deref(), Some("validated"));
    }

    #[test]
    fn commit_unknown_item_is_not_found() {
        let mut store = store();
        let err = store.commit(&Item::new("zzz")).unwrap_err();
        assert_eq!(err, RecordError::NotFound("zzz".into()));
        assert_eq!(err.to_string(), "item 'zzz' not found");
    }

    #[test]
    fn delete_removes_item() {
        let mut store = store();
        store.delete(&Item::new("a")).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("a").is_none());
        assert!(store.delete(&Item::new("a")).is_err());
    }

    #[test]
    fn duplicate_inserts_copy_after_original_with_free_id() {
        let mut store = store();
        let first = store.duplicate(&Item::new("a")).unwrap();
        let second = store.duplicate(&Item::new("a")).unwrap();
        assert_eq!(first.id, "a-copy");
        assert_eq!(second.id, "a-copy-2");
        let ids: Vec<_> = store.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a-copy-2", "a-copy", "b", "c"]);
    }

    #[test]
    fn export_collects_without_mutating() {
        let mut store = store();
        store.export(&Item::new("c")).unwrap();
        store.export(&Item::new("a")).unwrap();
        assert_eq!(store.len(), 3);
        let exported: Vec<_> = store.take_exports().into_iter().map(|i| i.id).collect();
        assert_eq!(exported, vec!["c", "a"]);
        assert!(store.take_exports().is_empty());
    }

    #[test]
    fn restore_overwrites_and_reinserts() {
        let mut store = store();
        store.commit(&Item::new("a").with_status("validated")).unwrap();
        store.delete(&Item::new("c")).unwrap();

        store.restore(&[Item::new("a"), Item::new("c")]).unwrap();
        assert!(store.get("a").unwrap().status.is_none());
        assert!(store.get("c").is_some());
    }
}
