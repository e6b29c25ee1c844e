//! Undo history for reversible bulk operations.
//!
//! One [`LedgerEntry`] per reversible operation, keyed by operation id and
//! holding the pre-operation copy of every target item. Entries live in
//! memory only. Taking an entry consumes it, so each operation can be undone
//! at most once; there is no redo.
//!
//! | Event | Ledger effect |
//! |---|---|
//! | reversible operation finishes its item loop | entry recorded |
//! | successful undo | entry removed |
//! | failed restore | entry put back |
//! | `max_entries` exceeded | oldest entry evicted |
//! | session reset | [`UndoLedger::clear`] |

use crate::action::ActionKind;
use crate::model::item::Item;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Everything needed to reverse one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoPayload {
    pub action: ActionKind,
    pub original_state: Vec<Item>,
    pub item_ids: Vec<String>,
}

impl UndoPayload {
    #[must_use]
    pub fn new(action: ActionKind, original_state: Vec<Item>) -> Self {
        let item_ids = original_state.iter().map(|i| i.id.clone()).collect();
        Self {
            action,
            original_state,
            item_ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub operation_id: String,
    pub payload: UndoPayload,
}

#[derive(Debug, Clone, Default)]
pub struct UndoLedger {
    entries: VecDeque<LedgerEntry>,
    max_entries: Option<usize>,
}

impl UndoLedger {
    /// An unbounded ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger that keeps at most `max_entries` entries, evicting the
    /// oldest. `None` means unbounded.
    #[must_use]
    pub const fn with_capacity_limit(max_entries: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    /// Record an entry. A second entry for the same id replaces the first.
    pub fn record(&mut self, operation_id: impl Into<String>, payload: UndoPayload) {
        let operation_id = operation_id.into();
        self.entries.retain(|e| e.operation_id != operation_id);
        self.entries.push_back(LedgerEntry {
            operation_id,
            payload,
        });

        if let Some(max) = self.max_entries {
            while self.entries.len() > max {
                if let Some(evicted) = self.entries.pop_front() {
                    tracing::warn!(
                        operation_id = %evicted.operation_id,
                        max_entries = max,
                        "undo ledger full, evicting oldest entry"
                    );
                }
            }
        }
    }

    /// Remove and return the entry for `operation_id`.
    pub fn take(&mut self, operation_id: &str) -> Option<LedgerEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.operation_id == operation_id)?;
        self.entries.remove(idx)
    }

    /// Put a taken entry back. It becomes the newest entry.
    pub(crate) fn reinstate(&mut self, entry: LedgerEntry) {
        self.record(entry.operation_id, entry.payload);
    }

    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.operation_id == operation_id)
    }

    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.get(operation_id).is_some()
    }

    /// Id of the most recently recorded entry still undoable.
    #[must_use]
    pub fn last_operation_id(&self) -> Option<&str> {
        self.entries.back().map(|e| e.operation_id.as_str())
    }

    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.operation_id.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(ids: &[&str]) -> UndoPayload {
        UndoPayload::new(
            ActionKind::ChangeStatus,
            ids.iter().map(|id| Item::new(*id)).collect(),
        )
    }

    #[test]
    fn payload_lists_affected_ids() {
        let p = payload(&["a", "b"]);
        assert_eq!(p.item_ids, vec!["a", "b"]);
        assert_eq!(p.original_state.len(), 2);
    }

    #[test]
    fn take_is_single_use() {
        let mut ledger = UndoLedger::new();
        ledger.record("bulk-1", payload(&["a"]));
        assert!(ledger.contains("bulk-1"));
        assert!(ledger.take("bulk-1").is_some());
        assert!(ledger.take("bulk-1").is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn take_unknown_leaves_ledger_unchanged() {
        let mut ledger = UndoLedger::new();
        ledger.record("bulk-1", payload(&["a"]));
        assert!(ledger.take("bulk-404").is_none());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn unbounded_by_default() {
        let mut ledger = UndoLedger::new();
        for n in 0..500 {
            ledger.record(format!("bulk-{n}"), payload(&["a"]));
        }
        assert_eq!(ledger.len(), 500);
    }

    #[test]
    fn cap_evicts_oldest() {
        let mut ledger = UndoLedger::with_capacity_limit(Some(2));
        ledger.record("bulk-1", payload(&["a"]));
        ledger.record("bulk-2", payload(&["b"]));
        ledger.record("bulk-3", payload(&["c"]));
        let ids: Vec<_> = ledger.operation_ids().collect();
        assert_eq!(ids, vec!["bulk-2", "bulk-3"]);
    }

    #[test]
    fn last_operation_id_tracks_newest() {
        let mut ledger = UndoLedger::new();
        assert!(ledger.last_operation_id().is_none());
        ledger.record("bulk-1", payload(&["a"]));
        ledger.record("bulk-2", payload(&["b"]));
        assert_eq!(ledger.last_operation_id(), Some("bulk-2"));
        ledger.take("bulk-2");
        assert_eq!(ledger.last_operation_id(), Some("bulk-1"));
    }

    #[test]
    fn rerecording_same_id_replaces_entry() {
        let mut ledger = UndoLedger::new();
        ledger.record("bulk-1", payload(&["a"]));
        ledger.record("bulk-1", payload(&["a", "b"]));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("bulk-1").unwrap().payload.item_ids.len(), 2);
    }

    #[test]
    fn clear_empties() {
        let mut ledger = UndoLedger::new();
        ledger.record("bulk-1", payload(&["a"]));
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
