//! Bulk operation executor.
//!
//! Applies one [`BulkAction`] to a list of items, strictly in input order,
//! and returns an [`OperationResult`] describing exactly what happened.
//!
//! - A failure on one item never stops the batch. The item keeps its prior
//!   state, the error string names it, and processing moves on.
//! - A batch with any item failure ends `failed`, even though the items that
//!   succeeded keep their changes.
//! - Progress is reported after every attempted item, so it only increases
//!   and ends at 100%.
//! - A [`CancelToken`] is checked between items; a cancelled batch ends
//!   `cancelled` with the remaining items untouched.
//! - Reversible actions leave an entry in the executor's [`UndoLedger`].

use crate::action::{ActionKind, BulkAction};
use crate::ledger::{UndoLedger, UndoPayload};
use crate::model::item::Item;
use crate::record::{RecordError, SystemOfRecord};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Lifecycle of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl OperationStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether moving from `self` to `target` is allowed.
    ///
    /// Valid transitions:
    /// - `pending -> in-progress`
    /// - `pending -> failed` (could not start)
    /// - `in-progress -> completed | failed | cancelled`
    ///
    /// Terminal states never change.
    #[must_use]
    pub const fn can_advance_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::InProgress | Self::Failed)
                | (
                    Self::InProgress,
                    Self::Completed | Self::Failed | Self::Cancelled
                )
        )
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit record of one bulk operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub id: String,
    pub action: ActionKind,
    pub status: OperationStatus,
    pub items_total: usize,
    pub items_processed: usize,
    pub items_succeeded: usize,
    pub items_failed: usize,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub errors: Vec<String>,
    pub can_undo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undo_data: Option<UndoPayload>,
}

impl OperationResult {
    fn pending(id: String, action: ActionKind, total: usize) -> Self {
        Self {
            id,
            action,
            status: OperationStatus::Pending,
            items_total: total,
            items_processed: 0,
            items_succeeded: 0,
            items_failed: 0,
            started_at: Utc::now(),
            completed_at: None,
            errors: Vec::new(),
            can_undo: false,
            undo_data: None,
        }
    }

    /// Move to `target` if the transition is allowed. Returns whether it was.
    fn advance(&mut self, target: OperationStatus) -> bool {
        if !self.status.can_advance_to(target) {
            return false;
        }
        self.status = target;
        if target.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        true
    }

    fn record_success(&mut self) {
        self.items_processed += 1;
        self.items_succeeded += 1;
    }

    fn record_failure(&mut self, item_id: &str, cause: &RecordError) {
        self.items_processed += 1;
        self.items_failed += 1;
        self.errors
            .push(format!("Failed to process item {item_id}: {cause}"));
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == OperationStatus::Completed
    }

    #[must_use]
    pub const fn progress(&self) -> Progress {
        Progress {
            processed: self.items_processed,
            total: self.items_total,
        }
    }
}

/// How far an operation has got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    /// Completion in percent, `0.0..=100.0`. An empty batch is complete.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.processed as f64 / self.total as f64) * 100.0
    }

    /// [`Progress::percent`] rounded to a whole number.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent_rounded(self) -> u8 {
        self.percent().round().clamp(0.0, 100.0) as u8
    }
}

/// Shared flag a caller flips to stop a running batch between items.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs bulk actions against a system of record and keeps the undo ledger.
#[derive(Debug)]
pub struct Executor<R> {
    record: R,
    ledger: UndoLedger,
}

impl<R: SystemOfRecord> Executor<R> {
    /// An executor with an unbounded ledger.
    pub fn new(record: R) -> Self {
        Self::with_ledger(record, UndoLedger::new())
    }

    pub const fn with_ledger(record: R, ledger: UndoLedger) -> Self {
        Self { record, ledger }
    }

    pub const fn record(&self) -> &R {
        &self.record
    }

    pub const fn record_mut(&mut self) -> &mut R {
        &mut self.record
    }

    pub const fn ledger(&self) -> &UndoLedger {
        &self.ledger
    }

    /// Forget all undo history (logout / session reset).
    pub fn reset(&mut self) {
        self.ledger.clear();
    }

    /// Apply `action` to every item in `items`.
    ///
    /// Items that succeed are updated in place with their new state.
    pub fn execute(
        &mut self,
        action: &BulkAction,
        items: &mut [Item],
        progress: Option<&mut dyn FnMut(Progress)>,
    ) -> OperationResult {
        self.execute_with_cancel(action, items, progress, &CancelToken::new())
    }

    /// [`Executor::execute`], checking `cancel` before each item.
    pub fn execute_with_cancel(
        &mut self,
        action: &BulkAction,
        items: &mut [Item],
        mut progress: Option<&mut dyn FnMut(Progress)>,
        cancel: &CancelToken,
    ) -> OperationResult {
        let kind = action.kind();
        let operation_id = new_operation_id(Utc::now());
        let original_state: Vec<Item> = items.to_vec();
        let mut result = OperationResult::pending(operation_id, kind, items.len());

        if let Err(e) = self
            .record
            .begin_batch(&result.id, kind, result.items_total)
        {
            warn!(operation_id = %result.id, action = %kind, "bulk operation could not start: {e}");
            result.errors.push(format!("Bulk operation failed: {e}"));
            result.advance(OperationStatus::Failed);
            return result;
        }
        result.advance(OperationStatus::InProgress);

        for item in items.iter_mut() {
            if cancel.is_cancelled() {
                info!(
                    operation_id = %result.id,
                    processed = result.items_processed,
                    total = result.items_total,
                    "bulk operation cancelled"
                );
                result.advance(OperationStatus::Cancelled);
                break;
            }

            match self.apply(action, item) {
                Ok(()) => {
                    result.record_success();
                    if let Some(report) = progress.as_mut() {
                        report(result.progress());
                    }
                }
                Err(e) => {
                    debug!(operation_id = %result.id, item_id = %item.id, "item failed: {e}");
                    result.record_failure(&item.id, &e);
                }
            }
        }

        if result.items_failed == 0 {
            result.advance(OperationStatus::Completed);
        } else {
            result.advance(OperationStatus::Failed);
        }

        if kind.is_reversible() {
            let payload = UndoPayload::new(kind, original_state);
            self.ledger.record(result.id.clone(), payload.clone());
            result.can_undo = true;
            result.undo_data = Some(payload);
        }

        info!(
            operation_id = %result.id,
            action = %kind,
            status = %result.status,
            succeeded = result.items_succeeded,
            failed = result.items_failed,
            total = result.items_total,
            "bulk operation finished"
        );
        result
    }

    /// Reverse a recorded operation by handing its snapshot back to the
    /// system of record.
    ///
    /// Returns `false` when the id is unknown, already undone, belongs to a
    /// non-reversible action, or the restore failed (the entry then stays
    /// available).
    pub fn undo(&mut self, operation_id: &str) -> bool {
        let Some(entry) = self.ledger.take(operation_id) else {
            debug!(operation_id, "undo requested for unknown operation");
            return false;
        };

        match self.record.restore(&entry.payload.original_state) {
            Ok(()) => {
                info!(
                    operation_id,
                    action = %entry.payload.action,
                    items = entry.payload.item_ids.len(),
                    "bulk operation undone"
                );
                true
            }
            Err(e) => {
                warn!(operation_id, "undo failed, keeping ledger entry: {e}");
                self.ledger.reinstate(entry);
                false
            }
        }
    }

    fn apply(&mut self, action: &BulkAction, item: &mut Item) -> Result<(), RecordError> {
        match action {
            BulkAction::ChangeStatus { status } => {
                self.commit_with(item, |w| w.status = Some(status.clone()))
            }
            BulkAction::AssignTags { tags } => self.commit_with(item, |w| {
                w.add_tags(tags);
            }),
            BulkAction::RemoveTags { tags } => self.commit_with(item, |w| {
                w.remove_tags(tags);
            }),
            BulkAction::ChangeCategory { category } => {
                self.commit_with(item, |w| w.category = Some(category.clone()))
            }
            BulkAction::ChangePriority { priority } => {
                self.commit_with(item, |w| w.priority = Some(priority.clone()))
            }
            BulkAction::Archive => self.commit_with(item, |w| w.archive(Utc::now())),
            BulkAction::Restore => self.commit_with(item, Item::unarchive),
            BulkAction::Delete => self.record.delete(item),
            BulkAction::Export => self.record.export(item),
            BulkAction::Duplicate => self.record.duplicate(item).map(|copy| {
                debug!(item_id = %item.id, copy_id = %copy.id, "item duplicated");
            }),
        }
    }

    /// Edit a working copy, commit it, and only then write it back.
    fn commit_with(
        &mut self,
        item: &mut Item,
        edit: impl FnOnce(&mut Item),
    ) -> Result<(), RecordError> {
        let mut working = item.clone();
        edit(&mut working);
        self.record.commit(&working)?;
        *item = working;
        Ok(())
    }
}

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// `bulk-<unix millis>-<9 base36 chars>`.
fn new_operation_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
        .collect();
    format!("bulk-{}-{suffix}", now.timestamp_millis())
}
