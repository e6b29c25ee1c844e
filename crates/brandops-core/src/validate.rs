//! Pre-flight checks for bulk operations.
//!
//! Nothing here mutates anything. A request that fails validation must not
//! reach the executor, so an invalid request never leaves partial effects.

use crate::action::{ActionKind, ActionParams, BulkAction};

/// Why a bulk request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Human-readable reason, suitable for showing next to the form.
    pub message: &'static str,
    /// The parameter that was missing, when the rejection is about one.
    pub field: Option<&'static str>,
    /// Machine-readable code (e.g. `"no_items"`, `"missing_status"`).
    pub code: &'static str,
}

impl ValidationError {
    const fn new(message: &'static str, field: Option<&'static str>, code: &'static str) -> Self {
        Self {
            message,
            field,
            code,
        }
    }

    const fn no_items() -> Self {
        Self::new("No items selected", None, "no_items")
    }
}

/// Check a request without building the typed action.
///
/// # Errors
///
/// Returns a [`ValidationError`] when `items` is empty or the parameter
/// required by `kind` is absent or blank.
pub fn validate<T>(
    kind: ActionKind,
    items: &[T],
    params: &ActionParams,
) -> Result<(), ValidationError> {
    validate_action(kind, items, params).map(|_| ())
}

/// Check a request and turn it into a [`BulkAction`] with normalized values.
///
/// Text values are trimmed. Tags are trimmed, blanks dropped and duplicates
/// removed (first occurrence wins) before the non-empty check.
///
/// # Errors
///
/// Same rules as [`validate`].
pub fn validate_action<T>(
    kind: ActionKind,
    items: &[T],
    params: &ActionParams,
) -> Result<BulkAction, ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::no_items());
    }

    let action = match kind {
        ActionKind::ChangeStatus => BulkAction::ChangeStatus {
            status: present(params.status.as_deref()).ok_or(ValidationError::new(
                "Please select a status",
                Some("status"),
                "missing_status",
            ))?,
        },
        ActionKind::AssignTags => BulkAction::AssignTags {
            tags: required_tags(params)?,
        },
        ActionKind::RemoveTags => BulkAction::RemoveTags {
            tags: required_tags(params)?,
        },
        ActionKind::ChangeCategory => BulkAction::ChangeCategory {
            category: present(params.category.as_deref()).ok_or(ValidationError::new(
                "Please select a category",
                Some("category"),
                "missing_category",
            ))?,
        },
        ActionKind::ChangePriority => BulkAction::ChangePriority {
            priority: present(params.priority.as_deref()).ok_or(ValidationError::new(
                "Please select a priority",
                Some("priority"),
                "missing_priority",
            ))?,
        },
        ActionKind::Archive => BulkAction::Archive,
        ActionKind::Restore => BulkAction::Restore,
        ActionKind::Delete => BulkAction::Delete,
        ActionKind::Export => BulkAction::Export,
        ActionKind::Duplicate => BulkAction::Duplicate,
    };

    Ok(action)
}

/// Actions offered for a set of items: none for an empty set, otherwise all
/// of them.
#[must_use]
pub fn available_actions<T>(items: &[T]) -> Vec<ActionKind> {
    if items.is_empty() {
        Vec::new()
    } else {
        ActionKind::ALL.to_vec()
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn required_tags(params: &ActionParams) -> Result<Vec<String>, ValidationError> {
    let tags = normalize_tags(params.tags.as_deref().unwrap_or_default());
    if tags.is_empty() {
        Err(ValidationError::new(
            "Please select at least one tag",
            Some("tags"),
            "missing_tags",
        ))
    } else {
        Ok(tags)
    }
}

/// Trim, drop blanks, de-duplicate (first occurrence wins).
#[must_use]
pub fn normalize_tags(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|existing| existing == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
