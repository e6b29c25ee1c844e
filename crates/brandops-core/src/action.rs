//! Bulk action vocabulary.
//!
//! [`ActionKind`] is the closed set of things a bulk operation can do.
//! [`ActionParams`] is the loose bag a form collects. [`BulkAction`] is the
//! typed, validated pairing of the two: one variant per kind, carrying only
//! the fields that kind needs. Build it with
//! [`validate_action`](crate::validate::validate_action).

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The ten bulk actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    ChangeStatus,
    AssignTags,
    RemoveTags,
    ChangeCategory,
    ChangePriority,
    Archive,
    Restore,
    Delete,
    Export,
    Duplicate,
}

impl ActionKind {
    /// Every kind, in menu order.
    pub const ALL: [Self; 10] = [
        Self::ChangeStatus,
        Self::AssignTags,
        Self::RemoveTags,
        Self::ChangeCategory,
        Self::ChangePriority,
        Self::Archive,
        Self::Restore,
        Self::Delete,
        Self::Export,
        Self::Duplicate,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChangeStatus => "change-status",
            Self::AssignTags => "assign-tags",
            Self::RemoveTags => "remove-tags",
            Self::ChangeCategory => "change-category",
            Self::ChangePriority => "change-priority",
            Self::Archive => "archive",
            Self::Restore => "restore",
            Self::Delete => "delete",
            Self::Export => "export",
            Self::Duplicate => "duplicate",
        }
    }

    /// Whether a completed operation of this kind can be undone from its
    /// pre-operation snapshot.
    #[must_use]
    pub const fn is_reversible(self) -> bool {
        matches!(
            self,
            Self::ChangeStatus
                | Self::AssignTags
                | Self::RemoveTags
                | Self::ChangeCategory
                | Self::ChangePriority
                | Self::Archive
                | Self::Restore
        )
    }

    /// Destructive kinds should get an explicit confirmation step.
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::Delete)
    }

    /// The [`ActionParams`] field this kind cannot run without, if any.
    #[must_use]
    pub const fn required_param(self) -> Option<&'static str> {
        match self {
            Self::ChangeStatus => Some("status"),
            Self::AssignTags | Self::RemoveTags => Some("tags"),
            Self::ChangeCategory => Some("category"),
            Self::ChangePriority => Some("priority"),
            Self::Archive | Self::Restore | Self::Delete | Self::Export | Self::Duplicate => None,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::ChangeStatus => "Change Status",
            Self::AssignTags => "Assign Tags",
            Self::RemoveTags => "Remove Tags",
            Self::ChangeCategory => "Change Category",
            Self::ChangePriority => "Change Priority",
            Self::Archive => "Archive Items",
            Self::Restore => "Restore Items",
            Self::Delete => "Delete Items",
            Self::Export => "Export Items",
            Self::Duplicate => "Duplicate Items",
        }
    }

    /// Confirmation text for applying this kind to `count` items.
    #[must_use]
    pub fn prompt(self, count: usize) -> String {
        let noun = if count == 1 { "item" } else { "items" };
        match self {
            Self::ChangeStatus => format!("Change the status of {count} {noun}"),
            Self::AssignTags => format!("Add tags to {count} {noun}"),
            Self::RemoveTags => format!("Remove tags from {count} {noun}"),
            Self::ChangeCategory => format!("Move {count} {noun} to a different category"),
            Self::ChangePriority => format!("Change the priority of {count} {noun}"),
            Self::Archive => format!("Archive {count} {noun}? You can restore them later."),
            Self::Restore => format!("Restore {count} archived {noun}"),
            Self::Delete => format!(
                "Are you sure you want to delete {count} {noun}? This action cannot be undone."
            ),
            Self::Export => format!("Export {count} {noun} to JSON format"),
            Self::Duplicate => format!("Create copies of {count} {noun}"),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an action name from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action '{0}'")]
pub struct ParseActionError(pub String);

impl FromStr for ActionKind {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}

/// Parameters as a form collects them. Every field is optional; which ones
/// matter depends on the [`ActionKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl ActionParams {
    #[must_use]
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: Some(tags.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn priority(priority: impl Into<String>) -> Self {
        Self {
            priority: Some(priority.into()),
            ..Self::default()
        }
    }
}

/// A validated action with exactly the data its kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum BulkAction {
    ChangeStatus { status: String },
    AssignTags { tags: Vec<String> },
    RemoveTags { tags: Vec<String> },
    ChangeCategory { category: String },
    ChangePriority { priority: String },
    Archive,
    Restore,
    Delete,
    Export,
    Duplicate,
}

impl BulkAction {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::ChangeStatus { .. } => ActionKind::ChangeStatus,
            Self::AssignTags { .. } => ActionKind::AssignTags,
            Self::RemoveTags { .. } => ActionKind::RemoveTags,
            Self::ChangeCategory { .. } => ActionKind::ChangeCategory,
            Self::ChangePriority { .. } => ActionKind::ChangePriority,
            Self::Archive => ActionKind::Archive,
            Self::Restore => ActionKind::Restore,
            Self::Delete => ActionKind::Delete,
            Self::Export => ActionKind::Export,
            Self::Duplicate => ActionKind::Duplicate,
        }
    }

    #[must_use]
    pub const fn is_reversible(&self) -> bool {
        self.kind().is_reversible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_json_is_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ActionKind::ChangeStatus).unwrap(),
            "\"change-status\""
        );
        assert_eq!(
            serde_json::from_str::<ActionKind>("\"assign-tags\"").unwrap(),
            ActionKind::AssignTags
        );
    }

    #[test]
    fn display_parse_roundtrips() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.to_string().parse::<ActionKind>().unwrap(), kind);
        }
        assert_eq!(
            "CHANGE_PRIORITY".parse::<ActionKind>().unwrap(),
            ActionKind::ChangePriority
        );
        assert!("purge".parse::<ActionKind>().is_err());
    }

    #[test]
    fn reversible_set_is_the_seven_field_edits() {
        let reversible: Vec<_> = ActionKind::ALL
            .into_iter()
            .filter(|k| k.is_reversible())
            .collect();
        assert_eq!(reversible.len(), 7);
        assert!(!ActionKind::Delete.is_reversible());
        assert!(!ActionKind::Export.is_reversible());
        assert!(!ActionKind::Duplicate.is_reversible());
    }

    #[test]
    fn only_delete_is_destructive() {
        let destructive: Vec<_> = ActionKind::ALL
            .into_iter()
            .filter(|k| k.is_destructive())
            .collect();
        assert_eq!(destructive, vec![ActionKind::Delete]);
    }

    #[test]
    fn prompt_pluralizes() {
        assert_eq!(
            ActionKind::ChangeStatus.prompt(1),
            "Change the status of 1 item"
        );
        assert_eq!(ActionKind::Duplicate.prompt(4), "Create copies of 4 items");
    }

    #[test]
    fn bulk_action_kind_matches_variant() {
        let action = BulkAction::AssignTags {
            tags: vec!["core".into()],
        };
        assert_eq!(action.kind(), ActionKind::AssignTags);
        assert!(action.is_reversible());
        assert!(!BulkAction::Export.is_reversible());
    }

    #[test]
    fn bulk_action_serializes_with_action_tag() {
        let json = serde_json::to_value(BulkAction::ChangeStatus {
            status: "validated".into(),
        })
        .unwrap();
        assert_eq!(json["action"], "change-status");
        assert_eq!(json["status"], "validated");
        assert_eq!(
            serde_json::to_value(BulkAction::Archive).unwrap()["action"],
            "archive"
        );
    }
}
