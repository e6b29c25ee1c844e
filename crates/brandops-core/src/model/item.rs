use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anything with a stable string identifier can be a selection candidate.
pub trait Identified {
    fn id(&self) -> &str;
}

/// A catalog record (brand asset, research bundle, strategy tool, ...).
///
/// Only `id` is required. The fields the bulk actions touch are typed;
/// everything else the catalog carries lands in `extra` and is written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

impl Identified for Item {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Item {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: None,
            tags: Vec::new(),
            category: None,
            priority: None,
            is_archived: false,
            archived_at: None,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Union `tags` into the item's tags, keeping existing order and skipping
    /// duplicates. Returns `true` if anything was added.
    pub fn add_tags(&mut self, tags: &[String]) -> bool {
        let before = self.tags.len();
        for tag in tags {
            if !self.tags.contains(tag) {
                self.tags.push(tag.clone());
            }
        }
        self.tags.len() != before
    }

    /// Drop every tag in `tags`. Returns `true` if anything was removed.
    pub fn remove_tags(&mut self, tags: &[String]) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| !tags.contains(t));
        self.tags.len() != before
    }

    pub fn archive(&mut self, at: DateTime<Utc>) {
        self.is_archived = true;
        self.archived_at = Some(at);
    }

    pub fn unarchive(&mut self) {
        self.is_archived = false;
        self.archived_at = None;
    }

    /// Loose field match used by "select all matching X" filters.
    ///
    /// Known fields compare case-insensitively; `tag`/`tags` matches when the
    /// item carries the tag; `archived`/`isArchived` parses a boolean. Any
    /// other name is looked up in `extra`, comparing strings directly and
    /// other JSON values by their rendered form.
    #[must_use]
    pub fn matches_field(&self, field: &str, value: &str) -> bool {
        let eq = |candidate: Option<&str>| {
            candidate.is_some_and(|c| c.trim().eq_ignore_ascii_case(value.trim()))
        };

        match field {
            "id" => self.id == value,
            "status" => eq(self.status.as_deref()),
            "category" => eq(self.category.as_deref()),
            "priority" => eq(self.priority.as_deref()),
            "tag" | "tags" => self.tags.iter().any(|t| eq(Some(t))),
            "archived" | "isArchived" => parse_bool(value) == Some(self.is_archived),
            other => match self.extra.get(other) {
                Some(serde_json::Value::String(s)) => eq(Some(s)),
                Some(v) => v.to_string() == value.trim(),
                None => false,
            },
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
