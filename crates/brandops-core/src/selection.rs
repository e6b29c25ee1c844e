//! Multi-select state for bulk actions.
//!
//! [`Selection`] only stores identifiers. The candidate collection (the
//! list currently on screen) stays with the caller and is passed to the
//! operations that need it, so derived answers always reflect the latest
//! item data. Ids that are no longer among the candidates are tolerated:
//! they never count toward "all selected" and are never returned by
//! [`Selection::selected_items`].

use crate::model::item::Identified;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<String>,
}

/// Point-in-time view of a selection against a candidate collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub selected_ids: Vec<String>,
    pub is_all_selected: bool,
    pub total_items: usize,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of one id.
    pub fn toggle(&mut self, id: &str) {
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
    }

    /// Clear when every candidate is selected, otherwise select exactly the
    /// candidates. The new set is built first and swapped in whole.
    pub fn toggle_all<T: Identified>(&mut self, candidates: &[T]) {
        self.selected = if self.is_all_selected(candidates) {
            BTreeSet::new()
        } else {
            candidates.iter().map(|c| c.id().to_string()).collect()
        };
    }

    /// Replace the selection with the candidates matching `predicate`.
    pub fn select_by<T, F>(&mut self, candidates: &[T], mut predicate: F)
    where
        T: Identified,
        F: FnMut(&T) -> bool,
    {
        self.selected = candidates
            .iter()
            .filter(|c| predicate(c))
            .map(|c| c.id().to_string())
            .collect();
    }

    /// Replace the selection with `ids`.
    pub fn select_many<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = ids.into_iter().map(Into::into).collect();
    }

    /// Union `ids` into the selection.
    pub fn add_many<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.extend(ids.into_iter().map(Into::into));
    }

    /// Remove `ids` from the selection.
    pub fn remove_many<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.selected.remove(id.as_ref());
        }
    }

    /// Add every candidate between `anchor` and `target` (inclusive, either
    /// direction) to the selection.
    ///
    /// Returns `false` and leaves the selection alone when either id is not
    /// among the candidates.
    pub fn select_range<T: Identified>(
        &mut self,
        candidates: &[T],
        anchor: &str,
        target: &str,
    ) -> bool {
        let position = |id: &str| candidates.iter().position(|c| c.id() == id);
        let (Some(a), Some(b)) = (position(anchor), position(target)) else {
            return false;
        };
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        self.selected.extend(
            candidates[start..=end]
                .iter()
                .map(|c| c.id().to_string()),
        );
        true
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop ids that are no longer among the candidates. Returns how many
    /// were dropped.
    pub fn prune<T: Identified>(&mut self, candidates: &[T]) -> usize {
        let before = self.selected.len();
        let live: BTreeSet<&str> = candidates.iter().map(Identified::id).collect();
        self.selected.retain(|id| live.contains(id.as_str()));
        before - self.selected.len()
    }

    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// The selected candidates, in candidate order.
    #[must_use]
    pub fn selected_items<'a, T: Identified>(&self, candidates: &'a [T]) -> Vec<&'a T> {
        candidates
            .iter()
            .filter(|c| self.selected.contains(c.id()))
            .collect()
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// `true` only when there is at least one candidate and every candidate
    /// is selected.
    #[must_use]
    pub fn is_all_selected<T: Identified>(&self, candidates: &[T]) -> bool {
        !candidates.is_empty() && candidates.iter().all(|c| self.selected.contains(c.id()))
    }

    #[must_use]
    pub fn state<T: Identified>(&self, candidates: &[T]) -> SelectionState {
        SelectionState {
            selected_ids: self.selected.iter().cloned().collect(),
            is_all_selected: self.is_all_selected(candidates),
            total_items: candidates.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::Item;

    fn catalog(n: usize) -> Vec<Item> {
        (1..=n).map(|i| Item::new(format!("asset-{i}"))).collect()
    }

    #[test]
    fn toggle_twice_cancels_out() {
        let mut sel = Selection::new();
        sel.toggle("asset-1");
        assert!(sel.is_selected("asset-1"));
        sel.toggle("asset-1");
        assert!(!sel.is_selected("asset-1"));
        assert!(sel.is_empty());
    }

    #[test]
    fn toggle_all_selects_then_clears() {
        let items = catalog(10);
        let mut sel = Selection::new();

        sel.toggle_all(&items);
        assert_eq!(sel.selected_count(), 10);
        assert!(sel.is_all_selected(&items));

        sel.toggle_all(&items);
        assert_eq!(sel.selected_count(), 0);
        assert!(!sel.is_all_selected(&items));
    }

    #[test]
    fn toggle_all_from_partial_selects_everything() {
        let items = catalog(4);
        let mut sel = Selection::new();
        sel.toggle("asset-2");
        sel.toggle_all(&items);
        assert_eq!(sel.selected_count(), 4);
    }

    #[test]
    fn toggle_all_replaces_stale_ids() {
        let items = catalog(2);
        let mut sel = Selection::new();
        sel.select_many(["gone"]);
        sel.toggle_all(&items);
        assert!(!sel.is_selected("gone"));
        assert_eq!(sel.selected_count(), 2);
    }

    #[test]
    fn empty_candidates_are_never_all_selected() {
        let items: Vec<Item> = Vec::new();
        let mut sel = Selection::new();
        assert!(!sel.is_all_selected(&items));
        sel.select_many(["asset-1", "asset-2"]);
        assert!(!sel.is_all_selected(&items));
    }

    #[test]
    fn stale_ids_do_not_make_all_selected() {
        let items = catalog(3);
        let mut sel = Selection::new();
        sel.select_many(["asset-1", "asset-2", "removed"]);
        assert_eq!(sel.selected_count(), 3);
        assert!(!sel.is_all_selected(&items));
        assert_eq!(sel.selected_items(&items).len(), 2);
    }

    #[test]
    fn select_by_replaces_prior_selection() {
        let items = vec![
            Item::new("a").with_status("validated"),
            Item::new("b").with_status("in-development"),
            Item::new("c").with_status("validated"),
        ];
        let mut sel = Selection::new();
        sel.toggle("b");
        sel.select_by(&items, |i| i.status.as_deref() == Some("validated"));
        let ids: Vec<_> = sel.selected_ids().collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn add_and_remove_many() {
        let mut sel = Selection::new();
        sel.select_many(["a", "b"]);
        sel.add_many(["b", "c"]);
        assert_eq!(sel.selected_count(), 3);
        sel.remove_many(["a", "z"]);
        let ids: Vec<_> = sel.selected_ids().collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn select_range_is_inclusive_in_both_directions() {
        let items = catalog(6);
        let mut sel = Selection::new();
        assert!(sel.select_range(&items, "asset-5", "asset-3"));
        let ids: Vec<_> = sel.selected_ids().collect();
        assert_eq!(ids, vec!["asset-3", "asset-4", "asset-5"]);

        assert!(sel.select_range(&items, "asset-1", "asset-1"));
        assert_eq!(sel.selected_count(), 4);
    }

    #[test]
    fn select_range_with_unknown_id_is_a_noop() {
        let items = catalog(3);
        let mut sel = Selection::new();
        sel.toggle("asset-1");
        assert!(!sel.select_range(&items, "asset-1", "missing"));
        assert_eq!(sel.selected_count(), 1);
    }

    #[test]
    fn selected_items_follow_candidate_order_and_latest_data() {
        let mut items = catalog(3);
        let mut sel = Selection::new();
        sel.select_many(["asset-3", "asset-1"]);
        items[0].status = Some("validated".into());

        let picked = sel.selected_items(&items);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].id, "asset-1");
        assert_eq!(picked[0].status.as_deref(), Some("validated"));
        assert_eq!(picked[1].id, "asset-3");
    }

    #[test]
    fn prune_drops_only_stale_ids() {
        let items = catalog(2);
        let mut sel = Selection::new();
        sel.select_many(["asset-1", "old-1", "old-2"]);
        assert_eq!(sel.prune(&items), 2);
        assert!(sel.is_selected("asset-1"));
    }

    #[test]
    fn state_snapshot_serializes_camel_case() {
        let items = catalog(2);
        let mut sel = Selection::new();
        sel.toggle_all(&items);
        let json = serde_json::to_value(sel.state(&items)).unwrap();
        assert_eq!(json["isAllSelected"], true);
        assert_eq!(json["totalItems"], 2);
        assert_eq!(json["selectedIds"].as_array().unwrap().len(), 2);
    }
}
