use brandops_core::{
    BulkAction, Executor, Item, MemoryStore, OperationStatus, Progress, RecordError, Selection,
    SystemOfRecord,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn arb_catalog() -> impl Strategy<Value = Vec<Item>> {
    (0usize..40).prop_map(|n| (0..n).map(|i| Item::new(format!("item-{i}"))).collect())
}

/// A catalog plus the ids the store will reject.
fn arb_catalog_with_failures() -> impl Strategy<Value = (Vec<Item>, HashSet<String>)> {
    (1usize..40).prop_flat_map(|n| {
        let items: Vec<Item> = (0..n).map(|i| Item::new(format!("item-{i}"))).collect();
        (
            Just(items),
            prop::collection::vec(prop::bool::weighted(0.2), n).prop_map(|mask| {
                mask.into_iter()
                    .enumerate()
                    .filter(|(_, fail)| *fail)
                    .map(|(i, _)| format!("item-{i}"))
                    .collect()
            }),
        )
    })
}

fn arb_action() -> impl Strategy<Value = BulkAction> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(|status| BulkAction::ChangeStatus { status }),
        prop::collection::vec("[a-z]{1,5}", 1..4).prop_map(|tags| BulkAction::AssignTags { tags }),
        prop::collection::vec("[a-z]{1,5}", 1..4).prop_map(|tags| BulkAction::RemoveTags { tags }),
        "[a-z]{1,8}".prop_map(|category| BulkAction::ChangeCategory { category }),
        "[a-z]{1,8}".prop_map(|priority| BulkAction::ChangePriority { priority }),
        Just(BulkAction::Archive),
        Just(BulkAction::Restore),
        Just(BulkAction::Delete),
        Just(BulkAction::Export),
        Just(BulkAction::Duplicate),
    ]
}

struct Rejects {
    inner: MemoryStore,
    ids: HashSet<String>,
}

impl Rejects {
    fn guard(&self, item: &Item) -> Result<(), RecordError> {
        if self.ids.contains(&item.id) {
            Err(RecordError::Rejected("no".into()))
        } else {
            Ok(())
        }
    }
}

impl SystemOfRecord for Rejects {
    fn commit(&mut self, item: &Item) -> Result<(), RecordError> {
        self.guard(item)?;
        self.inner.commit(item)
    }
    fn delete(&mut self, item: &Item) -> Result<(), RecordError> {
        self.guard(item)?;
        self.inner.delete(item)
    }
    fn duplicate(&mut self, item: &Item) -> Result<Item, RecordError> {
        self.guard(item)?;
        self.inner.duplicate(item)
    }
    fn export(&mut self, item: &Item) -> Result<(), RecordError> {
        self.guard(item)?;
        self.inner.export(item)
    }
    fn restore(&mut self, snapshot: &[Item]) -> Result<(), RecordError> {
        self.inner.restore(snapshot)
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn toggle_twice_is_identity(items in arb_catalog(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!items.is_empty());
        let id = &items[pick.index(items.len())].id;
        let mut sel = Selection::new();
        sel.add_many(items.iter().step_by(2).map(|i| i.id.clone()));
        let before = sel.clone();
        sel.toggle(id);
        sel.toggle(id);
        prop_assert_eq!(sel, before);
    }

    #[test]
    fn toggle_all_selects_everything_or_nothing(
        items in arb_catalog(),
        preselect in prop::collection::vec(any::<bool>(), 40),
    ) {
        let mut sel = Selection::new();
        sel.add_many(
            items
                .iter()
                .zip(&preselect)
                .filter(|(_, on)| **on)
                .map(|(i, _)| i.id.clone()),
        );
        let was_all = sel.is_all_selected(&items);
        sel.toggle_all(&items);
        if was_all {
            prop_assert_eq!(sel.selected_count(), 0);
        } else {
            prop_assert_eq!(sel.selected_count(), items.len());
        }
        prop_assert_eq!(sel.is_all_selected(&items), !was_all && !items.is_empty());
    }

    #[test]
    fn selected_count_matches_set_size(
        ops in prop::collection::vec((0usize..10, any::<bool>()), 0..60),
    ) {
        let mut sel = Selection::new();
        let mut model = HashSet::new();
        for (n, add) in ops {
            let id = format!("item-{n}");
            if add {
                sel.add_many([id.clone()]);
                model.insert(id);
            } else {
                sel.toggle(&id);
                if !model.remove(&id) {
                    model.insert(id);
                }
            }
        }
        prop_assert_eq!(sel.selected_count(), model.len());
    }

    #[test]
    fn counters_and_status_agree(
        (items, failing) in arb_catalog_with_failures(),
        action in arb_action(),
    ) {
        let mut targets = items.clone();
        let mut exec = Executor::new(Rejects {
            inner: MemoryStore::new(items),
            ids: failing.clone(),
        });
        let mut seen: Vec<Progress> = Vec::new();
        let mut on_progress = |p: Progress| seen.push(p);
        let result = exec.execute(&action, &mut targets, Some(&mut on_progress));

        prop_assert_eq!(result.items_processed, result.items_succeeded + result.items_failed);
        prop_assert!(result.items_processed <= result.items_total);
        prop_assert_eq!(result.items_processed, result.items_total);
        prop_assert_eq!(result.items_failed, failing.len());
        prop_assert_eq!(result.errors.len(), failing.len());
        if failing.is_empty() {
            prop_assert_eq!(result.status, OperationStatus::Completed);
        } else {
            prop_assert_eq!(result.status, OperationStatus::Failed);
        }
        prop_assert_eq!(result.can_undo, action.is_reversible());

        prop_assert_eq!(seen.len(), result.items_succeeded);
        prop_assert!(seen.windows(2).all(|w| w[0].processed < w[1].processed));
        if failing.is_empty() {
            prop_assert_eq!(seen.last().map(|p| p.percent_rounded()), Some(100));
        }
    }

    #[test]
    fn undo_of_reversible_action_restores_store(
        (items, failing) in arb_catalog_with_failures(),
        action in arb_action(),
    ) {
        prop_assume!(action.is_reversible());
        let before = items.clone();
        let mut targets = items.clone();
        let mut exec = Executor::new(Rejects {
            inner: MemoryStore::new(items),
            ids: failing,
        });
        let result = exec.execute(&action, &mut targets, None);
        prop_assert!(exec.undo(&result.id));
        prop_assert_eq!(exec.record().inner.items(), before.as_slice());
        prop_assert!(!exec.undo(&result.id));
    }
}
