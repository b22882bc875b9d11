//! Pruning of expired weekly snapshots.
//!
//! Only the weekly tier is capped. Daily, monthly and yearly slots are bounded
//! by their keys and replaced in place by promotion.

use tracing::info;

use crate::error::{BackupError, BackupResult};
use crate::name::SnapshotName;
use crate::selector::Selection;
use crate::store::SnapshotStore;
use crate::tier::Tier;

/// Default cap on weekly snapshots.
pub const DEFAULT_MAX_WEEKLY: usize = 5;

/// Chooses the weekly entries to remove, oldest first.
///
/// `fresh` is the entry just promoted when that promotion was weekly. It is
/// never pruned, and the other managed entries are trimmed to
/// `max_weekly - 1` to leave room for it. Without a fresh entry the tier is
/// trimmed to `max_weekly`. Names that are not managed snapshots are ignored.
///
/// Age comes from the embedded date: names lead with the slot key, so their
/// lexical order says nothing about when they were taken.
#[must_use]
pub fn plan_pruning(entries: &[String], fresh: Option<&str>, max_weekly: usize) -> Vec<String> {
    let mut candidates: Vec<(SnapshotName, &String)> = entries
        .iter()
        .filter(|entry| Some(entry.as_str()) != fresh)
        .filter_map(|entry| SnapshotName::parse(entry).map(|name| (name, entry)))
        .collect();
    candidates.sort_by(|(a, a_entry), (b, b_entry)| {
        a.date().cmp(&b.date()).then_with(|| a_entry.cmp(b_entry))
    });

    let keep = if fresh.is_some() {
        max_weekly.saturating_sub(1)
    } else {
        max_weekly
    };
    let excess = candidates.len().saturating_sub(keep);
    candidates
        .into_iter()
        .take(excess)
        .map(|(_, entry)| entry.clone())
        .collect()
}

/// Enforces the weekly cap after `promoted` has been promoted.
///
/// Returns the removed entries in removal order.
pub fn enforce_retention(
    store: &SnapshotStore,
    promoted: &Selection,
    max_weekly: usize,
) -> BackupResult<Vec<String>> {
    if max_weekly == 0 {
        return Err(BackupError::InvalidConfig(
            "weekly retention must keep at least one snapshot".to_owned(),
        ));
    }

    let entries = store.list_entries(Tier::Weekly)?;
    let fresh = (promoted.tier() == Tier::Weekly).then(|| promoted.entry_name());
    let expired = plan_pruning(&entries, fresh.as_deref(), max_weekly);

    for entry in &expired {
        info!(target: "backup::prune", tier = %Tier::Weekly, "pruning {entry}");
        store
            .context()
            .remove_tree(&store.entry_path(Tier::Weekly, entry))
            .map_err(|source| BackupError::RetentionFailed {
                entry: entry.clone(),
                source,
            })?;
    }

    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use proptest::prelude::*;
    use test_support::SnapshotRoot;
    use time::macros::date;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn fresh_weekly_entry_reserves_one_place() {
        let entries = names(&[
            "1-20240205.snapshot",
            "2-20240212.snapshot",
            "3-20240219.snapshot",
            "4-20240226.snapshot",
            "5-20240304.snapshot",
        ]);
        let fresh = Some("5-20240304.snapshot");
        assert!(plan_pruning(&entries, fresh, 5).is_empty());
        assert_eq!(
            plan_pruning(&entries, fresh, 3),
            names(&["1-20240205.snapshot", "2-20240212.snapshot"])
        );
    }

    #[test]
    fn without_fresh_entry_the_cap_itself_is_kept() {
        let entries = names(&[
            "1-20240205.snapshot",
            "2-20240212.snapshot",
            "3-20240219.snapshot",
            "4-20240226.snapshot",
            "5-20240304.snapshot",
        ]);
        assert!(plan_pruning(&entries, None, 5).is_empty());
        assert_eq!(
            plan_pruning(&entries, None, 3),
            names(&["1-20240205.snapshot", "2-20240212.snapshot"])
        );
    }

    #[test]
    fn ordering_is_chronological_not_lexical() {
        // Slot 5 was written before slot 1 when the weeks wrap around.
        let entries = names(&[
            "1-20240304.snapshot",
            "5-20240226.snapshot",
            "4-20240219.snapshot",
        ]);
        assert_eq!(
            plan_pruning(&entries, None, 1),
            names(&["4-20240219.snapshot", "5-20240226.snapshot"])
        );
    }

    #[test]
    fn fresh_entry_is_never_pruned() {
        let entries = names(&["1-20240101.snapshot", "2-20240108.snapshot"]);
        assert_eq!(
            plan_pruning(&entries, Some("1-20240101.snapshot"), 1),
            names(&["2-20240108.snapshot"])
        );
    }

    #[test]
    fn foreign_names_are_left_alone() {
        let entries = names(&["notes.snapshot", "1-20240101.snapshot", "2-20240108.snapshot"]);
        assert_eq!(plan_pruning(&entries, None, 1), names(&["1-20240101.snapshot"]));
    }

    #[test]
    fn under_cap_prunes_nothing() {
        let entries = names(&["1-20240101.snapshot", "2-20240108.snapshot"]);
        assert!(plan_pruning(&entries, None, 5).is_empty());
    }

    proptest! {
        #[test]
        fn leaves_at_most_cap_and_removes_exactly_the_oldest(
            days in proptest::collection::btree_set(0u16..300, 1..12),
            max_weekly in 1usize..8,
            newest_is_fresh in any::<bool>(),
        ) {
            let base = date!(2023 - 01 - 02);
            let entries: Vec<String> = days
                .iter()
                .enumerate()
                .map(|(index, offset)| {
                    let day = base + time::Duration::days(i64::from(*offset));
                    format!("{}-{}.snapshot", index % 5 + 1, crate::name::compact_date(day))
                })
                .collect();
            let fresh = entries.last().filter(|_| newest_is_fresh).map(String::as_str);

            let pruned = plan_pruning(&entries, fresh, max_weekly);
            let expected = if fresh.is_some() {
                (entries.len() - 1).saturating_sub(max_weekly - 1)
            } else {
                entries.len().saturating_sub(max_weekly)
            };
            prop_assert_eq!(pruned.len(), expected);
            prop_assert!(entries.len() - pruned.len() <= max_weekly);

            // BTreeSet iteration is ascending, so entries are already oldest first.
            prop_assert_eq!(pruned.as_slice(), &entries[..expected]);
        }
    }

    #[test]
    fn enforce_retention_removes_expired_entries_from_disk() {
        let root = SnapshotRoot::new();
        for name in [
            "1-20240205.snapshot",
            "2-20240212.snapshot",
            "3-20240219.snapshot",
            "4-20240226.snapshot",
            "5-20240101.snapshot",
            "1-20240304.snapshot",
        ] {
            root.add_entry("weekly", name);
        }
        let store = SnapshotStore::open(Location::local(root.path()), &[]);
        let promoted = Selection::new(Tier::Weekly, date!(2024 - 03 - 04));

        let pruned = enforce_retention(&store, &promoted, 3).expect("retention");

        assert_eq!(
            pruned,
            names(&["5-20240101.snapshot", "1-20240205.snapshot", "2-20240212.snapshot"])
        );
        assert_eq!(
            root.entries("weekly"),
            names(&["1-20240304.snapshot", "3-20240219.snapshot", "4-20240226.snapshot"])
        );
    }

    #[test]
    fn daily_promotion_keeps_a_full_weekly_tier() {
        let root = SnapshotRoot::new();
        for name in [
            "1-20240205.snapshot",
            "2-20240212.snapshot",
            "3-20240219.snapshot",
            "4-20240226.snapshot",
            "5-20240304.snapshot",
        ] {
            root.add_entry("weekly", name);
        }
        let store = SnapshotStore::open(Location::local(root.path()), &[]);
        let promoted = Selection::new(Tier::Daily, date!(2024 - 03 - 06));

        let pruned = enforce_retention(&store, &promoted, DEFAULT_MAX_WEEKLY).expect("retention");

        assert!(pruned.is_empty());
        assert_eq!(root.entries("weekly").len(), 5);
    }

    #[test]
    fn zero_cap_is_rejected() {
        let root = SnapshotRoot::new();
        let store = SnapshotStore::open(Location::local(root.path()), &[]);
        let promoted = Selection::new(Tier::Daily, date!(2024 - 03 - 06));
        let error = enforce_retention(&store, &promoted, 0).expect_err("invalid");
        assert!(matches!(error, BackupError::InvalidConfig(_)));
    }
}
