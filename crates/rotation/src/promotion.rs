//! Turning a completed staging entry into a named snapshot.
//!
//! 1. remove whatever occupies the target slot (at most one entry);
//! 2. rename `incomplete.snapshot` to `<tier>/<slot>-<YYYYMMDD>.snapshot`;
//! 3. remove `latest.snapshot`;
//! 4. link `latest.snapshot` to the new entry.
//!
//! Steps are not rolled back. When the staging entry is gone but the target
//! already exists, an earlier run got past step 2 and only the alias is
//! rebuilt, so repeating a promotion is harmless.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{BackupError, BackupResult, PromotionStep, StoreError};
use crate::selector::Selection;
use crate::store::SnapshotStore;

/// What a promotion did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PromotionReport {
    /// Entries removed from the target slot.
    pub replaced: Vec<String>,
    /// `true` when the rename had already happened in an earlier run.
    pub resumed: bool,
}

fn step<T>(step: PromotionStep, result: Result<T, StoreError>) -> BackupResult<T> {
    result.map_err(|source| BackupError::PromotionFailed { step, source })
}

/// Promotes the staging entry of `store` into the slot chosen by `selection`.
pub fn promote(store: &SnapshotStore, selection: &Selection) -> BackupResult<PromotionReport> {
    let context = store.context();
    let tier = selection.tier();
    let entry_name = selection.entry_name();
    let staging = store.staging_path();
    let target = store.entry_path(tier, &entry_name);
    let mut report = PromotionReport::default();

    if step(PromotionStep::Inspect, context.path_exists(&staging))? {
        let slot = selection.slot();
        let occupants = step(PromotionStep::ClearSlot, store.exists(tier, &slot.pattern()))?;
        if occupants.len() > 1 {
            return Err(BackupError::ConsistencyViolation {
                tier,
                slot: slot.to_string(),
                entries: occupants,
            });
        }
        for occupant in occupants {
            info!(target: "backup::promote", tier = %tier, entry = %occupant, "replacing slot occupant");
            step(
                PromotionStep::ClearSlot,
                context.remove_tree(&store.entry_path(tier, &occupant)),
            )?;
            report.replaced.push(occupant);
        }

        step(PromotionStep::Rename, context.rename(&staging, &target))?;
        info!(target: "backup::promote", "promoted {}", selection.relative_path());
    } else if step(PromotionStep::Inspect, context.path_exists(&target))? {
        info!(
            target: "backup::promote",
            "staging entry already promoted to {}; relinking latest",
            selection.relative_path()
        );
        report.resumed = true;
    } else {
        return Err(BackupError::PromotionFailed {
            step: PromotionStep::Inspect,
            source: StoreError::Missing { path: staging },
        });
    }

    let latest = store.latest_path();
    step(PromotionStep::RemoveLatest, context.remove_link(&latest))?;
    step(
        PromotionStep::LinkLatest,
        context.symlink(Path::new(&selection.relative_path()), &latest),
    )?;
    debug!(target: "backup::promote", "latest.snapshot -> {}", selection.relative_path());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use crate::store::RemoteContext;
    use crate::tier::Tier;
    use test_support::{ScriptedChannel, SnapshotRoot};
    use time::macros::date;

    fn local_store(root: &SnapshotRoot) -> SnapshotStore {
        SnapshotStore::open(Location::local(root.path()), &[])
    }

    #[cfg(unix)]
    #[test]
    fn promotes_staging_and_links_latest() {
        let root = SnapshotRoot::new();
        root.add_staging("notes.txt", "monday");
        let store = local_store(&root);
        let selection = Selection::new(Tier::Daily, date!(2024 - 03 - 04));

        let report = promote(&store, &selection).expect("promote");

        assert_eq!(report, PromotionReport::default());
        assert!(!root.has_staging());
        assert_eq!(root.entries("daily"), vec!["1-20240304.snapshot"]);
        assert_eq!(
            root.latest().expect("latest"),
            Path::new("daily/1-20240304.snapshot")
        );
        let promoted = root.path().join("latest.snapshot/notes.txt");
        assert_eq!(std::fs::read_to_string(promoted).expect("read"), "monday");
    }

    #[cfg(unix)]
    #[test]
    fn replaces_stale_entry_in_same_slot() {
        let root = SnapshotRoot::new();
        root.add_entry("monthly", "03-20230301.snapshot");
        root.add_entry("monthly", "04-20230401.snapshot");
        root.link_latest("monthly/03-20230301.snapshot");
        root.add_staging("file", "new");
        let store = local_store(&root);
        let selection = Selection::new(Tier::Monthly, date!(2024 - 03 - 01));

        let report = promote(&store, &selection).expect("promote");

        assert_eq!(report.replaced, vec!["03-20230301.snapshot"]);
        assert_eq!(
            root.entries("monthly"),
            vec!["03-20240301.snapshot", "04-20230401.snapshot"]
        );
        assert_eq!(
            root.latest().expect("latest"),
            Path::new("monthly/03-20240301.snapshot")
        );
    }

    #[cfg(unix)]
    #[test]
    fn second_promotion_is_a_no_op() {
        let root = SnapshotRoot::new();
        root.add_staging("file", "data");
        let store = local_store(&root);
        let selection = Selection::new(Tier::Weekly, date!(2024 - 03 - 04));

        promote(&store, &selection).expect("first");
        let entries = root.entries("weekly");
        let latest = root.latest();

        let report = promote(&store, &selection).expect("second");
        assert!(report.resumed);
        assert!(report.replaced.is_empty());
        assert_eq!(root.entries("weekly"), entries);
        assert_eq!(root.latest(), latest);
    }

    #[test]
    fn nothing_to_promote_is_an_error() {
        let root = SnapshotRoot::new();
        let store = local_store(&root);
        let selection = Selection::new(Tier::Yearly, date!(2024 - 03 - 01));

        let error = promote(&store, &selection).expect_err("no staging");
        assert!(matches!(
            error,
            BackupError::PromotionFailed {
                step: PromotionStep::Inspect,
                source: StoreError::Missing { .. }
            }
        ));
        assert_eq!(error.exit_code(), 11);
        assert!(root.latest().is_none());
    }

    #[test]
    fn crowded_slot_is_refused_before_renaming() {
        let root = SnapshotRoot::new();
        root.add_entry("monthly", "03-20220301.snapshot");
        root.add_entry("monthly", "03-20230301.snapshot");
        root.add_staging("file", "data");
        let store = local_store(&root);
        let selection = Selection::new(Tier::Monthly, date!(2024 - 03 - 01));

        let error = promote(&store, &selection).expect_err("violation");
        assert_eq!(error.exit_code(), 3);
        assert!(root.has_staging());
        assert_eq!(root.entries("monthly").len(), 2);
    }

    #[test]
    fn remote_promotion_issues_commands_in_order() {
        // test -e staging, find slot, rm -rf occupant, mv, rm -f latest, ln -s.
        let channel = ScriptedChannel::new()
            .respond(0, "")
            .respond(0, "/srv/monthly/03-20230301.snapshot\n");
        let store = SnapshotStore::new(
            Location::remote(None, "nas", "/srv"),
            Box::new(RemoteContext::new(channel.clone())),
        );
        let selection = Selection::new(Tier::Monthly, date!(2024 - 03 - 01));

        let report = promote(&store, &selection).expect("promote");
        assert_eq!(report.replaced, vec!["03-20230301.snapshot"]);
        assert_eq!(
            channel.rendered_calls(),
            vec![
                "test -e /srv/incomplete.snapshot",
                "find /srv/monthly -mindepth 1 -maxdepth 1 -name 03-*.snapshot",
                "rm -rf -- /srv/monthly/03-20230301.snapshot",
                "mv -- /srv/incomplete.snapshot /srv/monthly/03-20240301.snapshot",
                "rm -f -- /srv/latest.snapshot",
                "ln -s -- monthly/03-20240301.snapshot /srv/latest.snapshot",
            ]
        );
    }

    #[test]
    fn remote_rename_failure_reports_step_and_status() {
        let channel = ScriptedChannel::new()
            .respond(0, "")
            .respond(1, "")
            .respond_with_stderr(1, "", "mv: cannot move");
        let store = SnapshotStore::new(
            Location::remote(None, "nas", "/srv"),
            Box::new(RemoteContext::new(channel.clone())),
        );
        let selection = Selection::new(Tier::Yearly, date!(2024 - 03 - 01));

        let error = promote(&store, &selection).expect_err("mv fails");
        assert!(matches!(
            error,
            BackupError::PromotionFailed {
                step: PromotionStep::Rename,
                ..
            }
        ));
        assert_eq!(error.exit_code(), 1);
        assert_eq!(channel.calls().len(), 3);
    }
}
