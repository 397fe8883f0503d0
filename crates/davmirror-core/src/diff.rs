//! Snapshot comparison
//!
//! Turns a remote and a local snapshot into a [`SyncPlan`]. Pure and
//! deterministic: the same inputs always give the same plan.

use tracing::debug;

use crate::models::{Snapshot, SyncPlan};

/// Compute the actions that bring `remote` in line with `local`
///
/// - `load`: names only in `local`
/// - `delete`: names only in `remote`
/// - `reload`: names on both sides whose sizes differ, or whose remote copy
///   is strictly older than the local one
pub fn diff(remote: &Snapshot, local: &Snapshot) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for (name, local_meta) in local {
        match remote.get(name) {
            None => {
                plan.load.insert(name.clone());
            }
            Some(remote_meta) => {
                if remote_meta.size != local_meta.size
                    || remote_meta.last_modified < local_meta.last_modified
                {
                    plan.reload.insert(name.clone());
                }
            }
        }
    }

    plan.delete = remote
        .keys()
        .filter(|name| !local.contains_key(*name))
        .cloned()
        .collect();

    if !plan.load.is_empty() {
        debug!(count = plan.load.len(), "Files missing from remote");
    }
    if !plan.delete.is_empty() {
        debug!(count = plan.delete.len(), "Files missing locally");
    }
    if !plan.reload.is_empty() {
        debug!(count = plan.reload.len(), "Files changed locally");
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileMetadata;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeSet;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn snapshot(entries: &[(&str, u64, i64)]) -> Snapshot {
        entries
            .iter()
            .map(|(name, size, secs)| (name.to_string(), FileMetadata::new(*name, *size, t(*secs))))
            .collect()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_snapshots_need_nothing() {
        let side = snapshot(&[("a.txt", 1, 0), ("b.txt", 2, 5)]);
        let plan = diff(&side, &side.clone());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_local_only_is_loaded() {
        let plan = diff(&Snapshot::new(), &snapshot(&[("new.txt", 3, 0)]));
        assert_eq!(plan.load, set(&["new.txt"]));
        assert!(plan.reload.is_empty());
        assert!(plan.delete.is_empty());
    }

    #[test]
    fn test_remote_only_is_deleted() {
        let plan = diff(&snapshot(&[("c.txt", 3, 0)]), &Snapshot::new());
        assert_eq!(plan.delete, set(&["c.txt"]));
        assert!(plan.load.is_empty());
        assert!(plan.reload.is_empty());
    }

    #[test]
    fn test_size_change_and_new_file() {
        let remote = snapshot(&[("a.txt", 100, 0)]);
        let local = snapshot(&[("a.txt", 200, 0), ("b.txt", 10, 30)]);

        let plan = diff(&remote, &local);
        assert_eq!(plan.load, set(&["b.txt"]));
        assert_eq!(plan.reload, set(&["a.txt"]));
        assert!(plan.delete.is_empty());
    }

    #[test]
    fn test_older_remote_is_reloaded() {
        let plan = diff(&snapshot(&[("a.txt", 5, 0)]), &snapshot(&[("a.txt", 5, 1)]));
        assert_eq!(plan.reload, set(&["a.txt"]));
    }

    #[test]
    fn test_newer_or_equal_remote_is_left_alone() {
        let local = snapshot(&[("a.txt", 5, 10)]);

        let equal = diff(&snapshot(&[("a.txt", 5, 10)]), &local);
        assert!(equal.is_empty());

        let newer = diff(&snapshot(&[("a.txt", 5, 20)]), &local);
        assert!(newer.is_empty());
    }

    #[test]
    fn test_size_mismatch_wins_over_newer_remote() {
        // Remote clock ahead, but the sizes disagree
        let plan = diff(&snapshot(&[("a.txt", 5, 100)]), &snapshot(&[("a.txt", 6, 0)]));
        assert_eq!(plan.reload, set(&["a.txt"]));
    }

    #[test]
    fn test_sets_are_disjoint_and_bounded() {
        let remote = snapshot(&[("a", 1, 0), ("b", 2, 0), ("c", 3, 0), ("d", 4, 9)]);
        let local = snapshot(&[("b", 2, 0), ("c", 30, 0), ("d", 4, 1), ("e", 5, 0)]);

        let plan = diff(&remote, &local);

        assert!(plan.load.is_disjoint(&plan.reload));
        assert!(plan.load.is_disjoint(&plan.delete));
        assert!(plan.reload.is_disjoint(&plan.delete));

        let all_names: BTreeSet<String> = remote.keys().chain(local.keys()).cloned().collect();
        for name in plan.load.iter().chain(&plan.reload).chain(&plan.delete) {
            assert!(all_names.contains(name));
        }

        assert_eq!(plan.load, set(&["e"]));
        assert_eq!(plan.reload, set(&["c"]));
        assert_eq!(plan.delete, set(&["a"]));
    }

    #[test]
    fn test_diff_is_repeatable() {
        let remote = snapshot(&[("a", 1, 0), ("b", 2, 0)]);
        let local = snapshot(&[("b", 3, 0), ("z", 1, 0)]);
        assert_eq!(diff(&remote, &local), diff(&remote, &local));
    }
}
