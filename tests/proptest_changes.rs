//! Property-based tests for change detection, merging and export.
//!
//! Uses proptest to generate arbitrary friend lists and checks the set
//! relationships the activity report depends on.

use std::collections::BTreeSet;

use friend_tracker::analysis::{AnalysisOutcome, ChangeAnalyzer, ChangeSet};
use friend_tracker::enrich::merge;
use friend_tracker::model::{nameless_fraction, FriendRecord};
use friend_tracker::store::write_csv;
use proptest::prelude::*;

fn records(ids: &BTreeSet<u64>) -> Vec<FriendRecord> {
    ids.iter()
        .map(|&id| FriendRecord::new(id).with_names(format!("user{id}"), format!("User {id}")))
        .collect()
}

fn id_set() -> impl Strategy<Value = BTreeSet<u64>> {
    prop::collection::btree_set(0u64..200, 0..60)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Removed and added match the set differences exactly.
    #[test]
    fn change_set_matches_set_difference(old in id_set(), current in id_set()) {
        let changes = ChangeSet::compute(&records(&old), &records(&current));

        let removed: BTreeSet<u64> = old.difference(&current).copied().collect();
        let added: BTreeSet<u64> = current.difference(&old).copied().collect();
        prop_assert_eq!(changes.removed_ids(), removed);
        prop_assert_eq!(changes.added_ids(), added);
    }

    /// No identifier is reported both lost and new.
    #[test]
    fn removed_and_added_are_disjoint(old in id_set(), current in id_set()) {
        let changes = ChangeSet::compute(&records(&old), &records(&current));
        prop_assert!(changes.removed_ids().is_disjoint(&changes.added_ids()));
    }

    /// Report order is ascending by identifier on both sides.
    #[test]
    fn change_set_is_sorted(old in id_set(), current in id_set()) {
        let mut shuffled = records(&current);
        shuffled.reverse();
        let changes = ChangeSet::compute(&records(&old), &shuffled);

        prop_assert!(changes.removed.windows(2).all(|w| w[0].id < w[1].id));
        prop_assert!(changes.added.windows(2).all(|w| w[0].id < w[1].id));
    }

    /// Comparing a list with itself never reports changes.
    #[test]
    fn identical_lists_have_no_changes(ids in id_set()) {
        let list = records(&ids);
        let outcome = ChangeAnalyzer::new(0.5).analyze(&list, Some(list.as_slice()));
        prop_assert_eq!(outcome, AnalysisOutcome::NoChanges);
    }

    /// The log carries one line per change, removals first.
    #[test]
    fn log_lines_cover_every_change(old in id_set(), current in id_set()) {
        let changes = ChangeSet::compute(&records(&old), &records(&current));
        let lines = changes.log_lines("2024-01-01 00:00:00");

        prop_assert_eq!(lines.len(), changes.removed.len() + changes.added.len());
        let split = changes.removed.len();
        prop_assert!(lines[..split].iter().all(|l| l.contains("UNFRIENDED")));
        prop_assert!(lines[split..].iter().all(|l| l.contains("NEW FRIEND")));
    }

    /// Merging never reorders, drops or invents entries.
    #[test]
    fn merge_preserves_identity_and_order(
        ids in prop::collection::vec(0u64..500, 0..80),
        history in id_set(),
    ) {
        let friends: Vec<FriendRecord> = ids.iter().copied().map(FriendRecord::new).collect();
        let (merged, recovered) = merge(friends, &Default::default(), &records(&history));

        let merged_ids: Vec<u64> = merged.iter().map(|r| r.id).collect();
        prop_assert_eq!(merged_ids, ids.clone());
        let expected = ids.iter().filter(|id| history.contains(*id)).count();
        prop_assert_eq!(recovered, expected);
    }

    /// The nameless fraction stays within [0, 1].
    #[test]
    fn nameless_fraction_is_a_fraction(named in 0usize..50, nameless in 0usize..50) {
        let mut list: Vec<FriendRecord> = (0..named as u64)
            .map(|id| FriendRecord::new(id).with_names("n", "N"))
            .collect();
        list.extend((0..nameless as u64).map(|id| FriendRecord::new(1000 + id)));

        let fraction = nameless_fraction(&list);
        prop_assert!((0.0..=1.0).contains(&fraction));
        if !list.is_empty() {
            let expected = nameless as f64 / list.len() as f64;
            prop_assert!((fraction - expected).abs() < 1e-9);
        }
    }

    /// CSV export has a header plus one row per record.
    #[test]
    fn csv_has_one_row_per_record(ids in id_set()) {
        let mut out = Vec::new();
        write_csv(&mut out, &records(&ids)).unwrap();

        let text = String::from_utf8(out).unwrap();
        prop_assert_eq!(text.matches("\r\n").count(), ids.len() + 1);
    }
}
