//! Property-based tests for topic pruning and the artifact format.
//!
//! Uses proptest to generate arbitrary snapshots and exclusion sets.

use proptest::prelude::*;
use std::collections::HashSet;

use kafka_offset_migrate_core::migrate::artifact::{parse, render};
use kafka_offset_migrate_core::migrate::{prune, topics};
use kafka_offset_migrate_core::{ExclusionList, OffsetEntry, OffsetSnapshot};

/// Topic names as Kafka allows them, plus commas
fn arbitrary_topic() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9._,-]{1,16}"
}

fn arbitrary_snapshot() -> impl Strategy<Value = OffsetSnapshot> {
    prop::collection::vec((arbitrary_topic(), 0..1024i32, 0..i64::MAX), 0..64).prop_map(
        |entries| {
            entries
                .into_iter()
                .map(|(topic, partition, offset)| OffsetEntry::new(topic, partition, offset))
                .collect()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: pruning with no exclusions returns the snapshot unchanged
    #[test]
    fn prune_without_exclusions_is_identity(snapshot in arbitrary_snapshot()) {
        prop_assert_eq!(prune(snapshot.clone(), &ExclusionList::default()), snapshot);
    }

    /// Property: exclusions naming no subscribed topic change nothing
    #[test]
    fn prune_with_unknown_exclusions_is_identity(
        snapshot in arbitrary_snapshot(),
        unknown in prop::collection::vec("[a-z]{17,24}", 1..8),
    ) {
        let exclusions: ExclusionList = unknown.iter().map(String::as_str).collect();
        prop_assert_eq!(prune(snapshot.clone(), &exclusions), snapshot);
    }

    /// Property: pruning drops exactly the excluded topics and keeps the rest in order
    #[test]
    fn prune_removes_exactly_the_excluded_topics(
        snapshot in arbitrary_snapshot(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let subscribed = topics(&snapshot);
        let excluded: HashSet<String> = if subscribed.is_empty() {
            HashSet::new()
        } else {
            picks.iter().map(|i| i.get(subscribed.as_slice()).clone()).collect()
        };
        let exclusions: ExclusionList = excluded.iter().map(String::as_str).collect();

        let pruned = prune(snapshot.clone(), &exclusions);

        let expected: Vec<_> = snapshot
            .entries()
            .filter(|e| !excluded.contains(&e.topic))
            .collect();
        prop_assert_eq!(pruned.entries().collect::<Vec<_>>(), expected);
        prop_assert!(topics(&pruned).as_slice().iter().all(|t| !excluded.contains(t)));
    }

    /// Property: every name in a comma separated list is excluded, whatever the spacing
    #[test]
    fn parsed_exclusions_contain_every_listed_topic(
        names in prop::collection::vec("[a-z0-9._-]{1,16}", 1..8),
        separator in prop::sample::select(vec![",", ", ", " , ", ",,"]),
    ) {
        let exclusions = ExclusionList::parse(&names.join(separator));
        for name in &names {
            prop_assert!(exclusions.contains(name));
        }
    }

    /// Property: rendering then parsing an artifact yields the same snapshot
    #[test]
    fn artifact_text_round_trips(snapshot in arbitrary_snapshot()) {
        let text = render(&snapshot);
        prop_assert_eq!(text.lines().count(), snapshot.len());
        prop_assert_eq!(parse(&text).unwrap(), snapshot);
    }
}
