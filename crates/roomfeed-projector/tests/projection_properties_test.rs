//! Property-based tests for projection store invariants.
//!
//! Event sequences are generated over a small id space so that duplicates,
//! modifies and removes of the same document are common.

use proptest::prelude::*;
use roomfeed_core::{ChangeEvent, Document};
use roomfeed_projector::ProjectionStore;

fn doc(id: &str, name: &str) -> Document {
    Document::new(id).with_field("name", name)
}

/// Ids drawn from a small pool.
fn arb_id() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["r1", "r2", "r3", "r4", "r5", "r6"]).prop_map(String::from)
}

fn arb_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{0,6}".prop_map(|s| s)
}

/// Any event, including ones a well-behaved source would never send.
fn arb_event() -> impl Strategy<Value = ChangeEvent<Document>> {
    prop_oneof![
        (arb_id(), arb_name()).prop_map(|(id, name)| ChangeEvent::Added(doc(&id, &name))),
        (arb_id(), arb_name()).prop_map(|(id, name)| ChangeEvent::Modified(doc(&id, &name))),
        arb_id().prop_map(ChangeEvent::Removed),
    ]
}

fn arb_events() -> impl Strategy<Value = Vec<ChangeEvent<Document>>> {
    prop::collection::vec(arb_event(), 0..40)
}

/// Added for the first sighting of an id, Modified afterwards.
fn arb_upserts() -> impl Strategy<Value = Vec<ChangeEvent<Document>>> {
    prop::collection::vec((arb_id(), arb_name()), 0..40).prop_map(|pairs| {
        let mut seen = Vec::new();
        pairs
            .into_iter()
            .map(|(id, name)| {
                if seen.contains(&id) {
                    ChangeEvent::Modified(doc(&id, &name))
                } else {
                    seen.push(id.clone());
                    ChangeEvent::Added(doc(&id, &name))
                }
            })
            .collect()
    })
}

fn ids(store: &ProjectionStore<Document>) -> Vec<String> {
    store.iter().map(|d| d.id.clone()).collect()
}

proptest! {
    #[test]
    fn prop_added_keeps_distinct_ids_in_first_seen_order(
        adds in prop::collection::vec(arb_id(), 0..40)
    ) {
        let store = ProjectionStore::replay(
            adds.iter().map(|id| ChangeEvent::Added(doc(id, "A"))),
        );

        let mut expected: Vec<String> = Vec::new();
        for id in &adds {
            if !expected.contains(id) {
                expected.push(id.clone());
            }
        }
        prop_assert_eq!(store.len(), expected.len());
        prop_assert_eq!(ids(&store), expected);
    }

    #[test]
    fn prop_duplicate_added_is_idempotent(
        events in arb_events(),
        id in arb_id(),
        name in arb_name(),
    ) {
        let mut once = ProjectionStore::replay(events.clone());
        once.apply(ChangeEvent::Added(doc(&id, &name)));

        let mut twice = ProjectionStore::replay(events);
        twice.apply(ChangeEvent::Added(doc(&id, &name)));
        let outcome = twice.apply(ChangeEvent::Added(doc(&id, &name)));

        prop_assert!(!outcome.changed());
        prop_assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn prop_every_event_is_idempotent(events in arb_events(), event in arb_event()) {
        let mut once = ProjectionStore::replay(events.clone());
        once.apply(event.clone());

        let mut twice = ProjectionStore::replay(events);
        twice.apply(event.clone());
        twice.apply(event);

        prop_assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn prop_replay_is_deterministic(events in arb_events()) {
        let first = ProjectionStore::replay(events.clone());
        let second = ProjectionStore::replay(events);
        prop_assert_eq!(first.snapshot(), second.snapshot());
    }

    #[test]
    fn prop_replaying_upsert_prefix_twice_changes_nothing(
        events in arb_upserts(),
        cut in any::<prop::sample::Index>(),
    ) {
        let prefix = &events[..cut.index(events.len() + 1)];

        let mut store = ProjectionStore::replay(prefix.to_vec());
        let before = store.snapshot();
        store.apply_all(prefix.to_vec());

        prop_assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn prop_redelivered_snapshot_changes_nothing(events in arb_events()) {
        let mut store = ProjectionStore::replay(events);
        let before = store.snapshot();

        // A reconnecting source re-sends current contents as additions
        let changed = store.apply_all(before.iter().cloned().map(ChangeEvent::Added));

        prop_assert_eq!(changed, 0);
        prop_assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn prop_clear_always_empties(events in arb_events()) {
        let mut store = ProjectionStore::replay(events);
        store.clear();
        prop_assert!(store.is_empty());
        prop_assert!(store.snapshot().is_empty());
    }
}
