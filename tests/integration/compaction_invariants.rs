#![allow(missing_docs)]

use std::sync::Arc;

use proptest::prelude::*;
use relcount::{
    CachedRelationshipCounter, Direction, FallbackRelationshipCounter, MemoryDegreeStore,
    MemoryGraph, NaiveRelationshipCounter, NodeDegreeCache, NodeId, RelationshipCounter,
    RelationshipDescription, RelcountConfig, Relationship, RelationshipId,
};

const PREFIX: &str = "_GA_FRC_";
const HUB: NodeId = NodeId(0);

#[derive(Debug, Clone)]
struct RelShape {
    rel_type: &'static str,
    hub_is_start: bool,
    other: u64,
    colour: Option<i64>,
    size: Option<i64>,
}

fn arb_rel() -> impl Strategy<Value = RelShape> {
    (
        prop_oneof![Just("LIKES"), Just("FOLLOWS")],
        any::<bool>(),
        1u64..=12,
        proptest::option::of(0i64..4),
        proptest::option::of(0i64..3),
    )
        .prop_map(|(rel_type, hub_is_start, other, colour, size)| RelShape {
            rel_type,
            hub_is_start,
            other,
            colour,
            size,
        })
}

fn relationships(specs: &[RelShape]) -> Vec<Relationship> {
    specs
        .iter()
        .enumerate()
        .map(|(idx, spec)| {
            let (start, end) = if spec.hub_is_start {
                (HUB, NodeId(spec.other))
            } else {
                (NodeId(spec.other), HUB)
            };
            let mut rel = Relationship::new(RelationshipId(idx as u64 + 1), start, end, spec.rel_type);
            if let Some(colour) = spec.colour {
                rel = rel.with_property("colour", colour);
            }
            if let Some(size) = spec.size {
                rel = rel.with_property("size", size);
            }
            rel
        })
        .collect()
}

fn setup(threshold: usize) -> (MemoryDegreeStore, Arc<MemoryGraph>, NodeDegreeCache) {
    let store = MemoryDegreeStore::new();
    let cache = NodeDegreeCache::new(RelcountConfig::new(Arc::new(store.clone())).with_threshold(threshold));
    (store, Arc::new(MemoryGraph::new()), cache)
}

fn hub_total(store: &MemoryDegreeStore) -> u64 {
    store.sorted_degrees(HUB, PREFIX).iter().map(|(_, count)| count).sum()
}

fn queries() -> Vec<RelationshipDescription> {
    let mut queries = Vec::new();
    for rel_type in ["LIKES", "FOLLOWS"] {
        for direction in [Direction::Outgoing, Direction::Incoming, Direction::Both] {
            queries.push(RelationshipDescription::wildcard(rel_type, direction).unwrap());
        }
    }
    queries
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_compaction_preserves_totals_and_bounds_entries(
        specs in prop::collection::vec(arb_rel(), 1..60),
        threshold in 4usize..8,
    ) {
        let (store, graph, cache) = setup(threshold);
        for (seen, rel) in relationships(&specs).into_iter().enumerate() {
            graph.insert(rel.clone()).unwrap();
            let mut session = cache.begin();
            session.relationship_created(&rel).unwrap();
            session.commit().unwrap();

            prop_assert_eq!(hub_total(&store), seen as u64 + 1);
            prop_assert!(store.sorted_degrees(HUB, PREFIX).len() <= threshold);
        }

        let config = cache.config().clone();
        let cached = CachedRelationshipCounter::new(config.clone());
        let naive = NaiveRelationshipCounter::new(graph.clone(), config.clone());
        let fallback = FallbackRelationshipCounter::new(graph.clone(), config);
        for query in queries() {
            let expected = naive.count(HUB, &query).unwrap();
            prop_assert_eq!(cached.count(HUB, &query).unwrap(), expected);
            prop_assert_eq!(fallback.count(HUB, &query).unwrap(), expected);
            let refined = query.with("colour", relcount::Predicate::equal_to(1i64));
            prop_assert_eq!(fallback.count(HUB, &refined).unwrap(), naive.count(HUB, &refined).unwrap());
        }
    }

    #[test]
    fn prop_deleting_everything_empties_the_cache(
        (specs, order) in prop::collection::vec(arb_rel(), 1..40).prop_flat_map(|specs| {
            let order: Vec<usize> = (0..specs.len()).collect();
            (Just(specs), Just(order).prop_shuffle())
        }),
        threshold in 1usize..8,
    ) {
        let (store, graph, cache) = setup(threshold);
        let rels = relationships(&specs);
        for rel in &rels {
            graph.insert(rel.clone()).unwrap();
            let mut session = cache.begin();
            session.relationship_created(rel).unwrap();
            session.commit().unwrap();
        }

        for idx in order {
            let rel = graph.remove(rels[idx].id).unwrap();
            let mut session = cache.begin();
            let deleted = session.relationship_deleted(&rel);
            prop_assert!(deleted.is_ok(), "{:?}", deleted);
            session.commit().unwrap();
            prop_assert_eq!(hub_total(&store), graph.len() as u64);
        }
        prop_assert!(store.nodes(PREFIX).is_empty());
    }

    #[test]
    fn prop_cleared_caches_need_initialization_until_rebuilt(
        specs in prop::collection::vec(arb_rel(), 1..30),
        threshold in 1usize..8,
    ) {
        let (store, graph, cache) = setup(threshold);
        let rels = relationships(&specs);
        for rel in &rels {
            graph.insert(rel.clone()).unwrap();
            let mut session = cache.begin();
            session.relationship_created(rel).unwrap();
            session.commit().unwrap();
        }

        store.clear(HUB, PREFIX);
        let doomed = graph.remove(rels[0].id).unwrap();
        let mut session = cache.begin();
        let err = session.relationship_deleted(&doomed).unwrap_err();
        prop_assert!(err.needs_initialization());
        drop(session);
        prop_assert_eq!(hub_total(&store), 0);

        cache.rebuild_node(HUB, &*graph).unwrap();
        prop_assert_eq!(hub_total(&store), graph.len() as u64);
    }

    #[test]
    fn prop_rebuild_matches_incremental_caching(
        specs in prop::collection::vec(arb_rel(), 1..40),
    ) {
        let (store, graph, cache) = setup(1_000);
        let mut session = cache.begin();
        for rel in relationships(&specs) {
            graph.insert(rel.clone()).unwrap();
            session.relationship_created(&rel).unwrap();
        }
        session.commit().unwrap();

        let (rebuilt_store, _, rebuilt_cache) = setup(1_000);
        let rebuilt = rebuilt_cache.rebuild(&*graph).unwrap();
        prop_assert_eq!(rebuilt, store.nodes(PREFIX).len());
        prop_assert_eq!(store.nodes(PREFIX), rebuilt_store.nodes(PREFIX));
        for node in store.nodes(PREFIX) {
            prop_assert_eq!(store.sorted_degrees(node, PREFIX), rebuilt_store.sorted_degrees(node, PREFIX));
        }
    }
}
