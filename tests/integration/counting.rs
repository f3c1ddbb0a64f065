#![allow(missing_docs)]

use std::sync::atomic::Ordering;
use std::sync::Arc;

use relcount::config::InclusionRules;
use relcount::metrics::CounterMetrics;
use relcount::{
    CachedRelationshipCounter, Direction, FallbackRelationshipCounter, MemoryDegreeStore,
    MemoryGraph, NaiveRelationshipCounter, NodeDegreeCache, NodeId, Predicate,
    RelationshipCounter, RelationshipDescription, RelcountConfig, RelcountError, Relationship,
    RelationshipId,
};

/// A graph and a cache kept in step, with a compaction threshold of five.
struct Fixture {
    graph: Arc<MemoryGraph>,
    cache: NodeDegreeCache,
    next_id: u64,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(|config| config)
    }

    fn with_config(adjust: impl FnOnce(RelcountConfig) -> RelcountConfig) -> Self {
        let config = adjust(RelcountConfig::new(Arc::new(MemoryDegreeStore::new())).with_threshold(5));
        Self {
            graph: Arc::new(MemoryGraph::new()),
            cache: NodeDegreeCache::new(config),
            next_id: 1,
        }
    }

    fn create(&mut self, start: u64, end: u64, ty: &str, props: &[(&str, &str)]) -> Relationship {
        let rel = props.iter().fold(
            Relationship::new(RelationshipId(self.next_id), NodeId(start), NodeId(end), ty),
            |rel, (k, v)| rel.with_property(*k, *v),
        );
        self.next_id += 1;
        self.graph.insert(rel.clone()).unwrap();
        let mut session = self.cache.begin();
        session.relationship_created(&rel).unwrap();
        session.commit().unwrap();
        rel
    }

    fn delete(&self, rel: &Relationship) {
        self.graph.remove(rel.id).unwrap();
        let mut session = self.cache.begin();
        session.relationship_deleted(rel).unwrap();
        session.commit().unwrap();
    }

    fn change(&self, previous: &Relationship, current: Relationship) {
        self.graph.replace(current.clone());
        let mut session = self.cache.begin();
        session.relationship_changed(previous, &current).unwrap();
        session.commit().unwrap();
    }

    fn cached(&self) -> CachedRelationshipCounter {
        CachedRelationshipCounter::new(self.cache.config().clone())
    }

    fn count(&self, node: u64, description: &RelationshipDescription) -> relcount::Result<u64> {
        self.cached().count(NodeId(node), description)
    }

    fn first_relationships(&mut self) -> Vec<Relationship> {
        vec![
            self.create(1, 2, "test", &[("key1", "value1")]),
            self.create(1, 3, "test", &[("key1", "value2")]),
            self.create(1, 4, "test", &[]),
            self.create(1, 5, "test", &[("key1", "value2")]),
            self.create(6, 1, "test", &[("key2", "value1")]),
        ]
    }

    fn second_relationships(&mut self) -> Vec<Relationship> {
        vec![
            self.create(1, 7, "test", &[("key1", "value3")]),
            self.create(1, 8, "test", &[("key1", "value4")]),
            self.create(1, 9, "test", &[("key1", "value5")]),
            self.create(1, 10, "test", &[("key1", "value6")]),
        ]
    }
}

fn wildcard(ty: &str, dir: Direction) -> RelationshipDescription {
    RelationshipDescription::wildcard(ty, dir).unwrap()
}

fn key1(value: &str) -> RelationshipDescription {
    wildcard("test", Direction::Outgoing).with("key1", Predicate::equal_to(value))
}

fn assert_unable(result: relcount::Result<u64>) {
    assert!(
        matches!(result, Err(RelcountError::UnableToCount(_))),
        "expected UnableToCount, got {result:?}"
    );
}

#[test]
fn relationships_below_threshold_are_counted_one_by_one() {
    let mut fx = Fixture::new();
    fx.first_relationships();

    assert_eq!(fx.count(1, &key1("value1")).unwrap(), 1);
    assert_eq!(fx.count(1, &key1("value2")).unwrap(), 2);
    assert_eq!(fx.count(1, &key1("value3")).unwrap(), 0);
    assert_eq!(fx.count(1, &wildcard("test", Direction::Outgoing)).unwrap(), 4);
    assert_eq!(fx.count(1, &wildcard("test", Direction::Incoming)).unwrap(), 1);
    assert_eq!(
        fx.count(
            1,
            &wildcard("test", Direction::Incoming).with("key2", Predicate::equal_to("value1"))
        )
        .unwrap(),
        1
    );
    assert_eq!(fx.count(1, &wildcard("test", Direction::Both)).unwrap(), 5);
}

#[test]
fn relationships_above_threshold_are_only_counted_in_aggregate() {
    let mut fx = Fixture::new();
    fx.first_relationships();
    fx.second_relationships();

    assert_unable(fx.count(1, &key1("value1")));
    assert_unable(fx.count(1, &key1("value2")));
    assert_unable(fx.count(1, &key1("value3")));
    assert_eq!(fx.count(1, &wildcard("test", Direction::Outgoing)).unwrap(), 8);
    assert_eq!(fx.count(1, &wildcard("test", Direction::Incoming)).unwrap(), 1);
}

#[test]
fn deleting_relationships_decrements_counts() {
    let mut fx = Fixture::new();
    let rels = fx.first_relationships();
    fx.delete(&rels[1]);
    fx.delete(&rels[4]);

    assert_eq!(fx.count(1, &key1("value2")).unwrap(), 1);
    assert_eq!(fx.count(1, &wildcard("test", Direction::Outgoing)).unwrap(), 3);
    assert_eq!(fx.count(1, &wildcard("test", Direction::Incoming)).unwrap(), 0);
    assert_eq!(fx.count(6, &wildcard("test", Direction::Outgoing)).unwrap(), 0);
}

#[test]
fn deleting_after_compaction_decrements_the_generalization() {
    let mut fx = Fixture::new();
    let rels = fx.first_relationships();
    fx.second_relationships();
    fx.delete(&rels[0]);
    fx.delete(&rels[2]);

    assert_eq!(fx.count(1, &wildcard("test", Direction::Outgoing)).unwrap(), 6);
    assert_eq!(fx.count(1, &wildcard("test", Direction::Incoming)).unwrap(), 1);
}

#[test]
fn changing_properties_moves_counts() {
    let mut fx = Fixture::new();
    let rels = fx.first_relationships();
    let changed = rels[0].clone().with_property("key1", "value2");
    fx.change(&rels[0], changed);

    assert_eq!(fx.count(1, &key1("value1")).unwrap(), 0);
    assert_eq!(fx.count(1, &key1("value2")).unwrap(), 3);
    assert_eq!(fx.count(1, &wildcard("test", Direction::Outgoing)).unwrap(), 4);
    assert_eq!(
        fx.count(2, &wildcard("test", Direction::Incoming).with("key1", Predicate::equal_to("value2")))
            .unwrap(),
        1
    );
}

#[test]
fn changing_properties_after_compaction_keeps_totals() {
    let mut fx = Fixture::new();
    let rels = fx.first_relationships();
    fx.second_relationships();
    let changed = rels[0].clone().with_property("key1", "value7");
    fx.change(&rels[0], changed);

    assert_eq!(fx.count(1, &wildcard("test", Direction::Outgoing)).unwrap(), 8);
    assert_eq!(fx.count(1, &wildcard("test", Direction::Incoming)).unwrap(), 1);
}

#[test]
fn inclusion_rules_are_honoured() {
    let mut fx = Fixture::with_config(|config| {
        config.inclusion(Arc::new(InclusionRules::new().exclude_property("key1")))
    });
    fx.first_relationships();

    assert_eq!(fx.count(1, &key1("value1")).unwrap(), 0);
    assert_eq!(fx.count(1, &wildcard("test", Direction::Outgoing)).unwrap(), 4);
    assert_eq!(
        fx.count(1, &wildcard("test", Direction::Outgoing).with("key1", Predicate::Undefined))
            .unwrap(),
        4
    );

    let mut fx = Fixture::with_config(|config| {
        config.inclusion(Arc::new(InclusionRules::new().exclude_type("test")))
    });
    fx.first_relationships();
    assert_eq!(fx.count(1, &wildcard("test", Direction::Both)).unwrap(), 0);
}

#[test]
fn friends_by_level_lose_granularity_as_levels_multiply() {
    let mut fx = Fixture::new();
    let level_of = |fx: &mut Fixture, end: u64, level: &str| {
        let timestamp = (1_700_000_000_000u64 + fx.next_id).to_string();
        fx.create(10, end, "FRIEND_OF", &[("level", level), ("timestamp", timestamp.as_str())]);
    };
    let level = |value: &str| wildcard("FRIEND_OF", Direction::Outgoing).with("level", Predicate::equal_to(value));

    for (end, value) in [(1, "1"), (2, "2"), (3, "3"), (4, "1"), (5, "1"), (6, "1"), (7, "1"), (8, "2"), (9, "2")] {
        level_of(&mut fx, end, value);
    }
    assert_eq!(fx.count(10, &level("1")).unwrap(), 5);
    assert_eq!(fx.count(10, &level("2")).unwrap(), 3);
    assert_eq!(fx.count(10, &level("3")).unwrap(), 1);
    assert_eq!(fx.count(10, &wildcard("FRIEND_OF", Direction::Outgoing)).unwrap(), 9);

    for (end, value) in [(1, "4"), (2, "5"), (3, "6"), (4, "7")] {
        level_of(&mut fx, end, value);
    }
    for value in ["1", "2", "3", "4", "5", "6", "7"] {
        assert_unable(fx.count(10, &level(value)));
    }
    assert_eq!(fx.count(10, &wildcard("FRIEND_OF", Direction::Outgoing)).unwrap(), 13);
}

#[test]
fn fallback_agrees_with_the_naive_counter_after_compaction() {
    let metrics = Arc::new(CounterMetrics::default());
    let mut fx = Fixture::with_config(|config| config.metrics(metrics.clone()));
    fx.first_relationships();
    fx.second_relationships();

    let config = fx.cache.config().clone();
    let fallback = FallbackRelationshipCounter::new(fx.graph.clone(), config.clone());
    let naive = NaiveRelationshipCounter::new(fx.graph.clone(), config);
    for query in [key1("value1"), key1("value2"), key1("value6"), wildcard("test", Direction::Both)] {
        assert_eq!(
            fallback.count(NodeId(1), &query).unwrap(),
            naive.count(NodeId(1), &query).unwrap(),
            "{query}"
        );
    }
    assert_eq!(fallback.count(NodeId(1), &key1("value2")).unwrap(), 2);
    assert_eq!(metrics.fallbacks.load(Ordering::Relaxed), 4);
}
