use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{MemoryDegreeStore, NodeDegreeCache};
use crate::config::RelcountSettings;
use crate::count::{FallbackRelationshipCounter, RelationshipCounter};
use crate::description::{Direction, Predicate, RelationshipDescription};
use crate::error::RelcountError;
use crate::graph::{MemoryGraph, Relationship};
use crate::types::{NodeId, PropValue, RelationshipId};

/// Number of events applied per unit of work when none is given.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Error type for CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// CSV parsing error.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Malformed JSON properties.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Cache error.
    #[error(transparent)]
    Relcount(#[from] RelcountError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}

/// Options of a replay run.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// CSV file with `op,id,start,end,type,props` columns.
    pub events: PathBuf,
    /// Events applied per unit of work.
    pub batch: usize,
    /// Descriptions counted on every node after the replay.
    pub queries: Vec<RelationshipDescription>,
}

/// One cached degree in a report.
#[derive(Debug, Clone, Serialize)]
pub struct DegreeEntry {
    /// Rendered description.
    pub description: String,
    /// Cached count.
    pub count: u64,
}

/// Cached degrees of one node in a report.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDegrees {
    /// Node identity.
    pub node: u64,
    /// Cached degrees in description order.
    pub degrees: Vec<DegreeEntry>,
}

/// Result of one query on one node.
#[derive(Debug, Clone, Serialize)]
pub struct QueryCount {
    /// Node identity.
    pub node: u64,
    /// Rendered query description.
    pub query: String,
    /// Counted total.
    pub count: u64,
}

/// Summary of a replay run.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Events applied.
    pub events: u64,
    /// Units of work committed.
    pub batches: u64,
    /// Cached degrees of every node holding any.
    pub nodes: Vec<NodeDegrees>,
    /// Query results.
    pub counts: Vec<QueryCount>,
}

enum Event {
    Create(Relationship),
    Delete(RelationshipId),
    Update(RelationshipId, Map<String, Value>),
}

/// Replays relationship events into an in-memory cache and reports the
/// resulting degrees.
pub fn run_replay(cfg: &ReplayConfig, settings: RelcountSettings) -> Result<ReplayReport, CliError> {
    if cfg.batch == 0 {
        return Err(CliError::Message("--batch must be positive".into()));
    }
    let store = MemoryDegreeStore::new();
    let config = settings.into_config(Arc::new(store.clone()))?;
    let prefix = config.prefix.clone();
    let cache = NodeDegreeCache::new(config.clone());
    let graph = Arc::new(MemoryGraph::new());

    let mut reader = ReaderBuilder::new().flexible(true).from_path(&cfg.events)?;
    let headers = reader.headers()?.clone();
    let columns = EventColumns::resolve(&headers)?;

    let mut events = 0u64;
    let mut batches = 0u64;
    let mut session = cache.begin();
    let mut pending = 0usize;
    for record in reader.records() {
        let record = record?;
        match columns.parse(&record)? {
            Event::Create(relationship) => {
                graph.insert(relationship.clone())?;
                session.relationship_created(&relationship)?;
            }
            Event::Delete(id) => {
                let relationship = graph
                    .remove(id)
                    .ok_or_else(|| CliError::Message(format!("delete of unknown relationship {id}")))?;
                session.relationship_deleted(&relationship)?;
            }
            Event::Update(id, props) => {
                let previous = graph
                    .get(id)
                    .ok_or_else(|| CliError::Message(format!("update of unknown relationship {id}")))?;
                let mut current = previous.clone();
                current.properties = convert_props(&props)?;
                graph.replace(current.clone());
                session.relationship_changed(&previous, &current)?;
            }
        }
        events += 1;
        pending += 1;
        if pending == cfg.batch {
            session.commit()?;
            batches += 1;
            pending = 0;
            session = cache.begin();
        }
    }
    if pending > 0 {
        session.commit()?;
        batches += 1;
    }
    info!(events, batches, "relcount.replay.done");

    let nodes: Vec<NodeDegrees> = store
        .nodes(&prefix)
        .into_iter()
        .map(|node| NodeDegrees {
            node: node.0,
            degrees: store
                .sorted_degrees(node, &prefix)
                .into_iter()
                .map(|(description, count)| DegreeEntry {
                    description: description.to_string(),
                    count,
                })
                .collect(),
        })
        .collect();

    let counter = FallbackRelationshipCounter::new(graph, config);
    let mut counts = Vec::new();
    for query in &cfg.queries {
        for node in &nodes {
            let count = counter.count(NodeId(node.node), query)?;
            counts.push(QueryCount {
                node: node.node,
                query: query.to_string(),
                count,
            });
        }
    }

    Ok(ReplayReport {
        events,
        batches,
        nodes,
        counts,
    })
}

/// Parses `TYPE:DIR[:k=v,...]` into a wildcard description.
pub fn parse_query(raw: &str) -> Result<RelationshipDescription, CliError> {
    let mut parts = raw.splitn(3, ':');
    let rel_type = parts.next().map(str::trim).unwrap_or_default();
    let direction = parts
        .next()
        .map(str::trim)
        .ok_or_else(|| CliError::Message(format!("query '{raw}' is missing a direction")))?;
    let direction = Direction::parse(direction)
        .ok_or_else(|| CliError::Message(format!("unknown direction '{direction}' in query '{raw}'")))?;
    let mut description = RelationshipDescription::wildcard(rel_type, direction)?;
    if let Some(constraints) = parts.next() {
        for pair in constraints.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| CliError::Message(format!("expected key=value, got '{pair}'")))?;
            description = description.with(key.trim(), parse_predicate(value.trim())?);
        }
    }
    Ok(description)
}

struct EventColumns {
    op: usize,
    id: usize,
    start: Option<usize>,
    end: Option<usize>,
    rel_type: Option<usize>,
    props: Option<usize>,
}

impl EventColumns {
    fn resolve(headers: &StringRecord) -> Result<Self, CliError> {
        Ok(Self {
            op: find_column(headers, "op")?,
            id: find_column(headers, "id")?,
            start: find_column(headers, "start").ok(),
            end: find_column(headers, "end").ok(),
            rel_type: find_column(headers, "type").ok(),
            props: find_column(headers, "props").ok(),
        })
    }

    fn parse(&self, record: &StringRecord) -> Result<Event, CliError> {
        let op = get_required(record, self.op, "op")?;
        let id = RelationshipId(parse_u64(get_required(record, self.id, "id")?, "id")?);
        match op.to_ascii_lowercase().as_str() {
            "create" => {
                let start = self.required(record, self.start, "start")?;
                let end = self.required(record, self.end, "end")?;
                let rel_type = self.required(record, self.rel_type, "type")?;
                let mut relationship = Relationship::new(
                    id,
                    NodeId(parse_u64(start, "start")?),
                    NodeId(parse_u64(end, "end")?),
                    rel_type,
                );
                relationship.properties = convert_props(&self.props(record)?)?;
                Ok(Event::Create(relationship))
            }
            "delete" => Ok(Event::Delete(id)),
            "update" => Ok(Event::Update(id, self.props(record)?)),
            other => Err(CliError::Message(format!("unknown op '{other}'"))),
        }
    }

    fn required<'a>(
        &self,
        record: &'a StringRecord,
        idx: Option<usize>,
        name: &str,
    ) -> Result<&'a str, CliError> {
        let idx = idx.ok_or_else(|| CliError::Message(format!("column '{name}' not found")))?;
        get_required(record, idx, name)
    }

    fn props(&self, record: &StringRecord) -> Result<Map<String, Value>, CliError> {
        let raw = self
            .props
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .unwrap_or_default();
        if raw.is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(raw)?)
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, CliError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| CliError::Message(format!("column '{}' not found", name)))
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, CliError> {
    record
        .get(idx)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CliError::Message(format!("missing value for column '{}'", name)))
}

fn parse_u64(raw: &str, name: &str) -> Result<u64, CliError> {
    raw.parse()
        .map_err(|_| CliError::Message(format!("column '{name}' expects an unsigned integer, got '{raw}'")))
}

fn convert_props(props: &Map<String, Value>) -> Result<BTreeMap<String, PropValue>, CliError> {
    let mut converted = BTreeMap::new();
    for (key, value) in props {
        if value.is_null() {
            continue;
        }
        converted.insert(key.clone(), value_to_prop_value(value)?);
    }
    debug!(properties = converted.len(), "relcount.replay.props");
    Ok(converted)
}

fn parse_predicate(raw: &str) -> Result<Predicate, CliError> {
    match raw.to_ascii_lowercase().as_str() {
        "*" | "any" => Ok(Predicate::Any),
        "undefined" | "undef" => Ok(Predicate::Undefined),
        _ => Ok(Predicate::EqualTo(value_to_prop_value(&parse_value(raw))?)),
    }
}

fn parse_value(raw: &str) -> Value {
    let lower = raw.to_ascii_lowercase();
    if lower == "true" {
        return Value::Bool(true);
    }
    if lower == "false" {
        return Value::Bool(false);
    }
    if let Ok(int_val) = raw.parse::<i64>() {
        return Value::Number(int_val.into());
    }
    if let Ok(float_val) = raw.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(float_val) {
            return Value::Number(num);
        }
    }
    Value::String(raw.to_string())
}

fn value_to_prop_value(value: &Value) -> Result<PropValue, CliError> {
    match value {
        Value::Null => Ok(PropValue::Null),
        Value::Bool(v) => Ok(PropValue::Bool(*v)),
        Value::Number(num) => {
            if let Some(i) = num.as_i64() {
                return Ok(PropValue::Int(i));
            }
            if let Some(f) = num.as_f64() {
                return Ok(PropValue::Float(f));
            }
            Err(CliError::Message("numeric literal out of range".into()))
        }
        Value::String(s) => Ok(PropValue::Str(s.clone())),
        _ => Err(CliError::Message(
            "only bool/int/float/string/null property values are supported".into(),
        )),
    }
}
