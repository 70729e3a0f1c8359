//! Programs, snapshots and payload decoding.
//!
//! A snapshot is built wholesale from one poll payload and never mutated afterwards.
//! Decoding is lenient per node: a malformed program record is logged and skipped so
//! one bad file in a checkpoint never stalls the dashboard.

use std::borrow::Cow;

use hashbrown::{HashMap, HashSet};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fmt;

/// One metric value as reported by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Missing,
}

impl MetricValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => MetricValue::Missing,
            Value::Number(n) => n.as_f64().map_or(MetricValue::Missing, MetricValue::Number),
            Value::String(s) => MetricValue::Text(s.clone()),
            Value::Bool(b) => MetricValue::Text(b.to_string()),
            other => MetricValue::Text(other.to_string()),
        }
    }

    /// The value if it can take part in ranges, sorting and scaling.
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, MetricValue::Missing)
    }

    pub fn display(&self) -> String {
        match self {
            MetricValue::Number(v) => fmt::fixed(*v, 4),
            MetricValue::Text(s) => s.clone(),
            MetricValue::Missing => "null".to_string(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            MetricValue::Number(v) => serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number),
            MetricValue::Text(s) => Value::String(s.clone()),
            MetricValue::Missing => Value::Null,
        }
    }
}

/// Metric name/value pairs in the order the payload listed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics(Vec<(String, MetricValue)>);

impl Metrics {
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, MetricValue)>,
        K: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn numeric(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(MetricValue::as_finite)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub name: String,
    pub text: String,
}

/// One candidate solution; a node of the lineage graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub id: String,
    pub generation: u32,
    pub island: Option<u32>,
    pub parent_id: Option<String>,
    /// `None` when the program was never evaluated.
    pub metrics: Option<Metrics>,
    pub code: Option<String>,
    pub prompts: Vec<Prompt>,
}

impl Program {
    pub fn new(id: impl Into<String>, generation: u32) -> Self {
        Self {
            id: id.into(),
            generation,
            island: None,
            parent_id: None,
            metrics: None,
            code: None,
            prompts: Vec::new(),
        }
    }

    pub fn with_island(mut self, island: u32) -> Self {
        self.island = Some(island);
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics
            .get_or_insert_with(Metrics::default)
            .0
            .push((name.into(), MetricValue::Number(value)));
        self
    }

    pub fn with_metric_value(mut self, name: impl Into<String>, value: MetricValue) -> Self {
        self.metrics
            .get_or_insert_with(Metrics::default)
            .0
            .push((name.into(), value));
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_prompt(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.prompts.push(Prompt {
            name: name.into(),
            text: text.into(),
        });
        self
    }

    /// Finite value of `metric`, if this program reports one.
    pub fn metric(&self, metric: &str) -> Option<f64> {
        self.metrics.as_ref().and_then(|m| m.numeric(metric))
    }

    pub fn metric_value(&self, metric: &str) -> Option<&MetricValue> {
        self.metrics.as_ref().and_then(|m| m.get(metric))
    }

    pub fn has_code(&self) -> bool {
        self.code.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    /// Decode one node record. Errors name the offending field.
    pub fn from_json(v: &Value) -> std::result::Result<Self, String> {
        let obj = v.as_object().ok_or("node is not an object")?;

        let id = match obj.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err("missing or empty `id`".to_string()),
        };

        let generation = match obj.get("generation") {
            None | Some(Value::Null) => 0,
            Some(v) => non_negative_int(v).ok_or_else(|| format!("bad `generation` for {id}"))?,
        };

        let island = match obj.get("island") {
            None | Some(Value::Null) => None,
            Some(v) => Some(non_negative_int(v).ok_or_else(|| format!("bad `island` for {id}"))?),
        };

        let parent_id = match obj.get("parent_id") {
            Some(Value::String(s)) if !s.is_empty() && s != "None" => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let metrics = match obj.get("metrics") {
            Some(Value::Object(m)) => Some(Metrics(
                m.iter()
                    .map(|(k, v)| (k.clone(), MetricValue::from_json(v)))
                    .collect(),
            )),
            _ => None,
        };

        let code = match obj.get("code") {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };

        let prompts = match obj.get("prompts") {
            Some(Value::Object(p)) => p
                .iter()
                .map(|(name, v)| Prompt {
                    name: name.clone(),
                    text: match v {
                        Value::String(s) => s.clone(),
                        other => serde_json::to_string_pretty(other).unwrap_or_default(),
                    },
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            id,
            generation,
            island,
            parent_id,
            metrics,
            code,
            prompts,
        })
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".into(), Value::String(self.id.clone()));
        obj.insert("generation".into(), Value::from(self.generation));
        if let Some(island) = self.island {
            obj.insert("island".into(), Value::from(island));
        }
        if let Some(parent) = &self.parent_id {
            obj.insert("parent_id".into(), Value::String(parent.clone()));
        }
        if let Some(metrics) = &self.metrics {
            let m: Map<String, Value> = metrics
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_json()))
                .collect();
            obj.insert("metrics".into(), Value::Object(m));
        }
        if let Some(code) = &self.code {
            obj.insert("code".into(), Value::String(code.clone()));
        }
        if !self.prompts.is_empty() {
            let p: Map<String, Value> = self
                .prompts
                .iter()
                .map(|p| (p.name.clone(), Value::String(p.text.clone())))
                .collect();
            obj.insert("prompts".into(), Value::Object(p));
        }
        Value::Object(obj)
    }
}

fn non_negative_int(v: &Value) -> Option<u32> {
    if let Some(n) = v.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = v.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

/// Parent → child link between two programs of the same snapshot, by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub parent: usize,
    pub child: usize,
}

/// The population as of one poll.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    programs: Vec<Program>,
    archive: HashSet<String>,
    checkpoint_dir: String,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    metric_names: Vec<String>,
    skipped: usize,
}

/// Metric names in the order they first appear across `programs`.
fn first_seen_metric_names(programs: &[Program]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut names = Vec::new();
    for (name, _) in programs.iter().filter_map(|p| p.metrics.as_ref()).flat_map(|m| m.iter()) {
        if seen.insert(name) {
            names.push(name.to_string());
        }
    }
    names
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot; later programs repeating an earlier id are dropped.
    pub fn new<I, S>(programs: Vec<Program>, archive: I, checkpoint_dir: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut snapshot = Self {
            programs: Vec::with_capacity(programs.len()),
            archive: archive.into_iter().map(Into::into).collect(),
            checkpoint_dir: checkpoint_dir.into(),
            ..Self::default()
        };

        for program in programs {
            if snapshot.index.contains_key(&program.id) {
                warn!("Skipping duplicate program id {}", program.id);
                snapshot.skipped += 1;
                continue;
            }
            snapshot
                .index
                .insert(program.id.clone(), snapshot.programs.len());
            snapshot.programs.push(program);
        }

        snapshot.metric_names = first_seen_metric_names(&snapshot.programs);

        snapshot.edges = snapshot
            .programs
            .iter()
            .enumerate()
            .filter_map(|(child, p)| {
                let parent = *snapshot.index.get(p.parent_id.as_deref()?)?;
                (parent != child).then_some(Edge { parent, child })
            })
            .collect();

        snapshot
    }

    /// Decode a poll payload: `{ nodes, archive, checkpoint_dir }`.
    pub fn from_payload(raw: &str) -> Result<Self> {
        let cleaned = sanitize_non_finite(raw);
        let root: Value = serde_json::from_str(&cleaned)?;
        let obj = root.as_object().ok_or_else(|| Error::PayloadShape {
            field: "payload",
            reason: "expected a JSON object".to_string(),
        })?;

        let nodes = match obj.get("nodes") {
            None | Some(Value::Null) => &[][..],
            Some(Value::Array(nodes)) => nodes.as_slice(),
            Some(_) => {
                return Err(Error::PayloadShape {
                    field: "nodes",
                    reason: "expected an array".to_string(),
                })
            }
        };

        let mut skipped = 0;
        let programs: Vec<Program> = nodes
            .iter()
            .filter_map(|node| match Program::from_json(node) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Skipping malformed program record: {}", e);
                    skipped += 1;
                    None
                }
            })
            .collect();

        let archive: Vec<String> = match obj.get("archive") {
            Some(Value::Array(ids)) => ids
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        let checkpoint_dir = obj
            .get("checkpoint_dir")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut snapshot = Self::new(programs, archive, checkpoint_dir);
        snapshot.skipped += skipped;
        debug!(
            "Decoded snapshot: {} programs, {} edges, {} skipped",
            snapshot.len(),
            snapshot.edges.len(),
            snapshot.skipped
        );
        Ok(snapshot)
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn program_at(&self, index: usize) -> Option<&Program> {
        self.programs.get(index)
    }

    pub fn get(&self, id: &str) -> Option<&Program> {
        self.index_of(id).map(|i| &self.programs[i])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn archive(&self) -> &HashSet<String> {
        &self.archive
    }

    pub fn in_archive(&self, id: &str) -> bool {
        self.archive.contains(id)
    }

    pub fn checkpoint_dir(&self) -> &str {
        &self.checkpoint_dir
    }

    /// Every metric name reported by any program, in first-seen order.
    pub fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    pub fn has_metric(&self, name: &str) -> bool {
        self.metric_names.iter().any(|m| m == name)
    }

    /// Records dropped while decoding (malformed or duplicate).
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn max_generation(&self) -> u32 {
        self.programs.iter().map(|p| p.generation).max().unwrap_or(0)
    }

    /// Parent of `id`, if the parent is part of this snapshot.
    pub fn parent_of(&self, id: &str) -> Option<&Program> {
        self.get(self.get(id)?.parent_id.as_deref()?)
    }

    /// `id` followed by its ancestors, nearest first. Stops at a missing parent or a cycle.
    pub fn lineage(&self, id: &str) -> Vec<&Program> {
        let mut chain = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut cursor = self.get(id);
        while let Some(p) = cursor {
            if !visited.insert(p.id.as_str()) {
                break;
            }
            chain.push(p);
            cursor = p.parent_id.as_deref().and_then(|pid| self.get(pid));
        }
        chain
    }

    /// Canonical JSON form; archive ids are sorted so equal content serializes equally.
    pub fn to_json(&self) -> Value {
        let mut archive: Vec<&String> = self.archive.iter().collect();
        archive.sort();
        let mut obj = Map::new();
        obj.insert(
            "nodes".into(),
            Value::Array(self.programs.iter().map(Program::to_json).collect()),
        );
        obj.insert(
            "archive".into(),
            Value::Array(archive.into_iter().map(|a| Value::String(a.clone())).collect()),
        );
        obj.insert(
            "checkpoint_dir".into(),
            Value::String(self.checkpoint_dir.clone()),
        );
        Value::Object(obj)
    }
}

/// Rewrite the bare `NaN`, `Infinity` and `-Infinity` tokens Python's encoder emits into
/// `null`, leaving string literals untouched.
pub fn sanitize_non_finite(raw: &str) -> Cow<'_, str> {
    const TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

    let bytes = raw.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if b == b'"' {
            in_string = true;
            i += 1;
            continue;
        }
        if let Some(tok) = TOKENS.iter().find(|t| bytes[i..].starts_with(t.as_bytes())) {
            let buf = out.get_or_insert_with(|| String::with_capacity(raw.len()));
            buf.push_str(&raw[copied..i]);
            buf.push_str("null");
            i += tok.len();
            copied = i;
            continue;
        }
        i += 1;
    }

    match out {
        None => Cow::Borrowed(raw),
        Some(mut buf) => {
            buf.push_str(&raw[copied..]);
            Cow::Owned(buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_exists_only_for_present_parents() {
        let s = Snapshot::new(
            vec![
                Program::new("a", 0),
                Program::new("b", 1).with_parent("a"),
            ],
            Vec::<String>::new(),
            "",
        );
        assert_eq!(s.edges(), &[Edge { parent: 0, child: 1 }]);

        // "a" disappears in a later poll: the edge goes with it.
        let later = Snapshot::new(
            vec![Program::new("b", 1).with_parent("a")],
            Vec::<String>::new(),
            "",
        );
        assert!(later.edges().is_empty());
        assert!(later.parent_of("b").is_none());
    }

    #[test]
    fn metric_names_are_unique_in_first_seen_order() {
        let s = Snapshot::new(
            vec![
                Program::new("a", 0).with_metric("loss", 0.3),
                Program::new("b", 1).with_metric("accuracy", 0.8).with_metric("loss", 0.2),
                Program::new("c", 2).with_metric("loss", 0.1),
            ],
            ["b"],
            "",
        );
        assert_eq!(s.metric_names(), &["loss", "accuracy"]);
        assert!(s.has_metric("accuracy"));
    }

    #[test]
    fn payload_decodes_nodes_archive_and_label() {
        let raw = r#"{
            "nodes": [
                {"id": "a", "generation": 0, "island": 1, "parent_id": null,
                 "metrics": {"score": 0.5, "error": null}, "code": "print(1)"},
                {"id": "b", "generation": 2, "island": 0, "parent_id": "a",
                 "metrics": {"score": NaN, "runtime": 3},
                 "prompts": {"diff_user": {"system": "s", "user": "u"}}}
            ],
            "edges": [{"source": "zzz", "target": "b"}],
            "archive": ["b"],
            "checkpoint_dir": "out/checkpoint_5"
        }"#;
        let s = Snapshot::from_payload(raw).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.checkpoint_dir(), "out/checkpoint_5");
        assert!(s.in_archive("b"));
        assert_eq!(s.edges().len(), 1);
        assert_eq!(s.metric_names(), &["score", "error", "runtime"]);

        let b = s.get("b").unwrap();
        assert_eq!(b.metric("score"), None);
        assert_eq!(b.metric("runtime"), Some(3.0));
        assert_eq!(b.prompts[0].name, "diff_user");
        assert!(b.prompts[0].text.contains("\"system\""));
    }

    #[test]
    fn malformed_and_duplicate_nodes_are_skipped() {
        let raw = r#"{"nodes": [
            {"generation": 1},
            {"id": "a", "generation": -3},
            {"id": "b"},
            {"id": "b", "generation": 4},
            "not a node"
        ]}"#;
        let s = Snapshot::from_payload(raw).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s.get("b").unwrap().generation, 0);
        assert_eq!(s.skipped(), 4);
        assert_eq!(s.checkpoint_dir(), "");
    }

    #[test]
    fn payload_shape_errors() {
        assert!(matches!(
            Snapshot::from_payload("[1, 2]"),
            Err(Error::PayloadShape { field: "payload", .. })
        ));
        assert!(matches!(
            Snapshot::from_payload(r#"{"nodes": 3}"#),
            Err(Error::PayloadShape { field: "nodes", .. })
        ));
        assert!(matches!(Snapshot::from_payload("{"), Err(Error::Payload(_))));
    }

    #[test]
    fn none_parent_is_absent() {
        let raw = r#"{"nodes": [{"id": "x", "parent_id": "None"}, {"id": "y", "parent_id": ""}]}"#;
        let s = Snapshot::from_payload(raw).unwrap();
        assert!(s.programs().iter().all(|p| p.parent_id.is_none()));
    }

    #[test]
    fn sanitizer_leaves_strings_alone() {
        let raw = r#"{"a": NaN, "b": "NaN and Infinity", "c": [-Infinity, Infinity], "d": "q\"NaN"}"#;
        let cleaned = sanitize_non_finite(raw);
        assert_eq!(
            cleaned,
            r#"{"a": null, "b": "NaN and Infinity", "c": [null, null], "d": "q\"NaN"}"#
        );
        assert!(matches!(sanitize_non_finite("{\"x\": 1}"), Cow::Borrowed(_)));
    }

    #[test]
    fn lineage_walks_to_root_and_survives_cycles() {
        let s = Snapshot::new(
            vec![
                Program::new("root", 0),
                Program::new("mid", 1).with_parent("root"),
                Program::new("leaf", 2).with_parent("mid"),
                Program::new("p", 3).with_parent("q"),
                Program::new("q", 3).with_parent("p"),
            ],
            Vec::<String>::new(),
            "",
        );
        let ids: Vec<&str> = s.lineage("leaf").iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["leaf", "mid", "root"]);
        assert_eq!(s.lineage("p").len(), 2);
        assert!(s.lineage("nope").is_empty());
    }

    #[test]
    fn canonical_json_ignores_archive_order() {
        let a = Snapshot::new(vec![Program::new("x", 0)], ["b", "a"], "c");
        let b = Snapshot::new(vec![Program::new("x", 0)], ["a", "b"], "c");
        assert_eq!(a.to_json(), b.to_json());
    }
}
