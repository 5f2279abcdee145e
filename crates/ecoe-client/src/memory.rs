//! In-memory [`ResourceFetcher`] used by tests.
//!
//! Emulates the resource API closely enough for the editor: records are
//! stored per route, queries are evaluated with [`Query::matches`], ids are
//! assigned on create, numeric ids in bodies are stored as `{"$ref": ...}`
//! for known reference fields, and qblock membership relations
//! (`qblock/<id>/questions`) edit the question's `qblocks` list. Every
//! request is logged and individual requests can be made to fail.

use std::cell::RefCell;
use std::collections::BTreeMap;

use ecoe_model::{ResourceKind, ResourceRef};
use serde_json::{Map, Value, json};

use crate::error::{RequestError, Result};
use crate::fetcher::{Record, ResourceFetcher};
use crate::query::Query;

/// The kind of request a [`LoggedRequest`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Create,
    Update,
    Delete,
}

/// A request seen by the [`MemoryFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedRequest {
    pub operation: Operation,
    /// Route for gets and creates, URI for updates and deletes.
    pub target: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct Failure {
    operation: Operation,
    target: String,
    status: u16,
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<&'static str, Vec<Value>>,
    log: Vec<LoggedRequest>,
    failures: Vec<Failure>,
}

/// Single-threaded in-memory resource store.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    state: RefCell<State>,
}

impl MemoryFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, filling in `$uri` from its id when absent.
    pub fn insert(&self, kind: ResourceKind, record: Value) {
        let mut record = normalize(record);
        if let Some(object) = record.as_object_mut()
            && !object.contains_key("$uri")
            && let Some(id) = object.get("id").and_then(Value::as_u64)
        {
            object.insert("$uri".to_string(), Value::String(kind.uri(id)));
        }
        self.state
            .borrow_mut()
            .tables
            .entry(kind.route())
            .or_default()
            .push(record);
    }

    /// Snapshot of the stored records of `kind`.
    #[must_use]
    pub fn records(&self, kind: ResourceKind) -> Vec<Value> {
        self.state
            .borrow()
            .tables
            .get(kind.route())
            .cloned()
            .unwrap_or_default()
    }

    /// Stored record with the given URI.
    #[must_use]
    pub fn record(&self, uri: &str) -> Option<Value> {
        self.state
            .borrow()
            .tables
            .values()
            .flatten()
            .find(|record| record_uri(record) == Some(uri))
            .cloned()
    }

    /// Make the next matching request fail with `status`.
    ///
    /// A request matches when its operation is equal and its target contains
    /// `target`. Each registered failure fires once.
    pub fn fail_once(&self, operation: Operation, target: impl Into<String>, status: u16) {
        self.state.borrow_mut().failures.push(Failure {
            operation,
            target: target.into(),
            status,
        });
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<LoggedRequest> {
        self.state.borrow().log.clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.borrow().log.len()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    fn begin(&self, operation: Operation, target: &str, body: Option<&Value>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.log.push(LoggedRequest {
            operation,
            target: target.to_string(),
            body: body.cloned(),
        });

        let position = state
            .failures
            .iter()
            .position(|failure| failure.operation == operation && target.contains(&failure.target));
        match position {
            Some(index) => {
                let failure = state.failures.remove(index);
                Err(RequestError::Status {
                    method: method_name(operation),
                    target: target.to_string(),
                    status: failure.status,
                    body: "injected failure".to_string(),
                })
            }
            None => Ok(()),
        }
    }
}

impl ResourceFetcher for MemoryFetcher {
    async fn get_resources(&self, kind: ResourceKind, query: &Query) -> Result<Vec<Record>> {
        self.begin(Operation::Get, kind.route(), None)?;
        let mut records: Vec<Value> = self
            .records(kind)
            .into_iter()
            .filter(|record| query.matches(record))
            .collect();
        records.sort_by(|a, b| query.compare(a, b));
        Ok(records)
    }

    async fn create_resource(&self, route: &str, body: Record) -> Result<Record> {
        self.begin(Operation::Create, route, Some(&body))?;

        if let Some((qblock, relation)) = parse_relation(route) {
            return self.link(qblock, relation, body);
        }

        let kind = ResourceKind::from_route(route.trim_matches('/'))
            .ok_or_else(|| not_found("POST", route))?;
        let mut state = self.state.borrow_mut();
        let table = state.tables.entry(kind.route()).or_default();
        let id = table
            .iter()
            .filter_map(|record| record.get("id").and_then(Value::as_u64))
            .max()
            .unwrap_or(0)
            + 1;

        let mut record = normalize(body);
        if let Some(object) = record.as_object_mut() {
            object.insert("id".to_string(), json!(id));
            object.insert("$uri".to_string(), Value::String(kind.uri(id)));
        }
        table.push(record.clone());
        Ok(record)
    }

    async fn update_resource(&self, uri: &str, body: Record) -> Result<Record> {
        self.begin(Operation::Update, uri, Some(&body))?;
        let mut state = self.state.borrow_mut();
        let record = state
            .tables
            .values_mut()
            .flatten()
            .find(|record| record_uri(record) == Some(uri))
            .ok_or_else(|| not_found("PATCH", uri))?;

        if let (Some(object), Value::Object(changes)) = (record.as_object_mut(), normalize(body)) {
            for (field, value) in changes {
                object.insert(field, value);
            }
        }
        Ok(record.clone())
    }

    async fn delete_resource(&self, uri: &str) -> Result<()> {
        self.begin(Operation::Delete, uri, None)?;

        if let Some((qblock, member)) = parse_relation_member(uri) {
            return self.unlink(qblock, member, uri);
        }

        let mut state = self.state.borrow_mut();
        let removed = state.tables.values_mut().any(|table| {
            let before = table.len();
            table.retain(|record| record_uri(record) != Some(uri));
            table.len() != before
        });
        if removed { Ok(()) } else { Err(not_found("DELETE", uri)) }
    }
}

impl MemoryFetcher {
    fn link(&self, qblock: u64, route: &str, body: Value) -> Result<Record> {
        let member: ResourceRef =
            serde_json::from_value(body.clone()).map_err(|e| RequestError::Decode(e.to_string()))?;
        let mut state = self.state.borrow_mut();
        let question = find_mut(&mut state, &member.uri).ok_or_else(|| not_found("POST", route))?;
        let qblocks = qblocks_of(question, route)?;
        let reference = json!(ResourceRef::to(ResourceKind::Qblock, qblock));
        if !qblocks.contains(&reference) {
            qblocks.push(reference);
        }
        Ok(body)
    }

    fn unlink(&self, qblock: u64, member: u64, uri: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let question = find_mut(&mut state, &ResourceKind::Question.uri(member))
            .ok_or_else(|| not_found("DELETE", uri))?;
        let qblocks = qblocks_of(question, uri)?;
        let reference = json!(ResourceRef::to(ResourceKind::Qblock, qblock));
        let before = qblocks.len();
        qblocks.retain(|item| item != &reference);
        if qblocks.len() == before {
            return Err(not_found("DELETE", uri));
        }
        Ok(())
    }
}

const REFERENCE_FIELDS: [(&str, ResourceKind); 5] = [
    ("ecoe", ResourceKind::Exam),
    ("area", ResourceKind::Area),
    ("station", ResourceKind::Station),
    ("question", ResourceKind::Question),
    ("qblocks", ResourceKind::Qblock),
];

/// Store numeric ids of reference fields as `{"$ref": ...}` objects.
fn normalize(record: Value) -> Value {
    let Value::Object(mut object) = record else {
        return record;
    };
    for (field, kind) in REFERENCE_FIELDS {
        if let Some(value) = object.get_mut(field) {
            *value = as_reference(value.take(), kind);
        }
    }
    Value::Object(object)
}

fn as_reference(value: Value, kind: ResourceKind) -> Value {
    match value {
        Value::Number(number) => match number.as_u64() {
            Some(id) => json!(ResourceRef::to(kind, id)),
            None => Value::Number(number),
        },
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| as_reference(item, kind))
                .collect(),
        ),
        other => other,
    }
}

fn record_uri(record: &Value) -> Option<&str> {
    record.get("$uri").and_then(Value::as_str)
}

fn find_mut<'a>(state: &'a mut State, uri: &str) -> Option<&'a mut Value> {
    state
        .tables
        .values_mut()
        .flatten()
        .find(|record| record_uri(record) == Some(uri))
}

fn qblocks_of<'a>(question: &'a mut Value, uri: &str) -> Result<&'a mut Vec<Value>> {
    question
        .as_object_mut()
        .and_then(|object| {
            object
                .entry("qblocks")
                .or_insert_with(|| Value::Array(Vec::new()))
                .as_array_mut()
        })
        .ok_or_else(|| RequestError::Decode(format!("record behind `{uri}` has no qblocks list")))
}

/// `qblock/<id>/questions` (with or without the `/api` prefix).
fn parse_relation(route: &str) -> Option<(u64, &str)> {
    let segments: Vec<&str> = route
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "api")
        .collect();
    match segments.as_slice() {
        ["qblock", id, "questions"] => Some((id.parse().ok()?, route)),
        _ => None,
    }
}

/// `/api/qblock/<id>/questions/<question id>`.
fn parse_relation_member(uri: &str) -> Option<(u64, u64)> {
    let segments: Vec<&str> = uri
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "api")
        .collect();
    match segments.as_slice() {
        ["qblock", id, "questions", member] => Some((id.parse().ok()?, member.parse().ok()?)),
        _ => None,
    }
}

fn method_name(operation: Operation) -> &'static str {
    match operation {
        Operation::Get => "GET",
        Operation::Create => "POST",
        Operation::Update => "PATCH",
        Operation::Delete => "DELETE",
    }
}

fn not_found(method: &'static str, target: &str) -> RequestError {
    RequestError::Status {
        method,
        target: target.to_string(),
        status: 404,
        body: "not found".to_string(),
    }
}
