//! Structured resource queries.
//!
//! A [`Query`] is a conjunction of predicates plus an optional sort key. It
//! renders to the `where`/`sort` JSON parameters understood by the resource
//! API:
//!
//! ```text
//! {"station": 2}                      equality
//! {"qblocks": {"$contains": 4}}       containment in a collection
//! {"$uri": "/api/qblock/4"}           reference equality
//! {"order": false}                    ascending sort on `order`
//! ```

use ecoe_model::{ResourceKind, ResourceRef};
use serde_json::{Map, Value};

/// One filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals the value. For reference fields the value is the id.
    Equals { field: String, value: Value },
    /// Collection field contains the value.
    Contains { field: String, value: Value },
    /// Record is the one with this URI.
    Uri(String),
}

/// Sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

/// Filter and sort for a resource listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    predicates: Vec<Predicate>,
    sort: Option<SortKey>,
}

impl Query {
    /// An unfiltered query (every record of the kind).
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Equals {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn contains(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Contains {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Restrict to the record of `kind` with the given id.
    #[must_use]
    pub fn uri(mut self, kind: ResourceKind, id: u64) -> Self {
        self.predicates.push(Predicate::Uri(kind.uri(id)));
        self
    }

    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.sort = Some(SortKey {
            field: field.into(),
            descending,
        });
        self
    }

    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    #[must_use]
    pub fn sort(&self) -> Option<&SortKey> {
        self.sort.as_ref()
    }

    /// JSON text of the `where` parameter, or `None` when unfiltered.
    #[must_use]
    pub fn where_clause(&self) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }
        let mut clause = Map::new();
        for predicate in &self.predicates {
            match predicate {
                Predicate::Equals { field, value } => {
                    clause.insert(field.clone(), value.clone());
                }
                Predicate::Contains { field, value } => {
                    let mut contains = Map::new();
                    contains.insert("$contains".to_string(), value.clone());
                    clause.insert(field.clone(), Value::Object(contains));
                }
                Predicate::Uri(uri) => {
                    clause.insert("$uri".to_string(), Value::String(uri.clone()));
                }
            }
        }
        Some(Value::Object(clause).to_string())
    }

    /// JSON text of the `sort` parameter.
    #[must_use]
    pub fn sort_clause(&self) -> Option<String> {
        self.sort.as_ref().map(|key| {
            let mut clause = Map::new();
            clause.insert(key.field.clone(), Value::Bool(key.descending));
            Value::Object(clause).to_string()
        })
    }

    /// Evaluate the predicates against a record locally.
    ///
    /// Reference fields (`{"$ref": ...}`) match a numeric value by their
    /// trailing id, the same way the server interprets them.
    #[must_use]
    pub fn matches(&self, record: &Value) -> bool {
        self.predicates.iter().all(|predicate| match predicate {
            Predicate::Equals { field, value } => record
                .get(field)
                .is_some_and(|actual| value_matches(actual, value)),
            Predicate::Contains { field, value } => record
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|item| value_matches(item, value))),
            Predicate::Uri(uri) => record.get("$uri").and_then(Value::as_str) == Some(uri),
        })
    }

    /// Compare two records by the sort key; equal when no sort is set.
    #[must_use]
    pub fn compare(&self, a: &Value, b: &Value) -> std::cmp::Ordering {
        let Some(key) = &self.sort else {
            return std::cmp::Ordering::Equal;
        };
        let ordering = sort_value(a.get(&key.field)).total_cmp(&sort_value(b.get(&key.field)));
        if key.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

fn value_matches(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (reference_id(actual), expected.as_u64()) {
        (Some(id), Some(expected)) => id == expected,
        _ => false,
    }
}

fn reference_id(value: &Value) -> Option<u64> {
    serde_json::from_value::<ResourceRef>(value.clone())
        .ok()
        .and_then(|reference| reference.id())
}

fn sort_value(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(f64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_where_clause_shapes() {
        assert_eq!(Query::all().where_clause(), None);
        assert_eq!(
            Query::all().equals("ecoe", 1).where_clause().unwrap(),
            r#"{"ecoe":1}"#
        );
        assert_eq!(
            Query::all().contains("qblocks", 4).where_clause().unwrap(),
            r#"{"qblocks":{"$contains":4}}"#
        );
        assert_eq!(
            Query::all()
                .uri(ResourceKind::Qblock, 4)
                .where_clause()
                .unwrap(),
            r#"{"$uri":"/api/qblock/4"}"#
        );
    }

    #[test]
    fn test_sort_clause() {
        let query = Query::all().sort_by("order", false);
        assert_eq!(query.sort_clause().unwrap(), r#"{"order":false}"#);
    }

    #[test]
    fn test_matches_reference_fields_by_id() {
        let record = json!({
            "$uri": "/api/question/5",
            "id": 5,
            "area": {"$ref": "/api/area/2"},
            "qblocks": [{"$ref": "/api/qblock/4"}, {"$ref": "/api/qblock/7"}]
        });

        assert!(Query::all().equals("area", 2).matches(&record));
        assert!(!Query::all().equals("area", 3).matches(&record));
        assert!(Query::all().contains("qblocks", 7).matches(&record));
        assert!(!Query::all().contains("qblocks", 8).matches(&record));
        assert!(
            Query::all()
                .uri(ResourceKind::Question, 5)
                .matches(&record)
        );
    }

    #[test]
    fn test_compare_by_sort_key() {
        let query = Query::all().sort_by("order", false);
        let first = json!({"order": 1});
        let second = json!({"order": 2});
        assert!(query.compare(&first, &second).is_lt());
        assert!(Query::all().compare(&first, &second).is_eq());
    }
}
