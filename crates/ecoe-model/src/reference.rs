//! Resource kinds and references.
//!
//! The resource API addresses every record by a URI of the form
//! `/api/<route>/<id>` and links records to each other with reference
//! objects:
//!
//! ```text
//! {"$ref": "/api/area/3"}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every resource URI.
pub const API_PREFIX: &str = "/api";

/// The kinds of resource this model knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// An exam (`ecoe` route).
    Exam,
    Area,
    Station,
    Qblock,
    Question,
    /// An answer option of a question.
    Option,
}

impl ResourceKind {
    /// Route segment used by the resource API.
    #[must_use]
    pub const fn route(self) -> &'static str {
        match self {
            Self::Exam => "ecoe",
            Self::Area => "area",
            Self::Station => "station",
            Self::Qblock => "qblock",
            Self::Question => "question",
            Self::Option => "option",
        }
    }

    /// Canonical URI of the record with the given id.
    #[must_use]
    pub fn uri(self, id: u64) -> String {
        format!("{API_PREFIX}/{}/{id}", self.route())
    }

    /// Resolve a route segment back to a kind.
    #[must_use]
    pub fn from_route(route: &str) -> Option<Self> {
        match route {
            "ecoe" => Some(Self::Exam),
            "area" => Some(Self::Area),
            "station" => Some(Self::Station),
            "qblock" => Some(Self::Qblock),
            "question" => Some(Self::Question),
            "option" => Some(Self::Option),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}

/// A `{"$ref": "/api/<route>/<id>"}` link to another record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "$ref")]
    pub uri: String,
}

impl ResourceRef {
    /// Reference to the record of `kind` with the given id.
    #[must_use]
    pub fn to(kind: ResourceKind, id: u64) -> Self {
        Self { uri: kind.uri(id) }
    }

    /// Kind named by the route segment of the URI, if known.
    #[must_use]
    pub fn kind(&self) -> Option<ResourceKind> {
        let mut segments = self.segments();
        segments.next_back()?;
        segments.next_back().and_then(ResourceKind::from_route)
    }

    /// Trailing numeric id of the URI.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.segments().next_back()?.parse().ok()
    }

    /// Id of the referenced record, provided it is of the expected kind.
    #[must_use]
    pub fn id_of(&self, kind: ResourceKind) -> Option<u64> {
        (self.kind() == Some(kind)).then(|| self.id()).flatten()
    }

    fn segments(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.uri.split('/').filter(|segment| !segment.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_for_kind() {
        assert_eq!(ResourceKind::Qblock.uri(12), "/api/qblock/12");
        assert_eq!(ResourceKind::Exam.uri(1), "/api/ecoe/1");
    }

    #[test]
    fn test_reference_parses_kind_and_id() {
        let reference = ResourceRef::to(ResourceKind::Area, 3);
        assert_eq!(reference.kind(), Some(ResourceKind::Area));
        assert_eq!(reference.id(), Some(3));
        assert_eq!(reference.id_of(ResourceKind::Area), Some(3));
        assert_eq!(reference.id_of(ResourceKind::Station), None);
    }

    #[test]
    fn test_reference_serde_shape() {
        let reference: ResourceRef = serde_json::from_str(r#"{"$ref":"/api/question/9"}"#).unwrap();
        assert_eq!(reference.id_of(ResourceKind::Question), Some(9));
        assert_eq!(
            serde_json::to_string(&reference).unwrap(),
            r#"{"$ref":"/api/question/9"}"#
        );
    }

    #[test]
    fn test_malformed_reference_has_no_id() {
        let reference = ResourceRef {
            uri: "/api/area/".to_string(),
        };
        assert_eq!(reference.id(), None);
    }
}
