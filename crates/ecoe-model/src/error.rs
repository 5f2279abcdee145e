//! Model-level error types.

use thiserror::Error;

use crate::ids::QuestionId;

/// A required field is missing from a staging draft.
///
/// Raised before any request is issued; no cache state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entity} is missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
}

impl ValidationError {
    pub(crate) const fn missing(entity: &'static str, field: &'static str) -> Self {
        Self::MissingField { entity, field }
    }

    /// Name of the missing field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field, .. } => field,
        }
    }
}

/// Fetched data does not form a well-linked tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// A question references an area that was not among the fetched areas.
    #[error("question {question} references unknown area `{reference}`")]
    UnknownArea {
        question: QuestionId,
        reference: String,
    },

    /// A reference could not be parsed into a record of the expected kind.
    #[error("malformed {expected} reference `{uri}`")]
    MalformedReference { expected: &'static str, uri: String },
}
