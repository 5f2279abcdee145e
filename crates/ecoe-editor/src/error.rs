//! Editor error types.
//!
//! Every failure is terminal for the single action that caused it; the
//! session is left as it was before the action and recovery needs a new,
//! explicit action.

use ecoe_client::RequestError;
use ecoe_model::{IntegrityError, OptionId, QblockId, QuestionId, StationId, ValidationError};
use thiserror::Error;

/// Errors raised by editor operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EditorError {
    /// A required field is missing; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A fetch, create, update or delete call failed; cache state is untouched.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Fetched data is malformed; assembly aborted.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// The exam has no stations to browse.
    #[error("exam has no stations")]
    NoStations,

    /// The requested station is not among the exam's stations.
    #[error("station {0} not found")]
    StationNotFound(StationId),

    /// No tree has been assembled yet.
    #[error("no station tree has been loaded")]
    NotLoaded,

    #[error("qblock {0} is not part of the loaded tree")]
    UnknownQblock(QblockId),

    #[error("question {0} is not part of the loaded tree")]
    UnknownQuestion(QuestionId),

    #[error("option {option} is not part of question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },

    /// The row has no staging record in the edit cache.
    #[error("row {0} has no staging record")]
    RowNotStaged(u64),

    /// The row exists only locally and cannot take part in a server request.
    #[error("row {0} has not been saved yet")]
    NotPersisted(u64),

    /// The option is already first or last and cannot move further.
    #[error("option {0} has no neighbour in that direction")]
    NoAdjacentOption(OptionId),
}

impl EditorError {
    /// Returns a user-friendly error message suitable for display.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => format!("Please fill in the `{}` field.", err.field()),
            Self::Request(err) => err.user_message().to_string(),
            Self::Integrity(_) => {
                "The exam data is inconsistent and cannot be displayed.".to_string()
            }
            Self::NoStations => "This exam has no stations yet.".to_string(),
            Self::StationNotFound(_) => "The selected station does not exist.".to_string(),
            Self::NotLoaded => "Nothing has been loaded yet.".to_string(),
            Self::UnknownQblock(_)
            | Self::UnknownQuestion(_)
            | Self::UnknownOption { .. }
            | Self::RowNotStaged(_) => "The selected item is no longer available.".to_string(),
            Self::NotPersisted(_) => "Save the item before using this action.".to_string(),
            Self::NoAdjacentOption(_) => "The option cannot move any further.".to_string(),
        }
    }

    /// Whether repeating the same action may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(err) => err.is_retryable(),
            _ => false,
        }
    }
}

/// Result type alias for editor operations.
pub type Result<T> = std::result::Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = EditorError::from(RequestError::Network("refused".to_string()));
        assert!(err.user_message().contains("connection"));
        assert!(err.is_retryable());

        assert!(!EditorError::NoStations.is_retryable());
        assert!(
            EditorError::NoAdjacentOption(OptionId(3))
                .user_message()
                .contains("cannot move")
        );
    }

    #[test]
    fn test_integrity_errors_display_source_message() {
        let err = EditorError::from(IntegrityError::UnknownArea {
            question: QuestionId(4),
            reference: "/api/area/9".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "question 4 references unknown area `/api/area/9`"
        );
    }
}
