//! Answer options of a question.

use serde::{Deserialize, Serialize};

use crate::ids::{OptionId, QuestionId};
use crate::reference::{ResourceKind, ResourceRef};

/// One answer option. Display order within a question is ascending `order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// `None` for rows added locally and not yet saved.
    #[serde(rename = "$uri", default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub id: OptionId,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub points: Option<f64>,
    pub question: ResourceRef,
}

impl QuestionOption {
    /// A blank, unsaved option row of `question`.
    #[must_use]
    pub fn blank(id: OptionId, question: QuestionId) -> Self {
        Self {
            uri: None,
            id,
            order: None,
            label: String::new(),
            points: None,
            question: ResourceRef::to(ResourceKind::Question, question.get()),
        }
    }

    /// Id of the owning question.
    #[must_use]
    pub fn question_id(&self) -> Option<QuestionId> {
        self.question.id_of(ResourceKind::Question).map(QuestionId)
    }

    #[inline]
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.uri.is_some()
    }
}

/// Sort options ascending by order.
///
/// The sort is stable, so options with equal order keep their relative
/// position. Rows without an order (unsaved blanks) go last.
pub fn sort_options(options: &mut [QuestionOption]) {
    options.sort_by_key(|option| (option.order.is_none(), option.order));
}
