//! Staging drafts for inline row editing.
//!
//! A draft holds the editable field values of one row while it is being
//! edited. Drafts are validated into request bodies before a save, and
//! reconciled field by field against server state after a save or cancel.

use serde::Serialize;

use crate::error::ValidationError;
use crate::ids::{AreaId, QblockId, QuestionId};
use crate::option::QuestionOption;
use crate::question::{Question, QuestionType};

/// Editable fields of a question row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuestionDraft {
    pub order: Option<i64>,
    pub description: String,
    pub reference: String,
    pub question_type: Option<QuestionType>,
    pub area_id: Option<AreaId>,
}

/// Create/update body for a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionBody {
    pub order: i64,
    pub description: String,
    pub reference: String,
    pub question_type: QuestionType,
    pub area: AreaId,
    pub qblocks: Vec<QblockId>,
}

impl QuestionDraft {
    /// Draft mirroring the given question.
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        let mut draft = Self::default();
        draft.reconcile(question);
        draft
    }

    /// Overwrite every field with the server state of `question`.
    pub fn reconcile(&mut self, question: &Question) {
        self.order = question.order;
        self.description.clone_from(&question.description);
        self.reference.clone_from(&question.reference);
        self.question_type = question.question_type;
        self.area_id = question.area.as_ref().map(|area| area.id);
    }

    /// Check required fields and build the request body for `qblock`.
    ///
    /// Description, reference, type and area are required; a missing order
    /// is sent as `0`.
    ///
    /// # Errors
    ///
    /// Returns the first missing required field.
    pub fn validate(&self, qblock: QblockId) -> Result<QuestionBody, ValidationError> {
        const ENTITY: &str = "question";

        if self.description.trim().is_empty() {
            return Err(ValidationError::missing(ENTITY, "description"));
        }
        if self.reference.trim().is_empty() {
            return Err(ValidationError::missing(ENTITY, "reference"));
        }
        let question_type = self
            .question_type
            .ok_or(ValidationError::missing(ENTITY, "question_type"))?;
        let area = self
            .area_id
            .ok_or(ValidationError::missing(ENTITY, "area"))?;

        Ok(QuestionBody {
            order: self.order.unwrap_or_default(),
            description: self.description.clone(),
            reference: self.reference.clone(),
            question_type,
            area,
            qblocks: vec![qblock],
        })
    }
}

/// Editable fields of an option row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptionDraft {
    pub order: Option<i64>,
    pub label: String,
    pub points: Option<f64>,
}

/// Create/update body for an option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionBody {
    pub order: i64,
    pub label: String,
    pub points: f64,
    pub question: QuestionId,
}

/// Body of an order-only update, used when swapping option positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderPatch {
    pub order: Option<i64>,
}

impl OptionDraft {
    #[must_use]
    pub fn from_option(option: &QuestionOption) -> Self {
        let mut draft = Self::default();
        draft.reconcile(option);
        draft
    }

    /// Overwrite every field with the server state of `option`.
    pub fn reconcile(&mut self, option: &QuestionOption) {
        self.order = option.order;
        self.label.clone_from(&option.label);
        self.points = option.points;
    }

    /// Check required fields (order, label, points) and build the body.
    ///
    /// Zero points is a valid value; only an absent value is rejected.
    ///
    /// # Errors
    ///
    /// Returns the first missing required field.
    pub fn validate(&self, question: QuestionId) -> Result<OptionBody, ValidationError> {
        const ENTITY: &str = "option";

        let order = self.order.ok_or(ValidationError::missing(ENTITY, "order"))?;
        if self.label.trim().is_empty() {
            return Err(ValidationError::missing(ENTITY, "label"));
        }
        let points = self
            .points
            .ok_or(ValidationError::missing(ENTITY, "points"))?;

        Ok(OptionBody {
            order,
            label: self.label.clone(),
            points,
            question,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::OptionId;

    fn complete_question_draft() -> QuestionDraft {
        QuestionDraft {
            order: Some(3),
            description: "Washes hands".to_string(),
            reference: "H1".to_string(),
            question_type: Some(QuestionType::OneAnswer),
            area_id: Some(AreaId(2)),
        }
    }

    #[test]
    fn test_question_body_targets_parent_qblock() {
        let body = complete_question_draft().validate(QblockId(4)).unwrap();
        assert_eq!(body.qblocks, vec![QblockId(4)]);
        assert_eq!(body.area, AreaId(2));

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["question_type"], "RB");
        assert_eq!(json["area"], 2);
    }

    #[test]
    fn test_question_missing_fields() {
        let mut draft = complete_question_draft();
        draft.reference = "  ".to_string();
        assert_eq!(draft.validate(QblockId(1)).unwrap_err().field(), "reference");

        let mut draft = complete_question_draft();
        draft.area_id = None;
        assert_eq!(draft.validate(QblockId(1)).unwrap_err().field(), "area");

        let draft = QuestionDraft::default();
        assert_eq!(draft.validate(QblockId(1)).unwrap_err().field(), "description");
    }

    #[test]
    fn test_missing_question_order_defaults_to_zero() {
        let mut draft = complete_question_draft();
        draft.order = None;
        assert_eq!(draft.validate(QblockId(1)).unwrap().order, 0);
    }

    #[test]
    fn test_option_validation() {
        let mut draft = OptionDraft {
            order: Some(1),
            label: "Correct".to_string(),
            points: Some(0.0),
        };
        let body = draft.validate(QuestionId(8)).unwrap();
        assert_eq!(body.points, 0.0);
        assert_eq!(body.question, QuestionId(8));

        draft.points = None;
        assert_eq!(draft.validate(QuestionId(8)).unwrap_err().field(), "points");

        draft.order = None;
        assert_eq!(draft.validate(QuestionId(8)).unwrap_err().field(), "order");
    }

    #[test]
    fn test_reconcile_discards_local_edits() {
        let mut option = QuestionOption::blank(OptionId(2), QuestionId(8));
        option.order = Some(4);
        option.label = "Server".to_string();
        option.points = Some(2.0);

        let mut draft = OptionDraft {
            order: Some(1),
            label: "Local".to_string(),
            points: None,
        };
        draft.reconcile(&option);
        assert_eq!(draft, OptionDraft::from_option(&option));
        assert_eq!(draft.label, "Server");
    }
}
