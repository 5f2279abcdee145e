//! Question blocks.

use serde::{Deserialize, Serialize};

use crate::ids::{QblockId, QuestionId};
use crate::question::Question;
use crate::reference::ResourceRef;

/// A named group of questions scoped to one station.
///
/// `questions` is not part of the wire record; it is filled in by the
/// hierarchy assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qblock {
    #[serde(rename = "$uri")]
    pub uri: String,
    pub id: QblockId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    pub station: ResourceRef,
    #[serde(skip)]
    pub questions: Vec<Question>,
}

impl Qblock {
    /// Question with the given id, if this block holds it.
    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn question_mut(&mut self, id: QuestionId) -> Option<&mut Question> {
        self.questions.iter_mut().find(|question| question.id == id)
    }

    /// Drop the question with the given id. Returns whether one was removed.
    pub fn remove_question(&mut self, id: QuestionId) -> bool {
        let before = self.questions.len();
        self.questions.retain(|question| question.id != id);
        self.questions.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ResourceKind;

    #[test]
    fn test_qblock_wire_record() {
        let qblock: Qblock = serde_json::from_str(
            r#"{"$uri":"/api/qblock/4","id":4,"name":"Anamnesis","station":{"$ref":"/api/station/2"}}"#,
        )
        .unwrap();
        assert_eq!(qblock.id, QblockId(4));
        assert_eq!(qblock.station, ResourceRef::to(ResourceKind::Station, 2));
        assert!(qblock.questions.is_empty());
    }

    #[test]
    fn test_remove_question() {
        let mut qblock: Qblock = serde_json::from_str(
            r#"{"$uri":"/api/qblock/4","id":4,"station":{"$ref":"/api/station/2"}}"#,
        )
        .unwrap();
        qblock.questions.push(Question::blank(QuestionId(50), QblockId(4)));

        assert!(qblock.question(QuestionId(50)).is_some());

        assert!(!qblock.remove_question(QuestionId(7)));
        assert!(qblock.remove_question(QuestionId(50)));
        assert!(qblock.questions.is_empty());
    }
}
