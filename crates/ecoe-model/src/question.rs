//! Questions and question types.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::area::Area;
use crate::error::IntegrityError;
use crate::ids::{AreaId, OptionId, QblockId, QuestionId};
use crate::option::{QuestionOption, sort_options};
use crate::reference::{ResourceKind, ResourceRef};

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    /// Radio buttons: exactly one option may be chosen.
    #[serde(rename = "RB")]
    OneAnswer,
    /// Checkboxes: any number of options may be chosen.
    #[serde(rename = "CH")]
    MultiAnswer,
    /// Range slider over numeric values.
    #[serde(rename = "RS")]
    ValueRange,
}

impl QuestionType {
    /// All question types, in presentation order.
    pub const ALL: [Self; 3] = [Self::OneAnswer, Self::MultiAnswer, Self::ValueRange];

    /// Wire code (`RB`, `CH`, `RS`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::OneAnswer => "RB",
            Self::MultiAnswer => "CH",
            Self::ValueRange => "RS",
        }
    }

    /// Label key shown to users.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneAnswer => "ONE_ANSWER",
            Self::MultiAnswer => "MULTI_ANSWER",
            Self::ValueRange => "VALUE_RANGE",
        }
    }

    /// Parse a wire code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A question as returned by the resource API, before area resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "$uri")]
    pub uri: String,
    pub id: QuestionId,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reference: String,
    pub question_type: Option<QuestionType>,
    pub area: ResourceRef,
    #[serde(default)]
    pub qblocks: Vec<ResourceRef>,
}

/// The resolved area a question belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaLink {
    pub id: AreaId,
    pub name: String,
}

impl From<&Area> for AreaLink {
    fn from(area: &Area) -> Self {
        Self {
            id: area.id,
            name: area.name.clone(),
        }
    }
}

/// A question node of the browsing tree.
///
/// Persisted questions carry their resource `uri`; rows added locally and
/// not yet saved have `uri == None` and blank fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub uri: Option<String>,
    pub order: Option<i64>,
    pub description: String,
    pub reference: String,
    pub question_type: Option<QuestionType>,
    pub area: Option<AreaLink>,
    pub qblock_ids: BTreeSet<QblockId>,
    /// Options, loaded lazily and kept sorted ascending by order.
    pub options: Vec<QuestionOption>,
}

impl Question {
    /// Resolve a fetched record against the known areas.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::UnknownArea`] when the referenced area is not
    /// among `areas`, and [`IntegrityError::MalformedReference`] when a qblock
    /// reference carries no id.
    pub fn resolve(record: QuestionRecord, areas: &[Area]) -> Result<Self, IntegrityError> {
        let area = areas
            .iter()
            .find(|area| area.is_referenced_by(&record.area))
            .ok_or_else(|| IntegrityError::UnknownArea {
                question: record.id,
                reference: record.area.uri.clone(),
            })?;

        let qblock_ids = record
            .qblocks
            .iter()
            .map(|reference| {
                reference
                    .id_of(ResourceKind::Qblock)
                    .map(QblockId)
                    .ok_or_else(|| IntegrityError::MalformedReference {
                        expected: "qblock",
                        uri: reference.uri.clone(),
                    })
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            id: record.id,
            uri: Some(record.uri),
            order: record.order,
            description: record.description,
            reference: record.reference,
            question_type: record.question_type,
            area: Some(AreaLink::from(area)),
            qblock_ids,
            options: Vec::new(),
        })
    }

    /// A blank, unsaved question row under `qblock`.
    #[must_use]
    pub fn blank(id: QuestionId, qblock: QblockId) -> Self {
        Self {
            id,
            uri: None,
            order: None,
            description: String::new(),
            reference: String::new(),
            question_type: None,
            area: None,
            qblock_ids: BTreeSet::from([qblock]),
            options: Vec::new(),
        }
    }

    /// Whether the question exists on the server.
    #[inline]
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.uri.is_some()
    }

    /// Resource URI, falling back to the canonical URI for the id.
    #[must_use]
    pub fn resource_uri(&self) -> String {
        self.uri
            .clone()
            .unwrap_or_else(|| ResourceKind::Question.uri(self.id.get()))
    }

    /// Label of the question type, if one is set.
    #[must_use]
    pub fn type_label(&self) -> Option<&'static str> {
        self.question_type.map(QuestionType::label)
    }

    pub fn option(&self, id: OptionId) -> Option<&QuestionOption> {
        self.options.iter().find(|option| option.id == id)
    }

    /// Re-sort options ascending by order.
    pub fn sort_options(&mut self) {
        sort_options(&mut self.options);
    }
}
