//! Data model for ECOE exam content.
//!
//! An exam is organized as a tree fetched from a Potion-style resource API:
//! areas and stations belong to an exam, question blocks (qblocks) belong to
//! a station, questions belong to one or more qblocks, and options belong to
//! a question.
//!
//! # Module Organization
//!
//! - [`ids`]: Strongly typed entity identifiers
//! - [`reference`]: Resource kinds, URIs and `{"$ref": ...}` references
//! - [`area`], [`station`], [`qblock`], [`question`], [`option`]: Entities
//! - [`draft`]: Editable staging drafts with validation and reconciliation
//! - [`error`]: Validation and integrity errors

pub mod area;
pub mod draft;
pub mod error;
pub mod ids;
pub mod option;
pub mod qblock;
pub mod question;
pub mod reference;
pub mod station;

pub use area::Area;
pub use draft::{OptionBody, OptionDraft, OrderPatch, QuestionBody, QuestionDraft};
pub use error::{IntegrityError, ValidationError};
pub use ids::{AreaId, ExamId, OptionId, QblockId, QuestionId, StationId};
pub use option::{QuestionOption, sort_options};
pub use qblock::Qblock;
pub use question::{AreaLink, Question, QuestionRecord, QuestionType};
pub use reference::{ResourceKind, ResourceRef};
pub use station::Station;
