//! Evaluation areas.

use serde::{Deserialize, Serialize};

use crate::ids::AreaId;
use crate::reference::{ResourceKind, ResourceRef};

/// An evaluation area of an exam. Questions reference exactly one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    #[serde(rename = "$uri")]
    pub uri: String,
    pub id: AreaId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Area {
    /// Whether `reference` points at this area.
    #[must_use]
    pub fn is_referenced_by(&self, reference: &ResourceRef) -> bool {
        reference.uri == self.uri || reference.id_of(ResourceKind::Area) == Some(self.id.get())
    }
}
