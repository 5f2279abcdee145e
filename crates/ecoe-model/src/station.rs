//! Examination stations.

use serde::{Deserialize, Serialize};

use crate::ids::StationId;

/// An examination post. A browsing session is rooted at exactly one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "$uri")]
    pub uri: String,
    pub id: StationId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}
