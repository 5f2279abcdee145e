//! Entity identifiers.
//!
//! Every entity is keyed by a server-assigned integer. Unsaved rows borrow the
//! same id space with locally allocated values until they are persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw numeric value.
            #[inline]
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of an exam (an ECOE).
    ExamId
);
entity_id!(
    /// Identifier of an evaluation area.
    AreaId
);
entity_id!(
    /// Identifier of an examination station.
    StationId
);
entity_id!(
    /// Identifier of a question block.
    QblockId
);
entity_id!(
    /// Identifier of a question.
    QuestionId
);
entity_id!(
    /// Identifier of an answer option.
    OptionId
);
