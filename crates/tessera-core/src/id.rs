//! Identifier types

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SHORT_ID_LEN: usize = 12;

/// Generate a short random base-36 identifier
pub fn random_id() -> String {
    let mut value = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(SHORT_ID_LEN);
    for _ in 0..SHORT_ID_LEN {
        out.push(ALPHABET[(value % 36) as usize] as char);
        value /= 36;
    }
    out
}

macro_rules! short_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random identifier
            pub fn new() -> Self {
                Self(random_id())
            }

            /// Get the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

short_id!(
    /// Identity of a table, shared by every column and cell line it owns
    TableId
);
short_id!(
    /// Identity of a row
    RowId
);
short_id!(
    /// Identity of a column; a cell anchors itself to the column carrying its `ColId`
    ColId
);

/// Handle of a node stored in a [`Document`](crate::Document) arena
///
/// The generation is bumped whenever a slot is freed, so handles to removed
/// nodes never alias a node created later in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the arena
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when this handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}
