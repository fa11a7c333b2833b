// Authenticated caller identity.
//
// Authentication mechanics live in the surrounding application; the engine
// only ever sees an already-authenticated principal.

use serde::{Deserialize, Serialize};

/// An authenticated parent, with the commissioner flag that unlocks
/// forced-pick overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub parent_id: String,
    pub is_commissioner: bool,
}

impl Principal {
    /// A regular parent.
    pub fn parent(id: impl Into<String>) -> Self {
        Principal {
            parent_id: id.into(),
            is_commissioner: false,
        }
    }

    /// A commissioner (privileged; may force-pick for any parent).
    pub fn commissioner(id: impl Into<String>) -> Self {
        Principal {
            parent_id: id.into(),
            is_commissioner: true,
        }
    }
}
