// Player records: the kids (and coaches) parents draft from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a roster entry is a kid on the team or a coach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Kid,
    Coach,
}

impl PlayerKind {
    /// Parse the store's kind string ("kid" / "coach").
    pub fn from_str_kind(s: &str) -> Option<Self> {
        match s {
            "kid" => Some(PlayerKind::Kid),
            "coach" => Some(PlayerKind::Coach),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerKind::Kid => "kid",
            PlayerKind::Coach => "coach",
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A draftable roster member. Never hard-deleted; `is_active` is flipped off
/// instead so historical picks and logs keep their referent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub kind: PlayerKind,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_store_string() {
        for kind in [PlayerKind::Kid, PlayerKind::Coach] {
            assert_eq!(PlayerKind::from_str_kind(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn kind_rejects_unknown_strings() {
        assert_eq!(PlayerKind::from_str_kind("parent"), None);
        assert_eq!(PlayerKind::from_str_kind(""), None);
        assert_eq!(PlayerKind::from_str_kind("Kid"), None);
    }

    #[test]
    fn kind_display() {
        assert_eq!(format!("{}", PlayerKind::Kid), "kid");
        assert_eq!(format!("{}", PlayerKind::Coach), "coach");
    }
}
