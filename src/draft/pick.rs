// Committed draft picks: the append-only log the whole engine re-derives from.

use serde::{Deserialize, Serialize};

/// A single committed draft pick.
///
/// `pick_number` is a per-game sequence starting at 1 with no gaps;
/// `round_number` is derived from the draft order size at commit time and is
/// stored for display, not re-derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPick {
    pub game_id: i64,
    /// The parent the pick is attributed to (not necessarily the caller,
    /// when a commissioner forces a pick).
    pub parent_id: String,
    pub player_id: i64,
    pub round_number: u32,
    pub pick_number: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_pick_serde_round_trip() {
        let pick = DraftPick {
            game_id: 7,
            parent_id: "parent-x".to_string(),
            player_id: 3,
            round_number: 2,
            pick_number: 5,
        };
        let json = serde_json::to_string(&pick).unwrap();
        let back: DraftPick = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pick);
    }
}
