// Wire protocol between draft clients and the relay. JSON text frames,
// tagged by a `type` field.

use serde::{Deserialize, Serialize};

use crate::draft::commit::PickError;
use crate::draft::pick::DraftPick;
use crate::session::BoardSnapshot;
use crate::sync::ChangeEvent;

/// Messages a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Identify the connection. Must be the first message; everything else
    /// is refused until it arrives.
    Hello {
        parent_id: String,
        #[serde(default)]
        is_commissioner: bool,
    },
    /// Watch a game. Replaces any previous subscription on this connection
    /// and always answers with a full board.
    Subscribe { game_id: i64 },
    /// Attempt a pick. `force_for` is the commissioner-override path.
    CommitPick {
        game_id: i64,
        player_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        force_for: Option<String>,
    },
    /// Commit the best legal pick for whoever is on the clock.
    AutoPick { game_id: i64 },
}

/// Messages the relay sends back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome { parent_id: String },
    /// Full board state; sent on subscribe and after every change signal.
    Board { board: BoardSnapshot },
    PickCommitted { pick: DraftPick },
    PickRejected { reason: RejectReason, detail: String },
    /// A pick landed in the subscribed game (informational; a fresh
    /// `Board` follows).
    PickInserted { event: ChangeEvent },
    Error { detail: String },
}

/// Machine-readable rejection codes, stable across wording changes in
/// the human-readable detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NotYourTurn,
    NoActivePicker,
    NotCommissioner,
    NotInPool,
    Restricted,
    AlreadyDrafted,
    Conflict,
    NoLegalCandidate,
    Unavailable,
}

impl From<&PickError> for RejectReason {
    fn from(e: &PickError) -> Self {
        match e {
            PickError::NotYourTurn => RejectReason::NotYourTurn,
            PickError::NoActivePicker => RejectReason::NoActivePicker,
            PickError::NotCommissioner => RejectReason::NotCommissioner,
            PickError::NotInPool => RejectReason::NotInPool,
            PickError::Restricted => RejectReason::Restricted,
            PickError::AlreadyDrafted => RejectReason::AlreadyDrafted,
            PickError::Conflict => RejectReason::Conflict,
            PickError::Store(_) => RejectReason::Unavailable,
        }
    }
}

impl ServerMessage {
    /// Standard rejection framing for a refused pick.
    pub fn rejected(e: &PickError) -> Self {
        ServerMessage::PickRejected {
            reason: RejectReason::from(e),
            detail: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_parses_with_and_without_commissioner_flag() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"hello","parent_id":"p1"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Hello {
                parent_id: "p1".into(),
                is_commissioner: false
            }
        );

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"hello","parent_id":"admin","is_commissioner":true}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Hello {
                is_commissioner: true,
                ..
            }
        ));
    }

    #[test]
    fn commit_pick_omits_absent_force_for() {
        let msg = ClientMessage::CommitPick {
            game_id: 1,
            player_id: 2,
            force_for: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("force_for"));

        let back: ClientMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn rejection_carries_stable_reason_code() {
        let msg = ServerMessage::rejected(&PickError::NotYourTurn);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""reason":"not_your_turn""#), "{json}");
        assert!(json.contains(r#""type":"pick_rejected""#), "{json}");
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"shout"}"#).is_err());
    }
}
