// A viewer's live session: snapshot on demand, refetch on every signal.
//
// The refetch discipline is deliberately blunt. Whatever the signal says
// happened, the session re-derives the entire board from the store. Signals
// carry no state worth merging, so a lost, duplicated, or reordered signal
// can never corrupt what the viewer sees.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::db::{Database, StoreError};
use crate::draft::pick::DraftPick;
use crate::draft::pool::{self, PoolEntry};
use crate::draft::turn::{self, TurnState};
use crate::identity::Principal;
use crate::sync::{ChangeEvent, Signal, Subscription};

/// Everything a client renders: the pool (with this viewer's restriction
/// flags), the projected turn, and the pick log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub game_id: i64,
    pub pool: Vec<PoolEntry>,
    pub turn: TurnState,
    pub picks: Vec<DraftPick>,
}

/// What the session loop emits to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// A pick landed in the watched game; a fresh `Board` always follows.
    Pick(ChangeEvent),
    Board(BoardSnapshot),
    /// A refetch failed; the board shown until now is stale, not wrong.
    Unavailable(String),
}

/// One viewer watching one game.
pub struct DraftSession {
    db: Arc<Database>,
    game_id: i64,
    viewer: Principal,
}

impl DraftSession {
    pub fn new(db: Arc<Database>, game_id: i64, viewer: Principal) -> Self {
        DraftSession {
            db,
            game_id,
            viewer,
        }
    }

    /// Re-derive the full board from the store.
    pub fn snapshot(&self) -> Result<BoardSnapshot, StoreError> {
        let pool = pool::resolve(&self.db, self.game_id, &self.viewer)?;
        let order = self.db.load_draft_order(self.game_id)?;
        let picks = self.db.load_picks(self.game_id)?;
        let turn = turn::project(&order, picks.len());
        Ok(BoardSnapshot {
            game_id: self.game_id,
            pool,
            turn,
            picks,
        })
    }

    /// Drive the session until the subscription or the consumer goes away.
    ///
    /// Always refetches once before waiting, so a (re)connecting viewer
    /// never renders from memory of a previous session.
    pub async fn run(self, mut sub: Subscription, out: mpsc::Sender<ViewUpdate>) {
        if self.refetch_into(&out).await.is_err() {
            return;
        }

        while let Some(signal) = sub.recv().await {
            debug!(game_id = self.game_id, ?signal, "refetching board");
            if let Signal::Changed(event) = &signal {
                if out.send(ViewUpdate::Pick(event.clone())).await.is_err() {
                    return;
                }
            }
            if self.refetch_into(&out).await.is_err() {
                return; // consumer gone
            }
        }
        debug!(game_id = self.game_id, "change feed closed; session ending");
    }

    async fn refetch_into(
        &self,
        out: &mpsc::Sender<ViewUpdate>,
    ) -> Result<(), mpsc::error::SendError<ViewUpdate>> {
        let update = match self.snapshot() {
            Ok(board) => ViewUpdate::Board(board),
            Err(e) => {
                error!(game_id = self.game_id, error = %e, "board refetch failed");
                ViewUpdate::Unavailable(e.to_string())
            }
        };
        out.send(update).await
    }
}
