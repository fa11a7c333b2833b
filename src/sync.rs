// Live sync: the invalidate/refetch signal between clients.
//
// The feed is never a source of truth. Delivery is at-least-once and
// unordered; every handler re-derives the full board from the store, so a
// duplicated, reordered, or even dropped-and-replaced signal is harmless. A
// receiver that falls behind gets a bare Refresh instead of the missed
// events, which amounts to the same thing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// "A pick was inserted" — the only change the draft engine broadcasts.
/// Carries just enough to log and route; never enough to apply incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub game_id: i64,
    pub pick_number: u32,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn pick_inserted(game_id: i64, pick_number: u32) -> Self {
        ChangeEvent {
            game_id,
            pick_number,
            at: Utc::now(),
        }
    }
}

/// What a subscriber wakes up to.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A specific insert happened in the subscribed game.
    Changed(ChangeEvent),
    /// The receiver lagged and events were dropped; refetch everything.
    Refresh,
}

/// Fan-out hub for change events. Cheaply cloneable; every writer publishes
/// here and every client view holds a [`Subscription`].
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        ChangeFeed { tx }
    }

    /// Publish a change event to all current subscribers. Publishing with no
    /// subscribers is fine (nobody is watching this game right now).
    pub fn publish(&self, event: ChangeEvent) {
        match self.tx.send(event) {
            Ok(n) => debug!(subscribers = n, "change event published"),
            Err(_) => debug!("change event published with no subscribers"),
        }
    }

    /// Subscribe to inserts for a single game. Dropping the subscription
    /// unsubscribes; in-flight store operations are unaffected.
    pub fn subscribe(&self, game_id: i64) -> Subscription {
        Subscription {
            game_id,
            rx: self.tx.subscribe(),
        }
    }
}

/// A per-game view of the feed. Events for other games are filtered out.
pub struct Subscription {
    game_id: i64,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn game_id(&self) -> i64 {
        self.game_id
    }

    /// Wait for the next signal for this game. Returns `None` once the feed
    /// itself is gone (all senders dropped).
    pub async fn recv(&mut self) -> Option<Signal> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.game_id == self.game_id => {
                    return Some(Signal::Changed(event));
                }
                Ok(_) => continue, // another game's draft
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "subscription lagged; degrading to full refresh");
                    return Some(Signal::Refresh);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv): `None` when nothing is
    /// pending for this game (or the feed is gone).
    pub fn try_recv(&mut self) -> Option<Signal> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.game_id == self.game_id => {
                    return Some(Signal::Changed(event));
                }
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => return Some(Signal::Refresh),
                Err(_) => return None,
            }
        }
    }
}
