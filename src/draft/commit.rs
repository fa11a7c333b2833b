// Pick commit protocol: validate, insert, announce.
//
// Validation here is advisory UX; the only arbitration that matters under
// concurrency is the store's uniqueness constraint. Two clients can both pass
// every precondition below for the same player, and exactly one insert wins.

use thiserror::Error;
use tracing::{debug, info};

use crate::db::{Database, StoreError};
use crate::draft::pick::DraftPick;
use crate::draft::pool;
use crate::draft::turn;
use crate::identity::Principal;
use crate::sync::{ChangeEvent, ChangeFeed};

/// Why a pick was refused. Every variant except `Store` is an expected
/// outcome of normal play, not a fault.
#[derive(Debug, Error)]
pub enum PickError {
    #[error("it is not your turn to pick")]
    NotYourTurn,

    #[error("no draft order is configured for this game")]
    NoActivePicker,

    #[error("only a commissioner may pick on another parent's behalf")]
    NotCommissioner,

    #[error("player is not in this game's pool")]
    NotInPool,

    #[error("you may not draft this player")]
    Restricted,

    #[error("player has already been drafted in this game")]
    AlreadyDrafted,

    /// A concurrent commit won the race after our preconditions passed.
    /// Never retried automatically; the caller refetches and re-decides.
    #[error("another pick was committed concurrently")]
    Conflict,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Commit a pick for `actor`, or — when `force_for` names a parent and the
/// actor is a commissioner — on that parent's behalf.
///
/// A forced commit skips the turn check and the restriction check (both
/// bypasses are audit-logged); everything else applies to both paths. On
/// success the pick is announced on the feed before returning.
pub fn commit_pick(
    db: &Database,
    feed: &ChangeFeed,
    game_id: i64,
    player_id: i64,
    actor: &Principal,
    force_for: Option<&str>,
) -> Result<DraftPick, PickError> {
    let forced = force_for.is_some();
    if forced && !actor.is_commissioner {
        return Err(PickError::NotCommissioner);
    }
    let attributed = force_for.unwrap_or(&actor.parent_id);

    let order = db.load_draft_order(game_id)?;
    let pick_count = db.pick_count(game_id)?;
    let current = turn::project(&order, pick_count);

    if !forced {
        match current.picker.as_deref() {
            None => return Err(PickError::NoActivePicker),
            Some(picker) if picker != attributed => return Err(PickError::NotYourTurn),
            Some(_) => {}
        }
    }

    // Pool flags as the attributed parent would see them, exhaustion reset
    // included: a post-reset "available" player passes this check and the
    // store's constraint has the final word.
    let board = pool::resolve(db, game_id, &Principal::parent(attributed))?;
    let entry = board
        .iter()
        .find(|e| e.player.id == player_id)
        .ok_or(PickError::NotInPool)?;

    if entry.restricted {
        if forced {
            info!(
                game_id,
                player_id,
                parent_id = attributed,
                commissioner = %actor.parent_id,
                "commissioner override bypasses parent restriction"
            );
        } else {
            return Err(PickError::Restricted);
        }
    }
    if entry.drafted {
        return Err(PickError::AlreadyDrafted);
    }

    let pick = db
        .insert_pick(game_id, attributed, player_id, current.round)
        .map_err(|e| match e {
            StoreError::Conflict => PickError::Conflict,
            other => PickError::Store(other),
        })?;

    debug!(
        game_id,
        player_id,
        parent_id = attributed,
        pick_number = pick.pick_number,
        round = pick.round_number,
        forced,
        "pick committed"
    );
    feed.publish(ChangeEvent::pick_inserted(game_id, pick.pick_number));

    Ok(pick)
}
