// Player pool resolution: who is draftable, for whom, and how good they are.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::{Database, StoreError};
use crate::draft::player::Player;
use crate::identity::Principal;

/// One row of the draft board, as seen by a specific caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub player: Player,
    /// The caller may never draft this player (their own child, typically).
    pub restricted: bool,
    /// Already taken in this game. Subject to the exhaustion reset below.
    pub drafted: bool,
    /// Mean fantasy points over completed games; 0 with no history. A ranking
    /// heuristic only, nothing downstream depends on it for correctness.
    pub average_points: f64,
}

/// Resolve the draft pool for `game_id` as seen by `caller`, ordered by
/// player name.
///
/// Read-only; every call re-reads attendance, restrictions, the pick log,
/// and the scoring history. If any source read fails the whole resolution
/// fails — a partially resolved board is never returned.
///
/// Exhaustion reset: once fewer undrafted players remain than there are
/// parents in the draft order, all players are reported available again so
/// the draft never stalls. This is a read-time illusion recomputed on every
/// load; no pick rows are touched.
pub fn resolve(
    db: &Database,
    game_id: i64,
    caller: &Principal,
) -> Result<Vec<PoolEntry>, StoreError> {
    let players = db.attendance_players(game_id)?;
    let restricted = db.restricted_players(&caller.parent_id)?;
    let picks = db.load_picks(game_id)?;
    let order = db.load_draft_order(game_id)?;
    let averages = db.player_averages()?;

    let drafted_ids: std::collections::HashSet<i64> =
        picks.iter().map(|p| p.player_id).collect();

    let undrafted = players
        .iter()
        .filter(|p| !drafted_ids.contains(&p.id))
        .count();
    let pool_exhausted = !order.is_empty() && !players.is_empty() && undrafted < order.len();
    if pool_exhausted {
        info!(
            game_id,
            undrafted,
            parents = order.len(),
            "pool exhausted; reporting all players available again"
        );
    }

    Ok(players
        .into_iter()
        .map(|player| {
            let drafted = !pool_exhausted && drafted_ids.contains(&player.id);
            PoolEntry {
                restricted: restricted.contains(&player.id),
                drafted,
                average_points: averages.get(&player.id).copied().unwrap_or(0.0),
                player,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::GameStatus;
    use crate::draft::player::PlayerKind;
    use chrono::NaiveDate;

    fn test_db() -> Database {
        Database::open(":memory:").unwrap()
    }

    fn game_with_players(db: &Database, names: &[&str]) -> (i64, Vec<i64>) {
        let game = db
            .create_game(
                "Cougars",
                NaiveDate::from_ymd_opt(2026, 5, 9).unwrap(),
                GameStatus::Drafting,
            )
            .unwrap();
        let ids = names
            .iter()
            .map(|name| {
                let id = db.insert_player(name, PlayerKind::Kid).unwrap();
                db.add_attendance(game, id).unwrap();
                id
            })
            .collect();
        (game, ids)
    }

    #[test]
    fn pool_is_name_ordered_with_flags() {
        let db = test_db();
        let (game, ids) = game_with_players(&db, &["Zoe", "Avery", "Milo"]);
        db.set_draft_order(game, &["x", "y", "z"]).unwrap();
        db.add_restriction("x", ids[1]).unwrap(); // Avery is x's kid
        db.insert_pick(game, "y", ids[2], 1).unwrap(); // Milo drafted

        let pool = resolve(&db, game, &Principal::parent("x")).unwrap();
        let names: Vec<&str> = pool.iter().map(|e| e.player.name.as_str()).collect();
        assert_eq!(names, vec!["Avery", "Milo", "Zoe"]);

        assert!(pool[0].restricted);
        assert!(!pool[0].drafted);
        assert!(pool[1].drafted);
        assert!(!pool[2].restricted);
    }

    #[test]
    fn restrictions_are_per_caller() {
        let db = test_db();
        let (game, ids) = game_with_players(&db, &["Avery", "Blake"]);
        db.set_draft_order(game, &["x", "y", "z"]).unwrap();
        db.add_restriction("x", ids[0]).unwrap();

        let for_x = resolve(&db, game, &Principal::parent("x")).unwrap();
        let for_y = resolve(&db, game, &Principal::parent("y")).unwrap();
        assert!(for_x[0].restricted);
        assert!(!for_y[0].restricted);
    }

    #[test]
    fn averages_flow_through_and_default_to_zero() {
        let db = test_db();
        let (game, ids) = game_with_players(&db, &["Avery", "Blake"]);
        db.set_draft_order(game, &["x", "y"]).unwrap();

        let done = db
            .create_game(
                "Hornets",
                NaiveDate::from_ymd_opt(2026, 4, 25).unwrap(),
                GameStatus::Completed,
            )
            .unwrap();
        let goal = db.add_scoring_rule("goal", 4.0).unwrap();
        db.add_game_log(done, ids[0], goal).unwrap();

        let pool = resolve(&db, game, &Principal::parent("x")).unwrap();
        assert!((pool[0].average_points - 4.0).abs() < f64::EPSILON);
        assert_eq!(pool[1].average_points, 0.0);
    }

    #[test]
    fn exhaustion_reset_reports_all_available() {
        // P=2 parents, 2 players, both drafted: undrafted (0) < parents (2),
        // so both come back as available. The picks themselves stay put.
        let db = test_db();
        let (game, ids) = game_with_players(&db, &["Avery", "Blake"]);
        db.set_draft_order(game, &["x", "y"]).unwrap();
        db.insert_pick(game, "x", ids[0], 1).unwrap();
        db.insert_pick(game, "y", ids[1], 1).unwrap();

        let pool = resolve(&db, game, &Principal::parent("x")).unwrap();
        assert!(pool.iter().all(|e| !e.drafted));
        assert_eq!(db.pick_count(game).unwrap(), 2);
    }

    #[test]
    fn exhaustion_reset_triggers_below_parent_count_not_only_at_zero() {
        // 3 parents, 4 players, 2 drafted: undrafted (2) < parents (3).
        let db = test_db();
        let (game, ids) = game_with_players(&db, &["A", "B", "C", "D"]);
        db.set_draft_order(game, &["x", "y", "z"]).unwrap();
        db.insert_pick(game, "x", ids[0], 1).unwrap();
        db.insert_pick(game, "y", ids[1], 1).unwrap();

        let pool = resolve(&db, game, &Principal::parent("z")).unwrap();
        assert!(pool.iter().all(|e| !e.drafted));
    }

    #[test]
    fn no_reset_while_enough_players_remain() {
        let db = test_db();
        let (game, ids) = game_with_players(&db, &["A", "B", "C", "D"]);
        db.set_draft_order(game, &["x", "y"]).unwrap();
        db.insert_pick(game, "x", ids[0], 1).unwrap();

        // 3 undrafted >= 2 parents: the drafted flag stands.
        let pool = resolve(&db, game, &Principal::parent("y")).unwrap();
        assert_eq!(pool.iter().filter(|e| e.drafted).count(), 1);
    }

    #[test]
    fn no_reset_without_a_draft_order() {
        let db = test_db();
        let (game, ids) = game_with_players(&db, &["A"]);
        db.insert_pick(game, "x", ids[0], 1).unwrap();

        let pool = resolve(&db, game, &Principal::parent("x")).unwrap();
        assert!(pool[0].drafted);
    }
}
