// SQLite persistence layer: the single source of truth for the draft.
//
// The engine never caches any of this authoritatively; every view is
// re-derived from these tables on each refresh. Mutual exclusion on "who gets
// this player" is delegated entirely to the UNIQUE(game_id, player_id)
// constraint on draft_picks.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use thiserror::Error;

use crate::draft::pick::DraftPick;
use crate::draft::player::{Player, PlayerKind};
use crate::draft::turn::OrderSlot;

/// Store-level failures. `Conflict` is an expected, first-class outcome of
/// concurrent pick submission, not an exceptional path.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write; another client won the race.
    #[error("player already drafted in this game")]
    Conflict,

    /// A row violated an invariant the schema cannot express (e.g. an unknown
    /// enum string). Logged and surfaced, never papered over.
    #[error("data integrity problem: {0}")]
    Integrity(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Lifecycle of a game. Drafting opens after `scheduled`; historical averages
/// only ever read from `completed` games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Scheduled,
    Drafting,
    Live,
    Completed,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Scheduled => "scheduled",
            GameStatus::Drafting => "drafting",
            GameStatus::Live => "live",
            GameStatus::Completed => "completed",
        }
    }

    pub fn from_str_status(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(GameStatus::Scheduled),
            "drafting" => Some(GameStatus::Drafting),
            "live" => Some(GameStatus::Live),
            "completed" => Some(GameStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// SQLite-backed persistence for players, games, attendance, restrictions,
/// the draft order, the pick log, and the scoring history.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                name      TEXT NOT NULL,
                kind      TEXT NOT NULL CHECK (kind IN ('kid', 'coach')),
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS games (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                opponent_name TEXT NOT NULL,
                game_date     TEXT NOT NULL,
                status        TEXT NOT NULL DEFAULT 'scheduled'
            );

            CREATE TABLE IF NOT EXISTS game_attendance (
                game_id   INTEGER NOT NULL REFERENCES games(id),
                player_id INTEGER NOT NULL REFERENCES players(id),
                PRIMARY KEY (game_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS parent_restrictions (
                parent_id TEXT NOT NULL,
                player_id INTEGER NOT NULL REFERENCES players(id),
                PRIMARY KEY (parent_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS draft_order (
                game_id    INTEGER NOT NULL REFERENCES games(id),
                parent_id  TEXT NOT NULL,
                pick_order INTEGER NOT NULL,
                PRIMARY KEY (game_id, pick_order),
                UNIQUE (game_id, parent_id)
            );

            CREATE TABLE IF NOT EXISTS draft_picks (
                game_id      INTEGER NOT NULL REFERENCES games(id),
                parent_id    TEXT NOT NULL,
                player_id    INTEGER NOT NULL REFERENCES players(id),
                round_number INTEGER NOT NULL,
                pick_number  INTEGER NOT NULL,
                picked_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (game_id, pick_number),
                UNIQUE (game_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS scoring_rules (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                action_name TEXT NOT NULL,
                points      REAL NOT NULL,
                is_active   INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS game_logs (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id   INTEGER NOT NULL REFERENCES games(id),
                player_id INTEGER NOT NULL REFERENCES players(id),
                rule_id   INTEGER NOT NULL REFERENCES scoring_rules(id),
                logged_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Add a player to the roster. Returns the new row id.
    pub fn insert_player(&self, name: &str, kind: PlayerKind) -> Result<i64, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO players (name, kind) VALUES (?1, ?2)",
            params![name, kind.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Soft-deactivate (or reactivate) a player. Players are never deleted.
    pub fn set_player_active(&self, player_id: i64, active: bool) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "UPDATE players SET is_active = ?2 WHERE id = ?1",
            params![player_id, active],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Games
    // ------------------------------------------------------------------

    /// Create a game. Returns the new row id.
    pub fn create_game(
        &self,
        opponent_name: &str,
        game_date: NaiveDate,
        status: GameStatus,
    ) -> Result<i64, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO games (opponent_name, game_date, status) VALUES (?1, ?2, ?3)",
            params![opponent_name, game_date.to_string(), status.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn set_game_status(&self, game_id: i64, status: GameStatus) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "UPDATE games SET status = ?2 WHERE id = ?1",
            params![game_id, status.as_str()],
        )?;
        Ok(())
    }

    pub fn game_status(&self, game_id: i64) -> Result<GameStatus, StoreError> {
        let conn = self.conn();
        let raw: String = conn.query_row(
            "SELECT status FROM games WHERE id = ?1",
            params![game_id],
            |row| row.get(0),
        )?;
        GameStatus::from_str_status(&raw)
            .ok_or_else(|| StoreError::Integrity(format!("unknown game status '{raw}'")))
    }

    // ------------------------------------------------------------------
    // Attendance / restrictions / draft order (game setup, immutable
    // during drafting)
    // ------------------------------------------------------------------

    pub fn add_attendance(&self, game_id: i64, player_id: i64) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO game_attendance (game_id, player_id) VALUES (?1, ?2)",
            params![game_id, player_id],
        )?;
        Ok(())
    }

    /// The draftable pool for a game, ordered by player name.
    pub fn attendance_players(&self, game_id: i64) -> Result<Vec<Player>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.kind, p.is_active
             FROM game_attendance ga
             JOIN players p ON p.id = ga.player_id
             WHERE ga.game_id = ?1
             ORDER BY p.name",
        )?;

        let rows = stmt
            .query_map(params![game_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name, kind, is_active)| {
                let kind = PlayerKind::from_str_kind(&kind).ok_or_else(|| {
                    StoreError::Integrity(format!("player {id} has unknown kind '{kind}'"))
                })?;
                Ok(Player {
                    id,
                    name,
                    kind,
                    is_active,
                })
            })
            .collect()
    }

    pub fn add_restriction(&self, parent_id: &str, player_id: i64) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO parent_restrictions (parent_id, player_id) VALUES (?1, ?2)",
            params![parent_id, player_id],
        )?;
        Ok(())
    }

    /// All players a parent may never draft (typically their own child).
    pub fn restricted_players(&self, parent_id: &str) -> Result<HashSet<i64>, StoreError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT player_id FROM parent_restrictions WHERE parent_id = ?1")?;
        let ids = stmt
            .query_map(params![parent_id], |row| row.get(0))?
            .collect::<Result<HashSet<i64>, _>>()?;
        Ok(ids)
    }

    pub fn is_restricted(&self, parent_id: &str, player_id: i64) -> Result<bool, StoreError> {
        let conn = self.conn();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM parent_restrictions
                           WHERE parent_id = ?1 AND player_id = ?2)",
            params![parent_id, player_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Replace the draft order for a game. `parents` is the turn sequence;
    /// pick_order is assigned densely from 1, so density is enforced by
    /// construction.
    pub fn set_draft_order(&self, game_id: i64, parents: &[&str]) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM draft_order WHERE game_id = ?1",
            params![game_id],
        )?;
        for (i, parent_id) in parents.iter().enumerate() {
            tx.execute(
                "INSERT INTO draft_order (game_id, parent_id, pick_order) VALUES (?1, ?2, ?3)",
                params![game_id, parent_id, i as u32 + 1],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Load the turn sequence for a game, sorted by pick_order.
    pub fn load_draft_order(&self, game_id: i64) -> Result<Vec<OrderSlot>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT parent_id, pick_order FROM draft_order
             WHERE game_id = ?1 ORDER BY pick_order",
        )?;
        let slots = stmt
            .query_map(params![game_id], |row| {
                Ok(OrderSlot {
                    parent_id: row.get(0)?,
                    pick_order: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(slots)
    }

    // ------------------------------------------------------------------
    // Draft picks
    // ------------------------------------------------------------------

    /// Append a pick, assigning `pick_number = max + 1` inside the same
    /// transaction so the sequence stays contiguous under concurrent commits.
    ///
    /// A uniqueness violation (the player was drafted by a concurrent commit)
    /// surfaces as [`StoreError::Conflict`]; the caller must re-derive state
    /// before retrying, never retry blindly.
    pub fn insert_pick(
        &self,
        game_id: i64,
        parent_id: &str,
        player_id: i64,
        round_number: u32,
    ) -> Result<DraftPick, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let pick_number: u32 = tx.query_row(
            "SELECT COALESCE(MAX(pick_number), 0) + 1 FROM draft_picks WHERE game_id = ?1",
            params![game_id],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO draft_picks (game_id, parent_id, player_id, round_number, pick_number)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![game_id, parent_id, player_id, round_number, pick_number],
        )
        .map_err(map_pick_constraint)?;

        tx.commit()?;

        Ok(DraftPick {
            game_id,
            parent_id: parent_id.to_string(),
            player_id,
            round_number,
            pick_number,
        })
    }

    /// Load the pick log for a game, ordered by pick number.
    pub fn load_picks(&self, game_id: i64) -> Result<Vec<DraftPick>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT game_id, parent_id, player_id, round_number, pick_number
             FROM draft_picks WHERE game_id = ?1 ORDER BY pick_number",
        )?;
        let picks = stmt
            .query_map(params![game_id], |row| {
                Ok(DraftPick {
                    game_id: row.get(0)?,
                    parent_id: row.get(1)?,
                    player_id: row.get(2)?,
                    round_number: row.get(3)?,
                    pick_number: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(picks)
    }

    pub fn pick_count(&self, game_id: i64) -> Result<usize, StoreError> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM draft_picks WHERE game_id = ?1",
            params![game_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Scoring rules / game logs (scorekeeper side; feeds the averages)
    // ------------------------------------------------------------------

    pub fn add_scoring_rule(&self, action_name: &str, points: f64) -> Result<i64, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO scoring_rules (action_name, points) VALUES (?1, ?2)",
            params![action_name, points],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn add_game_log(
        &self,
        game_id: i64,
        player_id: i64,
        rule_id: i64,
    ) -> Result<i64, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO game_logs (game_id, player_id, rule_id) VALUES (?1, ?2, ?3)",
            params![game_id, player_id, rule_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Remove a mis-logged scoring event (log-correction tooling).
    pub fn delete_game_log(&self, log_id: i64) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute("DELETE FROM game_logs WHERE id = ?1", params![log_id])?;
        Ok(())
    }

    /// Mean fantasy points per player over log entries whose parent game is
    /// `completed`. Players with no completed history are absent from the map
    /// (the resolver treats that as 0).
    pub fn player_averages(&self) -> Result<HashMap<i64, f64>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT gl.player_id, AVG(sr.points)
             FROM game_logs gl
             JOIN scoring_rules sr ON sr.id = gl.rule_id
             JOIN games g ON g.id = gl.game_id
             WHERE g.status = 'completed'
             GROUP BY gl.player_id",
        )?;
        let averages = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(averages)
    }
}

/// Map a constraint violation on the draft_picks insert to the typed
/// `Conflict` outcome. Any losing concurrent attempt lands here; everything
/// else passes through as a plain SQLite error.
fn map_pick_constraint(e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, Some(msg))
            if err.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("draft_picks") =>
        {
            StoreError::Conflict
        }
        _ => StoreError::Sqlite(e),
    }
}
