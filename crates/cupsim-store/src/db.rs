// SQLite persistence layer for tournaments, teams and match records.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use cupsim_core::knockout::KnockoutSummary;
use cupsim_core::ledger::{MatchKind, MatchRecord};
use cupsim_core::store::{StoreError, TournamentStore};
use cupsim_core::team::Team;

/// SQLite-backed store for tournaments, their teams and their matches.
///
/// Teams and matches are kept as JSON snapshots alongside a few plain
/// columns for ad-hoc queries.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tournaments (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                champion    TEXT,
                runner_up   TEXT,
                third_place TEXT,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS teams (
                tournament_id TEXT NOT NULL REFERENCES tournaments(id),
                name          TEXT NOT NULL,
                region        TEXT NOT NULL,
                played        INTEGER NOT NULL,
                points        INTEGER NOT NULL,
                goals_for     INTEGER NOT NULL,
                goals_against INTEGER NOT NULL,
                yellow_cards  INTEGER NOT NULL,
                red_cards     INTEGER NOT NULL,
                data          TEXT NOT NULL,
                PRIMARY KEY (tournament_id, name)
            );

            CREATE TABLE IF NOT EXISTS matches (
                tournament_id TEXT NOT NULL REFERENCES tournaments(id),
                match_id      INTEGER NOT NULL,
                kind          TEXT NOT NULL,
                home          TEXT NOT NULL,
                away          TEXT NOT NULL,
                home_score    INTEGER NOT NULL,
                away_score    INTEGER NOT NULL,
                venue         TEXT NOT NULL DEFAULT '',
                referee       TEXT NOT NULL DEFAULT '',
                data          TEXT NOT NULL,
                PRIMARY KEY (tournament_id, match_id)
            );

            CREATE INDEX IF NOT EXISTS idx_matches_kind ON matches(tournament_id, kind);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))
    }

    // ------------------------------------------------------------------
    // Tournaments
    // ------------------------------------------------------------------

    /// Generate a new unique tournament ID based on the current UTC
    /// timestamp.
    ///
    /// Format: `cup_YYYYMMDD_HHMMSS_SSS` (e.g. `cup_20260614_183000_042`).
    pub fn generate_tournament_id() -> String {
        let now = chrono::Utc::now();
        now.format("cup_%Y%m%d_%H%M%S_%3f").to_string()
    }

    /// Register a tournament under a fresh ID and return the ID.
    pub fn create_tournament(&self, name: &str) -> Result<String> {
        let id = Self::generate_tournament_id();
        self.register_tournament(&id, name)?;
        Ok(id)
    }

    /// Register a tournament under an explicit ID.
    pub fn register_tournament(&self, id: &str, name: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO tournaments (id, name) VALUES (?1, ?2)",
            params![id, name],
        )
        .with_context(|| format!("failed to register tournament {id}"))?;
        debug!(tournament = id, name, "tournament registered");
        Ok(())
    }

    /// Name of a registered tournament, or `None` if the ID is unknown.
    pub fn tournament_name(&self, id: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT name FROM tournaments WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()
        .context("failed to look up tournament")
    }

    /// Store the final placings of a tournament.
    pub fn set_champion(&self, id: &str, summary: &KnockoutSummary) -> Result<()> {
        let conn = self.conn()?;
        let third_json =
            serde_json::to_string(&summary.third_place).context("failed to serialize third place")?;
        let updated = conn
            .execute(
                "UPDATE tournaments SET champion = ?2, runner_up = ?3, third_place = ?4 WHERE id = ?1",
                params![id, summary.champion, summary.runner_up, third_json],
            )
            .context("failed to store champion")?;
        if updated == 0 {
            return Err(anyhow!("no tournament with id {id}"));
        }
        Ok(())
    }

    /// Final placings, or `None` while the tournament is unfinished.
    pub fn load_summary(&self, id: &str) -> Result<Option<KnockoutSummary>> {
        let conn = self.conn()?;
        let row: Option<(Option<String>, Option<String>, Option<String>)> = conn
            .query_row(
                "SELECT champion, runner_up, third_place FROM tournaments WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .context("failed to query tournament summary")?;

        match row {
            Some((Some(champion), Some(runner_up), Some(third_json))) => {
                let third_place: [String; 2] = serde_json::from_str(&third_json)
                    .context("failed to deserialize third place")?;
                Ok(Some(KnockoutSummary {
                    champion,
                    runner_up,
                    third_place,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Delete a tournament with all its teams and matches. Uses a
    /// transaction with automatic rollback on error.
    pub fn clear_tournament(&self, id: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM matches WHERE tournament_id = ?1", params![id])
            .context("failed to delete matches")?;
        tx.execute("DELETE FROM teams WHERE tournament_id = ?1", params![id])
            .context("failed to delete teams")?;
        tx.execute("DELETE FROM tournaments WHERE id = ?1", params![id])
            .context("failed to delete tournament")?;
        tx.commit().context("failed to commit clear_tournament")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Teams
    // ------------------------------------------------------------------

    /// Insert a team snapshot, replacing any earlier one with the same name.
    pub fn upsert_team(&self, tournament_id: &str, team: &Team) -> Result<()> {
        let conn = self.conn()?;
        let data = serde_json::to_string(team).context("failed to serialize team")?;
        let s = team.stats();
        conn.execute(
            "INSERT OR REPLACE INTO teams
                (tournament_id, name, region, played, points, goals_for, goals_against,
                 yellow_cards, red_cards, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                tournament_id,
                team.name(),
                team.region(),
                s.played,
                s.points,
                s.goals_for,
                s.goals_against,
                s.yellow_cards,
                s.red_cards,
                data,
            ],
        )
        .with_context(|| format!("failed to save team {}", team.name()))?;
        Ok(())
    }

    /// Teams of a tournament, ordered by name.
    pub fn teams(&self, tournament_id: &str) -> Result<Vec<Team>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT data FROM teams WHERE tournament_id = ?1 ORDER BY name")
            .context("failed to prepare teams query")?;

        let rows = stmt
            .query_map(params![tournament_id], |row| row.get::<_, String>(0))
            .context("failed to query teams")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team rows")?;

        rows.iter()
            .map(|json| serde_json::from_str(json).context("failed to deserialize team"))
            .collect()
    }

    // ------------------------------------------------------------------
    // Matches
    // ------------------------------------------------------------------

    /// Insert a match record, replacing any earlier one with the same id.
    pub fn upsert_match(
        &self,
        tournament_id: &str,
        record: &MatchRecord,
        venue: &str,
        referee: &str,
    ) -> Result<()> {
        let conn = self.conn()?;
        let data = serde_json::to_string(record).context("failed to serialize match record")?;
        conn.execute(
            "INSERT OR REPLACE INTO matches
                (tournament_id, match_id, kind, home, away, home_score, away_score,
                 venue, referee, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                tournament_id,
                record.id,
                record.kind.display_str(),
                record.home,
                record.away,
                record.home_score,
                record.away_score,
                venue,
                referee,
                data,
            ],
        )
        .with_context(|| format!("failed to save match {}", record.id))?;
        Ok(())
    }

    /// Match records of a tournament, ordered by match id. The kind, venue
    /// and referee columns win over whatever the JSON snapshot carries.
    pub fn matches(&self, tournament_id: &str) -> Result<Vec<MatchRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT data, kind, venue, referee FROM matches
                 WHERE tournament_id = ?1 ORDER BY match_id",
            )
            .context("failed to prepare matches query")?;

        let rows = stmt
            .query_map(params![tournament_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .context("failed to query matches")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map match rows")?;

        rows.into_iter()
            .map(|(json, kind, venue, referee)| {
                let mut record: MatchRecord =
                    serde_json::from_str(&json).context("failed to deserialize match record")?;
                record.kind = MatchKind::from_str_kind(&kind)
                    .ok_or_else(|| anyhow!("match {} has unknown kind {kind:?}", record.id))?;
                record.venue = venue;
                record.referee = referee;
                Ok(record)
            })
            .collect()
    }

    /// Number of matches stored for a tournament.
    pub fn match_count(&self, tournament_id: &str) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM matches WHERE tournament_id = ?1",
                params![tournament_id],
                |row| row.get(0),
            )
            .context("failed to count matches")?;
        Ok(count as usize)
    }
}

fn store_error(operation: &'static str, err: anyhow::Error) -> StoreError {
    StoreError::new(operation, format!("{err:#}"))
}

impl TournamentStore for Database {
    fn save_team(&self, tournament_id: &str, team: &Team) -> std::result::Result<(), StoreError> {
        self.upsert_team(tournament_id, team)
            .map_err(|e| store_error("save_team", e))
    }

    fn save_match(
        &self,
        tournament_id: &str,
        record: &MatchRecord,
        venue: &str,
        referee: &str,
    ) -> std::result::Result<(), StoreError> {
        self.upsert_match(tournament_id, record, venue, referee)
            .map_err(|e| store_error("save_match", e))
    }

    fn load_teams(&self, tournament_id: &str) -> std::result::Result<Vec<Team>, StoreError> {
        self.teams(tournament_id)
            .map_err(|e| store_error("load_teams", e))
    }

    fn load_matches(&self, tournament_id: &str) -> std::result::Result<Vec<MatchRecord>, StoreError> {
        self.matches(tournament_id)
            .map_err(|e| store_error("load_matches", e))
    }

    fn save_summary(
        &self,
        tournament_id: &str,
        summary: &KnockoutSummary,
    ) -> std::result::Result<(), StoreError> {
        self.set_champion(tournament_id, summary)
            .map_err(|e| store_error("save_summary", e))
    }
}
