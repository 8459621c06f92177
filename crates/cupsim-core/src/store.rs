// Persistence seam for tournament runs, plus an in-memory implementation.

use std::cell::RefCell;
use std::collections::BTreeMap;

use thiserror::Error;

use crate::knockout::KnockoutSummary;
use crate::ledger::MatchRecord;
use crate::team::Team;

/// A failed store operation. Failures end the run; they are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("store {operation} failed: {message}")]
pub struct StoreError {
    pub operation: &'static str,
    pub message: String,
}

impl StoreError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        StoreError {
            operation,
            message: message.into(),
        }
    }
}

/// Where a tournament keeps its teams and match records.
///
/// Saves are upserts: saving a team or match again replaces the earlier
/// copy. The engine only calls these at round boundaries.
pub trait TournamentStore {
    fn save_team(&self, tournament_id: &str, team: &Team) -> Result<(), StoreError>;

    fn save_match(
        &self,
        tournament_id: &str,
        record: &MatchRecord,
        venue: &str,
        referee: &str,
    ) -> Result<(), StoreError>;

    /// Teams of a tournament, ordered by name.
    fn load_teams(&self, tournament_id: &str) -> Result<Vec<Team>, StoreError>;

    /// Match records of a tournament, ordered by match id.
    fn load_matches(&self, tournament_id: &str) -> Result<Vec<MatchRecord>, StoreError>;

    /// Record the final placings once the knockout stage is done.
    fn save_summary(&self, tournament_id: &str, summary: &KnockoutSummary) -> Result<(), StoreError>;
}

/// Keeps everything in process memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    teams: RefCell<BTreeMap<String, BTreeMap<String, Team>>>,
    matches: RefCell<BTreeMap<String, BTreeMap<u32, MatchRecord>>>,
    summaries: RefCell<BTreeMap<String, KnockoutSummary>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self, tournament_id: &str) -> Option<KnockoutSummary> {
        self.summaries.borrow().get(tournament_id).cloned()
    }
}

impl TournamentStore for MemoryStore {
    fn save_team(&self, tournament_id: &str, team: &Team) -> Result<(), StoreError> {
        self.teams
            .borrow_mut()
            .entry(tournament_id.to_string())
            .or_default()
            .insert(team.name().to_string(), team.clone());
        Ok(())
    }

    fn save_match(
        &self,
        tournament_id: &str,
        record: &MatchRecord,
        venue: &str,
        referee: &str,
    ) -> Result<(), StoreError> {
        let mut record = record.clone();
        record.venue = venue.to_string();
        record.referee = referee.to_string();
        self.matches
            .borrow_mut()
            .entry(tournament_id.to_string())
            .or_default()
            .insert(record.id, record);
        Ok(())
    }

    fn load_teams(&self, tournament_id: &str) -> Result<Vec<Team>, StoreError> {
        Ok(self
            .teams
            .borrow()
            .get(tournament_id)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default())
    }

    fn load_matches(&self, tournament_id: &str) -> Result<Vec<MatchRecord>, StoreError> {
        Ok(self
            .matches
            .borrow()
            .get(tournament_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    fn save_summary(&self, tournament_id: &str, summary: &KnockoutSummary) -> Result<(), StoreError> {
        self.summaries
            .borrow_mut()
            .insert(tournament_id.to_string(), summary.clone());
        Ok(())
    }
}
