// Team identity, roster and aggregate tournament statistics.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::ledger::MatchRecord;
use crate::player::{CardKind, Player};
use crate::roster::{Roster, RosterError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamError {
    #[error("match {match_id} was already applied to {team}")]
    DuplicateResult { team: String, match_id: u32 },

    #[error("{team} did not play in match {match_id}")]
    NotInMatch { team: String, match_id: u32 },

    #[error("match {0} is not finished")]
    MatchNotFinished(u32),
}

impl TeamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TeamError::DuplicateResult { .. } | TeamError::MatchNotFinished(_) => ErrorKind::State,
            TeamError::NotInMatch { .. } => ErrorKind::Consistency,
        }
    }
}

/// Aggregate results over every match a team has completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStats {
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
}

impl TeamStats {
    /// Always derived from the goal totals.
    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }
}

/// A tournament entrant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    name: String,
    region: String,
    stats: TeamStats,
    roster: Roster,
    /// Ids of matches already folded into `stats`.
    #[serde(default)]
    applied_matches: BTreeSet<u32>,
}

impl Team {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Team {
            name: name.into(),
            region: region.into(),
            stats: TeamStats::default(),
            roster: Roster::new(),
            applied_matches: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn stats(&self) -> &TeamStats {
        &self.stats
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn add_starting_player(&mut self, player: Player) -> Result<(), RosterError> {
        self.roster.add_starting(player)
    }

    pub fn add_substitute_player(&mut self, player: Player) -> Result<(), RosterError> {
        self.roster.add_substitute(player)
    }

    /// Fold a finished match into the team's statistics and its scorers'
    /// goal counters. Cards only count towards the team totals, so a
    /// player's send-off state never outlives the match. Each match id is
    /// accepted once.
    pub fn record_result(&mut self, record: &MatchRecord) -> Result<(), TeamError> {
        if !record.finished {
            return Err(TeamError::MatchNotFinished(record.id));
        }
        let side = record.side_of(&self.name).ok_or_else(|| TeamError::NotInMatch {
            team: self.name.clone(),
            match_id: record.id,
        })?;
        if self.applied_matches.contains(&record.id) {
            return Err(TeamError::DuplicateResult {
                team: self.name.clone(),
                match_id: record.id,
            });
        }

        let scored = record.score(side);
        let conceded = record.score(side.opposite());
        let stats = &mut self.stats;
        stats.played += 1;
        stats.goals_for += scored;
        stats.goals_against += conceded;
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => {
                stats.wins += 1;
                stats.points += 3;
            }
            std::cmp::Ordering::Equal => {
                stats.draws += 1;
                stats.points += 1;
            }
            std::cmp::Ordering::Less => stats.losses += 1,
        }

        for goal in record.goals().filter(|g| g.team == self.name) {
            if let Some(p) = self.roster.find_mut(&goal.scorer) {
                p.record_goal();
            }
        }
        for card in record.cards().filter(|c| c.team == self.name) {
            match card.kind {
                CardKind::Yellow => self.stats.yellow_cards += 1,
                CardKind::Red => self.stats.red_cards += 1,
            }
        }

        self.applied_matches.insert(record.id);
        Ok(())
    }
}
