// Group tables computed from match history.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::group::Group;
use crate::ledger::{MatchRecord, Side};

/// One line of a group table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub team: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
}

impl StandingRow {
    fn empty(team: &str) -> Self {
        StandingRow {
            team: team.to_string(),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            points: 0,
        }
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }

    fn add(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        match scored.cmp(&conceded) {
            Ordering::Greater => self.wins += 1,
            Ordering::Equal => self.draws += 1,
            Ordering::Less => self.losses += 1,
        }
        self.points = 3 * self.wins + self.draws;
    }
}

/// Table order: points, goal difference, goals scored (all descending),
/// then team name ascending. Head-to-head and fair-play keys are not used.
pub fn table_order(a: &StandingRow, b: &StandingRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| a.team.cmp(&b.team))
}

/// Build the table for `group` from scratch.
///
/// Only finished group matches between two members of the group count, so
/// the result depends on the match history alone. Teams without a match
/// still get a (zero) row.
pub fn compute_standings(group: &Group, matches: &[MatchRecord]) -> Vec<StandingRow> {
    let mut rows: Vec<StandingRow> = group.teams.iter().map(|t| StandingRow::empty(t)).collect();

    for record in matches.iter().filter(|m| group.owns(m)) {
        for side in [Side::Home, Side::Away] {
            let team = record.team(side);
            if let Some(row) = rows.iter_mut().find(|r| r.team == team) {
                row.add(record.score(side), record.score(side.opposite()));
            }
        }
    }

    rows.sort_by(table_order);
    rows
}
