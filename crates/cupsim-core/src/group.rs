// Group membership and round-robin fixtures.

use serde::{Deserialize, Serialize};

use crate::ledger::{MatchKind, MatchRecord};

/// A group-stage pool, identified by a letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: char,
    /// Team names in draw order.
    pub teams: Vec<String>,
}

impl Group {
    pub fn new(name: char, teams: Vec<String>) -> Self {
        Group { name, teams }
    }

    pub fn contains(&self, team: &str) -> bool {
        self.teams.iter().any(|t| t == team)
    }

    /// Every pairing of the group exactly once, in draw order
    /// (team i hosts team j for i < j).
    pub fn fixtures(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (i, home) in self.teams.iter().enumerate() {
            for away in &self.teams[i + 1..] {
                out.push((home.clone(), away.clone()));
            }
        }
        out
    }

    /// Whether `record` is a finished group match between two members.
    pub fn owns(&self, record: &MatchRecord) -> bool {
        record.finished
            && record.kind == MatchKind::Group
            && self.contains(&record.home)
            && self.contains(&record.away)
    }

    /// Pairings with no finished match yet, in fixture order. Home and away
    /// are interchangeable.
    pub fn missing_fixtures(&self, matches: &[MatchRecord]) -> Vec<(String, String)> {
        self.fixtures()
            .into_iter()
            .filter(|(a, b)| {
                !matches.iter().any(|m| {
                    self.owns(m)
                        && ((&m.home == a && &m.away == b) || (&m.home == b && &m.away == a))
                })
            })
            .collect()
    }

    /// Whether every pairing has been played.
    pub fn is_complete(&self, matches: &[MatchRecord]) -> bool {
        self.missing_fixtures(matches).is_empty()
    }
}
