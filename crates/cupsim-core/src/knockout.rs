// Knockout progression: round of 16 through the final, with a forced winner
// for every tie.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::ErrorKind;
use crate::ledger::{MatchError, MatchKind, MatchLedger, MatchRecord, Side};
use crate::team::Team;

/// Teams in a round-of-16 bracket.
pub const BRACKET_SIZE: usize = 16;

// ---------------------------------------------------------------------------
// Fixtures and runners
// ---------------------------------------------------------------------------

/// A pairing waiting to be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub kind: MatchKind,
    pub home: String,
    pub away: String,
}

impl Fixture {
    /// Whether `ledger` was opened for this fixture: same kind, same home
    /// and away sides.
    pub fn is_played_by(&self, ledger: &MatchLedger) -> bool {
        ledger.kind() == self.kind
            && ledger.team(Side::Home) == self.home
            && ledger.team(Side::Away) == self.away
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} v {}", self.kind, self.home, self.away)
    }
}

/// Label of a ledger in the same shape as a [`Fixture`].
pub(crate) fn ledger_label(ledger: &MatchLedger) -> String {
    format!(
        "{} {} v {}",
        ledger.kind(),
        ledger.team(Side::Home),
        ledger.team(Side::Away)
    )
}

/// Produces the ledger for a fixture.
///
/// Implementations assign the match id and record the events. The returned
/// ledger is normally left open; the caller resolves a level knockout score
/// and finishes it.
pub trait FixtureRunner {
    fn play(&mut self, fixture: &Fixture, home: &Team, away: &Team) -> Result<MatchLedger, MatchError>;
}

/// How a level knockout match is decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The first-listed (home) team goes through.
    #[default]
    FirstListed,
    /// The side with fewer card points (yellow 1, red 3) goes through;
    /// the first-listed team when those are equal too.
    FewerCards,
}

impl TieBreak {
    /// The side that receives the decisive increment.
    pub fn pick(&self, ledger: &MatchLedger) -> Side {
        match self {
            TieBreak::FirstListed => Side::Home,
            TieBreak::FewerCards => {
                if ledger.card_points(Side::Away) < ledger.card_points(Side::Home) {
                    Side::Away
                } else {
                    Side::Home
                }
            }
        }
    }

    pub fn from_str_policy(s: &str) -> Option<Self> {
        match s {
            "first_listed" => Some(TieBreak::FirstListed),
            "fewer_cards" => Some(TieBreak::FewerCards),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KnockoutError {
    #[error("cannot pair an odd number of teams ({0})")]
    UnpairedTeam(usize),

    #[error("bracket needs {size} teams, got {0}", size = BRACKET_SIZE)]
    BracketSize(usize),

    #[error("the knockout stage is already complete")]
    TournamentComplete,

    #[error("no team named {0}")]
    UnknownTeam(String),

    #[error("match {0} finished level and cannot be resolved")]
    Unresolved(u32),

    #[error("runner returned {played} for fixture {fixture}")]
    FixtureMismatch { fixture: String, played: String },

    #[error(transparent)]
    Match(#[from] MatchError),
}

impl KnockoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KnockoutError::UnpairedTeam(_) | KnockoutError::BracketSize(_) => ErrorKind::Validation,
            KnockoutError::TournamentComplete | KnockoutError::Unresolved(_) => ErrorKind::State,
            KnockoutError::UnknownTeam(_) | KnockoutError::FixtureMismatch { .. } => ErrorKind::Consistency,
            KnockoutError::Match(e) => e.kind(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

/// Result of one knockout round. `winners[i]` and `losers[i]` come from
/// the i-th pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub kind: MatchKind,
    pub winners: Vec<String>,
    pub losers: Vec<String>,
    pub matches: Vec<MatchRecord>,
}

/// Play `teams[2i]` against `teams[2i + 1]` for every i.
///
/// Level scores are settled through `tie_break`, so every pairing yields
/// exactly one winner. Nothing is applied to the teams themselves.
pub fn play_round<R: FixtureRunner + ?Sized>(
    teams: &[String],
    kind: MatchKind,
    runner: &mut R,
    squads: &BTreeMap<String, Team>,
    tie_break: TieBreak,
) -> Result<RoundOutcome, KnockoutError> {
    if teams.len() % 2 != 0 {
        return Err(KnockoutError::UnpairedTeam(teams.len()));
    }

    let lookup = |name: &String| {
        squads
            .get(name)
            .ok_or_else(|| KnockoutError::UnknownTeam(name.clone()))
    };

    let mut outcome = RoundOutcome {
        kind,
        winners: Vec::with_capacity(teams.len() / 2),
        losers: Vec::with_capacity(teams.len() / 2),
        matches: Vec::with_capacity(teams.len() / 2),
    };

    for pair in teams.chunks(2) {
        let home = lookup(&pair[0])?;
        let away = lookup(&pair[1])?;
        let fixture = Fixture {
            kind,
            home: pair[0].clone(),
            away: pair[1].clone(),
        };

        let mut ledger = runner.play(&fixture, home, away)?;
        if !fixture.is_played_by(&ledger) {
            return Err(KnockoutError::FixtureMismatch {
                fixture: fixture.to_string(),
                played: ledger_label(&ledger),
            });
        }
        if ledger.score(Side::Home) == ledger.score(Side::Away) {
            if ledger.is_finished() {
                return Err(KnockoutError::Unresolved(ledger.id()));
            }
            let side = tie_break.pick(&ledger);
            warn!(
                match_id = ledger.id(),
                %kind,
                team = ledger.team(side),
                policy = ?tie_break,
                "level knockout match settled by tiebreak"
            );
            ledger.apply_tiebreak(side)?;
        }
        if !ledger.is_finished() {
            ledger.finish()?;
        }

        let record = ledger.record();
        match (record.winner(), record.loser()) {
            (Some(w), Some(l)) => {
                outcome.winners.push(w.to_string());
                outcome.losers.push(l.to_string());
            }
            _ => return Err(KnockoutError::Unresolved(record.id)),
        }
        outcome.matches.push(record);
    }

    Ok(outcome)
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    RoundOf16,
    QuarterFinal,
    SemiFinal,
    Final,
    Done,
}

impl Stage {
    /// Match kind played at this stage; `None` once the final is over.
    pub fn match_kind(&self) -> Option<MatchKind> {
        match self {
            Stage::RoundOf16 => Some(MatchKind::RoundOf16),
            Stage::QuarterFinal => Some(MatchKind::QuarterFinal),
            Stage::SemiFinal => Some(MatchKind::SemiFinal),
            Stage::Final => Some(MatchKind::Final),
            Stage::Done => None,
        }
    }

    pub fn next(&self) -> Stage {
        match self {
            Stage::RoundOf16 => Stage::QuarterFinal,
            Stage::QuarterFinal => Stage::SemiFinal,
            Stage::SemiFinal => Stage::Final,
            Stage::Final | Stage::Done => Stage::Done,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.match_kind() {
            Some(kind) => write!(f, "{kind}"),
            None => f.write_str("DONE"),
        }
    }
}

/// Final placings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnockoutSummary {
    pub champion: String,
    pub runner_up: String,
    /// Both beaten semifinalists; there is no third-place match.
    pub third_place: [String; 2],
}

/// Progress of the knockout stage. Transitions only go forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Knockout {
    stage: Stage,
    remaining: Vec<String>,
    tie_break: TieBreak,
    rounds: Vec<RoundOutcome>,
    champion: Option<String>,
    runner_up: Option<String>,
    third_place: Vec<String>,
}

impl Knockout {
    /// Seed the round of 16. Entries `2i` and `2i + 1` meet first.
    pub fn new(bracket: Vec<String>, tie_break: TieBreak) -> Result<Self, KnockoutError> {
        if bracket.len() % 2 != 0 {
            return Err(KnockoutError::UnpairedTeam(bracket.len()));
        }
        if bracket.len() != BRACKET_SIZE {
            return Err(KnockoutError::BracketSize(bracket.len()));
        }
        Ok(Knockout {
            stage: Stage::RoundOf16,
            remaining: bracket,
            tie_break,
            rounds: Vec::new(),
            champion: None,
            runner_up: None,
            third_place: Vec::new(),
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Teams still in the competition, in bracket order.
    pub fn remaining(&self) -> &[String] {
        &self.remaining
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Every round played so far.
    pub fn rounds(&self) -> &[RoundOutcome] {
        &self.rounds
    }

    pub fn champion(&self) -> Option<&str> {
        self.champion.as_deref()
    }

    pub fn runner_up(&self) -> Option<&str> {
        self.runner_up.as_deref()
    }

    /// The two beaten semifinalists, once the semifinals are played.
    pub fn third_place(&self) -> &[String] {
        &self.third_place
    }

    /// Play the current round and move to the next stage.
    ///
    /// On error the state is left as it was.
    pub fn advance<R: FixtureRunner + ?Sized>(
        &mut self,
        runner: &mut R,
        teams: &BTreeMap<String, Team>,
    ) -> Result<RoundOutcome, KnockoutError> {
        let kind = self
            .stage
            .match_kind()
            .ok_or(KnockoutError::TournamentComplete)?;

        let outcome = play_round(&self.remaining, kind, runner, teams, self.tie_break)?;

        match self.stage {
            Stage::SemiFinal => self.third_place = outcome.losers.clone(),
            Stage::Final => {
                self.champion = outcome.winners.first().cloned();
                self.runner_up = outcome.losers.first().cloned();
            }
            _ => {}
        }

        let from = self.stage;
        self.remaining = outcome.winners.clone();
        self.stage = self.stage.next();
        self.rounds.push(outcome.clone());
        info!(
            from = %from,
            to = %self.stage,
            remaining = self.remaining.len(),
            "knockout round complete"
        );
        if let Some(champion) = &self.champion {
            info!(champion = %champion, "tournament decided");
        }
        Ok(outcome)
    }

    /// Advance until the final has been played. Returns the rounds played
    /// by this call.
    pub fn run_to_completion<R: FixtureRunner + ?Sized>(
        &mut self,
        runner: &mut R,
        teams: &BTreeMap<String, Team>,
    ) -> Result<Vec<RoundOutcome>, KnockoutError> {
        let mut played = Vec::new();
        while !self.is_complete() {
            played.push(self.advance(runner, teams)?);
        }
        Ok(played)
    }

    /// Final placings, available once the stage is done.
    pub fn summary(&self) -> Option<KnockoutSummary> {
        let champion = self.champion.clone()?;
        let runner_up = self.runner_up.clone()?;
        let third_place = match self.third_place.as_slice() {
            [a, b] => [a.clone(), b.clone()],
            _ => return None,
        };
        Some(KnockoutSummary {
            champion,
            runner_up,
            third_place,
        })
    }
}
