// Tournament orchestration: group stage, qualification, bracket and
// knockout rounds, with results persisted at each round boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bracket::{build_round_of_16, BracketError};
use crate::error::ErrorKind;
use crate::group::Group;
use crate::knockout::{ledger_label, Fixture, FixtureRunner, Knockout, KnockoutError, KnockoutSummary, RoundOutcome, TieBreak};
use crate::ledger::{MatchError, MatchKind, MatchRecord};
use crate::qualification::{select_qualifiers, QualificationError};
use crate::standings::{compute_standings, StandingRow};
use crate::store::{StoreError, TournamentStore};
use crate::team::{Team, TeamError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Teams and groups are being registered.
    Setup,
    /// Every group fixture has been played.
    GroupsPlayed,
    Knockout,
    Complete,
    /// Halted by an error. A failed run is never resumed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TournamentError {
    #[error("team {0} is already registered")]
    DuplicateTeam(String),

    #[error("group {0} is already registered")]
    DuplicateGroup(char),

    #[error("no team named {0}")]
    UnknownTeam(String),

    #[error("group {group} is missing {missing} fixture(s)")]
    IncompleteRoundRobin { group: char, missing: usize },

    #[error("expected phase {expected:?}, tournament is in {actual:?}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("tournament {0} was halted by an earlier failure")]
    Halted(String),

    #[error("runner returned {played} for fixture {fixture}")]
    FixtureMismatch { fixture: String, played: String },

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Team(#[from] TeamError),

    #[error(transparent)]
    Qualification(#[from] QualificationError),

    #[error(transparent)]
    Bracket(#[from] BracketError),

    #[error(transparent)]
    Knockout(#[from] KnockoutError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TournamentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TournamentError::DuplicateTeam(_) | TournamentError::DuplicateGroup(_) => ErrorKind::Validation,
            TournamentError::UnknownTeam(_) | TournamentError::FixtureMismatch { .. } => {
                ErrorKind::Consistency
            }
            TournamentError::IncompleteRoundRobin { .. } => ErrorKind::IncompleteData,
            TournamentError::WrongPhase { .. } | TournamentError::Halted(_) | TournamentError::Store(_) => {
                ErrorKind::State
            }
            TournamentError::Match(e) => e.kind(),
            TournamentError::Team(e) => e.kind(),
            TournamentError::Qualification(e) => e.kind(),
            TournamentError::Bracket(e) => e.kind(),
            TournamentError::Knockout(e) => e.kind(),
        }
    }
}

/// One tournament run, owned by the caller from setup to the final.
#[derive(Debug, Clone)]
pub struct Tournament {
    id: String,
    name: String,
    teams: BTreeMap<String, Team>,
    groups: Vec<Group>,
    group_matches: Vec<MatchRecord>,
    knockout: Option<Knockout>,
    tie_break: TieBreak,
    phase: Phase,
}

impl Tournament {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tie_break: TieBreak) -> Self {
        Tournament {
            id: id.into(),
            name: name.into(),
            teams: BTreeMap::new(),
            groups: Vec::new(),
            group_matches: Vec::new(),
            knockout: None,
            tie_break,
            phase: Phase::Setup,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn teams(&self) -> &BTreeMap<String, Team> {
        &self.teams
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.get(name)
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group_matches(&self) -> &[MatchRecord] {
        &self.group_matches
    }

    pub fn knockout(&self) -> Option<&Knockout> {
        self.knockout.as_ref()
    }

    /// Group and knockout matches, in the order they were played.
    pub fn all_matches(&self) -> Vec<&MatchRecord> {
        let knockout = self
            .knockout
            .iter()
            .flat_map(|k| k.rounds())
            .flat_map(|r| r.matches.iter());
        self.group_matches.iter().chain(knockout).collect()
    }

    pub fn summary(&self) -> Option<KnockoutSummary> {
        self.knockout.as_ref().and_then(Knockout::summary)
    }

    /// Register a group and its teams. Team names must be unique across the
    /// tournament.
    pub fn add_group(&mut self, name: char, teams: Vec<Team>) -> Result<(), TournamentError> {
        self.expect_phase(Phase::Setup)?;
        if self.groups.iter().any(|g| g.name == name) {
            return Err(TournamentError::DuplicateGroup(name));
        }
        for (i, team) in teams.iter().enumerate() {
            if self.teams.contains_key(team.name()) || teams[..i].iter().any(|t| t.name() == team.name()) {
                return Err(TournamentError::DuplicateTeam(team.name().to_string()));
            }
        }

        let names = teams.iter().map(|t| t.name().to_string()).collect();
        for team in teams {
            self.teams.insert(team.name().to_string(), team);
        }
        self.groups.push(Group::new(name, names));
        debug!(group = %name, "group registered");
        Ok(())
    }

    /// Play every round-robin fixture, fold each result into both teams,
    /// then persist teams and matches. Any failure halts the tournament.
    pub fn play_group_stage<R: FixtureRunner + ?Sized>(
        &mut self,
        runner: &mut R,
        store: &dyn TournamentStore,
    ) -> Result<(), TournamentError> {
        self.expect_phase(Phase::Setup)?;
        let result = self.play_group_fixtures(runner, store);
        self.halt_on_error(result)?;
        self.phase = Phase::GroupsPlayed;
        Ok(())
    }

    fn play_group_fixtures<R: FixtureRunner + ?Sized>(
        &mut self,
        runner: &mut R,
        store: &dyn TournamentStore,
    ) -> Result<(), TournamentError> {

        let fixtures: Vec<(String, String)> = self.groups.iter().flat_map(Group::fixtures).collect();
        info!(tournament = %self.id, fixtures = fixtures.len(), "group stage starting");

        for (home, away) in fixtures {
            let fixture = Fixture {
                kind: MatchKind::Group,
                home,
                away,
            };
            let mut ledger = {
                let home = self.lookup(&fixture.home)?;
                let away = self.lookup(&fixture.away)?;
                runner.play(&fixture, home, away)?
            };
            if !fixture.is_played_by(&ledger) {
                return Err(TournamentError::FixtureMismatch {
                    fixture: fixture.to_string(),
                    played: ledger_label(&ledger),
                });
            }
            if !ledger.is_finished() {
                ledger.finish()?;
            }
            let record = ledger.record();
            self.apply(&record)?;
            self.group_matches.push(record);
        }

        self.check_round_robin()?;

        for team in self.teams.values() {
            store.save_team(&self.id, team)?;
        }
        for record in &self.group_matches {
            store.save_match(&self.id, record, &record.venue, &record.referee)?;
        }
        info!(tournament = %self.id, matches = self.group_matches.len(), "group stage complete");
        Ok(())
    }

    /// Current table of every group, keyed by group letter.
    pub fn group_tables(&self) -> BTreeMap<char, Vec<StandingRow>> {
        self.groups
            .iter()
            .map(|g| (g.name, compute_standings(g, &self.group_matches)))
            .collect()
    }

    /// Select qualifiers, build the bracket and seed the knockout stage.
    /// Missing groups or qualifiers halt the tournament.
    pub fn start_knockout(&mut self) -> Result<&Knockout, TournamentError> {
        self.expect_phase(Phase::GroupsPlayed)?;
        let result = self.draw_bracket();
        let knockout = self.halt_on_error(result)?;
        self.phase = Phase::Knockout;
        Ok(self.knockout.insert(knockout))
    }

    fn draw_bracket(&self) -> Result<Knockout, TournamentError> {
        self.check_round_robin()?;

        let qualifiers = select_qualifiers(&self.group_tables())?;
        let bracket = build_round_of_16(&qualifiers)?;
        info!(tournament = %self.id, bracket = ?bracket, "knockout bracket drawn");

        Ok(Knockout::new(bracket, self.tie_break)?)
    }

    /// Play the next knockout round, fold its results into the teams and
    /// persist them. The final placings are saved once the final is over.
    /// Any failure halts the tournament.
    pub fn play_knockout_round<R: FixtureRunner + ?Sized>(
        &mut self,
        runner: &mut R,
        store: &dyn TournamentStore,
    ) -> Result<RoundOutcome, TournamentError> {
        self.expect_phase(Phase::Knockout)?;
        let result = self.play_next_round(runner, store);
        self.halt_on_error(result)
    }

    fn play_next_round<R: FixtureRunner + ?Sized>(
        &mut self,
        runner: &mut R,
        store: &dyn TournamentStore,
    ) -> Result<RoundOutcome, TournamentError> {
        let knockout = self.knockout.as_mut().ok_or(TournamentError::WrongPhase {
            expected: Phase::Knockout,
            actual: self.phase,
        })?;
        let outcome = knockout.advance(runner, &self.teams)?;
        let complete = knockout.is_complete();

        for record in &outcome.matches {
            self.apply(record)?;
        }
        for name in outcome.winners.iter().chain(&outcome.losers) {
            store.save_team(&self.id, self.lookup(name)?)?;
        }
        for record in &outcome.matches {
            store.save_match(&self.id, record, &record.venue, &record.referee)?;
        }

        if complete {
            if let Some(summary) = self.summary() {
                store.save_summary(&self.id, &summary)?;
                info!(
                    tournament = %self.id,
                    champion = %summary.champion,
                    runner_up = %summary.runner_up,
                    "tournament complete"
                );
            }
            self.phase = Phase::Complete;
        }
        Ok(outcome)
    }

    /// Run every remaining step through to the final.
    pub fn run<R: FixtureRunner + ?Sized>(
        &mut self,
        runner: &mut R,
        store: &dyn TournamentStore,
    ) -> Result<KnockoutSummary, TournamentError> {
        if self.phase == Phase::Failed {
            return Err(TournamentError::Halted(self.id.clone()));
        }
        if self.phase == Phase::Setup {
            self.play_group_stage(runner, store)?;
        }
        if self.phase == Phase::GroupsPlayed {
            self.start_knockout()?;
        }
        while self.phase == Phase::Knockout {
            self.play_knockout_round(runner, store)?;
        }
        self.summary().ok_or(TournamentError::WrongPhase {
            expected: Phase::Complete,
            actual: self.phase,
        })
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), TournamentError> {
        if self.phase == Phase::Failed {
            return Err(TournamentError::Halted(self.id.clone()));
        }
        if self.phase != expected {
            return Err(TournamentError::WrongPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn halt_on_error<T>(&mut self, result: Result<T, TournamentError>) -> Result<T, TournamentError> {
        if let Err(e) = &result {
            warn!(tournament = %self.id, phase = ?self.phase, kind = %e.kind(), "tournament halted: {e}");
            self.phase = Phase::Failed;
        }
        result
    }

    fn lookup(&self, name: &str) -> Result<&Team, TournamentError> {
        self.teams
            .get(name)
            .ok_or_else(|| TournamentError::UnknownTeam(name.to_string()))
    }

    /// Fold a finished match into both participants.
    fn apply(&mut self, record: &MatchRecord) -> Result<(), TournamentError> {
        for name in [&record.home, &record.away] {
            self.teams
                .get_mut(name.as_str())
                .ok_or_else(|| TournamentError::UnknownTeam(name.clone()))?
                .record_result(record)?;
        }
        Ok(())
    }

    fn check_round_robin(&self) -> Result<(), TournamentError> {
        for group in &self.groups {
            let missing = group.missing_fixtures(&self.group_matches).len();
            if missing > 0 {
                return Err(TournamentError::IncompleteRoundRobin {
                    group: group.name,
                    missing,
                });
            }
        }
        Ok(())
    }
}
