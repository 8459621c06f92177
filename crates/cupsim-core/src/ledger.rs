// Match event ledger: goals, cards and substitutions recorded against the
// two match-day rosters, plus the read-only record handed to standings,
// teams and persistence.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::ErrorKind;
use crate::player::{CardKind, Player, PlayerId};
use crate::roster::{Roster, RosterError, STARTING_SIZE};
use crate::team::Team;

/// Latest minute an event may carry (extra time plus stoppage).
pub const MAX_MINUTE: u32 = 150;
/// Substitutions allowed per team per match.
pub const MAX_SUBSTITUTIONS: u8 = 3;

// ---------------------------------------------------------------------------
// Match kinds and sides
// ---------------------------------------------------------------------------

/// The competition round a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchKind {
    Group,
    RoundOf16,
    QuarterFinal,
    SemiFinal,
    Final,
}

impl MatchKind {
    /// Knockout matches must produce a winner.
    pub fn is_knockout(&self) -> bool {
        !matches!(self, MatchKind::Group)
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            MatchKind::Group => "GROUP",
            MatchKind::RoundOf16 => "ROUND_OF_16",
            MatchKind::QuarterFinal => "QUARTER",
            MatchKind::SemiFinal => "SEMI",
            MatchKind::Final => "FINAL",
        }
    }

    pub fn from_str_kind(s: &str) -> Option<Self> {
        match s {
            "GROUP" => Some(MatchKind::Group),
            "ROUND_OF_16" => Some(MatchKind::RoundOf16),
            "QUARTER" => Some(MatchKind::QuarterFinal),
            "SEMI" => Some(MatchKind::SemiFinal),
            "FINAL" => Some(MatchKind::Final),
            _ => None,
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub match_id: u32,
    pub scorer: PlayerId,
    pub team: String,
    pub minute: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub match_id: u32,
    pub player: PlayerId,
    pub team: String,
    pub kind: CardKind,
    pub minute: u32,
    /// Whether this card sent the player off.
    pub sent_off: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub match_id: u32,
    pub player_in: PlayerId,
    pub player_out: PlayerId,
    pub team: String,
    pub minute: u32,
}

/// One entry in a match's audit trail, in the order it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    Goal(Goal),
    Card(Card),
    Substitution(Substitution),
    /// Decisive increment awarded to a level knockout match.
    Tiebreak { team: String },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("a team cannot play itself: {0}")]
    SameTeam(String),

    #[error("{team} has {starters} starters, need {need}", need = STARTING_SIZE)]
    InvalidRoster { team: String, starters: usize },

    #[error("minute {0} is outside 0..={max}", max = MAX_MINUTE)]
    InvalidMinute(u32),

    #[error("unknown card type: {0}")]
    InvalidCardType(String),

    #[error("{player} is not on the pitch for {team}")]
    PlayerNotEligible { player: PlayerId, team: String },

    #[error("team {0} is not part of this match")]
    TeamNotInMatch(String),

    #[error("{0} is not part of this match")]
    PlayerNotInMatch(PlayerId),

    #[error("{player} does not play for {team}")]
    PlayerNotOnTeam { player: PlayerId, team: String },

    #[error("{0} has already been sent off")]
    AlreadySentOff(PlayerId),

    #[error("{0} has already made {max} substitutions", max = MAX_SUBSTITUTIONS)]
    SubstitutionLimitExceeded(String),

    #[error("match {0} is already finished")]
    MatchAlreadyFinished(u32),

    #[error("match {0} is not level, no tiebreak needed")]
    NotADraw(u32),

    #[error("{0} matches may end in a draw")]
    NotKnockout(MatchKind),

    #[error(transparent)]
    Roster(#[from] RosterError),
}

impl MatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::SameTeam(_)
            | MatchError::InvalidRoster { .. }
            | MatchError::InvalidMinute(_)
            | MatchError::InvalidCardType(_)
            | MatchError::PlayerNotEligible { .. } => ErrorKind::Validation,
            MatchError::TeamNotInMatch(_)
            | MatchError::PlayerNotInMatch(_)
            | MatchError::PlayerNotOnTeam { .. } => ErrorKind::Consistency,
            MatchError::AlreadySentOff(_)
            | MatchError::SubstitutionLimitExceeded(_)
            | MatchError::MatchAlreadyFinished(_)
            | MatchError::NotADraw(_)
            | MatchError::NotKnockout(_) => ErrorKind::State,
            MatchError::Roster(e) => e.kind(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Match-day state of one side.
#[derive(Debug, Clone)]
struct SideState {
    team: String,
    roster: Roster,
    score: u32,
    substitutions: u8,
    sent_off: Vec<Player>,
}

impl SideState {
    fn new(team: &Team) -> Self {
        SideState {
            team: team.name().to_string(),
            roster: team.roster().for_match(),
            score: 0,
            substitutions: 0,
            sent_off: Vec::new(),
        }
    }

    fn has_sent_off(&self, id: &PlayerId) -> bool {
        self.sent_off.iter().any(|p| p.id() == id)
    }

    /// On the roster now, or sent off earlier in the match.
    fn knows(&self, id: &PlayerId) -> bool {
        self.roster.contains(id) || self.has_sent_off(id)
    }
}

/// The live record of a single match.
///
/// Every rule violation is returned as a [`MatchError`] and leaves the
/// ledger untouched. Events are expected in minute order but minutes are
/// only range-checked.
#[derive(Debug, Clone)]
pub struct MatchLedger {
    id: u32,
    kind: MatchKind,
    home: SideState,
    away: SideState,
    events: Vec<MatchEvent>,
    finished: bool,
    tiebreak: Option<Side>,
    venue: String,
    referee: String,
}

impl MatchLedger {
    /// Open a ledger between two teams using match-scoped copies of their
    /// rosters.
    pub fn new(id: u32, kind: MatchKind, home: &Team, away: &Team) -> Result<Self, MatchError> {
        if home.name() == away.name() {
            return Err(MatchError::SameTeam(home.name().to_string()));
        }
        for team in [home, away] {
            if !team.roster().is_complete() {
                return Err(MatchError::InvalidRoster {
                    team: team.name().to_string(),
                    starters: team.roster().starting().len(),
                });
            }
        }

        Ok(MatchLedger {
            id,
            kind,
            home: SideState::new(home),
            away: SideState::new(away),
            events: Vec::new(),
            finished: false,
            tiebreak: None,
            venue: String::new(),
            referee: String::new(),
        })
    }

    /// Attach cosmetic match-day details.
    pub fn set_officials(&mut self, venue: impl Into<String>, referee: impl Into<String>) {
        self.venue = venue.into();
        self.referee = referee.into();
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    pub fn team(&self, side: Side) -> &str {
        &self.side(side).team
    }

    pub fn score(&self, side: Side) -> u32 {
        self.side(side).score
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn events(&self) -> &[MatchEvent] {
        &self.events
    }

    /// Which side `team` is playing on.
    pub fn side_of(&self, team: &str) -> Option<Side> {
        if self.home.team == team {
            Some(Side::Home)
        } else if self.away.team == team {
            Some(Side::Away)
        } else {
            None
        }
    }

    /// The match-day roster of `team`.
    pub fn roster(&self, team: &str) -> Option<&Roster> {
        self.side_of(team).map(|s| &self.side(s).roster)
    }

    pub fn substitution_count(&self, team: &str) -> Option<u8> {
        self.side_of(team).map(|s| self.side(s).substitutions)
    }

    /// Players sent off so far, in the order it happened.
    pub fn sent_off(&self, team: &str) -> Option<&[Player]> {
        self.side_of(team).map(|s| self.side(s).sent_off.as_slice())
    }

    /// Card points for a side in this match (yellow 1, red 3).
    pub fn card_points(&self, side: Side) -> u32 {
        let team = &self.side(side).team;
        self.events
            .iter()
            .filter_map(|e| match e {
                MatchEvent::Card(c) if &c.team == team => Some(match c.kind {
                    CardKind::Yellow => 1,
                    CardKind::Red => 3,
                }),
                _ => None,
            })
            .sum()
    }

    /// Record a goal for `team` scored by `scorer`.
    pub fn record_goal(&mut self, scorer: &PlayerId, team: &str, minute: u32) -> Result<Goal, MatchError> {
        self.ensure_open()?;
        check_minute(minute)?;
        let side = self.locate(scorer, team)?;

        let state = self.side_mut(side);
        if !state.roster.is_starting(scorer) {
            return Err(MatchError::PlayerNotEligible {
                player: scorer.clone(),
                team: team.to_string(),
            });
        }
        if let Some(player) = state.roster.find_mut(scorer) {
            player.record_goal();
        }
        state.score += 1;

        let goal = Goal {
            match_id: self.id,
            scorer: scorer.clone(),
            team: team.to_string(),
            minute,
        };
        debug!(match_id = self.id, %scorer, team, minute, "goal");
        self.events.push(MatchEvent::Goal(goal.clone()));
        Ok(goal)
    }

    /// Record a card given as text ("YELLOW" / "RED").
    pub fn record_card_str(
        &mut self,
        player: &PlayerId,
        team: &str,
        kind: &str,
        minute: u32,
    ) -> Result<Card, MatchError> {
        let kind = kind
            .parse::<CardKind>()
            .map_err(|e| MatchError::InvalidCardType(e.0))?;
        self.record_card(player, team, kind, minute)
    }

    /// Book a player. A second yellow or a red removes the player from the
    /// match-day roster for the rest of the match.
    pub fn record_card(
        &mut self,
        player: &PlayerId,
        team: &str,
        kind: CardKind,
        minute: u32,
    ) -> Result<Card, MatchError> {
        self.ensure_open()?;
        check_minute(minute)?;
        let side = self.locate(player, team)?;

        let match_id = self.id;
        let state = self.side_mut(side);
        if state.has_sent_off(player) {
            return Err(MatchError::AlreadySentOff(player.clone()));
        }

        let sent_off = state
            .roster
            .find_mut(player)
            .map(|p| p.record_card(kind))
            .unwrap_or(false);
        if sent_off {
            if let Some(p) = state.roster.send_off(player) {
                state.sent_off.push(p);
            }
            info!(match_id, %player, team, minute, "player sent off");
        } else {
            debug!(match_id, %player, team, %kind, minute, "card");
        }

        let card = Card {
            match_id,
            player: player.clone(),
            team: team.to_string(),
            kind,
            minute,
            sent_off,
        };
        self.events.push(MatchEvent::Card(card.clone()));
        Ok(card)
    }

    /// Replace `out` with `incoming` for `team`.
    pub fn record_substitution(
        &mut self,
        team: &str,
        out: &PlayerId,
        incoming: &PlayerId,
        minute: u32,
    ) -> Result<Substitution, MatchError> {
        self.ensure_open()?;
        check_minute(minute)?;
        let side = self
            .side_of(team)
            .ok_or_else(|| MatchError::TeamNotInMatch(team.to_string()))?;

        let state = self.side_mut(side);
        if state.substitutions >= MAX_SUBSTITUTIONS {
            return Err(MatchError::SubstitutionLimitExceeded(team.to_string()));
        }
        state.roster.substitute(out, incoming)?;
        state.substitutions += 1;

        let sub = Substitution {
            match_id: self.id,
            player_in: incoming.clone(),
            player_out: out.clone(),
            team: team.to_string(),
            minute,
        };
        debug!(match_id = self.id, team, %out, %incoming, minute, "substitution");
        self.events.push(MatchEvent::Substitution(sub.clone()));
        Ok(sub)
    }

    /// Award the decisive increment of a level knockout match to `side`.
    pub fn apply_tiebreak(&mut self, side: Side) -> Result<(), MatchError> {
        self.ensure_open()?;
        if !self.kind.is_knockout() {
            return Err(MatchError::NotKnockout(self.kind));
        }
        if self.home.score != self.away.score {
            return Err(MatchError::NotADraw(self.id));
        }

        let state = self.side_mut(side);
        state.score += 1;
        let team = state.team.clone();
        info!(match_id = self.id, team = %team, "level match decided by tiebreak");
        self.events.push(MatchEvent::Tiebreak { team });
        self.tiebreak = Some(side);
        Ok(())
    }

    /// Close the match. No further events are accepted.
    pub fn finish(&mut self) -> Result<(), MatchError> {
        self.ensure_open()?;
        self.finished = true;
        debug!(
            match_id = self.id,
            home = %self.home.team,
            away = %self.away.team,
            score = %format!("{}-{}", self.home.score, self.away.score),
            "match finished"
        );
        Ok(())
    }

    /// Read-only snapshot of the match.
    pub fn record(&self) -> MatchRecord {
        MatchRecord {
            id: self.id,
            kind: self.kind,
            home: self.home.team.clone(),
            away: self.away.team.clone(),
            home_score: self.home.score,
            away_score: self.away.score,
            events: self.events.clone(),
            finished: self.finished,
            tiebreak_winner: self.tiebreak.map(|s| self.side(s).team.clone()),
            venue: self.venue.clone(),
            referee: self.referee.clone(),
        }
    }

    fn side(&self, side: Side) -> &SideState {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    fn ensure_open(&self) -> Result<(), MatchError> {
        if self.finished {
            return Err(MatchError::MatchAlreadyFinished(self.id));
        }
        Ok(())
    }

    /// Resolve `team` to a side and check `player` belongs to it.
    fn locate(&self, player: &PlayerId, team: &str) -> Result<Side, MatchError> {
        let side = self.side_of(team);
        let known_home = self.home.knows(player);
        let known_away = self.away.knows(player);
        if !known_home && !known_away {
            return Err(MatchError::PlayerNotInMatch(player.clone()));
        }
        let side = side.ok_or_else(|| MatchError::TeamNotInMatch(team.to_string()))?;
        if !self.side(side).knows(player) {
            return Err(MatchError::PlayerNotOnTeam {
                player: player.clone(),
                team: team.to_string(),
            });
        }
        Ok(side)
    }
}

fn check_minute(minute: u32) -> Result<(), MatchError> {
    if minute > MAX_MINUTE {
        return Err(MatchError::InvalidMinute(minute));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A read-only snapshot of a match, as consumed by standings, teams and
/// persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: u32,
    pub kind: MatchKind,
    pub home: String,
    pub away: String,
    pub home_score: u32,
    pub away_score: u32,
    pub events: Vec<MatchEvent>,
    pub finished: bool,
    /// Team that received the decisive increment of a level knockout match.
    #[serde(default)]
    pub tiebreak_winner: Option<String>,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub referee: String,
}

impl MatchRecord {
    pub fn involves(&self, team: &str) -> bool {
        self.home == team || self.away == team
    }

    pub fn side_of(&self, team: &str) -> Option<Side> {
        if self.home == team {
            Some(Side::Home)
        } else if self.away == team {
            Some(Side::Away)
        } else {
            None
        }
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home_score,
            Side::Away => self.away_score,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.home_score == self.away_score
    }

    pub fn winner_side(&self) -> Option<Side> {
        match self.home_score.cmp(&self.away_score) {
            std::cmp::Ordering::Greater => Some(Side::Home),
            std::cmp::Ordering::Less => Some(Side::Away),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner_side().map(|s| self.team(s))
    }

    pub fn loser(&self) -> Option<&str> {
        self.winner_side().map(|s| self.team(s.opposite()))
    }

    pub fn goals(&self) -> impl Iterator<Item = &Goal> {
        self.events.iter().filter_map(|e| match e {
            MatchEvent::Goal(g) => Some(g),
            _ => None,
        })
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.events.iter().filter_map(|e| match e {
            MatchEvent::Card(c) => Some(c),
            _ => None,
        })
    }

    pub fn substitutions(&self) -> impl Iterator<Item = &Substitution> {
        self.events.iter().filter_map(|e| match e {
            MatchEvent::Substitution(s) => Some(s),
            _ => None,
        })
    }
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{} {}",
            self.home, self.home_score, self.away_score, self.away
        )?;
        if let Some(team) = &self.tiebreak_winner {
            write!(f, " ({team} on tiebreak)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Position;
    use crate::team::test_support::team_with_squad;

    fn pid(team: &str, n: u8) -> PlayerId {
        team_with_squad(team, 7).roster().players().find(|p| p.shirt_number() == n).unwrap().id().clone()
    }

    fn ledger(kind: MatchKind) -> MatchLedger {
        let home = team_with_squad("Brazil", 7);
        let away = team_with_squad("Germany", 7);
        MatchLedger::new(1, kind, &home, &away).unwrap()
    }

    #[test]
    fn rejects_same_team() {
        let t = team_with_squad("Brazil", 3);
        assert_eq!(
            MatchLedger::new(1, MatchKind::Group, &t, &t).unwrap_err(),
            MatchError::SameTeam("Brazil".into())
        );
    }

    #[test]
    fn rejects_short_lineup() {
        let home = team_with_squad("Brazil", 3);
        let away = Team::new("Chile", "CONMEBOL");
        let err = MatchLedger::new(1, MatchKind::Group, &home, &away).unwrap_err();
        assert_eq!(
            err,
            MatchError::InvalidRoster {
                team: "Chile".into(),
                starters: 0
            }
        );
        assert_eq!(err.to_string(), "Chile has 0 starters, need 11");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn goal_updates_score_and_scorer() {
        let mut m = ledger(MatchKind::Group);
        let scorer = pid("Brazil", 9);
        let goal = m.record_goal(&scorer, "Brazil", 23).unwrap();
        assert_eq!(goal.minute, 23);
        assert_eq!(m.score(Side::Home), 1);
        assert_eq!(m.score(Side::Away), 0);
        assert_eq!(m.roster("Brazil").unwrap().find(&scorer).unwrap().goals(), 1);
    }

    #[test]
    fn events_carry_their_match_id() {
        let home = team_with_squad("Brazil", 7);
        let away = team_with_squad("Germany", 7);
        let mut m = MatchLedger::new(42, MatchKind::Group, &home, &away).unwrap();
        let goal = m.record_goal(&pid("Brazil", 9), "Brazil", 5).unwrap();
        let card = m.record_card(&pid("Germany", 4), "Germany", CardKind::Yellow, 6).unwrap();
        let sub = m
            .record_substitution("Brazil", &pid("Brazil", 10), &pid("Brazil", 12), 60)
            .unwrap();
        assert_eq!((goal.match_id, card.match_id, sub.match_id), (42, 42, 42));

        // Still self-describing once pulled out of the record.
        let events = m.record().events;
        let ids: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                MatchEvent::Goal(g) => Some(g.match_id),
                MatchEvent::Card(c) => Some(c.match_id),
                MatchEvent::Substitution(s) => Some(s.match_id),
                MatchEvent::Tiebreak { .. } => None,
            })
            .collect();
        assert_eq!(ids, vec![42, 42, 42]);
    }

    #[test]
    fn goal_validation() {
        let mut m = ledger(MatchKind::Group);
        let stranger = PlayerId::new("Nobody", 99, Position::Forward);
        assert_eq!(
            m.record_goal(&stranger, "Brazil", 10),
            Err(MatchError::PlayerNotInMatch(stranger.clone()))
        );
        assert_eq!(
            m.record_goal(&pid("Brazil", 9), "France", 10),
            Err(MatchError::TeamNotInMatch("France".into()))
        );
        assert_eq!(
            m.record_goal(&pid("Brazil", 9), "Brazil", 151),
            Err(MatchError::InvalidMinute(151))
        );
        assert!(matches!(
            m.record_goal(&pid("Germany", 9), "Brazil", 10),
            Err(MatchError::PlayerNotOnTeam { .. })
        ));
        // Bench players cannot score.
        assert!(matches!(
            m.record_goal(&pid("Brazil", 12), "Brazil", 10),
            Err(MatchError::PlayerNotEligible { .. })
        ));
        assert_eq!(m.score(Side::Home), 0);
        assert!(m.events().is_empty());
    }

    #[test]
    fn minute_bounds_inclusive() {
        let mut m = ledger(MatchKind::Group);
        assert!(m.record_goal(&pid("Brazil", 9), "Brazil", 0).is_ok());
        assert!(m.record_goal(&pid("Brazil", 9), "Brazil", MAX_MINUTE).is_ok());
        assert_eq!(
            MatchError::InvalidMinute(151).to_string(),
            "minute 151 is outside 0..=150"
        );
    }

    #[test]
    fn second_yellow_removes_player() {
        let mut m = ledger(MatchKind::Group);
        let p = pid("Germany", 5);
        let first = m.record_card(&p, "Germany", CardKind::Yellow, 20).unwrap();
        assert!(!first.sent_off);
        let second = m.record_card(&p, "Germany", CardKind::Yellow, 60).unwrap();
        assert!(second.sent_off);

        let roster = m.roster("Germany").unwrap();
        assert!(!roster.contains(&p));
        assert_eq!(roster.starting().len(), 10);
        assert_eq!(m.sent_off("Germany").unwrap().len(), 1);
        assert!(m.sent_off("Germany").unwrap()[0].is_sent_off());

        assert_eq!(
            m.record_card(&p, "Germany", CardKind::Red, 70),
            Err(MatchError::AlreadySentOff(p.clone()))
        );
        assert!(matches!(
            m.record_goal(&p, "Germany", 75),
            Err(MatchError::PlayerNotEligible { .. })
        ));
    }

    #[test]
    fn red_card_player_cannot_be_substituted_off() {
        let mut m = ledger(MatchKind::Group);
        let p = pid("Brazil", 4);
        m.record_card(&p, "Brazil", CardKind::Red, 30).unwrap();
        assert_eq!(
            m.record_substitution("Brazil", &p, &pid("Brazil", 12), 40),
            Err(MatchError::Roster(RosterError::NotInStarting(p.clone())))
        );
        assert_eq!(m.substitution_count("Brazil"), Some(0));
    }

    #[test]
    fn sent_off_substitute_cannot_come_on() {
        let mut m = ledger(MatchKind::Group);
        let bench = pid("Brazil", 13);
        m.record_card(&bench, "Brazil", CardKind::Red, 30).unwrap();
        assert!(matches!(
            m.record_substitution("Brazil", &pid("Brazil", 9), &bench, 40),
            Err(MatchError::Roster(RosterError::NotEligibleSubstitute(_)))
        ));
    }

    #[test]
    fn card_type_parsed_from_text() {
        let mut m = ledger(MatchKind::Group);
        let p = pid("Brazil", 6);
        let err = m.record_card_str(&p, "Brazil", "BLUE", 10).unwrap_err();
        assert_eq!(err, MatchError::InvalidCardType("BLUE".into()));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(m.record_card_str(&p, "Brazil", "yellow", 10).is_ok());
    }

    #[test]
    fn fourth_substitution_rejected() {
        let mut m = ledger(MatchKind::Group);
        for (i, (out, inc)) in [(9, 12), (10, 13), (11, 14)].into_iter().enumerate() {
            m.record_substitution("Brazil", &pid("Brazil", out), &pid("Brazil", inc), 60 + i as u32)
                .unwrap();
        }
        let err = m
            .record_substitution("Brazil", &pid("Brazil", 8), &pid("Brazil", 15), 80)
            .unwrap_err();
        assert_eq!(err, MatchError::SubstitutionLimitExceeded("Brazil".into()));
        assert_eq!(err.to_string(), "Brazil has already made 3 substitutions");
        assert_eq!(err.kind(), ErrorKind::State);

        // The other side keeps its own quota.
        assert!(m
            .record_substitution("Germany", &pid("Germany", 9), &pid("Germany", 12), 81)
            .is_ok());
    }

    #[test]
    fn failed_substitution_does_not_use_quota() {
        let mut m = ledger(MatchKind::Group);
        assert!(m
            .record_substitution("Brazil", &pid("Brazil", 12), &pid("Brazil", 13), 50)
            .is_err());
        assert_eq!(m.substitution_count("Brazil"), Some(0));
    }

    #[test]
    fn finished_match_is_frozen() {
        let mut m = ledger(MatchKind::Group);
        m.record_goal(&pid("Brazil", 9), "Brazil", 10).unwrap();
        m.finish().unwrap();
        assert_eq!(
            m.record_goal(&pid("Brazil", 9), "Brazil", 11),
            Err(MatchError::MatchAlreadyFinished(1))
        );
        assert_eq!(m.finish(), Err(MatchError::MatchAlreadyFinished(1)));
        let rec = m.record();
        assert!(rec.finished);
        assert_eq!(rec.home_score, 1);
        assert_eq!(rec.winner(), Some("Brazil"));
    }

    #[test]
    fn tiebreak_only_for_level_knockout() {
        let mut group = ledger(MatchKind::Group);
        assert_eq!(
            group.apply_tiebreak(Side::Home),
            Err(MatchError::NotKnockout(MatchKind::Group))
        );

        let mut ko = ledger(MatchKind::SemiFinal);
        ko.record_goal(&pid("Germany", 10), "Germany", 5).unwrap();
        assert_eq!(ko.apply_tiebreak(Side::Home), Err(MatchError::NotADraw(1)));

        ko.record_goal(&pid("Brazil", 10), "Brazil", 88).unwrap();
        ko.apply_tiebreak(Side::Home).unwrap();
        ko.finish().unwrap();
        let rec = ko.record();
        assert_eq!((rec.home_score, rec.away_score), (2, 1));
        assert_eq!(rec.tiebreak_winner.as_deref(), Some("Brazil"));
        assert_eq!(rec.to_string(), "Brazil 2-1 Germany (Brazil on tiebreak)");
    }

    #[test]
    fn card_points_weigh_reds() {
        let mut m = ledger(MatchKind::Group);
        m.record_card(&pid("Brazil", 2), "Brazil", CardKind::Yellow, 5).unwrap();
        m.record_card(&pid("Germany", 3), "Germany", CardKind::Red, 6).unwrap();
        assert_eq!(m.card_points(Side::Home), 1);
        assert_eq!(m.card_points(Side::Away), 3);
    }

    #[test]
    fn record_round_trips_through_json() {
        let mut m = ledger(MatchKind::Final);
        m.record_goal(&pid("Brazil", 9), "Brazil", 12).unwrap();
        m.record_card(&pid("Germany", 4), "Germany", CardKind::Yellow, 30).unwrap();
        m.set_officials("Estadio Azul", "P. Collina");
        m.finish().unwrap();
        let rec = m.record();
        let json = serde_json::to_string(&rec).unwrap();
        let back: MatchRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
        assert_eq!(back.goals().count(), 1);
        assert_eq!(back.cards().count(), 1);
    }
}
