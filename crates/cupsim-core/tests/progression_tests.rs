// Integration tests for the progression engine.
//
// These drive the public API end to end: match ledgers feeding group tables,
// qualification and the bracket, knockout rounds through a scripted runner,
// and a store that fails at a round boundary.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

use cupsim_core::bracket::build_round_of_16;
use cupsim_core::error::ErrorKind;
use cupsim_core::group::Group;
use cupsim_core::knockout::{play_round, Fixture, FixtureRunner, KnockoutSummary, Stage, TieBreak};
use cupsim_core::ledger::{MatchError, MatchKind, MatchLedger, MatchRecord};
use cupsim_core::player::{CardKind, Player, Position};
use cupsim_core::qualification::select_qualifiers;
use cupsim_core::standings::compute_standings;
use cupsim_core::store::{MemoryStore, StoreError, TournamentStore};
use cupsim_core::team::Team;
use cupsim_core::tournament::{Phase, Tournament, TournamentError};

// ===========================================================================
// Test helpers
// ===========================================================================

fn squad(name: &str) -> Team {
    let mut team = Team::new(name, "Test");
    let shape = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Defender,
        Position::Defender,
        Position::Defender,
        Position::Midfielder,
        Position::Midfielder,
        Position::Midfielder,
        Position::Midfielder,
        Position::Forward,
        Position::Forward,
    ];
    for (i, pos) in shape.into_iter().enumerate() {
        let n = i as u8 + 1;
        team.add_starting_player(Player::new(format!("{name} {n}"), n, pos))
            .unwrap();
    }
    for n in 12..=18u8 {
        team.add_substitute_player(Player::new(format!("{name} {n}"), n, Position::Midfielder))
            .unwrap();
    }
    team
}

fn striker(team: &Team) -> cupsim_core::player::PlayerId {
    team.roster().starting()[10].id().clone()
}

/// Plays fixed scores; pairings without a script end 2-0 to the home side.
#[derive(Default)]
struct Scripted {
    next_id: u32,
    scores: HashMap<(String, String), (u32, u32)>,
}

impl Scripted {
    fn with(mut self, home: &str, away: &str, h: u32, a: u32) -> Self {
        self.scores.insert((home.into(), away.into()), (h, a));
        self
    }
}

impl FixtureRunner for Scripted {
    fn play(&mut self, fixture: &Fixture, home: &Team, away: &Team) -> Result<MatchLedger, MatchError> {
        self.next_id += 1;
        let mut ledger = MatchLedger::new(self.next_id, fixture.kind, home, away)?;
        ledger.set_officials("Test Ground", "A. Referee");
        let (h, a) = self
            .scores
            .get(&(fixture.home.clone(), fixture.away.clone()))
            .copied()
            .unwrap_or((2, 0));
        for i in 0..h {
            ledger.record_goal(&striker(home), home.name(), 10 + i)?;
        }
        for i in 0..a {
            ledger.record_goal(&striker(away), away.name(), 60 + i)?;
        }
        Ok(ledger)
    }
}

/// Accepts everything until the configured number of match saves, then
/// fails.
struct FlakyStore {
    inner: MemoryStore,
    saves_left: Cell<usize>,
}

impl TournamentStore for FlakyStore {
    fn save_team(&self, id: &str, team: &Team) -> Result<(), StoreError> {
        self.inner.save_team(id, team)
    }

    fn save_match(&self, id: &str, record: &MatchRecord, venue: &str, referee: &str) -> Result<(), StoreError> {
        if self.saves_left.get() == 0 {
            return Err(StoreError::new("save_match", "connection lost"));
        }
        self.saves_left.set(self.saves_left.get() - 1);
        self.inner.save_match(id, record, venue, referee)
    }

    fn load_teams(&self, id: &str) -> Result<Vec<Team>, StoreError> {
        self.inner.load_teams(id)
    }

    fn load_matches(&self, id: &str) -> Result<Vec<MatchRecord>, StoreError> {
        self.inner.load_matches(id)
    }

    fn save_summary(&self, id: &str, summary: &KnockoutSummary) -> Result<(), StoreError> {
        self.inner.save_summary(id, summary)
    }
}

fn full_field() -> Tournament {
    let mut t = Tournament::new("cup_it", "Integration Cup", TieBreak::FirstListed);
    for g in ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'] {
        let teams = (1..=4).map(|n| squad(&format!("{g}{n}"))).collect();
        t.add_group(g, teams).unwrap();
    }
    t
}

// ===========================================================================
// Group stage
// ===========================================================================

#[test]
fn ledger_results_drive_group_table() {
    let names = ["W", "X", "Y", "Z"];
    let teams: BTreeMap<&str, Team> = names.iter().map(|&n| (n, squad(n))).collect();
    let results = [
        ("W", 2, "X", 1),
        ("W", 2, "Y", 0),
        ("W", 2, "Z", 0),
        ("X", 2, "Y", 1),
        ("X", 2, "Z", 1),
        ("Y", 1, "Z", 1),
    ];

    let mut records = Vec::new();
    for (id, (home, hs, away, aws)) in results.into_iter().enumerate() {
        let (h, a) = (&teams[home], &teams[away]);
        let mut m = MatchLedger::new(id as u32 + 1, MatchKind::Group, h, a).unwrap();
        for i in 0..hs {
            m.record_goal(&striker(h), home, 20 + i).unwrap();
        }
        for i in 0..aws {
            m.record_goal(&striker(a), away, 70 + i).unwrap();
        }
        m.finish().unwrap();
        records.push(m.record());
    }

    let group = Group::new('A', names.iter().rev().map(|s| s.to_string()).collect());
    let table = compute_standings(&group, &records);
    let order: Vec<&str> = table.iter().map(|r| r.team.as_str()).collect();
    assert_eq!(order, vec!["W", "X", "Y", "Z"]);
    assert_eq!(table[0].points, 9);
    assert_eq!(table[0].goal_difference(), 5);

    // Y and Z are level on every key; the name decides, every time.
    for _ in 0..3 {
        assert_eq!(compute_standings(&group, &records), table);
    }

    let mut tables = BTreeMap::new();
    tables.insert('A', table);
    let q = select_qualifiers(&tables).unwrap();
    assert_eq!(q[&'A'].winner, "W");
    assert_eq!(q[&'A'].runner_up, "X");
    assert!(build_round_of_16(&q).is_err());
}

#[test]
fn cards_accumulate_per_match_only() {
    let home = squad("Home");
    let away = squad("Away");
    let defender = home.roster().starting()[3].id().clone();

    let mut first = MatchLedger::new(1, MatchKind::Group, &home, &away).unwrap();
    first.record_card(&defender, "Home", CardKind::Yellow, 12).unwrap();
    first.finish().unwrap();

    // One yellow in each match never sends the player off.
    let mut second = MatchLedger::new(2, MatchKind::Group, &home, &away).unwrap();
    let card = second.record_card(&defender, "Home", CardKind::Yellow, 40).unwrap();
    assert!(!card.sent_off);
    assert!(second.roster("Home").unwrap().is_starting(&defender));

    let again = second.record_card(&defender, "Home", CardKind::Yellow, 41).unwrap();
    assert!(again.sent_off);
    let err = second.record_card(&defender, "Home", CardKind::Yellow, 42).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
}

// ===========================================================================
// Knockout
// ===========================================================================

#[test]
fn semifinals_produce_final_and_joint_third() {
    let names: Vec<String> = ["Brazil", "Germany", "Argentina", "France"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let teams: BTreeMap<String, Team> = names.iter().map(|n| (n.clone(), squad(n))).collect();
    let mut runner = Scripted::default()
        .with("Brazil", "Germany", 2, 1)
        .with("Argentina", "France", 1, 1);

    let semis = play_round(&names, MatchKind::SemiFinal, &mut runner, &teams, TieBreak::FirstListed).unwrap();
    assert_eq!(semis.winners, vec!["Brazil".to_string(), "Argentina".to_string()]);
    let mut third = semis.losers.clone();
    third.sort();
    assert_eq!(third, vec!["France".to_string(), "Germany".to_string()]);

    let mut runner = runner.with("Brazil", "Argentina", 0, 3);
    let fin = play_round(&semis.winners, MatchKind::Final, &mut runner, &teams, TieBreak::FirstListed).unwrap();
    assert_eq!(fin.winners, vec!["Argentina".to_string()]);
    assert_eq!(fin.losers, vec!["Brazil".to_string()]);
}

#[test]
fn full_tournament_reaches_a_champion() {
    let mut t = full_field();
    let store = MemoryStore::new();
    // Slot 1 tops every group. Make the A1/B1 quarterfinal level.
    let mut runner = Scripted::default().with("A1", "B1", 1, 1);

    let summary = t.run(&mut runner, &store).unwrap();
    assert_eq!(t.phase(), Phase::Complete);
    assert_eq!(t.knockout().unwrap().stage(), Stage::Done);
    assert_eq!(summary.champion, "A1");
    assert_eq!(summary.runner_up, "E1");
    let mut third = summary.third_place.to_vec();
    third.sort();
    assert_eq!(third, vec!["C1".to_string(), "G1".to_string()]);

    let level = t
        .all_matches()
        .into_iter()
        .find(|m| m.kind == MatchKind::QuarterFinal && m.home == "A1")
        .unwrap()
        .clone();
    assert_eq!(level.tiebreak_winner.as_deref(), Some("A1"));
    assert_eq!((level.home_score, level.away_score), (2, 1));

    let stored = store.load_matches("cup_it").unwrap();
    assert_eq!(stored.len(), 63);
    assert!(stored.iter().all(|m| m.finished && m.venue == "Test Ground"));
    assert_eq!(store.summary("cup_it"), Some(summary));

    // Tournament totals: 3 group wins, then 4 knockout wins.
    let champ = store
        .load_teams("cup_it")
        .unwrap()
        .into_iter()
        .find(|team| team.name() == "A1")
        .unwrap();
    assert_eq!(champ.stats().wins, 7);
    // The tiebreak increment counts towards the quarterfinal score.
    assert_eq!(champ.stats().goals_for, 14);
}

#[test]
fn store_failure_is_fatal() {
    let mut t = full_field();
    let store = FlakyStore {
        inner: MemoryStore::new(),
        saves_left: Cell::new(50),
    };
    let err = t.run(&mut Scripted::default(), &store).unwrap_err();
    assert!(matches!(err, TournamentError::Store(_)));
    assert_eq!(t.phase(), Phase::Failed);
    assert!(t.summary().is_none());
    // 48 group matches plus the first two round-of-16 matches.
    assert_eq!(store.inner.load_matches("cup_it").unwrap().len(), 50);
}

#[test]
fn halted_run_is_not_resumed() {
    let mut t = full_field();
    let store = FlakyStore {
        inner: MemoryStore::new(),
        saves_left: Cell::new(10),
    };
    let err = t.run(&mut Scripted::default(), &store).unwrap_err();
    assert!(matches!(err, TournamentError::Store(_)));
    assert_eq!(t.phase(), Phase::Failed);

    // A second attempt with a healthy store is refused outright.
    store.saves_left.set(usize::MAX);
    let err = t.run(&mut Scripted::default(), &store).unwrap_err();
    assert_eq!(err, TournamentError::Halted("cup_it".into()));
    assert_eq!(err.kind(), ErrorKind::State);
    assert!(t.start_knockout().is_err());
    assert!(t.knockout().is_none());

    let stored = store.inner.load_matches("cup_it").unwrap();
    assert_eq!(stored.len(), 10);
    assert!(stored.iter().all(|m| m.kind == MatchKind::Group));
    assert!(store.inner.summary("cup_it").is_none());
}
