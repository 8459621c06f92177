// Integration tests for the SQLite store driven by a full tournament run.

use cupsim_core::knockout::{Fixture, FixtureRunner, TieBreak};
use cupsim_core::ledger::{MatchError, MatchKind, MatchLedger};
use cupsim_core::player::{CardKind, Player, Position};
use cupsim_core::store::TournamentStore;
use cupsim_core::team::Team;
use cupsim_core::tournament::{Phase, Tournament};
use cupsim_store::Database;

/// Away side wins 0-1 and the home goalkeeper is booked in every match.
#[derive(Default)]
struct AwayWins {
    next_id: u32,
}

impl FixtureRunner for AwayWins {
    fn play(&mut self, fixture: &Fixture, home: &Team, away: &Team) -> Result<MatchLedger, MatchError> {
        self.next_id += 1;
        let mut m = MatchLedger::new(self.next_id, fixture.kind, home, away)?;
        m.set_officials(format!("Ground {}", self.next_id), "C. Referee");
        m.record_card(home.roster().starting()[0].id(), home.name(), CardKind::Yellow, 5)?;
        m.record_goal(away.roster().starting()[9].id(), away.name(), 70)?;
        Ok(m)
    }
}

fn team(name: &str) -> Team {
    let mut t = Team::new(name, "Test");
    t.add_starting_player(Player::new(format!("{name} GK"), 1, Position::Goalkeeper))
        .unwrap();
    for n in 2..=11u8 {
        t.add_starting_player(Player::new(format!("{name} {n}"), n, Position::Midfielder))
            .unwrap();
    }
    t
}

fn field(id: &str) -> Tournament {
    let mut t = Tournament::new(id, "Store Cup", TieBreak::FewerCards);
    for g in ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'] {
        t.add_group(g, (1..=4).map(|n| team(&format!("{g}{n}"))).collect())
            .unwrap();
    }
    t
}

#[test]
fn full_run_is_persisted() {
    let db = Database::open(":memory:").unwrap();
    let id = db.create_tournament("Store Cup").unwrap();
    let mut t = field(&id);

    let summary = t.run(&mut AwayWins::default(), &db).unwrap();
    assert_eq!(t.phase(), Phase::Complete);
    assert_eq!(db.load_summary(&id).unwrap(), Some(summary.clone()));

    let matches = db.load_matches(&id).unwrap();
    assert_eq!(matches.len(), 63);
    assert_eq!(matches[0].venue, "Ground 1");
    assert_eq!(
        matches.iter().filter(|m| m.kind == MatchKind::Final).count(),
        1
    );

    // Persisted team snapshots match the in-memory totals.
    let teams = db.load_teams(&id).unwrap();
    assert_eq!(teams.len(), 32);
    for stored in &teams {
        let live = t.team(stored.name()).unwrap();
        assert_eq!(stored.stats(), live.stats());
    }
    let champion = teams.iter().find(|t| t.name() == summary.champion).unwrap();
    // Away sides win everything, so a group runner-up lifts the cup:
    // two group wins, one group loss, four knockout wins.
    assert_eq!((champion.stats().wins, champion.stats().losses), (6, 1));
    assert!(champion.stats().yellow_cards > 0);
}

#[test]
fn runs_are_isolated_by_tournament_id() {
    let db = Database::open(":memory:").unwrap();
    db.register_tournament("cup_one", "One").unwrap();
    db.register_tournament("cup_two", "Two").unwrap();

    field("cup_one").run(&mut AwayWins::default(), &db).unwrap();
    assert_eq!(db.match_count("cup_one").unwrap(), 63);
    assert_eq!(db.match_count("cup_two").unwrap(), 0);

    db.clear_tournament("cup_one").unwrap();
    assert!(db.load_teams("cup_one").unwrap().is_empty());
    assert_eq!(db.tournament_name("cup_two").unwrap().as_deref(), Some("Two"));
}

#[test]
fn unregistered_tournament_fails_the_run() {
    let db = Database::open(":memory:").unwrap();
    let mut t = field("cup_missing");
    let err = t.run(&mut AwayWins::default(), &db).unwrap_err();
    assert!(err.to_string().contains("save_team"));
    assert_eq!(t.phase(), Phase::Failed);
}
