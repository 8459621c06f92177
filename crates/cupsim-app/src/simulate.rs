// Seeded match simulation: plan a full event list, then replay it through
// the ledger.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use cupsim_core::knockout::{Fixture, FixtureRunner};
use cupsim_core::ledger::{MatchError, MatchLedger};
use cupsim_core::player::{CardKind, PlayerId};
use cupsim_core::team::Team;

use crate::config::SimulationConfig;

/// Last minute of regulation time; planned events fall inside it.
const FULL_TIME: u32 = 90;

/// One event drawn before the match is replayed.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedEvent {
    Goal {
        team: String,
        scorer: PlayerId,
        minute: u32,
    },
    Card {
        team: String,
        player: PlayerId,
        kind: CardKind,
        minute: u32,
    },
    Substitution {
        team: String,
        out: PlayerId,
        incoming: PlayerId,
        minute: u32,
    },
}

impl PlannedEvent {
    pub fn minute(&self) -> u32 {
        match self {
            PlannedEvent::Goal { minute, .. }
            | PlannedEvent::Card { minute, .. }
            | PlannedEvent::Substitution { minute, .. } => *minute,
        }
    }
}

/// Plays fixtures from a seeded RNG. The same seed and the same fixtures
/// always produce the same matches.
pub struct MatchSimulator {
    rng: ChaCha8Rng,
    settings: SimulationConfig,
    next_id: u32,
    venues: Vec<String>,
    referees: Vec<String>,
}

impl MatchSimulator {
    pub fn new(seed: u64, settings: SimulationConfig) -> Self {
        MatchSimulator {
            rng: ChaCha8Rng::seed_from_u64(seed),
            settings,
            next_id: 0,
            venues: Vec::new(),
            referees: Vec::new(),
        }
    }

    /// Pools the venue and referee of each match are drawn from.
    pub fn with_officials(mut self, venues: Vec<String>, referees: Vec<String>) -> Self {
        self.venues = venues;
        self.referees = referees;
        self
    }

    /// Number of matches played so far.
    pub fn matches_played(&self) -> u32 {
        self.next_id
    }

    /// Draw the events of one match, sorted by minute.
    pub fn plan(&mut self, home: &Team, away: &Team) -> Vec<PlannedEvent> {
        let mut events = Vec::new();
        for team in [home, away] {
            self.plan_side(team, &mut events);
        }
        // Stable: same-minute events keep their draw order.
        events.sort_by_key(PlannedEvent::minute);
        events
    }

    fn plan_side(&mut self, team: &Team, events: &mut Vec<PlannedEvent>) {
        let starters = team.roster().starting();
        let bench = team.roster().substitutes();
        let name = team.name().to_string();
        if starters.len() < 2 {
            return;
        }

        // Outfield starters score; the goalkeeper sits first in the XI.
        let goals = self.rng.gen_range(0..=self.settings.max_goals_per_side);
        for _ in 0..goals {
            let scorer = starters[self.rng.gen_range(1..starters.len())].id().clone();
            events.push(PlannedEvent::Goal {
                team: name.clone(),
                scorer,
                minute: self.rng.gen_range(1..=FULL_TIME),
            });
        }

        for player in starters {
            if self.rng.gen_bool(self.settings.yellow_card_chance) {
                events.push(PlannedEvent::Card {
                    team: name.clone(),
                    player: player.id().clone(),
                    kind: CardKind::Yellow,
                    minute: self.rng.gen_range(1..=FULL_TIME),
                });
            }
            if self.rng.gen_bool(self.settings.red_card_chance) {
                events.push(PlannedEvent::Card {
                    team: name.clone(),
                    player: player.id().clone(),
                    kind: CardKind::Red,
                    minute: self.rng.gen_range(1..=FULL_TIME),
                });
            }
        }

        let mut incoming: Vec<&PlayerId> = bench.iter().map(|p| p.id()).collect();
        incoming.shuffle(&mut self.rng);
        let subs = usize::from(self.settings.substitutions_per_side).min(incoming.len());
        for player_in in incoming.into_iter().take(subs) {
            let out = starters[self.rng.gen_range(1..starters.len())].id().clone();
            events.push(PlannedEvent::Substitution {
                team: name.clone(),
                out,
                incoming: player_in.clone(),
                minute: self.rng.gen_range(46..=85),
            });
        }
    }
}

fn choose(rng: &mut ChaCha8Rng, pool: &[String]) -> String {
    pool.choose(rng).cloned().unwrap_or_default()
}

/// Replay planned events onto the ledger. Events the ledger rejects (a
/// scorer who was sent off earlier, a player already substituted off) are
/// skipped. Returns how many were applied.
pub fn apply_plan(ledger: &mut MatchLedger, plan: &[PlannedEvent]) -> usize {
    let mut applied = 0;
    for event in plan {
        let result = match event {
            PlannedEvent::Goal {
                team,
                scorer,
                minute,
            } => ledger.record_goal(scorer, team, *minute).map(|_| ()),
            PlannedEvent::Card {
                team,
                player,
                kind,
                minute,
            } => ledger.record_card(player, team, *kind, *minute).map(|_| ()),
            PlannedEvent::Substitution {
                team,
                out,
                incoming,
                minute,
            } => ledger
                .record_substitution(team, out, incoming, *minute)
                .map(|_| ()),
        };
        match result {
            Ok(()) => applied += 1,
            Err(e) => warn!(
                match_id = ledger.id(),
                minute = event.minute(),
                kind = %e.kind(),
                "skipping simulated event: {e}"
            ),
        }
    }
    applied
}

impl FixtureRunner for MatchSimulator {
    fn play(&mut self, fixture: &Fixture, home: &Team, away: &Team) -> Result<MatchLedger, MatchError> {
        let id = self.next_id + 1;
        let mut ledger = MatchLedger::new(id, fixture.kind, home, away)?;
        self.next_id = id;

        let venue = choose(&mut self.rng, &self.venues);
        let referee = choose(&mut self.rng, &self.referees);
        ledger.set_officials(venue, referee);

        let plan = self.plan(home, away);
        let applied = apply_plan(&mut ledger, &plan);
        debug!(
            match_id = id,
            kind = %fixture.kind,
            home = %fixture.home,
            away = %fixture.away,
            planned = plan.len(),
            applied,
            "match simulated"
        );
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cupsim_core::ledger::{MatchKind, Side};
    use cupsim_core::player::{Player, Position};

    fn squad(name: &str) -> Team {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        crate::names::build_squad(&mut rng, name, "Test").unwrap()
    }

    fn fixture(kind: MatchKind) -> Fixture {
        Fixture {
            kind,
            home: "Home".into(),
            away: "Away".into(),
        }
    }

    fn card_heavy() -> SimulationConfig {
        SimulationConfig {
            max_goals_per_side: 6,
            yellow_card_chance: 0.9,
            red_card_chance: 0.3,
            substitutions_per_side: 3,
        }
    }

    #[test]
    fn plan_is_sorted_and_bounded() {
        let mut sim = MatchSimulator::new(3, SimulationConfig::default());
        let (home, away) = (squad("Home"), squad("Away"));
        for _ in 0..20 {
            let plan = sim.plan(&home, &away);
            assert!(plan.windows(2).all(|w| w[0].minute() <= w[1].minute()));
            let goals = plan
                .iter()
                .filter(|e| matches!(e, PlannedEvent::Goal { team, .. } if team == "Home"))
                .count();
            assert!(goals <= 4);
            let subs = plan
                .iter()
                .filter(|e| matches!(e, PlannedEvent::Substitution { .. }))
                .count();
            assert_eq!(subs, 6);
        }
    }

    #[test]
    fn same_seed_same_match() {
        let (home, away) = (squad("Home"), squad("Away"));
        let play = |seed| {
            let mut sim = MatchSimulator::new(seed, card_heavy())
                .with_officials(vec!["Ground".into()], vec!["Ref".into()]);
            sim.play(&fixture(MatchKind::Group), &home, &away).unwrap().record()
        };
        assert_eq!(play(42), play(42));
        assert_eq!(play(42).venue, "Ground");
    }

    #[test]
    fn rejected_events_are_skipped() {
        let (home, away) = (squad("Home"), squad("Away"));
        let mut sim = MatchSimulator::new(8, card_heavy());
        for _ in 0..10 {
            let ledger = sim.play(&fixture(MatchKind::Group), &home, &away).unwrap();
            assert!(!ledger.is_finished());
            for team in ["Home", "Away"] {
                assert!(ledger.substitution_count(team).unwrap() <= 3);
                let roster = ledger.roster(team).unwrap();
                assert!(roster.players().all(|p| !p.is_sent_off()));
                // The XI only shrinks through send-offs.
                let gone = ledger.sent_off(team).unwrap().len();
                assert!(roster.starting().len() + gone >= 11);
            }
        }
        assert_eq!(sim.matches_played(), 10);
    }

    #[test]
    fn apply_plan_skips_goal_after_send_off() {
        let mut home = Team::new("Home", "Test");
        for n in 1..=11u8 {
            home.add_starting_player(Player::new(format!("H{n}"), n, Position::Midfielder))
                .unwrap();
        }
        let away = squad("Away");
        let mut ledger = MatchLedger::new(1, MatchKind::Group, &home, &away).unwrap();
        let striker = home.roster().starting()[10].id().clone();
        let plan = vec![
            PlannedEvent::Card {
                team: "Home".into(),
                player: striker.clone(),
                kind: CardKind::Red,
                minute: 10,
            },
            PlannedEvent::Goal {
                team: "Home".into(),
                scorer: striker,
                minute: 20,
            },
        ];
        assert_eq!(apply_plan(&mut ledger, &plan), 1);
        assert_eq!(ledger.score(Side::Home), 0);
    }
}
