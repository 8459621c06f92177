// Tournament assembly: draw the field from a seed, then run it end to end
// against a store.

use anyhow::Context;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use cupsim_core::store::TournamentStore;
use cupsim_core::tournament::Tournament;

use crate::config::Config;
use crate::names;
use crate::simulate::MatchSimulator;

/// The configured seed, or one taken from the clock when none is set.
pub fn resolve_seed(config: &Config) -> u64 {
    config
        .seed
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis().unsigned_abs())
}

/// Draw eight groups of four and register them on a fresh tournament.
pub fn build_tournament(config: &Config, tournament_id: &str, seed: u64) -> anyhow::Result<Tournament> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let groups = names::draw_groups(&mut rng).context("failed to generate squads")?;

    let mut tournament = Tournament::new(tournament_id, config.tournament_name.as_str(), config.tie_break);
    for (letter, teams) in groups {
        tournament
            .add_group(letter, teams)
            .with_context(|| format!("failed to register group {letter}"))?;
    }
    Ok(tournament)
}

/// Build the field and play every match, persisting through `store`.
pub fn run_tournament(
    config: &Config,
    tournament_id: &str,
    seed: u64,
    store: &dyn TournamentStore,
) -> anyhow::Result<Tournament> {
    info!(tournament_id, seed, name = %config.tournament_name, "drawing groups");
    let mut tournament = build_tournament(config, tournament_id, seed)?;

    let mut simulator = MatchSimulator::new(seed, config.simulation.clone())
        .with_officials(names::venues(), names::referees());
    let summary = tournament
        .run(&mut simulator, store)
        .with_context(|| format!("tournament {tournament_id} stopped in phase {:?}", tournament.phase()))?;

    info!(
        tournament_id,
        matches = simulator.matches_played(),
        champion = %summary.champion,
        "tournament finished"
    );
    Ok(tournament)
}
