// Plain-text and CSV reports over a finished (or partly played) tournament.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use cupsim_core::knockout::Knockout;
use cupsim_core::ledger::MatchRecord;
use cupsim_core::standings::StandingRow;
use cupsim_core::tournament::Tournament;

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Every group table, in group order.
pub fn render_group_tables(tables: &BTreeMap<char, Vec<StandingRow>>) -> String {
    let mut out = String::new();
    for (letter, rows) in tables {
        out.push_str(&format!("Group {letter}\n"));
        out.push_str(&format!(
            "  {:>2}  {:<18} {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>4} {:>4}\n",
            "#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"
        ));
        for (i, row) in rows.iter().enumerate() {
            out.push_str(&format!(
                "  {:>2}  {:<18} {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>+4} {:>4}\n",
                i + 1,
                row.team,
                row.played,
                row.wins,
                row.draws,
                row.losses,
                row.goals_for,
                row.goals_against,
                row.goal_difference(),
                row.points
            ));
        }
        out.push('\n');
    }
    out
}

fn render_result(record: &MatchRecord) -> String {
    let mut line = format!(
        "{} {}-{} {}",
        record.home, record.home_score, record.away_score, record.away
    );
    if let Some(team) = &record.tiebreak_winner {
        line.push_str(&format!(" ({team} on tie-break)"));
    }
    line
}

/// Every knockout round played so far, then the podium once the final is over.
pub fn render_knockout(knockout: &Knockout) -> String {
    let mut out = String::new();
    for round in knockout.rounds() {
        out.push_str(&format!("{}\n", round.kind));
        for record in &round.matches {
            out.push_str(&format!("  {}\n", render_result(record)));
        }
        out.push('\n');
    }

    match knockout.summary() {
        Some(summary) => {
            out.push_str(&format!("Champion:    {}\n", summary.champion));
            out.push_str(&format!("Runner-up:   {}\n", summary.runner_up));
            out.push_str(&format!("Third place: {}\n", summary.third_place.join(", ")));
        }
        None => out.push_str(&format!("Next stage: {}\n", knockout.stage())),
    }
    out
}

/// Full report: header, group tables, knockout rounds.
pub fn render_report(tournament: &Tournament) -> String {
    let mut out = format!("{} [{}]\n\n", tournament.name(), tournament.id());
    out.push_str(&render_group_tables(&tournament.group_tables()));
    if let Some(knockout) = tournament.knockout() {
        out.push_str(&render_knockout(knockout));
    }
    out
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct StandingsCsvRow<'a> {
    group: String,
    position: usize,
    team: &'a str,
    played: u32,
    wins: u32,
    draws: u32,
    losses: u32,
    goals_for: u32,
    goals_against: u32,
    goal_difference: i64,
    points: u32,
}

/// Write all group tables as one CSV with a header row.
pub fn write_standings_csv<W: io::Write>(
    writer: W,
    tables: &BTreeMap<char, Vec<StandingRow>>,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (letter, rows) in tables {
        for (i, row) in rows.iter().enumerate() {
            wtr.serialize(StandingsCsvRow {
                group: letter.to_string(),
                position: i + 1,
                team: &row.team,
                played: row.played,
                wins: row.wins,
                draws: row.draws,
                losses: row.losses,
                goals_for: row.goals_for,
                goals_against: row.goals_against,
                goal_difference: row.goal_difference(),
                points: row.points,
            })
            .with_context(|| format!("failed to write standings row for {}", row.team))?;
        }
    }
    wtr.flush().context("failed to flush standings CSV")?;
    Ok(())
}

/// Export the tables to `path`, creating parent directories as needed.
pub fn export_standings_csv(path: &Path, tables: &BTreeMap<char, Vec<StandingRow>>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_standings_csv(file, tables)
}
