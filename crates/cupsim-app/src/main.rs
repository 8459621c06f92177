// Tournament simulator entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout carries the report)
// 2. Load config
// 3. Open database and register the run
// 4. Draw the groups and play every match, persisting each round
// 5. Export standings CSV (if configured)
// 6. Print the report

use std::path::Path;

use anyhow::Context;
use tracing::{error, info};

use cupsim_app::app;
use cupsim_app::config;
use cupsim_app::report;
use cupsim_store::Database;

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("cupsim starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {}, tie-break {:?}, seed {:?}",
        config.tournament_name, config.tie_break, config.seed
    );

    // 3. Open database
    let db = Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);
    let tournament_id = db
        .create_tournament(&config.tournament_name)
        .context("failed to register tournament")?;

    // 4. Play
    let seed = app::resolve_seed(&config);
    let tournament = match app::run_tournament(&config, &tournament_id, seed, &db) {
        Ok(t) => t,
        Err(e) => {
            error!("Tournament run failed: {:#}", e);
            return Err(e);
        }
    };

    // 5. Export standings
    if let Some(path) = &config.standings_csv {
        report::export_standings_csv(Path::new(path), &tournament.group_tables())
            .with_context(|| format!("failed to export standings to {path}"))?;
        info!("Standings written to {}", path);
    }

    // 6. Report
    print!("{}", report::render_report(&tournament));
    println!("\nSeed {seed}, stored as {tournament_id} in {}", config.db_path);

    info!("cupsim finished");
    Ok(())
}

/// Filter used when `RUST_LOG` is unset: the engine's round-by-round
/// progress plus warnings from everything else.
const DEFAULT_LOG_FILTER: &str = "cupsim=info,cupsim_app=info,cupsim_core=info,cupsim_store=info,warn";

/// Send the run log to `logs/cupsim.log`. Stdout is reserved for the report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let log_path = std::env::current_dir()?.join("logs").join("cupsim.log");
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create log directory {}", dir.display()))?;
    }
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("cannot open run log {}", log_path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("cupsim log subscriber already installed")?;
    Ok(())
}
