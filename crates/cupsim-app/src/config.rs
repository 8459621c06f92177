// Configuration loading and parsing (tournament.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use cupsim_core::knockout::TieBreak;
use cupsim_core::ledger::MAX_SUBSTITUTIONS;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("cannot seed config/ from defaults/: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub tournament_name: String,
    /// RNG seed; `None` draws one from the clock.
    pub seed: Option<u64>,
    pub tie_break: TieBreak,
    pub simulation: SimulationConfig,
    pub db_path: String,
    pub standings_csv: Option<String>,
}

// ---------------------------------------------------------------------------
// tournament.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire tournament.toml file.
#[derive(Debug, Clone, Deserialize)]
struct TournamentFile {
    tournament: TournamentSection,
    simulation: SimulationConfig,
    database: DatabaseSection,
    #[serde(default)]
    report: ReportSection,
}

#[derive(Debug, Clone, Deserialize)]
struct TournamentSection {
    name: String,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_tie_break")]
    tie_break: String,
}

fn default_tie_break() -> String {
    "first_listed".into()
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ReportSection {
    #[serde(default)]
    standings_csv: Option<String>,
}

/// Knobs for the match simulator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Upper bound (inclusive) on goals planned for one side.
    pub max_goals_per_side: u32,
    /// Chance that a given starter is booked once in a match.
    pub yellow_card_chance: f64,
    /// Chance that a given starter sees a straight red in a match.
    pub red_card_chance: f64,
    pub substitutions_per_side: u8,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            max_goals_per_side: 4,
            yellow_card_chance: 0.12,
            red_card_chance: 0.01,
            substitutions_per_side: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/tournament.toml` relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("tournament.toml");
    let text = read_file(&path)?;
    let file: TournamentFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let tie_break = TieBreak::from_str_policy(&file.tournament.tie_break).ok_or_else(|| {
        ConfigError::ValidationError {
            field: "tournament.tie_break".into(),
            message: format!(
                "must be \"first_listed\" or \"fewer_cards\", got \"{}\"",
                file.tournament.tie_break
            ),
        }
    })?;

    let config = Config {
        tournament_name: file.tournament.name,
        seed: file.tournament.seed,
        tie_break,
        simulation: file.simulation,
        db_path: file.database.path,
        standings_csv: file.report.standings_csv,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/` from the shipped `defaults/` so a fresh checkout can run.
/// Returns the files written on this call. A file already in `config/` is
/// never overwritten, and `*.example` templates stay behind.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(vec![]);
        }
        return Err(seed_error(format!(
            "no tournament settings under {}: expected defaults/tournament.toml \
             or config/tournament.toml (start cupsim from crates/cupsim-app)",
            base_dir.display()
        )));
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| seed_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let listing = std::fs::read_dir(&defaults_dir)
        .map_err(|e| seed_error(format!("cannot list {}: {e}", defaults_dir.display())))?;

    let mut seeded = Vec::new();
    for entry in listing {
        let shipped = entry
            .map_err(|e| seed_error(format!("cannot list {}: {e}", defaults_dir.display())))?
            .path();
        let Some(name) = shipped.file_name().filter(|_| shipped.is_file()) else {
            continue;
        };
        if name.to_string_lossy().ends_with(".example") {
            continue;
        }
        let local = config_dir.join(name);
        if seed_file(&shipped, &local)? {
            seeded.push(local);
        }
    }

    Ok(seeded)
}

/// Copy one shipped default into place. `Ok(false)` when the operator
/// already has a copy.
fn seed_file(shipped: &Path, local: &Path) -> Result<bool, ConfigError> {
    use std::io::Write;

    let mut out = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(local)
    {
        Ok(out) => out,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(seed_error(format!("cannot seed {}: {e}", local.display()))),
    };
    let body = std::fs::read(shipped)
        .map_err(|e| seed_error(format!("shipped default {} unreadable: {e}", shipped.display())))?;
    out.write_all(&body)
        .map_err(|e| seed_error(format!("cannot seed {}: {e}", local.display())))?;
    Ok(true)
}

fn seed_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.tournament_name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "tournament.name".into(),
            message: "must not be empty".into(),
        });
    }

    let sim = &config.simulation;
    if sim.max_goals_per_side == 0 {
        return Err(ConfigError::ValidationError {
            field: "simulation.max_goals_per_side".into(),
            message: "must be >= 1".into(),
        });
    }

    let chances: &[(&str, f64)] = &[
        ("simulation.yellow_card_chance", sim.yellow_card_chance),
        ("simulation.red_card_chance", sim.red_card_chance),
    ];
    for (name, val) in chances {
        if !(0.0..=1.0).contains(val) {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be between 0.0 and 1.0 inclusive, got {val}"),
            });
        }
    }

    if sim.substitutions_per_side > MAX_SUBSTITUTIONS {
        return Err(ConfigError::ValidationError {
            field: "simulation.substitutions_per_side".into(),
            message: format!(
                "must be at most {MAX_SUBSTITUTIONS}, got {}",
                sim.substitutions_per_side
            ),
        });
    }

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
