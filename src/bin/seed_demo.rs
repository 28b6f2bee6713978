use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use fixture_oracle::config::{self, EngineConfig};
use fixture_oracle::store::SqliteHistory;
use fixture_oracle::synthetic::{LeagueSpec, synthetic_league};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::init();

    let db_path = parse_db_path_arg()
        .or_else(config::default_db_path)
        .context("unable to resolve sqlite path")?;
    let seed = std::env::var("ORACLE_DEMO_SEED")
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(LeagueSpec::default().seed);

    let cfg = EngineConfig::from_env();
    let spec = LeagueSpec {
        seed,
        season_start_month: cfg.season_start_month,
        ..LeagueSpec::default()
    };
    let snapshot = synthetic_league(spec, Utc::now().date_naive());

    let history = SqliteHistory::open(&db_path)?;
    history.import_snapshot(&snapshot)?;

    println!("Demo league written");
    println!("DB: {}", db_path.display());
    println!("Teams: {}", snapshot.teams.len());
    println!("Completed matches: {}", snapshot.matches.len());
    println!("Season records: {}", snapshot.season_stats.len());
    println!("Scheduled fixtures: {}", snapshot.fixtures.len());
    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
