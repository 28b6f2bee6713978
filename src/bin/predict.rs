use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use fixture_oracle::config::{self, EngineConfig};
use fixture_oracle::report::MatchReport;
use fixture_oracle::store::SqliteHistory;
use fixture_oracle::{Fixture, MatchHistory, PredictionEngine};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let db_path = parse_db_path_arg(&args)
        .or_else(config::default_db_path)
        .context("unable to resolve sqlite path")?;
    let history = SqliteHistory::open(&db_path)?;

    let mut engine = PredictionEngine::new(history, EngineConfig::from_env());
    if let Some(date) = parse_date_arg(&args)? {
        engine = engine.with_reference_date(date);
    }

    let ids = fixture_id_args(&args);
    let fixtures: Vec<Fixture> = if ids.is_empty() {
        engine.history().scheduled_fixtures()?
    } else {
        let mut out = Vec::new();
        for id in ids {
            match engine.history().fixture_by_id(id)? {
                Some(fixture) => out.push(fixture),
                None => log::warn!("fixture {id} not found"),
            }
        }
        out
    };

    if fixtures.is_empty() {
        println!("No fixtures to predict (DB: {})", db_path.display());
        return Ok(());
    }

    println!(
        "Predicting {} fixture(s), season {} (DB: {})",
        fixtures.len(),
        engine.current_season(),
        db_path.display()
    );

    for (ctx, prediction) in engine.predict_matches_detailed(&fixtures) {
        engine
            .history()
            .upsert_prediction(ctx.fixture.id, &prediction)?;
        print!("{}", MatchReport::build(&ctx, &prediction));
    }

    println!(
        "Stored predictions: {}",
        engine.history().prediction_count()?
    );
    Ok(())
}

fn parse_db_path_arg(args: &[String]) -> Option<PathBuf> {
    flag_value(args, "--db").map(PathBuf::from)
}

fn parse_date_arg(args: &[String]) -> Result<Option<NaiveDate>> {
    let Some(raw) = flag_value(args, "--date") else {
        return Ok(None);
    };
    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .with_context(|| format!("invalid --date {raw:?}, expected YYYY-MM-DD"))?;
    Ok(Some(date))
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

/// Bare numeric arguments that are not the value of a flag.
fn fixture_id_args(args: &[String]) -> Vec<u64> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--db" || arg == "--date" {
            skip_next = true;
            continue;
        }
        if let Ok(id) = arg.trim().parse::<u64>() {
            out.push(id);
        }
    }
    out
}
