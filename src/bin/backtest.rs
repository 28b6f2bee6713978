use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use fixture_oracle::history::{HistorySnapshot, InMemoryHistory};
use fixture_oracle::report::MatchReport;
use fixture_oracle::{EngineConfig, MatchHistory, PredictionEngine};

#[derive(Debug, serde::Deserialize)]
struct BacktestCase {
    fixture_id: u64,
    /// "Today" for the season lookup, YYYY-MM-DD.
    as_of: NaiveDate,
    #[serde(default)]
    config: Option<EngineConfig>,
    history: HistorySnapshot,
}

fn main() -> Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/backtest_case.json"));

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let case: BacktestCase = serde_json::from_str(&raw).context("parse backtest case")?;

    // Frozen inputs only: no database, no network. Meant for hand-tuning against one snapshot.
    let cfg = case.config.unwrap_or_default().sanitized();
    let engine = PredictionEngine::new(InMemoryHistory::from_snapshot(case.history), cfg)
        .with_reference_date(case.as_of);

    let fixture = engine
        .history()
        .fixture_by_id(case.fixture_id)?
        .with_context(|| format!("fixture {} not in snapshot", case.fixture_id))?;
    let (ctx, prediction) = engine.predict_match_detailed(&fixture);
    print!("{}", MatchReport::build(&ctx, &prediction));
    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}
