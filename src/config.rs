use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CACHE_DIR: &str = "fixture_oracle";
const DB_FILE: &str = "history.sqlite";
/// Furthest season back a weight row may reach.
pub const MAX_SEASON_OFFSET: u32 = 50;

/// One row of the season blend: how many seasons back from the current one, and its weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonWeight {
    pub offset: u32,
    pub weight: f64,
}

pub const DEFAULT_SEASON_WEIGHTS: [SeasonWeight; 3] = [
    SeasonWeight {
        offset: 0,
        weight: 0.5,
    },
    SeasonWeight {
        offset: 1,
        weight: 0.3,
    },
    SeasonWeight {
        offset: 2,
        weight: 0.2,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub form_matches: usize,
    pub head_to_head_limit: usize,
    /// Percentage points credited to the home side.
    pub home_advantage: f64,
    /// First month (1-12) of a new season.
    pub season_start_month: u32,
    pub season_weights: Vec<SeasonWeight>,
    pub batch_size: usize,
    pub batch_pause_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            form_matches: 5,
            head_to_head_limit: 10,
            home_advantage: 15.0,
            season_start_month: 8,
            season_weights: DEFAULT_SEASON_WEIGHTS.to_vec(),
            batch_size: 5,
            batch_pause_ms: 1000,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read engine config {}", path.display()))?;
        let cfg: EngineConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parse engine config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = match non_empty(&lookup, "ORACLE_CONFIG") {
            Some(path) => Self::load(Path::new(&path)).unwrap_or_else(|err| {
                log::warn!("ignoring engine config file: {err:#}");
                Self::default()
            }),
            None => Self::default(),
        };

        if let Some(v) = parse_key::<usize>(&lookup, "ORACLE_FORM_MATCHES") {
            cfg.form_matches = v;
        }
        if let Some(v) = parse_key::<usize>(&lookup, "ORACLE_H2H_LIMIT") {
            cfg.head_to_head_limit = v;
        }
        if let Some(v) = parse_key::<f64>(&lookup, "ORACLE_HOME_ADVANTAGE") {
            cfg.home_advantage = v;
        }
        if let Some(v) = parse_key::<u32>(&lookup, "ORACLE_SEASON_START_MONTH") {
            cfg.season_start_month = v;
        }
        if let Some(v) = parse_key::<usize>(&lookup, "ORACLE_BATCH_SIZE") {
            cfg.batch_size = v;
        }
        if let Some(v) = parse_key::<u64>(&lookup, "ORACLE_BATCH_PAUSE_MS") {
            cfg.batch_pause_ms = v;
        }
        cfg.sanitized()
    }

    /// Pulls every field back into a usable range.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.form_matches = self.form_matches.clamp(1, 50);
        self.head_to_head_limit = self.head_to_head_limit.clamp(1, 50);
        self.home_advantage = if self.home_advantage.is_finite() {
            self.home_advantage.clamp(0.0, 100.0)
        } else {
            defaults.home_advantage
        };
        self.season_start_month = self.season_start_month.clamp(1, 12);
        self.season_weights.retain(|w| {
            w.offset <= MAX_SEASON_OFFSET && w.weight.is_finite() && w.weight > 0.0
        });
        if self.season_weights.is_empty() {
            self.season_weights = defaults.season_weights;
        }
        self.batch_size = self.batch_size.clamp(1, 100);
        self.batch_pause_ms = self.batch_pause_ms.min(60_000);
        self
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).and_then(|val| {
        if val.trim().is_empty() {
            None
        } else {
            Some(val.trim().to_string())
        }
    })
}

fn parse_key<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    non_empty(lookup, key).and_then(|val| val.parse::<T>().ok())
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

/// `ORACLE_DB_PATH` if set, else the history database in the cache dir.
pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("ORACLE_DB_PATH") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path.trim()));
        }
    }
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}
