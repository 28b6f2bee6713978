//! Multi-season strength profile for a single team.
//!
//! Each season that has data is turned into a set of normalized metrics, then the seasons are
//! blended with the weights from a [`SeasonWeight`] table. Seasons without data (or whose lookup
//! failed) simply drop out of the blend; they never dilute the weights of the seasons that did
//! contribute.

use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SeasonWeight;
use crate::history::MatchHistory;
use crate::model::{SeasonStatistics, clamp_score};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticalAnalysis {
    /// Share of home points taken, 0-100.
    pub home_advantage: f64,
    /// Raw goal difference, unbounded.
    pub goal_differential: f64,
    pub clean_sheet_ratio: f64,
    /// Share of matches with at least one goal scored, 0-100.
    pub scoring_consistency: f64,
    pub defensive_strength: f64,
    pub attacking_strength: f64,
}

impl StatisticalAnalysis {
    pub fn neutral() -> Self {
        Self {
            home_advantage: 50.0,
            goal_differential: 0.0,
            clean_sheet_ratio: 0.0,
            scoring_consistency: 50.0,
            defensive_strength: 50.0,
            attacking_strength: 50.0,
        }
    }

    pub fn overall_strength(&self) -> f64 {
        (self.attacking_strength + self.defensive_strength) / 2.0
    }

    fn zero() -> Self {
        Self {
            home_advantage: 0.0,
            goal_differential: 0.0,
            clean_sheet_ratio: 0.0,
            scoring_consistency: 0.0,
            defensive_strength: 0.0,
            attacking_strength: 0.0,
        }
    }

    fn add_weighted(&mut self, other: &Self, w: f64) {
        self.home_advantage += other.home_advantage * w;
        self.goal_differential += other.goal_differential * w;
        self.clean_sheet_ratio += other.clean_sheet_ratio * w;
        self.scoring_consistency += other.scoring_consistency * w;
        self.defensive_strength += other.defensive_strength * w;
        self.attacking_strength += other.attacking_strength * w;
    }

    fn scaled(mut self, factor: f64) -> Self {
        self.home_advantage *= factor;
        self.goal_differential *= factor;
        self.clean_sheet_ratio *= factor;
        self.scoring_consistency *= factor;
        self.defensive_strength *= factor;
        self.attacking_strength *= factor;
        self
    }
}

/// The season in progress on `today`, named by the calendar year it started in.
pub fn current_season(today: NaiveDate, season_start_month: u32) -> i32 {
    if today.month() >= season_start_month {
        today.year()
    } else {
        today.year() - 1
    }
}

/// Metrics for one season, or `None` when the record has no matches in it.
pub fn season_metrics(stats: &SeasonStatistics) -> Option<StatisticalAnalysis> {
    if stats.played == 0 {
        return None;
    }
    let played = stats.played as f64;

    let home_played = stats.home_played();
    let home_advantage = if home_played == 0 {
        50.0
    } else {
        (stats.home_wins * 3 + stats.home_draws) as f64 / (home_played as f64 * 3.0) * 100.0
    };

    let scored_in = stats.played.saturating_sub(stats.failed_to_score) as f64;

    Some(StatisticalAnalysis {
        home_advantage: clamp_score(home_advantage),
        goal_differential: stats.goal_difference() as f64,
        clean_sheet_ratio: clamp_score(stats.clean_sheets as f64 / played * 100.0),
        scoring_consistency: clamp_score(scored_in / played * 100.0),
        defensive_strength: clamp_score(100.0 - stats.goals_against as f64 / played * 25.0),
        attacking_strength: clamp_score(stats.goals_for as f64 / played * 40.0),
    })
}

/// Blends per-season metrics. Each entry is a season's metrics (if it had any) and its weight.
pub fn blend_seasons(seasons: &[(Option<StatisticalAnalysis>, f64)]) -> StatisticalAnalysis {
    let mut sum = StatisticalAnalysis::zero();
    let mut total_weight = 0.0;
    for (metrics, weight) in seasons {
        let Some(metrics) = metrics else {
            continue;
        };
        sum.add_weighted(metrics, *weight);
        total_weight += weight;
    }
    if total_weight <= 0.0 {
        return StatisticalAnalysis::neutral();
    }
    sum.scaled(1.0 / total_weight)
}

/// Looks up every season in `weights` for `team_id` and blends whatever came back.
///
/// Lookups run in parallel and fail independently; a failed or empty season is logged and
/// skipped.
pub fn analyze_statistics(
    history: &dyn MatchHistory,
    team_id: u32,
    current: i32,
    weights: &[SeasonWeight],
) -> StatisticalAnalysis {
    let seasons: Vec<(Option<StatisticalAnalysis>, f64)> = weights
        .par_iter()
        .map(|w| {
            let Some(season) = i32::try_from(w.offset)
                .ok()
                .and_then(|offset| current.checked_sub(offset))
            else {
                log::warn!("season offset {} out of range, skipped", w.offset);
                return (None, w.weight);
            };
            let metrics = match history.season_statistics(team_id, season) {
                Ok(Some(stats)) => season_metrics(&stats),
                Ok(None) => None,
                Err(err) => {
                    log::warn!("season {season} stats lookup failed for team {team_id}: {err:#}");
                    None
                }
            };
            (metrics, w.weight)
        })
        .collect();
    blend_seasons(&seasons)
}
