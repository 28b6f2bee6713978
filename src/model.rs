use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
    pub name: String,
}

impl Team {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
    Postponed,
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
            MatchStatus::Postponed => "postponed",
            MatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "scheduled" | "ns" | "tbd" => Some(MatchStatus::Scheduled),
            "live" | "1h" | "ht" | "2h" => Some(MatchStatus::Live),
            // "ft" and friends are the short codes most football feeds use for a final result.
            "finished" | "ft" | "aet" | "pen" => Some(MatchStatus::Finished),
            "postponed" | "pst" => Some(MatchStatus::Postponed),
            "cancelled" | "canc" => Some(MatchStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_final(self) -> bool {
        self == MatchStatus::Finished
    }
}

/// Result of a single match from one team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Draw,
    Loss,
}

impl MatchResult {
    pub fn from_goals(goals_for: u8, goals_against: u8) -> Self {
        match goals_for.cmp(&goals_against) {
            std::cmp::Ordering::Greater => MatchResult::Win,
            std::cmp::Ordering::Equal => MatchResult::Draw,
            std::cmp::Ordering::Less => MatchResult::Loss,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            MatchResult::Win => 3,
            MatchResult::Draw => 1,
            MatchResult::Loss => 0,
        }
    }

    pub fn letter(self) -> char {
        match self {
            MatchResult::Win => 'W',
            MatchResult::Draw => 'D',
            MatchResult::Loss => 'L',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedMatch {
    pub id: u64,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub home_goals: u8,
    pub away_goals: u8,
    pub date: NaiveDate,
    pub status: MatchStatus,
}

impl CompletedMatch {
    pub fn involves(&self, team_id: u32) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }

    /// Goals (for, against) from the perspective of `team_id`.
    pub fn goals_for_against(&self, team_id: u32) -> Option<(u8, u8)> {
        if team_id == self.home_team_id {
            Some((self.home_goals, self.away_goals))
        } else if team_id == self.away_team_id {
            Some((self.away_goals, self.home_goals))
        } else {
            None
        }
    }

    pub fn result_for(&self, team_id: u32) -> Option<MatchResult> {
        self.goals_for_against(team_id)
            .map(|(gf, ga)| MatchResult::from_goals(gf, ga))
    }
}

/// A scheduled (or completed) meeting between two teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u64,
    pub home: Team,
    pub away: Team,
    pub date: NaiveDate,
    pub status: MatchStatus,
}

impl Fixture {
    pub fn label(&self) -> String {
        format!("{} vs {}", self.home.name, self.away.name)
    }
}

/// Aggregate numbers for one team in one season. One record per (team, season).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonStatistics {
    pub team_id: u32,
    pub season: i32,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub home_wins: u32,
    pub home_draws: u32,
    pub home_losses: u32,
    pub away_wins: u32,
    pub away_draws: u32,
    pub away_losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub clean_sheets: u32,
    pub failed_to_score: u32,
}

impl SeasonStatistics {
    pub fn home_played(&self) -> u32 {
        self.home_wins + self.home_draws + self.home_losses
    }

    pub fn goal_difference(&self) -> i64 {
        self.goals_for as i64 - self.goals_against as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::HomeWin => "HOME_WIN",
            Outcome::Draw => "DRAW",
            Outcome::AwayWin => "AWAY_WIN",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "HOME_WIN" => Some(Outcome::HomeWin),
            "DRAW" => Some(Outcome::Draw),
            "AWAY_WIN" => Some(Outcome::AwayWin),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionFactors {
    pub home_form_score: f64,
    pub away_form_score: f64,
    pub head_to_head_score: f64,
    pub home_advantage: f64,
    pub goal_difference_factor: f64,
}

impl PredictionFactors {
    pub fn neutral() -> Self {
        Self {
            home_form_score: 50.0,
            away_form_score: 50.0,
            head_to_head_score: 50.0,
            home_advantage: 0.0,
            goal_difference_factor: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub outcome: Outcome,
    pub confidence: u8,
    pub factors: PredictionFactors,
}

impl PredictionResult {
    pub const FALLBACK_CONFIDENCE: u8 = 30;

    /// The call made when scoring itself could not complete.
    pub fn fallback() -> Self {
        Self {
            outcome: Outcome::Draw,
            confidence: Self::FALLBACK_CONFIDENCE,
            factors: PredictionFactors::neutral(),
        }
    }
}

pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

pub fn clamp_score(v: f64) -> f64 {
    clamp(v, 0.0, 100.0)
}
