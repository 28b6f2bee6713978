//! Turns a [`MatchContext`] into a single outcome call.
//!
//! The primary path is a weighted composite score per side; when the two composites land within
//! [`CLOSE_MATCH_MARGIN`] of each other, a small fixed-coefficient logistic model decides instead.

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

use crate::context::MatchContext;
use crate::model::{Outcome, PredictionFactors, PredictionResult, clamp, clamp_score};

const FORM_WEIGHT: f64 = 0.40;
const STRENGTH_WEIGHT: f64 = 0.35;
const HEAD_TO_HEAD_WEIGHT: f64 = 0.10;
const HOME_ADVANTAGE_WEIGHT: f64 = 0.15;

pub const CLOSE_MATCH_MARGIN: f64 = 10.0;
const DECISIVE_BASE: f64 = 60.0;
const DECISIVE_CAP: f64 = 95.0;
const CLOSE_BASE: f64 = 45.0;
const CLOSE_SPAN: f64 = 30.0;
const CLOSE_CAP: f64 = 75.0;

// Logistic tie-break coefficients. Fixed, not fitted.
const COEF_FORM: f64 = 0.02;
const COEF_GOAL_DIFF: f64 = 0.01;
const COEF_ATTACK_VS_DEFENSE: f64 = 0.015;
const COEF_CLEAN_SHEETS: f64 = 0.008;
const COEF_HOME_ADVANTAGE: f64 = 0.5;
const INTERCEPT: f64 = 0.1;
const AWAY_LOGIT_SCALE: f64 = 0.8;
const DRAW_FLOOR: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProbs {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OutcomeProbs {
    /// Most likely outcome and its probability. Ties go home, then draw.
    pub fn most_likely(&self) -> (Outcome, f64) {
        let mut best = (Outcome::HomeWin, self.home);
        if self.draw > best.1 {
            best = (Outcome::Draw, self.draw);
        }
        if self.away > best.1 {
            best = (Outcome::AwayWin, self.away);
        }
        best
    }
}

/// A prediction together with the intermediate numbers that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub prediction: PredictionResult,
    pub home_score: f64,
    pub away_score: f64,
    pub probs: OutcomeProbs,
    /// True when the logistic model made the call.
    pub close_call: bool,
}

impl ScoredMatch {
    pub fn score_diff(&self) -> f64 {
        self.home_score - self.away_score
    }
}

#[inline]
fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn derive_factors(ctx: &MatchContext) -> PredictionFactors {
    let form_difference = ctx.home_form.form_score - ctx.away_form.form_score;
    let goal_diff_gap = ctx.home_stats.goal_differential - ctx.away_stats.goal_differential;
    PredictionFactors {
        home_form_score: clamp_score(50.0 + form_difference),
        away_form_score: clamp_score(50.0 - form_difference),
        head_to_head_score: clamp_score(ctx.head_to_head_score),
        home_advantage: ctx.home_advantage,
        goal_difference_factor: clamp_score(50.0 + goal_diff_gap * 2.0),
    }
}

/// Weighted composites (home, away).
///
/// Only the home side carries a home-advantage term; the away composite has no counterpart.
pub fn composite_scores(ctx: &MatchContext, factors: &PredictionFactors) -> (f64, f64) {
    let home = factors.home_form_score * FORM_WEIGHT
        + ctx.home_stats.overall_strength() * STRENGTH_WEIGHT
        + factors.head_to_head_score * HEAD_TO_HEAD_WEIGHT
        + factors.home_advantage * HOME_ADVANTAGE_WEIGHT;
    let away = factors.away_form_score * FORM_WEIGHT
        + ctx.away_stats.overall_strength() * STRENGTH_WEIGHT
        + (100.0 - factors.head_to_head_score) * HEAD_TO_HEAD_WEIGHT;
    (home, away)
}

pub fn outcome_probabilities(ctx: &MatchContext) -> OutcomeProbs {
    let home = &ctx.home_stats;
    let away = &ctx.away_stats;
    let logit = COEF_FORM * (ctx.home_form.form_score - ctx.away_form.form_score)
        + COEF_GOAL_DIFF * (home.goal_differential - away.goal_differential)
        + COEF_ATTACK_VS_DEFENSE * (home.attacking_strength - away.defensive_strength)
        + COEF_CLEAN_SHEETS * (home.clean_sheet_ratio - away.clean_sheet_ratio)
        + COEF_HOME_ADVANTAGE * (home.home_advantage / 100.0)
        + INTERCEPT;

    let p_home = logistic(logit);
    let p_away = logistic(-logit * AWAY_LOGIT_SCALE);
    let p_draw = (1.0 - p_home - p_away).max(DRAW_FLOOR);

    let sum = p_home + p_draw + p_away;
    OutcomeProbs {
        home: p_home / sum,
        draw: p_draw / sum,
        away: p_away / sum,
    }
}

/// Outcome and confidence from the composite gap, deferring to `probs` on close calls.
pub fn decide(diff: f64, probs: &OutcomeProbs) -> (Outcome, u8, bool) {
    if diff > CLOSE_MATCH_MARGIN {
        let confidence = (DECISIVE_BASE + diff / 2.0).min(DECISIVE_CAP);
        (Outcome::HomeWin, to_confidence(confidence), false)
    } else if diff < -CLOSE_MATCH_MARGIN {
        let confidence = (DECISIVE_BASE + diff.abs() / 2.0).min(DECISIVE_CAP);
        (Outcome::AwayWin, to_confidence(confidence), false)
    } else {
        let (outcome, p) = probs.most_likely();
        let confidence = (CLOSE_BASE + p * CLOSE_SPAN).min(CLOSE_CAP);
        (outcome, to_confidence(confidence), true)
    }
}

fn to_confidence(v: f64) -> u8 {
    clamp(v.round(), 0.0, 100.0) as u8
}

/// Scores `ctx`. Errors only if the inputs produce non-finite numbers.
pub fn score_match(ctx: &MatchContext) -> Result<ScoredMatch> {
    let factors = derive_factors(ctx);
    let (home_score, away_score) = composite_scores(ctx, &factors);
    ensure!(
        home_score.is_finite() && away_score.is_finite(),
        "non-finite composite scores ({home_score}, {away_score}) for fixture {}",
        ctx.fixture.id
    );

    let probs = outcome_probabilities(ctx);
    ensure!(
        probs.home.is_finite() && probs.draw.is_finite() && probs.away.is_finite(),
        "non-finite outcome probabilities for fixture {}",
        ctx.fixture.id
    );

    let (outcome, confidence, close_call) = decide(home_score - away_score, &probs);
    Ok(ScoredMatch {
        prediction: PredictionResult {
            outcome,
            confidence,
            factors,
        },
        home_score,
        away_score,
        probs,
        close_call,
    })
}
