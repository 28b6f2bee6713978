use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::MatchContext;
use crate::model::{MatchResult, PredictionResult};
use crate::scorer::{self, OutcomeProbs};

const FORM_GAP_NOTABLE: f64 = 20.0;
const STRENGTH_GAP_NOTABLE: f64 = 10.0;
const H2H_NOTABLE: f64 = 15.0;
const GOAL_FACTOR_NOTABLE: f64 = 10.0;

/// Human-readable account of one prediction, for analysis views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub fixture_id: u64,
    pub label: String,
    pub home_form: String,
    pub away_form: String,
    pub home_score: f64,
    pub away_score: f64,
    pub probs: Option<OutcomeProbs>,
    pub close_call: bool,
    pub prediction: PredictionResult,
    pub reasons: Vec<String>,
}

impl MatchReport {
    pub fn build(ctx: &MatchContext, prediction: &PredictionResult) -> Self {
        let scored = scorer::score_match(ctx).ok();
        let home = &ctx.home_team().name;
        let away = &ctx.away_team().name;

        let mut reasons = Vec::new();
        let Some(scored) = scored else {
            reasons.push("scoring unavailable, neutral fallback used".to_string());
            return Self {
                fixture_id: ctx.fixture.id,
                label: ctx.fixture.label(),
                home_form: ctx.home_form.form_string(),
                away_form: ctx.away_form.form_string(),
                home_score: 0.0,
                away_score: 0.0,
                probs: None,
                close_call: false,
                prediction: *prediction,
                reasons,
            };
        };

        let form_gap = ctx.home_form.form_score - ctx.away_form.form_score;
        if form_gap.abs() >= FORM_GAP_NOTABLE {
            let (better, worse) = if form_gap > 0.0 { (home, away) } else { (away, home) };
            reasons.push(format!(
                "{better} in clearly better recent form than {worse} ({:.0} vs {:.0})",
                ctx.home_form.form_score.max(ctx.away_form.form_score),
                ctx.home_form.form_score.min(ctx.away_form.form_score),
            ));
        }

        let strength_gap = ctx.home_stats.overall_strength() - ctx.away_stats.overall_strength();
        if strength_gap.abs() >= STRENGTH_GAP_NOTABLE {
            let stronger = if strength_gap > 0.0 { home } else { away };
            reasons.push(format!(
                "{stronger} stronger on season numbers by {:.1} pts",
                strength_gap.abs()
            ));
        }

        if !ctx.head_to_head.is_empty()
            && (ctx.head_to_head_score - 50.0).abs() >= H2H_NOTABLE
        {
            let (leader, leader_id) = if ctx.head_to_head_score > 50.0 {
                (home, ctx.home_team().id)
            } else {
                (away, ctx.away_team().id)
            };
            let wins = ctx
                .head_to_head
                .iter()
                .filter(|m| m.result_for(leader_id) == Some(MatchResult::Win))
                .count();
            reasons.push(format!(
                "{leader} won {wins} of the last {} meetings",
                ctx.head_to_head.len()
            ));
        }

        let goal_factor = scored.prediction.factors.goal_difference_factor;
        if (goal_factor - 50.0).abs() >= GOAL_FACTOR_NOTABLE {
            let side = if goal_factor > 50.0 { home } else { away };
            reasons.push(format!("{side} has the better goal difference"));
        }

        if ctx.home_advantage > 0.0 {
            reasons.push(format!(
                "home advantage for {home} worth {:.0} pts",
                ctx.home_advantage
            ));
        }

        if scored.close_call {
            reasons.push(format!(
                "composites within {:.0} pts, decided on outcome probabilities",
                scorer::CLOSE_MATCH_MARGIN
            ));
        }

        Self {
            fixture_id: ctx.fixture.id,
            label: ctx.fixture.label(),
            home_form: ctx.home_form.form_string(),
            away_form: ctx.away_form.form_string(),
            home_score: scored.home_score,
            away_score: scored.away_score,
            probs: Some(scored.probs),
            close_call: scored.close_call,
            prediction: *prediction,
            reasons,
        }
    }
}

fn form_or_dash(form: &str) -> &str {
    if form.is_empty() { "-" } else { form }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "#{} {}: {} ({}%)",
            self.fixture_id, self.label, self.prediction.outcome, self.prediction.confidence
        )?;
        writeln!(
            f,
            "  form {} / {}  composite {:.1} / {:.1}",
            form_or_dash(&self.home_form),
            form_or_dash(&self.away_form),
            self.home_score,
            self.away_score
        )?;
        if let Some(p) = self.probs {
            writeln!(
                f,
                "  model H {:.1}% D {:.1}% A {:.1}%",
                p.home * 100.0,
                p.draw * 100.0,
                p.away * 100.0
            )?;
        }
        for reason in &self.reasons {
            writeln!(f, "  - {reason}")?;
        }
        Ok(())
    }
}
