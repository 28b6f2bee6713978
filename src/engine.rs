use std::thread;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::context::{self, MatchContext};
use crate::form::{self, FormAnalysis};
use crate::head_to_head;
use crate::history::MatchHistory;
use crate::model::{Fixture, PredictionResult};
use crate::scorer;
use crate::statistics::{self, StatisticalAnalysis};

/// Entry point for every prediction. Holds the data-access collaborator and the tunables.
///
/// All prediction methods are total: they always return a result, substituting neutral values
/// for missing or unreachable history. Only [`PredictionEngine::predict_fixture`] can fail, and
/// only when the fixture itself cannot be loaded.
pub struct PredictionEngine<H> {
    history: H,
    config: EngineConfig,
    reference_date: Option<NaiveDate>,
}

impl<H: MatchHistory> PredictionEngine<H> {
    pub fn new(history: H, config: EngineConfig) -> Self {
        Self {
            history,
            config,
            reference_date: None,
        }
    }

    /// Pins "today" so the current season (and so every prediction) is reproducible.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn current_season(&self) -> i32 {
        statistics::current_season(self.today(), self.config.season_start_month)
    }

    pub fn analyze_form(&self, team_id: u32, n: usize) -> FormAnalysis {
        form::analyze_team_form(&self.history, team_id, n)
    }

    pub fn analyze_statistics(&self, team_id: u32) -> StatisticalAnalysis {
        statistics::analyze_statistics(
            &self.history,
            team_id,
            self.current_season(),
            &self.config.season_weights,
        )
    }

    pub fn analyze_head_to_head(&self, team_a: u32, team_b: u32) -> f64 {
        head_to_head::analyze_head_to_head(
            &self.history,
            team_a,
            team_b,
            self.config.head_to_head_limit,
        )
        .0
    }

    pub fn build_match_context(&self, fixture: &Fixture) -> MatchContext {
        context::build_match_context(&self.history, fixture, &self.config, self.current_season())
    }

    pub fn predict_match(&self, fixture: &Fixture) -> PredictionResult {
        self.predict_match_detailed(fixture).1
    }

    /// Like [`predict_match`](Self::predict_match) but also hands back the context it scored.
    pub fn predict_match_detailed(&self, fixture: &Fixture) -> (MatchContext, PredictionResult) {
        let ctx = self.build_match_context(fixture);
        let prediction = predict_from_context(&ctx);
        (ctx, prediction)
    }

    /// Predicts every fixture, `batch_size` at a time, pausing between batches.
    ///
    /// Output order matches input order.
    pub fn predict_matches(&self, fixtures: &[Fixture]) -> Vec<(Fixture, PredictionResult)> {
        self.in_batches(fixtures, |fixture| {
            (fixture.clone(), self.predict_match(fixture))
        })
    }

    /// Batched like [`predict_matches`](Self::predict_matches), keeping each scored context.
    pub fn predict_matches_detailed(
        &self,
        fixtures: &[Fixture],
    ) -> Vec<(MatchContext, PredictionResult)> {
        self.in_batches(fixtures, |fixture| self.predict_match_detailed(fixture))
    }

    fn in_batches<T, F>(&self, fixtures: &[Fixture], predict: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Fixture) -> T + Sync,
    {
        let pause = self.config.batch_pause();
        let mut out = Vec::with_capacity(fixtures.len());
        for (idx, batch) in fixtures.chunks(self.config.batch_size.max(1)).enumerate() {
            if idx > 0 && !pause.is_zero() {
                thread::sleep(pause);
            }
            let predicted: Vec<T> = batch.par_iter().map(&predict).collect();
            out.extend(predicted);
        }
        out
    }

    /// Loads `fixture_id` from history and predicts it.
    pub fn predict_fixture(&self, fixture_id: u64) -> Result<(Fixture, PredictionResult)> {
        let fixture = self
            .history
            .fixture_by_id(fixture_id)
            .with_context(|| format!("load fixture {fixture_id}"))?
            .ok_or_else(|| anyhow!("fixture {fixture_id} not found"))?;
        let prediction = self.predict_match(&fixture);
        Ok((fixture, prediction))
    }
}

/// Scores an assembled context, falling back to the fixed DRAW call if scoring fails.
pub fn predict_from_context(ctx: &MatchContext) -> PredictionResult {
    match scorer::score_match(ctx) {
        Ok(scored) => {
            log::debug!(
                "fixture {} ({}): {} {}% home={:.2} away={:.2}",
                ctx.fixture.id,
                ctx.fixture.label(),
                scored.prediction.outcome,
                scored.prediction.confidence,
                scored.home_score,
                scored.away_score
            );
            scored.prediction
        }
        Err(err) => {
            log::warn!("scoring fell back for fixture {}: {err:#}", ctx.fixture.id);
            PredictionResult::fallback()
        }
    }
}
