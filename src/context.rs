use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::form::{self, FormAnalysis};
use crate::head_to_head;
use crate::history::MatchHistory;
use crate::model::{CompletedMatch, Fixture, Team};
use crate::statistics::{self, StatisticalAnalysis};

/// Everything the scorer needs for one fixture, gathered in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    pub fixture: Fixture,
    pub home_form: FormAnalysis,
    pub away_form: FormAnalysis,
    pub home_stats: StatisticalAnalysis,
    pub away_stats: StatisticalAnalysis,
    /// Meetings between the two sides, most recent first.
    pub head_to_head: Vec<CompletedMatch>,
    /// Home side's edge from `head_to_head`, 0-100.
    pub head_to_head_score: f64,
    pub home_advantage: f64,
}

impl MatchContext {
    pub fn home_team(&self) -> &Team {
        &self.fixture.home
    }

    pub fn away_team(&self) -> &Team {
        &self.fixture.away
    }
}

/// Runs every analyzer for `fixture` in parallel and waits for all of them.
///
/// Never fails: each analyzer already turns lookup errors into its neutral result.
pub fn build_match_context(
    history: &dyn MatchHistory,
    fixture: &Fixture,
    cfg: &EngineConfig,
    season: i32,
) -> MatchContext {
    let home_id = fixture.home.id;
    let away_id = fixture.away.id;

    let ((home_form, away_form), ((home_stats, away_stats), (h2h_score, h2h))) = rayon::join(
        || {
            rayon::join(
                || form::analyze_team_form(history, home_id, cfg.form_matches),
                || form::analyze_team_form(history, away_id, cfg.form_matches),
            )
        },
        || {
            rayon::join(
                || {
                    rayon::join(
                        || {
                            statistics::analyze_statistics(
                                history,
                                home_id,
                                season,
                                &cfg.season_weights,
                            )
                        },
                        || {
                            statistics::analyze_statistics(
                                history,
                                away_id,
                                season,
                                &cfg.season_weights,
                            )
                        },
                    )
                },
                || {
                    head_to_head::analyze_head_to_head(
                        history,
                        home_id,
                        away_id,
                        cfg.head_to_head_limit,
                    )
                },
            )
        },
    );

    MatchContext {
        fixture: fixture.clone(),
        home_form,
        away_form,
        home_stats,
        away_stats,
        head_to_head: h2h,
        head_to_head_score: h2h_score,
        home_advantage: cfg.home_advantage,
    }
}
