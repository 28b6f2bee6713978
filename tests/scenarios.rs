use anyhow::{Result, anyhow};
use chrono::{Duration, NaiveDate};

use fixture_oracle::context::MatchContext;
use fixture_oracle::engine::predict_from_context;
use fixture_oracle::history::{InMemoryHistory, MatchHistory};
use fixture_oracle::model::{
    CompletedMatch, Fixture, MatchStatus, Outcome, PredictionResult, SeasonStatistics, Team,
};
use fixture_oracle::scorer::{self, composite_scores, derive_factors};
use fixture_oracle::statistics::{StatisticalAnalysis, season_metrics};
use fixture_oracle::{EngineConfig, PredictionEngine};

const HOME: u32 = 1;
const AWAY: u32 = 2;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
}

fn config() -> EngineConfig {
    EngineConfig {
        batch_pause_ms: 0,
        ..EngineConfig::default()
    }
}

fn fixture() -> Fixture {
    Fixture {
        id: 500,
        home: Team::new(HOME, "Home FC"),
        away: Team::new(AWAY, "Away FC"),
        date: as_of() + Duration::days(3),
        status: MatchStatus::Scheduled,
    }
}

/// `scores` are (goals for, goals against) for `team`, most recent first, each against a
/// distinct filler opponent and alternating venue.
fn add_recent(h: &mut InMemoryHistory, team: u32, first_id: u64, scores: &[(u8, u8)]) {
    for (idx, (gf, ga)) in scores.iter().enumerate() {
        let opponent = 100 + team * 10 + idx as u32;
        let date = as_of() - Duration::days(7 * (idx as i64 + 1));
        let m = if idx % 2 == 0 {
            CompletedMatch {
                id: first_id + idx as u64,
                home_team_id: team,
                away_team_id: opponent,
                home_goals: *gf,
                away_goals: *ga,
                date,
                status: MatchStatus::Finished,
            }
        } else {
            CompletedMatch {
                id: first_id + idx as u64,
                home_team_id: opponent,
                away_team_id: team,
                home_goals: *ga,
                away_goals: *gf,
                date,
                status: MatchStatus::Finished,
            }
        };
        h.add_match(m);
    }
}

fn season(team: u32, season: i32) -> SeasonStatistics {
    SeasonStatistics {
        team_id: team,
        season,
        played: 20,
        wins: 8,
        draws: 6,
        losses: 6,
        home_wins: 5,
        home_draws: 3,
        home_losses: 2,
        away_wins: 3,
        away_draws: 3,
        away_losses: 4,
        goals_for: 28,
        goals_against: 24,
        clean_sheets: 6,
        failed_to_score: 5,
    }
}

fn engine(h: InMemoryHistory) -> PredictionEngine<InMemoryHistory> {
    PredictionEngine::new(h, config()).with_reference_date(as_of())
}

#[test]
fn dominant_home_form_is_a_confident_home_win() {
    let mut h = InMemoryHistory::new();
    add_recent(&mut h, HOME, 10, &[(3, 0), (3, 1), (3, 0), (3, 1), (3, 0)]);
    add_recent(&mut h, AWAY, 20, &[(0, 3), (1, 3), (0, 3), (1, 3), (0, 3)]);
    let engine = engine(h);

    let home_form = engine.analyze_form(HOME, 5);
    assert_eq!((home_form.wins, home_form.goals_for, home_form.goals_against), (5, 15, 2));
    let away_form = engine.analyze_form(AWAY, 5);
    assert_eq!((away_form.wins, away_form.goals_for, away_form.goals_against), (0, 2, 15));

    let prediction = engine.predict_match(&fixture());
    assert_eq!(prediction.outcome, Outcome::HomeWin);
    assert!(prediction.confidence >= 75);
    // home 100*.4 + 50*.35 + 50*.1 + 15*.15 = 64.75, away 0 + 17.5 + 5 = 22.5
    assert_eq!(prediction.confidence, 81);
    assert_eq!(prediction.factors.home_form_score, 100.0);
    assert_eq!(prediction.factors.away_form_score, 0.0);
    assert_eq!(prediction.factors.home_advantage, 15.0);
}

#[test]
fn evenly_matched_sides_go_to_the_probability_model() {
    let mut h = InMemoryHistory::new();
    let pattern = [(2, 1), (1, 1), (0, 1), (2, 0), (1, 1)];
    add_recent(&mut h, HOME, 10, &pattern);
    add_recent(&mut h, AWAY, 20, &pattern);
    for team in [HOME, AWAY] {
        h.set_season_statistics(season(team, 2025));
        h.set_season_statistics(season(team, 2024));
    }
    let engine = engine(h);

    let ctx = engine.build_match_context(&fixture());
    assert!(ctx.head_to_head.is_empty());
    assert_eq!(ctx.head_to_head_score, 50.0);
    assert_eq!(ctx.home_form.form_score, ctx.away_form.form_score);
    assert_eq!(ctx.home_stats, ctx.away_stats);

    let scored = scorer::score_match(&ctx).unwrap();
    assert!(scored.close_call);
    assert!((scored.score_diff() - 15.0 * 0.15).abs() < 1e-9);

    let p = scored.probs;
    assert!(p.home >= 0.0 && p.draw >= 0.0 && p.away >= 0.0);
    assert!((p.home + p.draw + p.away - 1.0).abs() < 1e-9);

    let prediction = engine.predict_match(&fixture());
    assert!((45..=75).contains(&prediction.confidence));
    assert_eq!(prediction, scored.prediction);
}

#[test]
fn head_to_head_dominance_weighs_exactly_ten_percent() {
    let mut h = InMemoryHistory::new();
    add_recent(&mut h, HOME, 10, &[(0, 1), (0, 2), (1, 1), (0, 1), (1, 2)]);
    add_recent(&mut h, AWAY, 20, &[(1, 1), (2, 1), (0, 0), (1, 2), (1, 0)]);
    // Ten older meetings: away side wins eight, two draws.
    for i in 0..10u64 {
        let date = as_of() - Duration::days(400 + 30 * i as i64);
        let (home_team_id, away_team_id, home_goals, away_goals) = match i {
            0 | 5 => (HOME, AWAY, 1, 1),
            _ if i % 2 == 0 => (HOME, AWAY, 0, 2),
            _ => (AWAY, HOME, 3, 1),
        };
        h.add_match(CompletedMatch {
            id: 1000 + i,
            home_team_id,
            away_team_id,
            home_goals,
            away_goals,
            date,
            status: MatchStatus::Finished,
        });
    }
    let engine = engine(h);

    let away_view = engine.analyze_head_to_head(AWAY, HOME);
    assert!((away_view - 26.0 / 30.0 * 100.0).abs() < 1e-9);

    let ctx = engine.build_match_context(&fixture());
    assert_eq!(ctx.head_to_head.len(), 10);
    let h2h = 2.0 / 30.0 * 100.0;
    assert!((ctx.head_to_head_score - h2h).abs() < 1e-9);

    let factors = derive_factors(&ctx);
    let (home_score, away_score) = composite_scores(&ctx, &factors);
    let expected_home = factors.home_form_score * 0.40
        + (ctx.home_stats.attacking_strength + ctx.home_stats.defensive_strength) / 2.0 * 0.35
        + h2h * 0.10
        + 15.0 * 0.15;
    let expected_away = factors.away_form_score * 0.40
        + (ctx.away_stats.attacking_strength + ctx.away_stats.defensive_strength) / 2.0 * 0.35
        + (100.0 - h2h) * 0.10;
    assert!((home_score - expected_home).abs() < 1e-9);
    assert!((away_score - expected_away).abs() < 1e-9);

    // Same context with a neutral record between the sides.
    let mut neutral = ctx.clone();
    neutral.head_to_head_score = 50.0;
    let nf = derive_factors(&neutral);
    let (nh, na) = composite_scores(&neutral, &nf);
    let shift = (nh - na) - (home_score - away_score);
    assert!((shift - (50.0 - h2h) * 0.20).abs() < 1e-9);

    let prediction = engine.predict_match(&fixture());
    assert_eq!(prediction.outcome, Outcome::AwayWin);
}

struct SeasonOutage {
    inner: InMemoryHistory,
    broken_team: u32,
}

impl MatchHistory for SeasonOutage {
    fn recent_completed_matches(&self, team_id: u32, limit: usize) -> Result<Vec<CompletedMatch>> {
        self.inner.recent_completed_matches(team_id, limit)
    }

    fn season_statistics(&self, team_id: u32, season: i32) -> Result<Option<SeasonStatistics>> {
        if team_id == self.broken_team {
            return Err(anyhow!("stats provider timed out for season {season}"));
        }
        self.inner.season_statistics(team_id, season)
    }

    fn head_to_head_matches(
        &self,
        team_a: u32,
        team_b: u32,
        limit: usize,
    ) -> Result<Vec<CompletedMatch>> {
        self.inner.head_to_head_matches(team_a, team_b, limit)
    }

    fn fixture_by_id(&self, fixture_id: u64) -> Result<Option<Fixture>> {
        self.inner.fixture_by_id(fixture_id)
    }
}

#[test]
fn failed_season_lookups_fall_back_to_neutral_statistics() {
    let mut inner = InMemoryHistory::new();
    add_recent(&mut inner, HOME, 10, &[(2, 0), (1, 0), (1, 1)]);
    add_recent(&mut inner, AWAY, 20, &[(0, 0), (2, 2)]);
    for team in [HOME, AWAY] {
        for s in 2023..=2025 {
            inner.set_season_statistics(season(team, s));
        }
    }
    inner.add_fixture(fixture());
    let engine = PredictionEngine::new(
        SeasonOutage {
            inner,
            broken_team: HOME,
        },
        config(),
    )
    .with_reference_date(as_of());

    assert_eq!(engine.analyze_statistics(HOME), StatisticalAnalysis::neutral());
    assert_ne!(engine.analyze_statistics(AWAY), StatisticalAnalysis::neutral());

    let (loaded, prediction) = engine.predict_fixture(500).unwrap();
    assert_eq!(loaded.id, 500);
    assert!((30..=95).contains(&prediction.confidence));

    let ctx = engine.build_match_context(&loaded);
    assert_eq!(ctx.home_stats, StatisticalAnalysis::neutral());
}

/// Fails only the lookup for one (team, season) pair.
struct SingleSeasonOutage {
    inner: InMemoryHistory,
    team: u32,
    season: i32,
}

impl MatchHistory for SingleSeasonOutage {
    fn recent_completed_matches(&self, team_id: u32, limit: usize) -> Result<Vec<CompletedMatch>> {
        self.inner.recent_completed_matches(team_id, limit)
    }

    fn season_statistics(&self, team_id: u32, season: i32) -> Result<Option<SeasonStatistics>> {
        if team_id == self.team && season == self.season {
            return Err(anyhow!("stats provider returned 503 for season {season}"));
        }
        self.inner.season_statistics(team_id, season)
    }

    fn head_to_head_matches(
        &self,
        team_a: u32,
        team_b: u32,
        limit: usize,
    ) -> Result<Vec<CompletedMatch>> {
        self.inner.head_to_head_matches(team_a, team_b, limit)
    }

    fn fixture_by_id(&self, fixture_id: u64) -> Result<Option<Fixture>> {
        self.inner.fixture_by_id(fixture_id)
    }
}

#[test]
fn one_failed_season_leaves_the_others_in_the_blend() {
    let mut inner = InMemoryHistory::new();
    let current = season(HOME, 2025);
    let previous = SeasonStatistics {
        goals_for: 40,
        goals_against: 15,
        clean_sheets: 10,
        ..season(HOME, 2024)
    };
    let older = SeasonStatistics {
        goals_for: 18,
        goals_against: 30,
        failed_to_score: 9,
        ..season(HOME, 2023)
    };
    for s in [current, previous.clone(), older.clone()] {
        inner.set_season_statistics(s);
    }
    let engine = PredictionEngine::new(
        SingleSeasonOutage {
            inner,
            team: HOME,
            season: 2025,
        },
        config(),
    )
    .with_reference_date(as_of());

    let m2024 = season_metrics(&previous).unwrap();
    let m2023 = season_metrics(&older).unwrap();
    let blend = |a: f64, b: f64| (a * 0.3 + b * 0.2) / 0.5;

    let got = engine.analyze_statistics(HOME);
    let pairs = [
        (got.home_advantage, blend(m2024.home_advantage, m2023.home_advantage)),
        (got.goal_differential, blend(m2024.goal_differential, m2023.goal_differential)),
        (got.clean_sheet_ratio, blend(m2024.clean_sheet_ratio, m2023.clean_sheet_ratio)),
        (
            got.scoring_consistency,
            blend(m2024.scoring_consistency, m2023.scoring_consistency),
        ),
        (
            got.defensive_strength,
            blend(m2024.defensive_strength, m2023.defensive_strength),
        ),
        (
            got.attacking_strength,
            blend(m2024.attacking_strength, m2023.attacking_strength),
        ),
    ];
    for (actual, expected) in pairs {
        assert!((actual - expected).abs() < 1e-9, "got {actual} want {expected}");
    }
    assert_ne!(got, StatisticalAnalysis::neutral());
}

#[test]
fn unknown_fixture_is_the_only_error() {
    let engine = engine(InMemoryHistory::new());
    assert!(engine.predict_fixture(404).is_err());

    // Any fixture with two teams still gets a call, even with no history at all.
    let prediction = engine.predict_match(&fixture());
    assert!((30..=95).contains(&prediction.confidence));
}

#[test]
fn home_composite_alone_carries_home_advantage() {
    // Two sides with nothing to tell them apart still differ by the home term. This asymmetry is
    // part of the scoring formula; the away composite has no counterpart.
    let engine = engine(InMemoryHistory::new());
    let ctx = engine.build_match_context(&fixture());
    let factors = derive_factors(&ctx);
    let (home, away) = composite_scores(&ctx, &factors);
    assert!((home - away - 2.25).abs() < 1e-9);
}

#[test]
fn non_finite_inputs_fall_back_to_a_low_confidence_draw() {
    let engine = engine(InMemoryHistory::new());
    let mut ctx: MatchContext = engine.build_match_context(&fixture());
    ctx.home_stats.attacking_strength = f64::NAN;

    assert!(scorer::score_match(&ctx).is_err());
    let prediction = predict_from_context(&ctx);
    assert_eq!(prediction, PredictionResult::fallback());
    assert_eq!(prediction.outcome, Outcome::Draw);
    assert_eq!(prediction.confidence, 30);
    assert_eq!(prediction.factors.home_advantage, 0.0);
    assert_eq!(prediction.factors.goal_difference_factor, 50.0);
}
