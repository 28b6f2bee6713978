use std::time::{Duration, Instant};

use chrono::NaiveDate;

use fixture_oracle::history::InMemoryHistory;
use fixture_oracle::model::{MatchStatus, Outcome, Team};
use fixture_oracle::statistics::StatisticalAnalysis;
use fixture_oracle::synthetic::{LeagueSpec, synthetic_league};
use fixture_oracle::{EngineConfig, Fixture, PredictionEngine};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn league_engine(seed: u64) -> (PredictionEngine<InMemoryHistory>, Vec<Fixture>) {
    let snapshot = synthetic_league(
        LeagueSpec {
            seed,
            ..LeagueSpec::default()
        },
        today(),
    );
    let fixtures = snapshot.fixtures.clone();
    let cfg = EngineConfig {
        batch_pause_ms: 0,
        ..EngineConfig::default()
    };
    let engine = PredictionEngine::new(InMemoryHistory::from_snapshot(snapshot), cfg)
        .with_reference_date(today());
    (engine, fixtures)
}

#[test]
fn form_scores_stay_on_scale() {
    let (engine, _) = league_engine(7);
    for team_id in 1..=10 {
        for n in [1, 3, 5, 10] {
            let form = engine.analyze_form(team_id, n);
            assert!((0.0..=100.0).contains(&form.form_score), "team {team_id} n {n}");
            assert!(form.matches_counted() <= n);
            assert_eq!(
                (form.wins + form.draws + form.losses) as usize,
                form.matches_counted()
            );
        }
    }
}

#[test]
fn teams_without_history_get_neutral_values() {
    let (engine, _) = league_engine(7);
    let ghost = 9_999;

    let form = engine.analyze_form(ghost, 5);
    assert_eq!(form.form_score, 50.0);
    assert_eq!((form.wins, form.draws, form.losses), (0, 0, 0));
    assert_eq!((form.goals_for, form.goals_against), (0, 0));

    let stats = engine.analyze_statistics(ghost);
    assert_eq!(stats, StatisticalAnalysis::neutral());
    assert_eq!(
        (
            stats.home_advantage,
            stats.goal_differential,
            stats.clean_sheet_ratio,
            stats.scoring_consistency,
            stats.defensive_strength,
            stats.attacking_strength,
        ),
        (50.0, 0.0, 0.0, 50.0, 50.0, 50.0)
    );

    assert_eq!(engine.analyze_head_to_head(ghost, 1), 50.0);
}

#[test]
fn strengths_are_clamped_and_blend_real_seasons() {
    let (engine, _) = league_engine(11);
    for team_id in 1..=10 {
        let s = engine.analyze_statistics(team_id);
        assert_ne!(s, StatisticalAnalysis::neutral());
        for v in [
            s.home_advantage,
            s.clean_sheet_ratio,
            s.scoring_consistency,
            s.defensive_strength,
            s.attacking_strength,
        ] {
            assert!((0.0..=100.0).contains(&v));
        }
    }
}

#[test]
fn every_fixture_gets_a_bounded_call() {
    for seed in [1, 2, 3, 42] {
        let (engine, fixtures) = league_engine(seed);
        assert!(!fixtures.is_empty());
        for (fixture, prediction) in engine.predict_matches(&fixtures) {
            assert!(
                (30..=95).contains(&prediction.confidence),
                "fixture {} confidence {}",
                fixture.id,
                prediction.confidence
            );
            assert!(matches!(
                prediction.outcome,
                Outcome::HomeWin | Outcome::Draw | Outcome::AwayWin
            ));
            let f = prediction.factors;
            for v in [
                f.home_form_score,
                f.away_form_score,
                f.head_to_head_score,
                f.goal_difference_factor,
            ] {
                assert!((0.0..=100.0).contains(&v));
            }
        }
    }
}

#[test]
fn repeated_predictions_are_identical() {
    let (engine, fixtures) = league_engine(5);
    for fixture in fixtures.iter().take(8) {
        let first = engine.predict_match(fixture);
        let second = engine.predict_match(fixture);
        assert_eq!(first, second);
        assert_eq!(
            first.factors.home_form_score.to_bits(),
            second.factors.home_form_score.to_bits()
        );
    }

    let (other, _) = league_engine(5);
    let a = engine.predict_matches(&fixtures);
    let b = other.predict_matches(&fixtures);
    assert_eq!(a, b);
}

#[test]
fn batch_prediction_keeps_input_order() {
    let (engine, fixtures) = league_engine(9);
    let mut reversed = fixtures.clone();
    reversed.reverse();

    let out = engine.predict_matches(&reversed);
    assert_eq!(out.len(), reversed.len());
    for ((fixture, prediction), expected) in out.iter().zip(&reversed) {
        assert_eq!(fixture.id, expected.id);
        assert_eq!(*prediction, engine.predict_match(expected));
    }

    let detailed = engine.predict_matches_detailed(&fixtures[..3]);
    let ids: Vec<u64> = detailed.iter().map(|(ctx, _)| ctx.fixture.id).collect();
    let want: Vec<u64> = fixtures[..3].iter().map(|f| f.id).collect();
    assert_eq!(ids, want);
}

#[test]
fn empty_batch_is_empty() {
    let (engine, _) = league_engine(3);
    assert!(engine.predict_matches(&[]).is_empty());
}

fn paced_engine(batch_size: usize, batch_pause_ms: u64) -> PredictionEngine<InMemoryHistory> {
    let cfg = EngineConfig {
        batch_size,
        batch_pause_ms,
        ..EngineConfig::default()
    };
    PredictionEngine::new(InMemoryHistory::new(), cfg).with_reference_date(today())
}

fn bare_fixtures(count: u64) -> Vec<Fixture> {
    (0..count)
        .map(|i| Fixture {
            id: 700 + i,
            home: Team::new(1, "Home"),
            away: Team::new(2, "Away"),
            date: today(),
            status: MatchStatus::Scheduled,
        })
        .collect()
}

fn timed(engine: &PredictionEngine<InMemoryHistory>, fixtures: &[Fixture]) -> Duration {
    let started = Instant::now();
    let out = engine.predict_matches(fixtures);
    let elapsed = started.elapsed();
    assert_eq!(out.len(), fixtures.len());
    elapsed
}

#[test]
fn batches_pause_between_chunks_only() {
    // 5 fixtures in chunks of 2 is three chunks, so two pauses.
    let elapsed = timed(&paced_engine(2, 30), &bare_fixtures(5));
    assert!(elapsed >= Duration::from_millis(60), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(90), "{elapsed:?}");

    // Exactly two full chunks: one pause, none after the last chunk.
    let elapsed = timed(&paced_engine(2, 30), &bare_fixtures(4));
    assert!(elapsed >= Duration::from_millis(30), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(60), "{elapsed:?}");
}

#[test]
fn single_chunk_and_zero_pause_never_sleep() {
    let elapsed = timed(&paced_engine(5, 30), &bare_fixtures(5));
    assert!(elapsed < Duration::from_millis(30), "{elapsed:?}");

    let elapsed = timed(&paced_engine(1, 0), &bare_fixtures(5));
    assert!(elapsed < Duration::from_millis(30), "{elapsed:?}");
}
