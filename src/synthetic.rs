//! Reproducible fake league used by `seed_demo`, the bench and tests.

use std::collections::HashMap;

use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::history::HistorySnapshot;
use crate::model::{CompletedMatch, Fixture, MatchStatus, SeasonStatistics, Team};
use crate::statistics::current_season;

const TEAM_NAMES: [&str; 10] = [
    "Ashford Rovers",
    "Brookvale United",
    "Castleford Athletic",
    "Dunmore City",
    "Eastwick Wanderers",
    "Fenwick Town",
    "Glenhaven Albion",
    "Harrowgate FC",
    "Ivybridge Villa",
    "Juniper Park",
];

const BASE_GOALS: f64 = 1.30;
const HOME_BOOST: f64 = 0.25;
const SEASON_OPENING_DAY: u32 = 10;
const DAYS_PER_ROUND: i64 = 7;

#[derive(Debug, Clone, Copy)]
pub struct LeagueSpec {
    pub seed: u64,
    pub teams: usize,
    /// Completed seasons before the current one.
    pub past_seasons: u32,
    pub season_start_month: u32,
}

impl Default for LeagueSpec {
    fn default() -> Self {
        Self {
            seed: 2026,
            teams: TEAM_NAMES.len(),
            past_seasons: 2,
            season_start_month: 8,
        }
    }
}

/// A double round-robin per season. Rounds dated before `today` in the current season are
/// played; the rest are left as scheduled fixtures.
pub fn synthetic_league(spec: LeagueSpec, today: NaiveDate) -> HistorySnapshot {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let n = spec.teams.clamp(2, TEAM_NAMES.len());
    let teams: Vec<Team> = TEAM_NAMES
        .iter()
        .take(n)
        .enumerate()
        .map(|(idx, name)| Team::new(idx as u32 + 1, *name))
        .collect();
    let strength: HashMap<u32, f64> = teams
        .iter()
        .map(|t| (t.id, rng.gen_range(-0.6..0.6)))
        .collect();

    let current = current_season(today, spec.season_start_month);
    let mut snapshot = HistorySnapshot {
        teams: teams.clone(),
        ..Default::default()
    };
    let mut next_id = 1u64;

    for season in (current - spec.past_seasons as i32)..=current {
        let Some(opening) =
            NaiveDate::from_ymd_opt(season, spec.season_start_month, SEASON_OPENING_DAY)
        else {
            continue;
        };
        let mut table: HashMap<u32, SeasonStatistics> = teams
            .iter()
            .map(|t| {
                (
                    t.id,
                    SeasonStatistics {
                        team_id: t.id,
                        season,
                        ..Default::default()
                    },
                )
            })
            .collect();

        for (round, pairs) in double_round_robin(&teams).into_iter().enumerate() {
            let date = opening + ChronoDuration::days(round as i64 * DAYS_PER_ROUND);
            for (home, away) in pairs {
                let id = next_id;
                next_id += 1;
                if season == current && date >= today {
                    snapshot.fixtures.push(Fixture {
                        id,
                        home: home.clone(),
                        away: away.clone(),
                        date,
                        status: MatchStatus::Scheduled,
                    });
                    continue;
                }
                let gap = strength[&home.id] - strength[&away.id];
                let home_goals = poisson(&mut rng, BASE_GOALS + HOME_BOOST + gap / 2.0);
                let away_goals = poisson(&mut rng, BASE_GOALS - gap / 2.0);
                let m = CompletedMatch {
                    id,
                    home_team_id: home.id,
                    away_team_id: away.id,
                    home_goals,
                    away_goals,
                    date,
                    status: MatchStatus::Finished,
                };
                if let Some(s) = table.get_mut(&home.id) {
                    record(s, home_goals, away_goals, true);
                }
                if let Some(s) = table.get_mut(&away.id) {
                    record(s, away_goals, home_goals, false);
                }
                snapshot.matches.push(m);
            }
        }

        let mut rows: Vec<SeasonStatistics> = table
            .into_values()
            .filter(|s| s.played > 0)
            .collect();
        rows.sort_by_key(|s| s.team_id);
        snapshot.season_stats.extend(rows);
    }

    snapshot
}

fn record(s: &mut SeasonStatistics, goals_for: u8, goals_against: u8, home: bool) {
    s.played += 1;
    s.goals_for += goals_for as u32;
    s.goals_against += goals_against as u32;
    if goals_against == 0 {
        s.clean_sheets += 1;
    }
    if goals_for == 0 {
        s.failed_to_score += 1;
    }
    match goals_for.cmp(&goals_against) {
        std::cmp::Ordering::Greater => {
            s.wins += 1;
            if home {
                s.home_wins += 1;
            } else {
                s.away_wins += 1;
            }
        }
        std::cmp::Ordering::Equal => {
            s.draws += 1;
            if home {
                s.home_draws += 1;
            } else {
                s.away_draws += 1;
            }
        }
        std::cmp::Ordering::Less => {
            s.losses += 1;
            if home {
                s.home_losses += 1;
            } else {
                s.away_losses += 1;
            }
        }
    }
}

/// Circle-method schedule; the second half mirrors the first with venues swapped.
fn double_round_robin(teams: &[Team]) -> Vec<Vec<(Team, Team)>> {
    let mut slots: Vec<Option<&Team>> = teams.iter().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();
    let mut first_half = Vec::with_capacity(n - 1);
    for round in 0..n - 1 {
        let mut pairs = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            let (a, b) = (slots[i], slots[n - 1 - i]);
            if let (Some(a), Some(b)) = (a, b) {
                if (round + i) % 2 == 0 {
                    pairs.push((a.clone(), b.clone()));
                } else {
                    pairs.push((b.clone(), a.clone()));
                }
            }
        }
        first_half.push(pairs);
        slots[1..].rotate_right(1);
    }
    let second_half: Vec<Vec<(Team, Team)>> = first_half
        .iter()
        .map(|pairs| {
            pairs
                .iter()
                .map(|(h, a)| (a.clone(), h.clone()))
                .collect()
        })
        .collect();
    first_half.into_iter().chain(second_half).collect()
}

fn poisson(rng: &mut impl Rng, lambda: f64) -> u8 {
    let lambda = lambda.clamp(0.1, 6.0);
    let limit = (-lambda).exp();
    let mut k = 0u8;
    let mut p: f64 = 1.0;
    loop {
        p *= rng.gen_range(0.0..1.0);
        if p <= limit || k >= 12 {
            return k;
        }
        k += 1;
    }
}
