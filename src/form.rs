use serde::{Deserialize, Serialize};

use crate::history::MatchHistory;
use crate::model::{CompletedMatch, MatchResult, clamp_score};

pub const DEFAULT_FORM_MATCHES: usize = 5;
pub const NEUTRAL_FORM_SCORE: f64 = 50.0;

/// Short-window performance over a team's last few completed matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormAnalysis {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    /// 0-100, share of available points taken.
    pub form_score: f64,
    /// Results in the order they were analyzed (most recent first).
    pub results: Vec<MatchResult>,
}

impl FormAnalysis {
    pub fn neutral() -> Self {
        Self {
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            form_score: NEUTRAL_FORM_SCORE,
            results: Vec::new(),
        }
    }

    pub fn matches_counted(&self) -> usize {
        self.results.len()
    }

    pub fn points(&self) -> u32 {
        self.wins * 3 + self.draws
    }

    /// e.g. "WWDLW", most recent first.
    pub fn form_string(&self) -> String {
        self.results.iter().map(|r| r.letter()).collect()
    }
}

/// Scores up to `n` of `matches` for `team_id`.
///
/// `matches` is expected most-recent-first. Non-final matches and matches the team did not play
/// are skipped. An empty window yields the neutral analysis.
pub fn analyze_form(team_id: u32, matches: &[CompletedMatch], n: usize) -> FormAnalysis {
    let mut out = FormAnalysis::neutral();
    for m in matches
        .iter()
        .filter(|m| m.status.is_final() && m.involves(team_id))
        .take(n)
    {
        let Some((gf, ga)) = m.goals_for_against(team_id) else {
            continue;
        };
        out.goals_for += gf as u32;
        out.goals_against += ga as u32;
        let result = MatchResult::from_goals(gf, ga);
        match result {
            MatchResult::Win => out.wins += 1,
            MatchResult::Draw => out.draws += 1,
            MatchResult::Loss => out.losses += 1,
        }
        out.results.push(result);
    }

    let counted = out.matches_counted();
    if counted == 0 {
        return FormAnalysis::neutral();
    }
    out.form_score = clamp_score(out.points() as f64 / (counted as f64 * 3.0) * 100.0);
    out
}

/// Fetches the window from `history` and scores it; lookup failures give the neutral analysis.
pub fn analyze_team_form(history: &dyn MatchHistory, team_id: u32, n: usize) -> FormAnalysis {
    match history.recent_completed_matches(team_id, n) {
        Ok(matches) => analyze_form(team_id, &matches, n),
        Err(err) => {
            log::warn!("form lookup failed for team {team_id}: {err:#}");
            FormAnalysis::neutral()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::MatchStatus;

    fn played(id: u64, home: u32, away: u32, hg: u8, ag: u8) -> CompletedMatch {
        CompletedMatch {
            id,
            home_team_id: home,
            away_team_id: away,
            home_goals: hg,
            away_goals: ag,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            status: MatchStatus::Finished,
        }
    }

    #[test]
    fn counts_results_by_role() {
        let matches = vec![
            played(5, 1, 2, 2, 0),
            played(4, 3, 1, 1, 1),
            played(3, 1, 4, 0, 3),
            played(2, 5, 1, 0, 2),
        ];
        let form = analyze_form(1, &matches, 5);
        assert_eq!((form.wins, form.draws, form.losses), (2, 1, 1));
        assert_eq!((form.goals_for, form.goals_against), (5, 4));
        assert_eq!(form.form_string(), "WDLW");
        // 7 of 12 points.
        assert!((form.form_score - 7.0 / 12.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn window_is_capped_at_n() {
        let matches: Vec<_> = (0..8).map(|i| played(i, 1, 2, 1, 0)).collect();
        let form = analyze_form(1, &matches, 3);
        assert_eq!(form.wins, 3);
        assert_eq!(form.matches_counted(), 3);
    }

    #[test]
    fn empty_window_is_neutral() {
        let form = analyze_form(1, &[], 5);
        assert_eq!(form, FormAnalysis::neutral());
        assert_eq!(form.form_score, 50.0);
    }

    #[test]
    fn unfinished_matches_are_ignored() {
        let mut live = played(9, 1, 2, 4, 0);
        live.status = MatchStatus::Live;
        let form = analyze_form(1, &[live], 5);
        assert_eq!(form, FormAnalysis::neutral());
    }
}
