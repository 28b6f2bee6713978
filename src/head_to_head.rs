use crate::history::MatchHistory;
use crate::model::{CompletedMatch, clamp_score};

pub const DEFAULT_HEAD_TO_HEAD_LIMIT: usize = 10;
pub const NEUTRAL_HEAD_TO_HEAD: f64 = 50.0;

/// Share of points `team_a` took from the given meetings, 0-100.
///
/// Meetings `team_a` did not take part in are ignored. No meetings reads as 50.
pub fn head_to_head_score(team_a: u32, meetings: &[CompletedMatch]) -> f64 {
    let mut points = 0u32;
    let mut counted = 0u32;
    for m in meetings.iter().filter(|m| m.status.is_final()) {
        let Some(result) = m.result_for(team_a) else {
            continue;
        };
        points += result.points();
        counted += 1;
    }
    if counted == 0 {
        return NEUTRAL_HEAD_TO_HEAD;
    }
    clamp_score(points as f64 / (counted as f64 * 3.0) * 100.0)
}

/// `team_a`'s historical edge over `team_b` from their last `limit` meetings.
pub fn analyze_head_to_head(
    history: &dyn MatchHistory,
    team_a: u32,
    team_b: u32,
    limit: usize,
) -> (f64, Vec<CompletedMatch>) {
    match history.head_to_head_matches(team_a, team_b, limit) {
        Ok(mut meetings) => {
            meetings.truncate(limit);
            (head_to_head_score(team_a, &meetings), meetings)
        }
        Err(err) => {
            log::warn!("head-to-head lookup failed for {team_a} v {team_b}: {err:#}");
            (NEUTRAL_HEAD_TO_HEAD, Vec::new())
        }
    }
}
