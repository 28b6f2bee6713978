use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::model::{CompletedMatch, Fixture, SeasonStatistics, Team};

/// Read access to historical results, season aggregates and fixtures.
///
/// Implementations may hit the network or disk; every call may fail. The analyzers absorb those
/// failures, so implementors should report errors rather than invent neutral data themselves.
pub trait MatchHistory: Send + Sync {
    /// Up to `limit` final-status matches involving `team_id`, most recent first.
    fn recent_completed_matches(&self, team_id: u32, limit: usize) -> Result<Vec<CompletedMatch>>;

    /// The aggregate record for `(team_id, season)`, if one was ever synced.
    fn season_statistics(&self, team_id: u32, season: i32) -> Result<Option<SeasonStatistics>>;

    /// Up to `limit` final-status meetings between the two teams (either side at home), most
    /// recent first.
    fn head_to_head_matches(
        &self,
        team_a: u32,
        team_b: u32,
        limit: usize,
    ) -> Result<Vec<CompletedMatch>>;

    fn fixture_by_id(&self, fixture_id: u64) -> Result<Option<Fixture>>;
}

/// Serializable dump of everything `InMemoryHistory` holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySnapshot {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub matches: Vec<CompletedMatch>,
    #[serde(default)]
    pub season_stats: Vec<SeasonStatistics>,
    #[serde(default)]
    pub fixtures: Vec<Fixture>,
}

/// Frozen, in-process history. Used for backtests, benches and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    teams: HashMap<u32, Team>,
    matches: Vec<CompletedMatch>,
    season_stats: HashMap<(u32, i32), SeasonStatistics>,
    fixtures: HashMap<u64, Fixture>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: HistorySnapshot) -> Self {
        let mut out = Self::new();
        for team in snapshot.teams {
            out.add_team(team);
        }
        // Later duplicates win, as with `add_match`; sorted once at the end.
        let mut by_id = HashMap::with_capacity(snapshot.matches.len());
        for m in snapshot.matches {
            by_id.insert(m.id, m);
        }
        out.matches = by_id.into_values().collect();
        out.sort_matches();
        for stats in snapshot.season_stats {
            out.set_season_statistics(stats);
        }
        for fixture in snapshot.fixtures {
            out.add_fixture(fixture);
        }
        out
    }

    pub fn add_team(&mut self, team: Team) {
        self.teams.insert(team.id, team);
    }

    pub fn team(&self, team_id: u32) -> Option<&Team> {
        self.teams.get(&team_id)
    }

    pub fn add_match(&mut self, m: CompletedMatch) {
        self.matches.retain(|existing| existing.id != m.id);
        self.matches.push(m);
        self.sort_matches();
    }

    // Most recent first; id breaks ties so ordering never depends on insertion order.
    fn sort_matches(&mut self) {
        self.matches
            .sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    }

    /// Replaces any record already held for the same (team, season).
    pub fn set_season_statistics(&mut self, stats: SeasonStatistics) {
        self.season_stats.insert((stats.team_id, stats.season), stats);
    }

    /// Also registers either side not yet known as a team.
    pub fn add_fixture(&mut self, fixture: Fixture) {
        for side in [&fixture.home, &fixture.away] {
            if self.team(side.id).is_none() {
                self.add_team(side.clone());
            }
        }
        self.fixtures.insert(fixture.id, fixture);
    }

    pub fn matches(&self) -> &[CompletedMatch] {
        &self.matches
    }
}

impl MatchHistory for InMemoryHistory {
    fn recent_completed_matches(&self, team_id: u32, limit: usize) -> Result<Vec<CompletedMatch>> {
        Ok(self
            .matches
            .iter()
            .filter(|m| m.status.is_final() && m.involves(team_id))
            .take(limit)
            .cloned()
            .collect())
    }

    fn season_statistics(&self, team_id: u32, season: i32) -> Result<Option<SeasonStatistics>> {
        Ok(self.season_stats.get(&(team_id, season)).cloned())
    }

    fn head_to_head_matches(
        &self,
        team_a: u32,
        team_b: u32,
        limit: usize,
    ) -> Result<Vec<CompletedMatch>> {
        Ok(self
            .matches
            .iter()
            .filter(|m| m.status.is_final() && m.involves(team_a) && m.involves(team_b))
            .take(limit)
            .cloned()
            .collect())
    }

    fn fixture_by_id(&self, fixture_id: u64) -> Result<Option<Fixture>> {
        Ok(self.fixtures.get(&fixture_id).cloned())
    }
}
