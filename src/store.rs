//! SQLite-backed history and prediction storage.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::history::{HistorySnapshot, MatchHistory};
use crate::model::{
    CompletedMatch, Fixture, MatchStatus, Outcome, PredictionFactors, PredictionResult,
    SeasonStatistics, Team,
};

const DATE_FMT: &str = "%Y-%m-%d";

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            team_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY,
            home_team_id INTEGER NOT NULL,
            away_team_id INTEGER NOT NULL,
            home_goals INTEGER NULL,
            away_goals INTEGER NULL,
            match_date TEXT NOT NULL,
            status TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_home ON matches(home_team_id, match_date);
        CREATE INDEX IF NOT EXISTS idx_matches_away ON matches(away_team_id, match_date);
        CREATE INDEX IF NOT EXISTS idx_matches_status ON matches(status);

        CREATE TABLE IF NOT EXISTS season_stats (
            team_id INTEGER NOT NULL,
            season INTEGER NOT NULL,
            played INTEGER NOT NULL,
            wins INTEGER NOT NULL,
            draws INTEGER NOT NULL,
            losses INTEGER NOT NULL,
            home_wins INTEGER NOT NULL,
            home_draws INTEGER NOT NULL,
            home_losses INTEGER NOT NULL,
            away_wins INTEGER NOT NULL,
            away_draws INTEGER NOT NULL,
            away_losses INTEGER NOT NULL,
            goals_for INTEGER NOT NULL,
            goals_against INTEGER NOT NULL,
            clean_sheets INTEGER NOT NULL,
            failed_to_score INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (team_id, season)
        );

        CREATE TABLE IF NOT EXISTS predictions (
            fixture_id INTEGER PRIMARY KEY,
            outcome TEXT NOT NULL,
            confidence INTEGER NOT NULL,
            home_form_score REAL NOT NULL,
            away_form_score REAL NOT NULL,
            head_to_head_score REAL NOT NULL,
            home_advantage REAL NOT NULL,
            goal_difference_factor REAL NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .context("init sqlite schema")?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredPrediction {
    pub fixture_id: u64,
    pub prediction: PredictionResult,
    pub created_at: String,
}

/// History and predictions in one SQLite database.
pub struct SqliteHistory {
    conn: Mutex<Connection>,
}

impl SqliteHistory {
    pub fn new(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open(path: &Path) -> Result<Self> {
        Self::new(open_db(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory().context("open in-memory sqlite db")?)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("history db lock poisoned"))
    }

    pub fn upsert_team(&self, team: &Team) -> Result<()> {
        let conn = self.conn()?;
        upsert_team(&conn, team)
    }

    pub fn upsert_match(&self, m: &CompletedMatch) -> Result<()> {
        let conn = self.conn()?;
        upsert_match(&conn, m)
    }

    /// Stores a fixture that has no result yet.
    pub fn upsert_fixture(&self, fixture: &Fixture) -> Result<()> {
        let conn = self.conn()?;
        upsert_fixture(&conn, fixture)
    }

    /// Replaces the whole (team, season) record.
    pub fn upsert_season_stats(&self, stats: &SeasonStatistics) -> Result<()> {
        let conn = self.conn()?;
        upsert_season_stats(&conn, stats)
    }

    /// Writes everything in `snapshot` in a single transaction.
    pub fn import_snapshot(&self, snapshot: &HistorySnapshot) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().context("begin import transaction")?;
        for team in &snapshot.teams {
            upsert_team(&tx, team)?;
        }
        for m in &snapshot.matches {
            upsert_match(&tx, m)?;
        }
        for stats in &snapshot.season_stats {
            upsert_season_stats(&tx, stats)?;
        }
        for fixture in &snapshot.fixtures {
            upsert_team(&tx, &fixture.home)?;
            upsert_team(&tx, &fixture.away)?;
            upsert_fixture(&tx, fixture)?;
        }
        tx.commit().context("commit import transaction")?;
        Ok(())
    }

    /// Keeps exactly one prediction per fixture; a newer one replaces the older.
    pub fn upsert_prediction(&self, fixture_id: u64, prediction: &PredictionResult) -> Result<()> {
        let conn = self.conn()?;
        let f = &prediction.factors;
        conn.execute(
            r#"
            INSERT INTO predictions (
                fixture_id, outcome, confidence,
                home_form_score, away_form_score, head_to_head_score,
                home_advantage, goal_difference_factor, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(fixture_id) DO UPDATE SET
                outcome = excluded.outcome,
                confidence = excluded.confidence,
                home_form_score = excluded.home_form_score,
                away_form_score = excluded.away_form_score,
                head_to_head_score = excluded.head_to_head_score,
                home_advantage = excluded.home_advantage,
                goal_difference_factor = excluded.goal_difference_factor,
                created_at = excluded.created_at
            "#,
            params![
                fixture_id as i64,
                prediction.outcome.as_str(),
                prediction.confidence as i64,
                f.home_form_score,
                f.away_form_score,
                f.head_to_head_score,
                f.home_advantage,
                f.goal_difference_factor,
                Utc::now().to_rfc3339(),
            ],
        )
        .with_context(|| format!("upsert prediction for fixture {fixture_id}"))?;
        Ok(())
    }

    pub fn load_prediction(&self, fixture_id: u64) -> Result<Option<StoredPrediction>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT outcome, confidence,
                       home_form_score, away_form_score, head_to_head_score,
                       home_advantage, goal_difference_factor, created_at
                FROM predictions
                WHERE fixture_id = ?1
                "#,
                params![fixture_id as i64],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        PredictionFactors {
                            home_form_score: row.get(2)?,
                            away_form_score: row.get(3)?,
                            head_to_head_score: row.get(4)?,
                            home_advantage: row.get(5)?,
                            goal_difference_factor: row.get(6)?,
                        },
                        row.get::<_, String>(7)?,
                    ))
                },
            )
            .optional()
            .context("query prediction")?;

        let Some((outcome, confidence, factors, created_at)) = row else {
            return Ok(None);
        };
        let outcome =
            Outcome::parse(&outcome).ok_or_else(|| anyhow!("unknown outcome {outcome:?}"))?;
        Ok(Some(StoredPrediction {
            fixture_id,
            prediction: PredictionResult {
                outcome,
                confidence: u8::try_from(confidence.clamp(0, 100)).unwrap_or(0),
                factors,
            },
            created_at,
        }))
    }

    pub fn prediction_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))
            .context("count predictions")?;
        Ok(n as usize)
    }

    /// Fixtures still to be played, soonest first.
    pub fn scheduled_fixtures(&self) -> Result<Vec<Fixture>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "{FIXTURE_SELECT} WHERE m.status = ?1 ORDER BY m.match_date ASC, m.match_id ASC"
            ))
            .context("prepare scheduled fixtures query")?;
        let rows = stmt
            .query_map(params![MatchStatus::Scheduled.as_str()], read_fixture_row)
            .context("query scheduled fixtures")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode fixture row")?.into_fixture()?);
        }
        Ok(out)
    }
}

const MATCH_COLUMNS: &str = r#"
    SELECT match_id, home_team_id, away_team_id, home_goals, away_goals, match_date, status
    FROM matches
"#;

const FIXTURE_SELECT: &str = r#"
    SELECT m.match_id, m.home_team_id, ht.name, m.away_team_id, at.name, m.match_date, m.status
    FROM matches m
    LEFT JOIN teams ht ON ht.team_id = m.home_team_id
    LEFT JOIN teams at ON at.team_id = m.away_team_id
"#;

struct MatchRow {
    match_id: i64,
    home_team_id: i64,
    away_team_id: i64,
    home_goals: Option<i64>,
    away_goals: Option<i64>,
    match_date: String,
    status: String,
}

fn read_match_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MatchRow> {
    Ok(MatchRow {
        match_id: row.get(0)?,
        home_team_id: row.get(1)?,
        away_team_id: row.get(2)?,
        home_goals: row.get(3)?,
        away_goals: row.get(4)?,
        match_date: row.get(5)?,
        status: row.get(6)?,
    })
}

impl MatchRow {
    fn into_match(self) -> Result<CompletedMatch> {
        let (Some(home_goals), Some(away_goals)) = (self.home_goals, self.away_goals) else {
            return Err(anyhow!("match {} has no final score", self.match_id));
        };
        Ok(CompletedMatch {
            id: self.match_id as u64,
            home_team_id: u32::try_from(self.home_team_id).context("home team id")?,
            away_team_id: u32::try_from(self.away_team_id).context("away team id")?,
            home_goals: u8::try_from(home_goals).context("home goals")?,
            away_goals: u8::try_from(away_goals).context("away goals")?,
            date: parse_date(&self.match_date)?,
            status: parse_status(&self.status)?,
        })
    }
}

struct FixtureRow {
    match_id: i64,
    home_team_id: i64,
    home_name: Option<String>,
    away_team_id: i64,
    away_name: Option<String>,
    match_date: String,
    status: String,
}

fn read_fixture_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FixtureRow> {
    Ok(FixtureRow {
        match_id: row.get(0)?,
        home_team_id: row.get(1)?,
        home_name: row.get(2)?,
        away_team_id: row.get(3)?,
        away_name: row.get(4)?,
        match_date: row.get(5)?,
        status: row.get(6)?,
    })
}

impl FixtureRow {
    fn into_fixture(self) -> Result<Fixture> {
        let home_id = u32::try_from(self.home_team_id).context("home team id")?;
        let away_id = u32::try_from(self.away_team_id).context("away team id")?;
        Ok(Fixture {
            id: self.match_id as u64,
            home: Team::new(
                home_id,
                self.home_name.unwrap_or_else(|| format!("Team {home_id}")),
            ),
            away: Team::new(
                away_id,
                self.away_name.unwrap_or_else(|| format!("Team {away_id}")),
            ),
            date: parse_date(&self.match_date)?,
            status: parse_status(&self.status)?,
        })
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FMT).with_context(|| format!("bad match date {raw:?}"))
}

fn parse_status(raw: &str) -> Result<MatchStatus> {
    MatchStatus::parse(raw).ok_or_else(|| anyhow!("unknown match status {raw:?}"))
}

fn decode_matches(
    rows: impl Iterator<Item = rusqlite::Result<MatchRow>>,
) -> Result<Vec<CompletedMatch>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode match row")?.into_match()?);
    }
    Ok(out)
}

fn upsert_team(conn: &Connection, team: &Team) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO teams (team_id, name) VALUES (?1, ?2)
        ON CONFLICT(team_id) DO UPDATE SET name = excluded.name
        "#,
        params![team.id as i64, team.name],
    )
    .context("upsert team")?;
    Ok(())
}

fn upsert_match(conn: &Connection, m: &CompletedMatch) -> Result<()> {
    write_match_row(
        conn,
        m.id,
        m.home_team_id,
        m.away_team_id,
        Some((m.home_goals, m.away_goals)),
        m.date,
        m.status,
    )
}

fn upsert_fixture(conn: &Connection, f: &Fixture) -> Result<()> {
    write_match_row(conn, f.id, f.home.id, f.away.id, None, f.date, f.status)
}

fn write_match_row(
    conn: &Connection,
    match_id: u64,
    home_team_id: u32,
    away_team_id: u32,
    score: Option<(u8, u8)>,
    date: NaiveDate,
    status: MatchStatus,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO matches (
            match_id, home_team_id, away_team_id, home_goals, away_goals,
            match_date, status, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(match_id) DO UPDATE SET
            home_team_id = excluded.home_team_id,
            away_team_id = excluded.away_team_id,
            home_goals = excluded.home_goals,
            away_goals = excluded.away_goals,
            match_date = excluded.match_date,
            status = excluded.status,
            updated_at = excluded.updated_at
        "#,
        params![
            match_id as i64,
            home_team_id as i64,
            away_team_id as i64,
            score.map(|(h, _)| h as i64),
            score.map(|(_, a)| a as i64),
            date.format(DATE_FMT).to_string(),
            status.as_str(),
            Utc::now().to_rfc3339(),
        ],
    )
    .with_context(|| format!("upsert match {match_id}"))?;
    Ok(())
}

fn upsert_season_stats(conn: &Connection, s: &SeasonStatistics) -> Result<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO season_stats (
            team_id, season, played, wins, draws, losses,
            home_wins, home_draws, home_losses,
            away_wins, away_draws, away_losses,
            goals_for, goals_against, clean_sheets, failed_to_score, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        "#,
        params![
            s.team_id as i64,
            s.season,
            s.played,
            s.wins,
            s.draws,
            s.losses,
            s.home_wins,
            s.home_draws,
            s.home_losses,
            s.away_wins,
            s.away_draws,
            s.away_losses,
            s.goals_for,
            s.goals_against,
            s.clean_sheets,
            s.failed_to_score,
            Utc::now().to_rfc3339(),
        ],
    )
    .with_context(|| format!("upsert season {} stats for team {}", s.season, s.team_id))?;
    Ok(())
}

impl MatchHistory for SqliteHistory {
    fn recent_completed_matches(&self, team_id: u32, limit: usize) -> Result<Vec<CompletedMatch>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                r#"{MATCH_COLUMNS}
                WHERE status = ?1
                  AND (home_team_id = ?2 OR away_team_id = ?2)
                  AND home_goals IS NOT NULL
                  AND away_goals IS NOT NULL
                ORDER BY match_date DESC, match_id DESC
                LIMIT ?3"#
            ))
            .context("prepare recent matches query")?;
        let rows = stmt
            .query_map(
                params![MatchStatus::Finished.as_str(), team_id as i64, limit as i64],
                read_match_row,
            )
            .context("query recent matches")?;
        decode_matches(rows)
    }

    fn season_statistics(&self, team_id: u32, season: i32) -> Result<Option<SeasonStatistics>> {
        let conn = self.conn()?;
        conn.query_row(
            r#"
            SELECT played, wins, draws, losses,
                   home_wins, home_draws, home_losses,
                   away_wins, away_draws, away_losses,
                   goals_for, goals_against, clean_sheets, failed_to_score
            FROM season_stats
            WHERE team_id = ?1 AND season = ?2
            "#,
            params![team_id as i64, season],
            |row| {
                Ok(SeasonStatistics {
                    team_id,
                    season,
                    played: row.get(0)?,
                    wins: row.get(1)?,
                    draws: row.get(2)?,
                    losses: row.get(3)?,
                    home_wins: row.get(4)?,
                    home_draws: row.get(5)?,
                    home_losses: row.get(6)?,
                    away_wins: row.get(7)?,
                    away_draws: row.get(8)?,
                    away_losses: row.get(9)?,
                    goals_for: row.get(10)?,
                    goals_against: row.get(11)?,
                    clean_sheets: row.get(12)?,
                    failed_to_score: row.get(13)?,
                })
            },
        )
        .optional()
        .with_context(|| format!("query season {season} stats for team {team_id}"))
    }

    fn head_to_head_matches(
        &self,
        team_a: u32,
        team_b: u32,
        limit: usize,
    ) -> Result<Vec<CompletedMatch>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                r#"{MATCH_COLUMNS}
                WHERE status = ?1
                  AND ((home_team_id = ?2 AND away_team_id = ?3)
                    OR (home_team_id = ?3 AND away_team_id = ?2))
                  AND home_goals IS NOT NULL
                  AND away_goals IS NOT NULL
                ORDER BY match_date DESC, match_id DESC
                LIMIT ?4"#
            ))
            .context("prepare head-to-head query")?;
        let rows = stmt
            .query_map(
                params![
                    MatchStatus::Finished.as_str(),
                    team_a as i64,
                    team_b as i64,
                    limit as i64
                ],
                read_match_row,
            )
            .context("query head-to-head matches")?;
        decode_matches(rows)
    }

    fn fixture_by_id(&self, fixture_id: u64) -> Result<Option<Fixture>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("{FIXTURE_SELECT} WHERE m.match_id = ?1"),
                params![fixture_id as i64],
                read_fixture_row,
            )
            .optional()
            .with_context(|| format!("query fixture {fixture_id}"))?;
        row.map(FixtureRow::into_fixture).transpose()
    }
}
