//! Match persistence.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use sportz_core::{Match, MatchStatus};
use tracing::{debug, instrument};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers::{format_ts, parse_ts};

const TABLE: &str = "matches";

const SELECT_COLUMNS: &str = "SELECT id, sport, home_team, away_team, status, start_time, \
     end_time, home_score, away_score, created_at FROM matches";

/// Validated input for a new match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMatch {
    /// Sport name.
    pub sport: String,
    /// Home side.
    pub home_team: String,
    /// Away side.
    pub away_team: String,
    /// Scheduled kick-off.
    pub start_time: DateTime<Utc>,
    /// Scheduled end, strictly after `start_time`.
    pub end_time: DateTime<Utc>,
    /// Initial home score.
    pub home_score: u32,
    /// Initial away score.
    pub away_score: u32,
}

/// Raw column values, decoded after the statement finishes.
struct MatchRow {
    id: i64,
    sport: String,
    home_team: String,
    away_team: String,
    status: String,
    start_time: String,
    end_time: String,
    home_score: u32,
    away_score: u32,
    created_at: String,
}

impl MatchRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sport: row.get(1)?,
            home_team: row.get(2)?,
            away_team: row.get(3)?,
            status: row.get(4)?,
            start_time: row.get(5)?,
            end_time: row.get(6)?,
            home_score: row.get(7)?,
            away_score: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_match(self) -> Result<Match, StoreError> {
        let status = MatchStatus::parse(&self.status).ok_or_else(|| StoreError::CorruptRow {
            table: TABLE,
            column: "status",
            detail: format!("unknown status {:?}", self.status),
        })?;
        Ok(Match {
            id: self.id,
            sport: self.sport,
            home_team: self.home_team,
            away_team: self.away_team,
            status,
            start_time: parse_ts(&self.start_time, TABLE, "start_time")?,
            end_time: parse_ts(&self.end_time, TABLE, "end_time")?,
            home_score: self.home_score,
            away_score: self.away_score,
            created_at: parse_ts(&self.created_at, TABLE, "created_at")?,
        })
    }
}

/// Repository for the `matches` table.
#[derive(Clone, Debug)]
pub struct MatchRepo {
    db: Database,
}

impl MatchRepo {
    /// Wrap a database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Newest matches first, at most `limit`.
    #[instrument(skip(self))]
    pub fn list(&self, limit: u32) -> Result<Vec<Match>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map([limit], MatchRow::read)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(MatchRow::into_match).collect()
        })
    }

    /// Get a match by ID.
    #[instrument(skip(self))]
    pub fn get(&self, id: i64) -> Result<Match, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [id], MatchRow::read)
                .optional()?
                .ok_or_else(|| StoreError::NotFound(format!("match {id}")))?
                .into_match()
        })
    }

    /// Insert a match. Status is derived from the schedule at insert time.
    #[instrument(skip(self, new), fields(sport = %new.sport))]
    pub fn create(&self, new: &NewMatch) -> Result<Match, StoreError> {
        let now = Utc::now();
        let status = MatchStatus::at(new.start_time, new.end_time, now);
        let created = self.db.with_conn(|conn| {
            let _ = conn.execute(
                "INSERT INTO matches (sport, home_team, away_team, status, start_time, end_time, \
                 home_score, away_score, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    new.sport,
                    new.home_team,
                    new.away_team,
                    status.as_str(),
                    format_ts(new.start_time),
                    format_ts(new.end_time),
                    new.home_score,
                    new.away_score,
                    format_ts(now),
                ],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [id], MatchRow::read)?
                .into_match()
        })?;
        debug!(match_id = created.id, status = created.status.as_str(), "match created");
        Ok(created)
    }

    /// Set both scores and refresh the status from the schedule.
    #[instrument(skip(self))]
    pub fn update_score(
        &self,
        id: i64,
        home_score: u32,
        away_score: u32,
    ) -> Result<Match, StoreError> {
        let mut current = self.get(id)?;
        let _ = current.sync_status(Utc::now());
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE matches SET home_score = ?1, away_score = ?2, status = ?3 WHERE id = ?4",
                params![home_score, away_score, current.status.as_str(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("match {id}")));
            }
            Ok(())
        })?;
        current.home_score = home_score;
        current.away_score = away_score;
        Ok(current)
    }
}
