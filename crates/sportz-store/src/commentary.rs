//! Commentary persistence.

use chrono::Utc;
use rusqlite::{Row, params};
use serde_json::{Map, Value};
use sportz_core::Commentary;
use tracing::instrument;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers::{format_ts, parse_json_opt, parse_ts};

const TABLE: &str = "commentary";

const SELECT_COLUMNS: &str = "SELECT id, match_id, minute, sequence, period, event_type, actor, \
     team, message, metadata, tags, created_at FROM commentary";

/// Validated input for a new commentary entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewCommentary {
    /// Minute of play.
    pub minute: u32,
    /// Ordering hint within a minute.
    pub sequence: Option<u32>,
    /// Period label.
    pub period: String,
    /// Event kind.
    pub event_type: String,
    /// Player involved.
    pub actor: Option<String>,
    /// Team involved.
    pub team: Option<String>,
    /// Text, non-empty.
    pub message: String,
    /// Structured extras.
    pub metadata: Option<Map<String, Value>>,
    /// Labels.
    pub tags: Option<Vec<String>>,
}

struct CommentaryRow {
    id: i64,
    match_id: i64,
    minute: u32,
    sequence: Option<u32>,
    period: String,
    event_type: String,
    actor: Option<String>,
    team: Option<String>,
    message: String,
    metadata: Option<String>,
    tags: Option<String>,
    created_at: String,
}

impl CommentaryRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            match_id: row.get(1)?,
            minute: row.get(2)?,
            sequence: row.get(3)?,
            period: row.get(4)?,
            event_type: row.get(5)?,
            actor: row.get(6)?,
            team: row.get(7)?,
            message: row.get(8)?,
            metadata: row.get(9)?,
            tags: row.get(10)?,
            created_at: row.get(11)?,
        })
    }

    fn into_commentary(self) -> Result<Commentary, StoreError> {
        Ok(Commentary {
            id: self.id,
            match_id: self.match_id,
            minute: self.minute,
            sequence: self.sequence,
            period: self.period,
            event_type: self.event_type,
            actor: self.actor,
            team: self.team,
            message: self.message,
            metadata: parse_json_opt(self.metadata.as_deref(), TABLE, "metadata")?,
            tags: parse_json_opt(self.tags.as_deref(), TABLE, "tags")?,
            created_at: parse_ts(&self.created_at, TABLE, "created_at")?,
        })
    }
}

/// Repository for the `commentary` table.
#[derive(Clone, Debug)]
pub struct CommentaryRepo {
    db: Database,
}

impl CommentaryRepo {
    /// Wrap a database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Newest entries for `match_id` first, at most `limit`.
    #[instrument(skip(self))]
    pub fn list_for_match(&self, match_id: i64, limit: u32) -> Result<Vec<Commentary>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE match_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![match_id, limit], CommentaryRow::read)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(CommentaryRow::into_commentary).collect()
        })
    }

    /// Insert an entry for an existing match.
    ///
    /// Returns `NotFound` when `match_id` does not exist.
    #[instrument(skip(self, new), fields(event_type = %new.event_type))]
    pub fn create(&self, match_id: i64, new: &NewCommentary) -> Result<Commentary, StoreError> {
        let metadata = new.metadata.as_ref().map(serde_json::to_string).transpose()?;
        let tags = new.tags.as_ref().map(serde_json::to_string).transpose()?;
        let now = format_ts(Utc::now());

        self.db.with_conn(|conn| {
            let exists = conn
                .prepare_cached("SELECT 1 FROM matches WHERE id = ?1")?
                .exists([match_id])?;
            if !exists {
                return Err(StoreError::NotFound(format!("match {match_id}")));
            }

            let _ = conn.execute(
                "INSERT INTO commentary (match_id, minute, sequence, period, event_type, actor, \
                 team, message, metadata, tags, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    match_id,
                    new.minute,
                    new.sequence,
                    new.period,
                    new.event_type,
                    new.actor,
                    new.team,
                    new.message,
                    metadata,
                    tags,
                    now,
                ],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [id],
                CommentaryRow::read,
            )?
            .into_commentary()
        })
    }
}
