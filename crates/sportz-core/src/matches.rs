//! Match records and lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a match is in its lifecycle relative to the wall clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Kick-off is still in the future.
    Scheduled,
    /// Between kick-off and the final whistle.
    Live,
    /// At or past the scheduled end.
    Finished,
}

impl MatchStatus {
    /// Compute the status of a match spanning `[start, end)` at `now`.
    pub fn at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now < start {
            Self::Scheduled
        } else if now >= end {
            Self::Finished
        } else {
            Self::Live
        }
    }

    /// Wire/storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Finished => "finished",
        }
    }

    /// Parse the storage representation. Unknown strings yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "live" => Some(Self::Live),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

/// A sporting fixture between two teams.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Store-assigned identifier.
    pub id: i64,
    /// Sport name, e.g. `"football"`.
    pub sport: String,
    /// Home side.
    pub home_team: String,
    /// Away side.
    pub away_team: String,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Scheduled kick-off.
    pub start_time: DateTime<Utc>,
    /// Scheduled end.
    pub end_time: DateTime<Utc>,
    /// Home score.
    pub home_score: u32,
    /// Away score.
    pub away_score: u32,
    /// When the record was stored.
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Recompute `status` from the schedule. Returns `true` if it changed.
    pub fn sync_status(&mut self, now: DateTime<Utc>) -> bool {
        let next = MatchStatus::at(self.start_time, self.end_time, now);
        if next == self.status {
            return false;
        }
        self.status = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn sample(status: MatchStatus) -> Match {
        Match {
            id: 1,
            sport: "football".into(),
            home_team: "Lions".into(),
            away_team: "Tigers".into(),
            status,
            start_time: ts("2026-05-01T15:00:00Z"),
            end_time: ts("2026-05-01T17:00:00Z"),
            home_score: 0,
            away_score: 0,
            created_at: ts("2026-04-01T00:00:00Z"),
        }
    }

    #[test]
    fn before_start_is_scheduled() {
        let start = ts("2026-05-01T15:00:00Z");
        let end = start + Duration::hours(2);
        assert_eq!(
            MatchStatus::at(start, end, start - Duration::seconds(1)),
            MatchStatus::Scheduled
        );
    }

    #[test]
    fn at_start_is_live() {
        let start = ts("2026-05-01T15:00:00Z");
        let end = start + Duration::hours(2);
        assert_eq!(MatchStatus::at(start, end, start), MatchStatus::Live);
    }

    #[test]
    fn at_end_is_finished() {
        let start = ts("2026-05-01T15:00:00Z");
        let end = start + Duration::hours(2);
        assert_eq!(MatchStatus::at(start, end, end), MatchStatus::Finished);
        assert_eq!(
            MatchStatus::at(start, end, end + Duration::days(3)),
            MatchStatus::Finished
        );
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [MatchStatus::Scheduled, MatchStatus::Live, MatchStatus::Finished] {
            assert_eq!(MatchStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(MatchStatus::parse("postponed"), None);
    }

    #[test]
    fn sync_status_reports_change() {
        let mut m = sample(MatchStatus::Scheduled);
        assert!(m.sync_status(ts("2026-05-01T16:00:00Z")));
        assert_eq!(m.status, MatchStatus::Live);
        assert!(!m.sync_status(ts("2026-05-01T16:30:00Z")));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(sample(MatchStatus::Live)).unwrap();
        assert_eq!(json["homeTeam"], "Lions");
        assert_eq!(json["awayScore"], 0);
        assert_eq!(json["status"], "live");
        assert_eq!(json["startTime"], "2026-05-01T15:00:00Z");
    }
}
