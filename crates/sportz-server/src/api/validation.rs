//! Input checks for REST bodies, path segments, and query strings.
//!
//! Every check collects all problems instead of stopping at the first, so
//! a 400 response lists each offending field.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sportz_store::{NewCommentary, NewMatch};

/// Upper bound for `limit` query parameters.
pub const MAX_LIMIT: u32 = 100;

/// One validation failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Offending field (empty for the whole body).
    pub path: String,
    /// What is wrong with it.
    pub message: String,
}

impl Issue {
    /// Build an issue.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

type Checked<T> = Result<T, Vec<Issue>>;

/// Parse an optional `limit`: a positive integer no larger than [`MAX_LIMIT`].
pub fn parse_limit(raw: Option<&str>) -> Checked<Option<u32>> {
    let Some(raw) = raw else { return Ok(None) };
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(vec![Issue::new("limit", "Number must be greater than 0")]),
        Ok(n) if n > MAX_LIMIT => Err(vec![Issue::new(
            "limit",
            format!("Number must be less than or equal to {MAX_LIMIT}"),
        )]),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(vec![Issue::new("limit", "Expected a positive integer")]),
    }
}

/// Parse a match ID path segment: a positive integer.
pub fn parse_match_id(raw: &str) -> Checked<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        Ok(_) => Err(vec![Issue::new("id", "Number must be greater than 0")]),
        Err(_) => Err(vec![Issue::new("id", "Expected a positive integer")]),
    }
}

/// Validate a create-match body.
pub fn create_match(body: &Value) -> Checked<NewMatch> {
    let mut f = Fields::new(body)?;
    let sport = f.required_string("sport", "Sport is required");
    let home_team = f.required_string("homeTeam", "Home team is required");
    let away_team = f.required_string("awayTeam", "Away team is required");
    let start_time = f.timestamp("startTime");
    let end_time = f.timestamp("endTime");
    let home_score = f.coerced_u32("homeScore", false);
    let away_score = f.coerced_u32("awayScore", false);

    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end <= start {
            f.issue("endTime", "endTime must be chronologically after startTime");
        }
    }

    f.finish()?;
    match (sport, home_team, away_team, start_time, end_time) {
        (Some(sport), Some(home_team), Some(away_team), Some(start_time), Some(end_time)) => {
            Ok(NewMatch {
                sport,
                home_team,
                away_team,
                start_time,
                end_time,
                home_score: home_score.unwrap_or(0),
                away_score: away_score.unwrap_or(0),
            })
        }
        _ => Err(vec![Issue::new("", "Incomplete payload")]),
    }
}

/// Validate a score-update body. Returns `(home, away)`.
pub fn update_score(body: &Value) -> Checked<(u32, u32)> {
    let mut f = Fields::new(body)?;
    let home = f.coerced_u32("homeScore", true);
    let away = f.coerced_u32("awayScore", true);
    f.finish()?;
    match (home, away) {
        (Some(home), Some(away)) => Ok((home, away)),
        _ => Err(vec![Issue::new("", "Incomplete payload")]),
    }
}

/// Validate a create-commentary body.
pub fn create_commentary(body: &Value) -> Checked<NewCommentary> {
    let mut f = Fields::new(body)?;
    let minute = f.strict_u32("minute", true);
    let sequence = f.strict_u32("sequence", false);
    let period = f.string("period", true);
    let event_type = f.string("eventType", true);
    let actor = f.string("actor", false);
    let team = f.string("team", false);
    let message = f.required_string("message", "Message is required");
    let metadata = f.object("metadata");
    let tags = f.string_array("tags");

    f.finish()?;
    match (minute, period, event_type, message) {
        (Some(minute), Some(period), Some(event_type), Some(message)) => Ok(NewCommentary {
            minute,
            sequence,
            period,
            event_type,
            actor,
            team,
            message,
            metadata,
            tags,
        }),
        _ => Err(vec![Issue::new("", "Incomplete payload")]),
    }
}

/// Field accessor that accumulates issues.
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    issues: Vec<Issue>,
}

impl<'a> Fields<'a> {
    fn new(body: &'a Value) -> Checked<Self> {
        match body.as_object() {
            Some(obj) => Ok(Self {
                obj,
                issues: Vec::new(),
            }),
            None => Err(vec![Issue::new("", "Expected object")]),
        }
    }

    fn issue(&mut self, path: &str, message: impl Into<String>) {
        self.issues.push(Issue::new(path, message));
    }

    fn finish(self) -> Checked<()> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(self.issues)
        }
    }

    /// Missing keys and explicit `null` are both "absent".
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.obj.get(key).filter(|v| !v.is_null())
    }

    fn absent(&mut self, key: &str, required: bool) {
        if required {
            self.issue(key, "Required");
        }
    }

    fn string(&mut self, key: &str, required: bool) -> Option<String> {
        match self.get(key) {
            None => {
                self.absent(key, required);
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.issue(key, "Expected string");
                None
            }
        }
    }

    fn required_string(&mut self, key: &str, empty_message: &str) -> Option<String> {
        let value = self.string(key, true)?;
        if value.is_empty() {
            self.issue(key, empty_message);
            return None;
        }
        Some(value)
    }

    fn timestamp(&mut self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.string(key, true)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(_) => {
                self.issue(key, format!("{key} must be a valid ISO date string"));
                None
            }
        }
    }

    /// Non-negative integer given as a JSON number or a numeric string.
    fn coerced_u32(&mut self, key: &str, required: bool) -> Option<u32> {
        match self.get(key) {
            None => {
                self.absent(key, required);
                None
            }
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(n) => self.whole_u32(key, n),
                Err(_) => {
                    self.issue(key, "Expected number");
                    None
                }
            },
            Some(Value::Number(n)) => {
                let n = n.as_f64().unwrap_or(f64::NAN);
                self.whole_u32(key, n)
            }
            Some(_) => {
                self.issue(key, "Expected number");
                None
            }
        }
    }

    /// Non-negative integer given as a JSON number only.
    fn strict_u32(&mut self, key: &str, required: bool) -> Option<u32> {
        match self.get(key) {
            None => {
                self.absent(key, required);
                None
            }
            Some(Value::Number(n)) => {
                let n = n.as_f64().unwrap_or(f64::NAN);
                self.whole_u32(key, n)
            }
            Some(_) => {
                self.issue(key, "Expected number");
                None
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range-checked above
    fn whole_u32(&mut self, key: &str, n: f64) -> Option<u32> {
        if !n.is_finite() {
            self.issue(key, "Expected number");
            None
        } else if n.fract() != 0.0 {
            self.issue(key, "Expected integer, received float");
            None
        } else if n < 0.0 {
            self.issue(key, "Number must be greater than or equal to 0");
            None
        } else if n > f64::from(u32::MAX) {
            self.issue(key, "Number is too large");
            None
        } else {
            Some(n as u32)
        }
    }

    fn object(&mut self, key: &str) -> Option<Map<String, Value>> {
        match self.get(key)? {
            Value::Object(map) => Some(map.clone()),
            _ => {
                self.issue(key, "Expected object");
                None
            }
        }
    }

    fn string_array(&mut self, key: &str) -> Option<Vec<String>> {
        let Value::Array(items) = self.get(key)? else {
            self.issue(key, "Expected array");
            return None;
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item {
                Value::String(s) => out.push(s.clone()),
                _ => self.issue(&format!("{key}.{i}"), "Expected string"),
            }
        }
        (out.len() == items.len()).then_some(out)
    }
}
