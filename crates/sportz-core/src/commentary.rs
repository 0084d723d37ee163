//! Play-by-play commentary entries attached to a match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One commentary line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commentary {
    /// Store-assigned identifier.
    pub id: i64,
    /// Owning match.
    pub match_id: i64,
    /// Minute of play.
    pub minute: u32,
    /// Ordering hint within a minute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
    /// Period label, e.g. `"1H"` or `"Q3"`.
    pub period: String,
    /// Event kind, e.g. `"goal"`.
    pub event_type: String,
    /// Player involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Team involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Human-readable text.
    pub message: String,
    /// Free-form structured extras.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// Labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// When the record was stored.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted() {
        let c = Commentary {
            id: 7,
            match_id: 1,
            minute: 42,
            sequence: None,
            period: "1H".into(),
            event_type: "goal".into(),
            actor: None,
            team: None,
            message: "What a strike!".into(),
            metadata: None,
            tags: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["matchId"], 1);
        assert_eq!(json["eventType"], "goal");
        assert!(json.get("actor").is_none());
        assert!(json.get("tags").is_none());
    }
}
