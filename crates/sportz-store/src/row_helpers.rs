use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::StoreError;

/// Canonical timestamp encoding for TEXT columns.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a TEXT timestamp column, returning `CorruptRow` on failure.
pub(crate) fn parse_ts(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptRow {
            table,
            column,
            detail: format!("invalid timestamp {raw:?}: {e}"),
        })
}

/// Parse an optional JSON TEXT column.
pub(crate) fn parse_json_opt<T: serde::de::DeserializeOwned>(
    raw: Option<&str>,
    table: &'static str,
    column: &'static str,
) -> Result<Option<T>, StoreError> {
    raw.map(|s| {
        serde_json::from_str(s).map_err(|e| StoreError::CorruptRow {
            table,
            column,
            detail: format!("invalid JSON: {e}"),
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn timestamp_roundtrip_keeps_millis() {
        let ts = DateTime::parse_from_rfc3339("2026-05-01T15:00:00.123Z")
            .unwrap()
            .with_timezone(&Utc);
        let raw = format_ts(ts);
        assert_eq!(raw, "2026-05-01T15:00:00.123Z");
        assert_eq!(parse_ts(&raw, "t", "c").unwrap(), ts);
    }

    #[test]
    fn bad_timestamp_is_corrupt_row() {
        assert_matches!(
            parse_ts("yesterday", "matches", "start_time"),
            Err(StoreError::CorruptRow { column: "start_time", .. })
        );
    }

    #[test]
    fn json_column() {
        let tags: Option<Vec<String>> = parse_json_opt(Some(r#"["a","b"]"#), "t", "c").unwrap();
        assert_eq!(tags, Some(vec!["a".into(), "b".into()]));
        let none: Option<Vec<String>> = parse_json_opt(None, "t", "c").unwrap();
        assert!(none.is_none());
        assert!(parse_json_opt::<Vec<String>>(Some("{"), "t", "c").is_err());
    }
}
