use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::page::RawReview;

/// Fixed textual form for review timestamps (UTC, second precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// A single review as delivered to exporters.
///
/// Built once from a [`RawReview`]; only `author_label` changes afterwards,
/// when resolved display names are merged back in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewEntry {
    pub author_id: String, // Empty when the source omits it
    pub author_label: String,
    pub body: String,
    pub recommended: bool,
    #[serde(with = "timestamp_format")]
    pub created_at: DateTime<Utc>,
    pub playtime_minutes: u64,
}

impl ReviewEntry {
    pub fn from_raw(raw: RawReview) -> Self {
        let author_id = raw.author_id.unwrap_or_default();
        let created_at = raw
            .timestamp_created
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_default();

        Self {
            author_label: author_id.clone(),
            author_id,
            body: raw.body.unwrap_or_default(),
            recommended: raw.recommended.unwrap_or(false),
            created_at,
            playtime_minutes: raw.playtime_minutes.unwrap_or(0),
        }
    }

    pub fn created_at_display(&self) -> String {
        format_timestamp(&self.created_at)
    }

    /// Replace the label with the resolved display name, falling back to the id.
    pub fn apply_label(&mut self, label: Option<&String>) {
        self.author_label = label.cloned().unwrap_or_else(|| self.author_id.clone());
    }
}

mod timestamp_format {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_defaults_missing_fields() {
        let entry = ReviewEntry::from_raw(RawReview::default());
        assert_eq!(entry.author_id, "");
        assert_eq!(entry.author_label, "");
        assert_eq!(entry.body, "");
        assert!(!entry.recommended);
        assert_eq!(entry.playtime_minutes, 0);
        assert_eq!(entry.created_at_display(), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_from_raw_normalizes_timestamp() {
        let raw = RawReview {
            author_id: Some("76561197960287930".to_string()),
            body: Some("Great game".to_string()),
            recommended: Some(true),
            timestamp_created: Some(1_700_000_000),
            playtime_minutes: Some(125),
        };
        let entry = ReviewEntry::from_raw(raw);
        assert_eq!(entry.author_label, "76561197960287930");
        assert_eq!(entry.created_at_display(), "2023-11-14 22:13:20");
        assert_eq!(entry.playtime_minutes, 125);
    }

    #[test]
    fn test_apply_label_falls_back_to_id() {
        let mut entry = ReviewEntry::from_raw(RawReview {
            author_id: Some("42".to_string()),
            ..RawReview::default()
        });
        entry.apply_label(None);
        assert_eq!(entry.author_label, "42");
        entry.apply_label(Some(&"Gabe".to_string()));
        assert_eq!(entry.author_label, "Gabe");
    }

    #[test]
    fn test_serializes_timestamp_as_text() {
        let entry = ReviewEntry::from_raw(RawReview {
            timestamp_created: Some(86_400),
            ..RawReview::default()
        });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["created_at"], "1970-01-02 00:00:00");
        let back: ReviewEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
