use super::notification::Notification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Projection applied to every notification before it is appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordMode {
    /// Flat record with the fields operators usually grep for.
    #[default]
    Curated,
    /// The full upstream object.
    Raw,
}

impl fmt::Display for RecordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordMode::Curated => f.write_str("curated"),
            RecordMode::Raw => f.write_str("raw"),
        }
    }
}

/// Serializes notifications into single-line JSON records.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordEncoder {
    mode: RecordMode,
}

impl RecordEncoder {
    pub fn new(mode: RecordMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RecordMode {
        self.mode
    }

    /// Encodes `notification` as one JSON object without embedded newlines.
    pub fn encode(&self, notification: &Notification) -> String {
        let encoded = match self.mode {
            RecordMode::Curated => serde_json::to_string(&CuratedRecord::from(notification)),
            RecordMode::Raw => serde_json::to_string(notification),
        };
        encoded.expect("notification records contain only string-keyed JSON")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CuratedRecord<'a> {
    resource_version: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    last_timestamp: String,
    first_timestamp: String,
    count: i32,
    name: &'a str,
    namespace: &'a str,
    kind: &'a str,
    reason: &'a str,
    source: String,
    message: &'a str,
}

impl<'a> From<&'a Notification> for CuratedRecord<'a> {
    fn from(notification: &'a Notification) -> Self {
        let involved = &notification.involved_object;
        Self {
            resource_version: &notification.metadata.resource_version,
            event_type: &notification.event_type,
            last_timestamp: format_timestamp(notification.last_timestamp),
            first_timestamp: format_timestamp(notification.first_timestamp),
            count: notification.count,
            name: &involved.name,
            namespace: &involved.namespace,
            kind: &involved.kind,
            reason: &notification.reason,
            source: format!(
                "{}{}",
                notification.source.component, notification.source.host
            ),
            message: &notification.message,
        }
    }
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| ts.format(RECORD_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}
