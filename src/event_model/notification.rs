use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of change reported by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Updated,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Updated => "updated",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification handed to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub kind: ChangeKind,
    pub notification: Notification,
}

impl Delivery {
    pub fn added(notification: Notification) -> Self {
        Self {
            kind: ChangeKind::Added,
            notification,
        }
    }

    pub fn updated(notification: Notification) -> Self {
        Self {
            kind: ChangeKind::Updated,
            notification,
        }
    }
}

/// Cluster event object as delivered by the control plane.
///
/// Only the fields the sink reads are typed; everything else is carried in
/// `extra` so the raw record mode can reproduce the upstream object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub involved_object: ObjectReference,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub source: EventOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub count: i32,
    #[serde(default, rename = "type")]
    pub event_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notification {
    /// Upstream version of this notification; see [`parse_version`].
    pub fn version(&self) -> u64 {
        parse_version(&self.metadata.resource_version)
    }

    /// Timestamp used to pick the daily log file: last-seen, then the event
    /// time, then first-seen.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp
            .or(self.event_time)
            .or(self.first_timestamp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub resource_version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The object an event is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Component and host that reported the event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventOrigin {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub component: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
}

/// Parses an upstream version string.
///
/// Versions that are not a non-negative decimal integer map to 0, so they are
/// always dropped: 0 is never strictly above the watermark.
pub fn parse_version(raw: &str) -> u64 {
    raw.parse::<u64>().unwrap_or(0)
}
