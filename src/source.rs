//! Boundary with the cluster event feed.
//!
//! The dispatcher pulls from an [`EventSource`]. Push-style producers (one
//! handler per change kind, each on its own thread) hand notifications to a
//! [`FeedSender`]; the single [`FeedReceiver`] is what the dispatcher drains,
//! so every watermark read-compare-advance happens on one thread.

use crate::config::SourceConfig;
use crate::event_model::{ChangeKind, Delivery, Notification};
use serde::Deserialize;
use serde_json::de::IoRead;
use serde_json::{StreamDeserializer, Value};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;

/// Unbounded, pull-based sequence of deliveries.
pub trait EventSource {
    /// Next delivery; `None` once the source is closed for good.
    fn next_delivery(&mut self) -> Option<Result<Delivery, SourceError>>;
}

/// Failures that make the event source unusable.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open event stream {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("event stream read failed: {0}")]
    Read(#[source] io::Error),
    #[error("event stream is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            SourceError::Read(err.into())
        } else {
            SourceError::Decode(err)
        }
    }
}

/// Returned when the receiving side of a feed has gone away.
#[derive(Debug, Error)]
#[error("notification feed closed")]
pub struct FeedClosed(pub Delivery);

/// Bounded hand-off between event producers and the dispatcher.
pub struct NotificationFeed;

impl NotificationFeed {
    /// Creates a feed holding at most `capacity` undelivered notifications.
    /// Producers block while the feed is full.
    pub fn bounded(capacity: usize) -> (FeedSender, FeedReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (FeedSender { tx }, FeedReceiver { rx })
    }
}

/// Producer handle; clone one per delivery context.
#[derive(Debug, Clone)]
pub struct FeedSender {
    tx: mpsc::Sender<Delivery>,
}

impl FeedSender {
    pub fn send(&self, delivery: Delivery) -> Result<(), FeedClosed> {
        self.tx
            .blocking_send(delivery)
            .map_err(|mpsc::error::SendError(delivery)| FeedClosed(delivery))
    }

    pub fn added(&self, notification: Notification) -> Result<(), FeedClosed> {
        self.send(Delivery::added(notification))
    }

    pub fn updated(&self, notification: Notification) -> Result<(), FeedClosed> {
        self.send(Delivery::updated(notification))
    }
}

/// Consumer side of a [`NotificationFeed`]; ends once every sender is dropped.
#[derive(Debug)]
pub struct FeedReceiver {
    rx: mpsc::Receiver<Delivery>,
}

impl EventSource for FeedReceiver {
    fn next_delivery(&mut self) -> Option<Result<Delivery, SourceError>> {
        self.rx.blocking_recv().map(Ok)
    }
}

/// Watch envelope as printed by `kubectl get events --watch --output-watch-events -o json`.
#[derive(Debug, Deserialize)]
struct WatchEnvelope {
    #[serde(rename = "type")]
    watch_type: String,
    object: Value,
}

/// Decodes a stream of concatenated JSON watch events.
///
/// `ADDED` and `MODIFIED` envelopes become deliveries, bare `Event` objects
/// are treated as additions, and other watch types are skipped. Invalid JSON
/// ends the stream with [`SourceError::Decode`].
pub struct WatchStreamSource<R: Read> {
    values: StreamDeserializer<'static, IoRead<R>, Value>,
}

impl<R: Read> WatchStreamSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            values: serde_json::Deserializer::from_reader(reader).into_iter::<Value>(),
        }
    }

    fn decode(value: Value) -> Option<Delivery> {
        let (kind, object) = if value.get("object").is_some() {
            let envelope: WatchEnvelope = match serde_json::from_value(value) {
                Ok(envelope) => envelope,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed watch envelope");
                    return None;
                }
            };
            let kind = match envelope.watch_type.as_str() {
                "ADDED" => ChangeKind::Added,
                "MODIFIED" => ChangeKind::Updated,
                other => {
                    tracing::debug!(watch_type = other, "ignoring watch event");
                    return None;
                }
            };
            (kind, envelope.object)
        } else if value.get("kind").and_then(Value::as_str) == Some("Event") {
            (ChangeKind::Added, value)
        } else {
            tracing::warn!("skipping value that is neither a watch event nor an Event");
            return None;
        };
        match serde_json::from_value::<Notification>(object) {
            Ok(notification) => Some(Delivery { kind, notification }),
            Err(err) => {
                tracing::warn!(error = %err, "skipping undecodable event object");
                None
            }
        }
    }
}

impl<R: Read> EventSource for WatchStreamSource<R> {
    fn next_delivery(&mut self) -> Option<Result<Delivery, SourceError>> {
        loop {
            let value = match self.values.next()? {
                Ok(value) => value,
                Err(err) => return Some(Err(err.into())),
            };
            if let Some(delivery) = Self::decode(value) {
                return Some(Ok(delivery));
            }
        }
    }
}

/// Watch stream reader boxed so stdin and file inputs share one type.
pub type BoxedWatchStream = WatchStreamSource<Box<dyn Read + Send>>;

/// Establishes the configured event source.
pub fn open(config: &SourceConfig) -> Result<BoxedWatchStream, SourceError> {
    let reader: Box<dyn Read + Send> = match config {
        SourceConfig::Stdin => Box::new(io::stdin()),
        SourceConfig::File { path } => Box::new(BufReader::new(open_file(path)?)),
    };
    Ok(WatchStreamSource::new(reader))
}

fn open_file(path: &Path) -> Result<File, SourceError> {
    File::open(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })
}
