//! Checkpointed, deduplicating sink that persists cluster event
//! notifications to daily JSON-lines files.

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod event_model;
pub mod observability;
pub mod sink;
pub mod source;
pub mod storage;

pub use config::{ConfigError, SinkConfig, SourceConfig, DEFAULT_QUEUE_CAPACITY};
pub use dispatcher::{
    Clock, DispatchOutcome, DispatchStats, Dispatcher, DispatcherState, SystemClock,
};
pub use event_model::{
    dedup, parse_version, ChangeKind, CheckpointStore, DedupDecision, Delivery, EventOrigin,
    Notification, ObjectMeta, ObjectReference, RecordEncoder, RecordMode, SaveOutcome,
};
pub use observability::logging::{LogFormat, LoggingError, DEFAULT_LOG_FILTER};
pub use sink::{DailyLogSink, RecordSink};
pub use source::{
    BoxedWatchStream, EventSource, FeedClosed, FeedReceiver, FeedSender, NotificationFeed,
    SourceError, WatchStreamSource,
};
pub use storage::{
    StorageError, StorageLayout, CHECKPOINT_FILE_NAME, DEFAULT_STORAGE_ROOT, LOG_DIR_NAME,
    LOG_FILE_EXTENSION,
};
