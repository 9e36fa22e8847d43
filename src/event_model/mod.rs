//! Event model primitives: the notification shape, the persisted watermark,
//! the dedup rule, and the record projection.

pub mod checkpoint;
pub mod dedup;
pub mod notification;
pub mod record;

pub use checkpoint::{CheckpointStore, SaveOutcome};
pub use dedup::DedupDecision;
pub use notification::{
    parse_version, ChangeKind, Delivery, EventOrigin, Notification, ObjectMeta, ObjectReference,
};
pub use record::{RecordEncoder, RecordMode};
