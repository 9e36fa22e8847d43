use crate::config::SinkConfig;
use crate::event_model::{dedup, CheckpointStore, Delivery, RecordEncoder, SaveOutcome};
use crate::sink::{DailyLogSink, RecordSink};
use crate::source::{EventSource, SourceError};
use crate::storage::StorageError;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Wall-clock source, used when a notification carries no timestamp.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Processing state of the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Draining,
}

/// What happened to a single delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Record appended and checkpoint persisted.
    Appended { version: u64, path: PathBuf },
    /// Version at or below the watermark; nothing written.
    Duplicate { version: u64, watermark: u64 },
    /// Append failed; the watermark did not move.
    AppendFailed { version: u64 },
    /// Record appended and the in-memory watermark advanced, but the
    /// checkpoint file still holds an older value.
    CheckpointFailed { version: u64, path: PathBuf },
}

/// Counters accumulated across deliveries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub appended: u64,
    pub duplicates: u64,
    pub append_failures: u64,
    pub checkpoint_failures: u64,
}

impl DispatchStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::Appended { .. } => &mut self.appended,
            DispatchOutcome::Duplicate { .. } => &mut self.duplicates,
            DispatchOutcome::AppendFailed { .. } => &mut self.append_failures,
            DispatchOutcome::CheckpointFailed { .. } => &mut self.checkpoint_failures,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Runs dedup, serialization, append, and checkpoint for each delivery.
///
/// The dispatcher owns the checkpoint store outright. Feeding it from a
/// single [`EventSource`] keeps the compare-and-advance sequence on one
/// thread, so concurrent producers cannot both pass the dedup check for the
/// same watermark.
pub struct Dispatcher<S: RecordSink = DailyLogSink, C: Clock = SystemClock> {
    checkpoint: CheckpointStore,
    encoder: RecordEncoder,
    sink: S,
    clock: C,
    state: DispatcherState,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Opens the checkpoint store and daily log sink under the configured root.
    pub fn open(config: &SinkConfig) -> Result<Self, StorageError> {
        let layout = config.layout();
        let checkpoint = CheckpointStore::open(&layout)?;
        Ok(Self::new(
            checkpoint,
            RecordEncoder::new(config.record_mode),
            DailyLogSink::new(layout),
            SystemClock,
        ))
    }
}

impl<S: RecordSink, C: Clock> Dispatcher<S, C> {
    pub fn new(checkpoint: CheckpointStore, encoder: RecordEncoder, sink: S, clock: C) -> Self {
        Self {
            checkpoint,
            encoder,
            sink,
            clock,
            state: DispatcherState::Idle,
            stats: DispatchStats::default(),
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn watermark(&self) -> u64 {
        self.checkpoint.watermark()
    }

    pub fn checkpoint(&self) -> &CheckpointStore {
        &self.checkpoint
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Processes one delivery. Failures are logged and reported in the
    /// outcome; they never stop the dispatcher.
    pub fn dispatch(&mut self, delivery: Delivery) -> DispatchOutcome {
        self.state = DispatcherState::Draining;
        let outcome = self.process(&delivery);
        self.stats.record(&outcome);
        self.state = DispatcherState::Idle;
        outcome
    }

    /// Drains `source` until it closes. Only a source failure is returned.
    pub fn run<E: EventSource + ?Sized>(&mut self, source: &mut E) -> Result<(), SourceError> {
        while let Some(delivery) = source.next_delivery() {
            self.dispatch(delivery?);
        }
        Ok(())
    }

    fn process(&mut self, delivery: &Delivery) -> DispatchOutcome {
        let notification = &delivery.notification;
        let version = notification.version();
        let watermark = self.checkpoint.watermark();
        if !dedup::check(watermark, version).is_accept() {
            tracing::debug!(kind = %delivery.kind, version, watermark, "dropping already recorded event");
            return DispatchOutcome::Duplicate { version, watermark };
        }

        let record = self.encoder.encode(notification);
        let at = notification
            .observed_at()
            .unwrap_or_else(|| self.clock.now());
        let path = match self.sink.append(&record, at) {
            Ok(path) => path,
            Err(err) => {
                tracing::error!(kind = %delivery.kind, version, error = %err, "failed to append event record");
                return DispatchOutcome::AppendFailed { version };
            }
        };

        match self.checkpoint.save(version) {
            Ok(SaveOutcome::Persisted(_)) | Ok(SaveOutcome::Stale { .. }) => {
                tracing::info!(
                    kind = %delivery.kind,
                    version,
                    name = %notification.involved_object.name,
                    reason = %notification.reason,
                    path = %path.display(),
                    "recorded event"
                );
                DispatchOutcome::Appended { version, path }
            }
            Err(err) => {
                tracing::error!(kind = %delivery.kind, version, error = %err, "failed to persist checkpoint");
                DispatchOutcome::CheckpointFailed { version, path }
            }
        }
    }
}
