use crate::config::SinkConfig;
use crate::dispatcher::Dispatcher;
use crate::observability::logging;
use crate::source::{self, EventSource, FeedSender, NotificationFeed, SourceError};
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::thread;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "EVENT_SINK_CONFIG";

/// Loads configuration, opens storage and the event source, then drains the
/// source until it closes. Any error returned here is fatal to the process.
pub fn run() -> Result<()> {
    let config = load_config()?;
    logging::init(config.log_format)?;

    let mut dispatcher = Dispatcher::open(&config).with_context(|| {
        format!(
            "failed to open event storage under {}",
            config.storage_root.display()
        )
    })?;
    let watch = source::open(&config.source).context("failed to establish event source")?;
    tracing::info!(
        storage_root = %config.storage_root.display(),
        record_mode = %config.record_mode,
        watermark = dispatcher.watermark(),
        "event sink started"
    );

    let (sender, mut receiver) = NotificationFeed::bounded(config.queue_capacity);
    let producer = thread::Builder::new()
        .name("event-source".into())
        .spawn(move || pump(watch, sender))
        .context("failed to spawn event source thread")?;

    dispatcher.run(&mut receiver)?;
    producer
        .join()
        .map_err(|_| anyhow!("event source thread panicked"))?
        .context("event source failed")?;

    let stats = dispatcher.stats();
    tracing::info!(
        appended = stats.appended,
        duplicates = stats.duplicates,
        append_failures = stats.append_failures,
        checkpoint_failures = stats.checkpoint_failures,
        watermark = dispatcher.watermark(),
        "event stream closed"
    );
    Ok(())
}

fn load_config() -> Result<SinkConfig> {
    match env::var_os(CONFIG_PATH_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            SinkConfig::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        None => Ok(SinkConfig::default()),
    }
}

// Moves deliveries from the source into the feed until either side closes.
fn pump<E: EventSource>(mut source: E, sender: FeedSender) -> Result<(), SourceError> {
    while let Some(delivery) = source.next_delivery() {
        if sender.send(delivery?).is_err() {
            break;
        }
    }
    Ok(())
}
