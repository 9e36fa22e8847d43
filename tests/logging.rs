use event_sink::observability::logging;
use event_sink::LogFormat;

#[test]
fn subscriber_installs_once() {
    logging::init(LogFormat::Text).expect("first install succeeds");
    tracing::info!(version = 1u64, "logging initialized");
    let err = logging::init(LogFormat::Json).expect_err("global subscriber already set");
    assert!(err.to_string().contains("failed to install log subscriber"));
}

#[test]
fn log_format_names() {
    assert_eq!(LogFormat::default(), LogFormat::Json);
    assert_eq!(LogFormat::Json.to_string(), "json");
    assert_eq!(
        serde_json::from_str::<LogFormat>("\"text\"").unwrap(),
        LogFormat::Text
    );
}
