//! Integration tests for logging and the event hub

use bridge_traits::logging::LogLevel;
use core_runtime::events::{EventHub, PlayerState, TransitionReason};
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};
use core_runtime::Error;

#[test]
fn test_logging_initializes_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);
    assert!(init_logging(config).is_ok());

    tracing::info!(target: "core_playback", "logging is up");

    let again = init_logging(LoggingConfig::default());
    assert!(matches!(again, Err(Error::AlreadyInitialized(_))));
}

#[test]
fn test_header_redaction() {
    assert_eq!(redact_if_sensitive("Authorization", "Basic dXNlcg=="), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Cookie", "session=1"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Icy-MetaData", "1"), "1");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/tmp/player/podcasts/ab12cd"), "ab12cd");
    assert_eq!(strip_path("D:\\cache\\file.bin"), "file.bin");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
    assert!(config.logger_sink.is_none());
}

#[tokio::test]
async fn test_hub_channels_are_independent() {
    let hub = EventHub::default();
    let mut transitions = hub.item_transition().subscribe();

    hub.state_change().publish(PlayerState::Playing);
    hub.item_transition().publish(TransitionReason::SeekToAnotherItem {
        old_position_ms: 12_000,
    });

    assert_eq!(
        transitions.recv().await.unwrap(),
        TransitionReason::SeekToAnotherItem {
            old_position_ms: 12_000
        }
    );
    assert!(transitions.try_recv().is_none());

    let mut states = hub.state_change().subscribe();
    assert_eq!(states.recv().await.unwrap(), PlayerState::Playing);
}
