//! # Queued Player Demo
//!
//! Drives a `QueuedAudioPlayer` over the headless engine and prints what the
//! Event Hub publishes.
//!
//! Run with: `cargo run --example queue_demo --package core-playback`

use bridge_headless::{HeadlessEngine, RecordingNotificationHost};
use bridge_traits::logging::LogLevel;
use core_notification::{NotificationButton, NotificationConfig};
use core_playback::{AudioItem, PlayerConfig, QueuedAudioPlayer, RepeatMode, Result};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

fn main() -> Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )
    .map_err(|e| core_playback::PlaybackError::Config(e.to_string()))?;

    let engine = HeadlessEngine::new();
    let host = RecordingNotificationHost::new();
    let config = PlayerConfig::builder()
        .handle_audio_focus(true)
        .user_agent("queue-demo/0.1")
        .build()?;

    let mut player = QueuedAudioPlayer::new(config, Box::new(engine.clone()), Box::new(host.clone()))?;
    let mut states = player.event_hub().state_change().subscribe();
    let mut transitions = player.event_hub().item_transition().subscribe();

    player.create_notification(NotificationConfig::new(vec![
        NotificationButton::previous().compact(),
        NotificationButton::play_pause().compact(),
        NotificationButton::next().compact(),
        NotificationButton::stop(),
    ]))?;

    // ========================================================================
    // Build a queue and play through it
    // ========================================================================

    let tracks = [
        ("https://cdn.example/intro.mp3", "Intro", 90_000),
        ("https://cdn.example/theme.mp3", "Theme", 180_000),
        ("https://cdn.example/outro.mp3", "Outro", 60_000),
    ];
    for (uri, _, duration) in &tracks {
        engine.set_duration(*uri, *duration);
    }
    let items = tracks
        .iter()
        .map(|(uri, title, duration)| {
            AudioItem::new(*uri)
                .title(*title)
                .artist("Demo Band")
                .duration_ms(*duration)
        })
        .collect();

    player.add(items, None, Some(true))?;
    player.set_repeat_mode(RepeatMode::All);
    player.process_pending_events();

    for _ in 0..tracks.len() {
        engine.advance(30_000);
        engine.finish_current_item();
        player.process_pending_events();
        println!(
            "now playing: {:?} (index {:?})",
            player.current_item().and_then(|item| item.get_title()),
            player.current_index()
        );
    }

    player.move_item(0, 10)?;
    player.remove_upcoming_items()?;
    println!(
        "queue: {:?}",
        player
            .items()
            .iter()
            .filter_map(|item| item.get_title())
            .collect::<Vec<_>>()
    );

    player.stop()?;
    player.process_pending_events();

    println!("states: {:?}", states.drain());
    println!("transitions: {:?}", transitions.drain());
    println!("notification posts: {}", host.post_count());

    player.destroy()
}
