//! What the player asks of the engine, checked against a mock.

use bridge_headless::RecordingNotificationHost;
use bridge_traits::callback::CallbackSender;
use bridge_traits::engine::{EngineOptions, EngineSource, MediaEngine};
use bridge_traits::error::{BridgeError, Result};
use core_playback::config::BufferConfig;
use core_playback::{AudioItem, PlaybackError, PlayerConfig, QueuedAudioPlayer, RepeatMode};
use mockall::predicate::eq;
use mockall::{mock, Sequence};
use std::ops::Range;

mock! {
    pub Engine {}

    impl MediaEngine for Engine {
        fn set_callback_sender(&mut self, sender: CallbackSender);
        fn configure(&mut self, options: EngineOptions) -> Result<()>;
        fn add_sources(&mut self, index: usize, sources: Vec<EngineSource>) -> Result<()>;
        fn remove_sources(&mut self, range: Range<usize>) -> Result<()>;
        fn move_source(&mut self, from: usize, to: usize) -> Result<()>;
        fn replace_source(&mut self, index: usize, source: EngineSource) -> Result<()>;
        fn clear(&mut self) -> Result<()>;
        fn source_count(&self) -> usize;
        fn current_index(&self) -> Option<usize>;
        fn seek_to(&mut self, index: usize, position_ms: u64) -> Result<()>;
        fn prepare(&mut self) -> Result<()>;
        fn set_play_when_ready(&mut self, play_when_ready: bool);
        fn play_when_ready(&self) -> bool;
        fn set_stop_at_item_end(&mut self, stop: bool);
        fn stop(&mut self) -> Result<()>;
        fn set_playback_speed(&mut self, speed: f32) -> Result<()>;
        fn set_volume(&mut self, volume: f32) -> Result<()>;
        fn position_ms(&self) -> u64;
        fn duration_ms(&self) -> Option<u64>;
        fn buffered_position_ms(&self) -> u64;
        fn is_playing(&self) -> bool;
        fn release(&mut self);
    }
}

/// Mock with the calls every player makes while being constructed.
fn constructed_engine(options: EngineOptions) -> MockEngine {
    let mut engine = MockEngine::new();
    engine
        .expect_set_callback_sender()
        .times(1)
        .return_const(());
    engine
        .expect_configure()
        .with(eq(options))
        .times(1)
        .returning(|_| Ok(()));
    engine
        .expect_set_stop_at_item_end()
        .with(eq(false))
        .times(1)
        .return_const(());
    engine
}

fn player(engine: MockEngine, config: PlayerConfig) -> QueuedAudioPlayer {
    QueuedAudioPlayer::new(
        config,
        Box::new(engine),
        Box::new(RecordingNotificationHost::new()),
    )
    .expect("player")
}

#[test]
fn test_engine_is_configured_from_player_config() {
    let config = PlayerConfig::builder()
        .buffer(BufferConfig {
            min_buffer_ms: 10_000,
            max_buffer_ms: 30_000,
            playback_buffer_ms: 1_000,
            back_buffer_ms: 2_000,
        })
        .handle_audio_becoming_noisy(true)
        .build()
        .unwrap();
    let engine = constructed_engine(config.engine_options());

    let player = player(engine, config);
    assert!(player.items().is_empty());
}

#[test]
fn test_engine_rejection_leaves_queue_untouched() {
    let config = PlayerConfig::default();
    let mut engine = constructed_engine(config.engine_options());
    engine
        .expect_add_sources()
        .times(1)
        .returning(|_, _| Err(BridgeError::OperationFailed("decoder unavailable".into())));
    engine.expect_prepare().never();

    let mut player = player(engine, config);
    let err = player
        .add(vec![AudioItem::new("https://cdn.example/a.mp3")], None, None)
        .unwrap_err();

    assert!(matches!(err, PlaybackError::Engine(_)));
    assert!(err.is_host_error());
    assert!(player.items().is_empty());
}

#[test]
fn test_batch_removal_reaches_engine_in_descending_order() {
    let config = PlayerConfig::default();
    let mut engine = constructed_engine(config.engine_options());
    engine
        .expect_add_sources()
        .withf(|index, sources| *index == 0 && sources.len() == 4)
        .times(1)
        .returning(|_, _| Ok(()));
    engine.expect_prepare().times(1).returning(|| Ok(()));
    engine.expect_current_index().return_const(Some(0));

    let mut seq = Sequence::new();
    engine
        .expect_remove_sources()
        .with(eq(3..4))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    engine
        .expect_remove_sources()
        .with(eq(1..2))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let mut player = player(engine, config);
    let items = ["a", "b", "c", "d"]
        .iter()
        .map(|name| AudioItem::new(format!("https://cdn.example/{}.mp3", name)))
        .collect();
    player.add(items, None, None).unwrap();
    player.remove_many(&[1, 3, 1]).unwrap();

    let left: Vec<&str> = player.items().iter().map(AudioItem::source).collect();
    assert_eq!(
        left,
        vec!["https://cdn.example/a.mp3", "https://cdn.example/c.mp3"]
    );
}

fn player_with_four_items(mut engine: MockEngine, config: PlayerConfig) -> QueuedAudioPlayer {
    engine
        .expect_add_sources()
        .times(1)
        .returning(|_, _| Ok(()));
    engine.expect_prepare().times(1).returning(|| Ok(()));
    engine.expect_current_index().return_const(Some(0));

    let mut player = player(engine, config);
    let items = ["a", "b", "c", "d"]
        .iter()
        .map(|name| AudioItem::new(format!("https://cdn.example/{}.mp3", name)))
        .collect();
    player.add(items, None, None).unwrap();
    player
}

fn sources(player: &QueuedAudioPlayer) -> Vec<&str> {
    player.items().iter().map(AudioItem::source).collect()
}

#[test]
fn test_adjacent_removals_reach_engine_as_one_range() {
    let config = PlayerConfig::default();
    let mut engine = constructed_engine(config.engine_options());
    engine
        .expect_remove_sources()
        .with(eq(1..4))
        .times(1)
        .returning(|_| Ok(()));

    let mut player = player_with_four_items(engine, config);
    player.remove_many(&[2, 1, 3]).unwrap();
    assert_eq!(sources(&player), vec!["https://cdn.example/a.mp3"]);
}

#[test]
fn test_rejected_removal_keeps_earlier_ranges_removed() {
    let config = PlayerConfig::default();
    let mut engine = constructed_engine(config.engine_options());
    let mut seq = Sequence::new();
    engine
        .expect_remove_sources()
        .with(eq(2..3))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    engine
        .expect_remove_sources()
        .with(eq(0..1))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(BridgeError::OperationFailed("timeline locked".into())));

    let mut player = player_with_four_items(engine, config);
    let err = player.remove_many(&[0, 2]).unwrap_err();

    assert!(matches!(err, PlaybackError::Engine(_)));
    assert_eq!(
        sources(&player),
        vec![
            "https://cdn.example/a.mp3",
            "https://cdn.example/b.mp3",
            "https://cdn.example/d.mp3",
        ]
    );
}

#[test]
fn test_repeat_one_asks_engine_to_stop_at_item_end() {
    let config = PlayerConfig::default();
    let mut engine = MockEngine::new();
    engine.expect_set_callback_sender().return_const(());
    engine.expect_configure().returning(|_| Ok(()));

    let mut seq = Sequence::new();
    engine
        .expect_set_stop_at_item_end()
        .with(eq(false))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    engine
        .expect_set_stop_at_item_end()
        .with(eq(true))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    engine
        .expect_set_stop_at_item_end()
        .with(eq(false))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());

    let mut player = player(engine, config);
    player.set_repeat_mode(RepeatMode::One);
    player.set_repeat_mode(RepeatMode::All);
    assert_eq!(player.repeat_mode(), RepeatMode::All);
}
