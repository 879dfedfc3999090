//! Workspace façade crate.
//!
//! Exposes feature flags that map to the individual workspace crates
//! (`core-playback`, `core-notification`, `core-runtime`). Host applications
//! can depend on `player-workspace` and enable `player` (default) or
//! `headless` without wiring each crate individually.

#[cfg(feature = "player")]
pub use core_notification as notification;
#[cfg(feature = "player")]
pub use core_playback as playback;
#[cfg(feature = "player")]
pub use core_runtime as runtime;

#[cfg(feature = "headless")]
pub use bridge_headless as headless;
