//! # Notification Bridge
//!
//! Mirrors playback into the system transport notification (lock screen,
//! notification shade, MPRIS...).
//!
//! ## Overview
//!
//! - [`NotificationConfig`] declares the buttons, their compact-view flags
//!   and icon overrides
//! - [`NotificationManager`] renders a [`SystemNotification`] from player
//!   state and metadata and hands it to the host's [`NotificationHost`]
//! - lifecycle changes are published on the Event Hub's
//!   `notification_state` channel
//!
//! [`SystemNotification`]: bridge_traits::notification::SystemNotification
//! [`NotificationHost`]: bridge_traits::notification::NotificationHost

pub mod config;
pub mod error;
pub mod manager;
pub mod metadata;

pub use config::{ButtonKind, NotificationButton, NotificationConfig, MAX_COMPACT_ACTIONS};
pub use error::{NotificationError, Result};
pub use manager::{NotificationManager, NOTIFICATION_ID};
pub use metadata::NotificationMetadata;
