//! # Playback Error Types
//!
//! Errors returned synchronously by player operations. Engine failures during
//! playback are not errors here: they are published on the Event Hub's
//! `playback_error` channel.

use bridge_traits::BridgeError;
use core_notification::NotificationError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Queue Errors
    // ========================================================================
    /// Index does not address an item (or, for inserts, a gap) in the queue.
    #[error("Index {index} out of bounds for queue of size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Argument is structurally invalid (empty item list, negative target...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// `next()` on the last item while repeat-all is off.
    #[error("No next item in queue")]
    NoNextItem,

    /// `previous()` on the first item while repeat-all is off.
    #[error("No previous item in queue")]
    NoPreviousItem,

    /// Operation needs a current item but the queue is empty.
    #[error("No item loaded")]
    NoItemLoaded,

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// Invalid volume value (must be in range [0.0, 1.0]).
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    /// The player was destroyed; no further operations are accepted.
    #[error("Player has been destroyed")]
    Destroyed,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Cache Errors
    // ========================================================================
    /// Cache directory could not be created or read.
    #[error("Cache error: {0}")]
    CacheError(String),

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// The host engine rejected a call.
    #[error("Engine error: {0}")]
    Engine(#[from] BridgeError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if the error was caused by the caller's arguments and
    /// left all state untouched.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PlaybackError::IndexOutOfBounds { .. }
                | PlaybackError::InvalidArgument(_)
                | PlaybackError::InvalidVolume(_)
                | PlaybackError::NoNextItem
                | PlaybackError::NoPreviousItem
                | PlaybackError::NoItemLoaded
        )
    }

    /// Returns `true` if a host collaborator failed.
    pub fn is_host_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::Engine(_) | PlaybackError::Notification(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(PlaybackError::IndexOutOfBounds { index: 4, size: 3 }.is_invalid_input());
        assert!(PlaybackError::NoNextItem.is_invalid_input());
        assert!(!PlaybackError::Destroyed.is_invalid_input());
        assert!(PlaybackError::Engine(BridgeError::Released).is_host_error());
    }

    #[test]
    fn test_error_messages() {
        let err = PlaybackError::IndexOutOfBounds { index: 7, size: 2 };
        assert_eq!(err.to_string(), "Index 7 out of bounds for queue of size 2");
        assert_eq!(
            PlaybackError::InvalidVolume(1.5).to_string(),
            "Invalid volume: 1.5 (must be between 0.0 and 1.0)"
        );
    }
}
