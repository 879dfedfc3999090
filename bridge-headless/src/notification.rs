//! Notification host that records instead of rendering.

use bridge_traits::{
    error::Result,
    notification::{NotificationHost, SystemNotification},
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// What the host was asked to do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationRecord {
    Posted(SystemNotification),
    Cancelled(u32),
    Released,
}

/// [`NotificationHost`] that keeps every call in memory.
///
/// Clones share the same log. Useful for headless hosts that still want to
/// expose "now playing" state, and for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationHost {
    records: Arc<Mutex<Vec<NotificationRecord>>>,
}

impl RecordingNotificationHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<NotificationRecord> {
        self.records.lock().clone()
    }

    /// The most recently posted notification, unless it was cancelled since.
    pub fn visible(&self) -> Option<SystemNotification> {
        match self.records.lock().last() {
            Some(NotificationRecord::Posted(notification)) => Some(notification.clone()),
            _ => None,
        }
    }

    pub fn post_count(&self) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| matches!(r, NotificationRecord::Posted(_)))
            .count()
    }
}

impl NotificationHost for RecordingNotificationHost {
    fn post(&mut self, notification: &SystemNotification) -> Result<()> {
        debug!(
            id = notification.id,
            title = ?notification.title,
            is_playing = notification.is_playing,
            "Posting notification"
        );
        self.records
            .lock()
            .push(NotificationRecord::Posted(notification.clone()));
        Ok(())
    }

    fn cancel(&mut self, id: u32) -> Result<()> {
        debug!(id, "Cancelling notification");
        self.records.lock().push(NotificationRecord::Cancelled(id));
        Ok(())
    }

    fn release(&mut self) {
        self.records.lock().push(NotificationRecord::Released);
    }
}
