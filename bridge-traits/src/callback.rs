//! Callback channel from host threads to the player context.
//!
//! Engines and media sessions call back on threads they own. They never touch
//! player state directly: every callback is pushed into an unbounded channel
//! and applied later, in order, by whoever owns the player.

use crate::{
    engine::EngineEvent,
    error::{BridgeError, Result},
    session::SessionEvent,
};
use tokio::sync::mpsc;

/// A single callback waiting to be applied on the player context.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCallback {
    Engine(EngineEvent),
    Session(SessionEvent),
}

/// Sending half handed to engines and session hosts. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CallbackSender {
    tx: mpsc::UnboundedSender<HostCallback>,
}

impl CallbackSender {
    /// Queue an engine callback.
    pub fn engine(&self, event: EngineEvent) -> Result<()> {
        self.send(HostCallback::Engine(event))
    }

    /// Queue an OS session callback.
    pub fn session(&self, event: SessionEvent) -> Result<()> {
        self.send(HostCallback::Session(event))
    }

    pub fn send(&self, callback: HostCallback) -> Result<()> {
        self.tx.send(callback).map_err(|_| BridgeError::ChannelClosed)
    }

    /// Returns `true` once the player side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half owned by the player.
#[derive(Debug)]
pub struct CallbackReceiver {
    rx: mpsc::UnboundedReceiver<HostCallback>,
}

impl CallbackReceiver {
    /// Take the next queued callback without waiting.
    pub fn try_recv(&mut self) -> Option<HostCallback> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next callback. Returns `None` when every sender is gone.
    pub async fn recv(&mut self) -> Option<HostCallback> {
        self.rx.recv().await
    }
}

/// Create a connected sender/receiver pair.
pub fn callback_channel() -> (CallbackSender, CallbackReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CallbackSender { tx }, CallbackReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineState;
    use crate::session::MediaSessionCallback;

    #[test]
    fn callbacks_keep_send_order() {
        let (tx, mut rx) = callback_channel();
        tx.engine(EngineEvent::PlaybackStateChanged(EngineState::Buffering))
            .unwrap();
        tx.session(SessionEvent::Transport(MediaSessionCallback::Pause))
            .unwrap();
        tx.engine(EngineEvent::IsPlayingChanged(false)).unwrap();

        assert_eq!(
            rx.try_recv(),
            Some(HostCallback::Engine(EngineEvent::PlaybackStateChanged(
                EngineState::Buffering
            )))
        );
        assert_eq!(
            rx.try_recv(),
            Some(HostCallback::Session(SessionEvent::Transport(
                MediaSessionCallback::Pause
            )))
        );
        assert_eq!(
            rx.try_recv(),
            Some(HostCallback::Engine(EngineEvent::IsPlayingChanged(false)))
        );
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn send_after_receiver_dropped_fails() {
        let (tx, rx) = callback_channel();
        drop(rx);
        assert!(tx.is_closed());
        assert!(matches!(
            tx.engine(EngineEvent::IsPlayingChanged(true)),
            Err(BridgeError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn recv_from_another_thread() {
        let (tx, mut rx) = callback_channel();
        std::thread::spawn(move || {
            tx.engine(EngineEvent::IsPlayingChanged(true)).ok();
        })
        .join()
        .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(HostCallback::Engine(EngineEvent::IsPlayingChanged(true)))
        );
        assert_eq!(rx.recv().await, None);
    }
}
