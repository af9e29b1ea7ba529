//! Observer interface for classified events

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::trace;

use crate::events::InputEvent;

/// Receives events published on an [`EventBus`](super::EventBus)
///
/// Handlers run synchronously on the publishing source's thread, so a
/// slow handler delays delivery of later raw input.
pub trait Subscriber: Send + Sync {
    fn handle(&self, event: &InputEvent) -> Result<()>;
}

impl<F> Subscriber for F
where
    F: Fn(&InputEvent) -> Result<()> + Send + Sync,
{
    fn handle(&self, event: &InputEvent) -> Result<()> {
        self(event)
    }
}

/// Forwards events into a tokio broadcast channel
///
/// Lets async consumers receive events without blocking the source thread.
#[derive(Debug, Clone)]
pub struct BroadcastSubscriber {
    tx: broadcast::Sender<InputEvent>,
}

impl BroadcastSubscriber {
    /// Create a subscriber forwarding into `tx`
    pub fn new(tx: broadcast::Sender<InputEvent>) -> Self {
        Self { tx }
    }
}

impl Subscriber for BroadcastSubscriber {
    fn handle(&self, event: &InputEvent) -> Result<()> {
        if self.tx.send(event.clone()).is_err() {
            // No receivers right now
            trace!(kind = %event.kind(), "broadcast has no receivers");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_subscriber() {
        let subscriber = |event: &InputEvent| -> Result<()> {
            anyhow::ensure!(matches!(event, InputEvent::Typing { .. }), "unexpected event");
            Ok(())
        };
        assert!(subscriber.handle(&InputEvent::typing("x")).is_ok());
        assert!(subscriber.handle(&InputEvent::double_click(0, 0)).is_err());
    }

    #[test]
    fn test_broadcast_forwarding() {
        let (tx, mut rx) = broadcast::channel(8);
        let subscriber = BroadcastSubscriber::new(tx);
        subscriber.handle(&InputEvent::typing("hello")).unwrap();

        let received = tokio_test::block_on(rx.recv()).unwrap();
        assert_eq!(received, InputEvent::typing("hello"));
    }

    #[test]
    fn test_broadcast_without_receivers_is_ok() {
        let (tx, rx) = broadcast::channel(8);
        drop(rx);
        let subscriber = BroadcastSubscriber::new(tx);
        assert!(subscriber.handle(&InputEvent::typing("lost")).is_ok());
    }
}
