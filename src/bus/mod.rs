//! Publish/subscribe registry shared by the input sources
//!
//! Handlers are kept per [`EventKind`] in registration order. Publishing
//! calls each of them in turn; a handler that returns an error or panics
//! is logged and skipped so the rest still run and the publishing thread
//! survives.

mod subscriber;

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error};

use crate::events::{EventKind, InputEvent};

pub use subscriber::{BroadcastSubscriber, Subscriber};

type Registry = HashMap<EventKind, Vec<Arc<dyn Subscriber>>>;

#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<Registry>,
}

impl EventBus {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; the same handler may be registered twice
    pub fn subscribe<S>(&self, kind: EventKind, subscriber: S)
    where
        S: Subscriber + 'static,
    {
        self.subscribe_arc(kind, Arc::new(subscriber));
    }

    /// Register an already shared handler, keeping the `Arc` for unsubscribe
    pub fn subscribe_arc(&self, kind: EventKind, subscriber: Arc<dyn Subscriber>) {
        self.registry().entry(kind).or_default().push(subscriber);
        debug!(%kind, "subscriber registered");
    }

    /// Deliver `event` to every handler registered for its kind
    ///
    /// Returns how many handlers completed without error.
    pub fn publish(&self, event: &InputEvent) -> usize {
        let kind = event.kind();
        // Snapshot so handlers may subscribe or publish re-entrantly
        let handlers: Vec<Arc<dyn Subscriber>> =
            self.registry().get(&kind).cloned().unwrap_or_default();

        let mut delivered = 0;
        for handler in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => error!(%kind, error = ?e, "error in subscriber"),
                Err(payload) => error!(%kind, panic = panic_message(&payload), "subscriber panicked"),
            }
        }
        delivered
    }

    /// Remove every registration of `subscriber` under `kind`
    pub fn unsubscribe(&self, kind: EventKind, subscriber: &Arc<dyn Subscriber>) -> bool {
        let mut registry = self.registry();
        let Some(handlers) = registry.get_mut(&kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|h| !Arc::ptr_eq(h, subscriber));
        handlers.len() != before
    }

    /// Drop every registration
    pub fn unsubscribe_all(&self) {
        self.registry().clear();
    }

    /// Number of handlers registered for `kind`
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry().get(&kind).map_or(0, Vec::len)
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry();
        let counts: HashMap<&str, usize> =
            registry.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
