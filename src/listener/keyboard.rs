//! Keyboard source: drives a [`KeyState`] from raw key transitions
//!
//! The worker thread is the only writer of the key state apart from the
//! click-driven [`TypingInterrupt`], which is why the state sits behind a
//! mutex. Both writers pass through one emit gate for the whole
//! mutate-then-publish step, so a flush and a hotkey reach subscribers in
//! the order they were decided.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use super::worker::Worker;
use super::{lock, ListenerError};
use crate::bus::{EventBus, Subscriber};
use crate::config::Config;
use crate::events::{EventKind, InputEvent};
use crate::feed::{InputFeed, RawInput, RawInputKind};
use crate::state::KeyState;

const GATE_RETRY: Duration = Duration::from_millis(1);

pub struct KeyboardEventSource {
    feed: Arc<dyn InputFeed>,
    state: Arc<Mutex<KeyState>>,
    gate: Arc<EmitGate>,
    bus: Arc<EventBus>,
    worker: Worker,
}

impl KeyboardEventSource {
    /// Create a stopped keyboard source reading from `feed`
    pub fn new(config: &Config, feed: Arc<dyn InputFeed>) -> Self {
        Self {
            feed,
            state: Arc::new(Mutex::new(KeyState::new(
                config.typing_timeout,
                config.hotkey_timeout,
            ))),
            gate: Arc::new(EmitGate::default()),
            bus: Arc::new(EventBus::new()),
            worker: Worker::new("keyboard-listener", config.poll_interval),
        }
    }

    /// Register a handler for `hotkey` or `typing` events
    pub fn subscribe<S>(&self, kind: EventKind, subscriber: S)
    where
        S: Subscriber + 'static,
    {
        self.bus.subscribe(kind, subscriber);
    }

    /// The bus keyboard events are published on
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Check if the source has been started and not stopped
    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Inspect the classification state
    pub fn with_state<R>(&self, f: impl FnOnce(&KeyState) -> R) -> R {
        f(&lock(&self.state))
    }

    /// Observer that ends typing mode when a click arrives
    pub fn typing_interrupt(&self) -> TypingInterrupt {
        TypingInterrupt {
            state: Arc::clone(&self.state),
            gate: Arc::clone(&self.gate),
            bus: Arc::clone(&self.bus),
        }
    }

    /// Make pending and future interrupts give up instead of waiting
    ///
    /// Called before another source is joined, so a click thread blocked on
    /// the gate cannot stall that join. Reopened by [`start`](Self::start).
    pub(crate) fn close_interrupts(&self) {
        self.gate.closed.store(true, Ordering::SeqCst);
    }

    /// Start the worker thread; a no-op when already running
    pub fn start(&self) -> Result<(), ListenerError> {
        if self.worker.is_running() {
            info!("keyboard listener is already running");
            return Ok(());
        }

        let rx = self.feed.connect()?;
        let state = Arc::clone(&self.state);
        let gate = Arc::clone(&self.gate);
        let bus = Arc::clone(&self.bus);

        gate.closed.store(false, Ordering::SeqCst);
        if self
            .worker
            .start(rx, move |input| dispatch(&state, &gate, &bus, input))?
        {
            info!("keyboard listener started");
        } else {
            info!("keyboard listener is already running");
        }
        Ok(())
    }

    /// Stop the worker, flush pending typing, and drop all subscribers
    ///
    /// Blocks until the worker has exited, so no handler runs after this
    /// returns. A no-op when not running.
    pub fn stop(&self) {
        if !self.worker.halt() {
            info!("keyboard listener is not running");
            return;
        }
        self.close_interrupts();
        self.worker.join();

        let pending = lock(&self.state).flush_typing();
        if let Some(event) = pending {
            self.bus.publish(&event);
        }

        self.bus.unsubscribe_all();
        lock(&self.state).reset();
        info!("keyboard listener stopped");
    }

    /// Block until the worker exits on its own or is stopped
    pub fn wait(&self) {
        self.worker.wait();
    }
}

impl std::fmt::Debug for KeyboardEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyboardEventSource")
            .field("worker", &self.worker)
            .field("bus", &self.bus)
            .finish()
    }
}

/// Serializes "mutate key state, then publish" across threads
///
/// Entering polls instead of blocking, so a thread being joined during
/// shutdown never waits on a holder that is doing the joining.
#[derive(Debug, Default)]
struct EmitGate {
    lock: Mutex<()>,
    /// Set while the listener is shutting down
    closed: AtomicBool,
}

impl EmitGate {
    /// Wait for the gate; `None` once it is closed
    fn try_enter(&self) -> Option<MutexGuard<'_, ()>> {
        loop {
            if self.closed.load(Ordering::SeqCst) {
                return None;
            }
            match self.lock.try_lock() {
                Ok(guard) => return Some(guard),
                Err(TryLockError::Poisoned(poisoned)) => return Some(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => thread::sleep(GATE_RETRY),
            }
        }
    }
}

fn dispatch(state: &Mutex<KeyState>, gate: &EmitGate, bus: &EventBus, input: RawInput) {
    let Some(_gate) = gate.try_enter() else {
        debug!("keyboard shutting down, input skipped");
        return;
    };
    let events = {
        let mut state = lock(state);
        match &input.kind {
            RawInputKind::KeyPress { key } => {
                debug!(%key, "key press");
                state.on_press(key, input.at)
            }
            RawInputKind::KeyRelease { key } => {
                debug!(%key, "key release");
                state.on_release(key, input.at)
            }
            RawInputKind::Click { .. } => return,
        }
    };

    for event in &events {
        debug!(%event, "publishing keyboard event");
        bus.publish(event);
    }
}

/// Flushes the keyboard's typing buffer from another source's thread
#[derive(Clone)]
pub struct TypingInterrupt {
    state: Arc<Mutex<KeyState>>,
    gate: Arc<EmitGate>,
    bus: Arc<EventBus>,
}

impl Subscriber for TypingInterrupt {
    fn handle(&self, _event: &InputEvent) -> Result<()> {
        let Some(_gate) = self.gate.try_enter() else {
            debug!("keyboard shutting down, click interrupt skipped");
            return Ok(());
        };
        let flushed = lock(&self.state).interrupt_typing();
        if let Some(event) = flushed {
            debug!(%event, "typing interrupted by click");
            self.bus.publish(&event);
        }
        Ok(())
    }
}
