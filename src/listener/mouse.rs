//! Mouse source: classifies button presses into single and double clicks

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::worker::Worker;
use super::ListenerError;
use crate::bus::{EventBus, Subscriber};
use crate::config::Config;
use crate::events::EventKind;
use crate::feed::{InputFeed, RawInputKind};
use crate::state::ClickState;

pub struct MouseEventSource {
    feed: Arc<dyn InputFeed>,
    bus: Arc<EventBus>,
    worker: Worker,
    double_click_window: Duration,
}

impl MouseEventSource {
    /// Create a stopped mouse source reading from `feed`
    pub fn new(config: &Config, feed: Arc<dyn InputFeed>) -> Self {
        Self {
            feed,
            bus: Arc::new(EventBus::new()),
            worker: Worker::new("mouse-listener", config.poll_interval),
            double_click_window: config.double_click_window,
        }
    }

    /// Register a handler for `single_click` or `double_click` events
    pub fn subscribe<S>(&self, kind: EventKind, subscriber: S)
    where
        S: Subscriber + 'static,
    {
        self.bus.subscribe(kind, subscriber);
    }

    /// The bus mouse events are published on
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Check if the source has been started and not stopped
    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Start the worker thread with a fresh debounce state
    pub fn start(&self) -> Result<(), ListenerError> {
        if self.worker.is_running() {
            info!("mouse listener is already running");
            return Ok(());
        }

        let rx = self.feed.connect()?;
        let bus = Arc::clone(&self.bus);
        let mut clicks = ClickState::new(self.double_click_window);

        let started = self.worker.start(rx, move |input| {
            if let RawInputKind::Click {
                x,
                y,
                button,
                pressed,
            } = input.kind
            {
                if let Some(event) = clicks.on_click(x, y, &button, pressed, input.at) {
                    debug!(%event, "publishing mouse event");
                    bus.publish(&event);
                }
            }
        })?;

        if started {
            info!("mouse listener started");
        }
        Ok(())
    }

    /// Stop the worker and drop all subscribers; a no-op when not running
    pub fn stop(&self) {
        if !self.worker.halt() {
            info!("mouse listener is not running");
            return;
        }
        self.worker.join();
        self.bus.unsubscribe_all();
        info!("mouse listener stopped");
    }

    /// Block until the worker exits on its own or is stopped
    pub fn wait(&self) {
        self.worker.wait();
    }
}

impl std::fmt::Debug for MouseEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MouseEventSource")
            .field("worker", &self.worker)
            .field("double_click_window", &self.double_click_window)
            .finish()
    }
}
