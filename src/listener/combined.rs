//! Keyboard and mouse sources behind one lifecycle

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use super::{KeyboardEventSource, ListenerError, MouseEventSource};
use crate::bus::Subscriber;
use crate::config::Config;
use crate::events::{EventKind, InputEvent};
use crate::feed::InputFeed;

/// Combined listener handed to recorder and player controllers
#[derive(Debug)]
pub struct EventListener {
    mouse: MouseEventSource,
    keyboard: KeyboardEventSource,
    running: AtomicBool,
}

impl EventListener {
    /// Create a stopped listener whose sources share `feed`
    pub fn new(config: &Config, feed: Arc<dyn InputFeed>) -> Self {
        Self {
            mouse: MouseEventSource::new(config, Arc::clone(&feed)),
            keyboard: KeyboardEventSource::new(config, feed),
            running: AtomicBool::new(false),
        }
    }

    /// The mouse source
    pub fn mouse(&self) -> &MouseEventSource {
        &self.mouse
    }

    /// The keyboard source
    pub fn keyboard(&self) -> &KeyboardEventSource {
        &self.keyboard
    }

    /// Check if `start_listening` succeeded and no stop followed
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Register a handler for `single_click` or `double_click` events
    pub fn subscribe_mouse<S>(&self, kind: EventKind, subscriber: S)
    where
        S: Subscriber + 'static,
    {
        self.mouse.subscribe(kind, subscriber);
    }

    /// Register a handler for `hotkey` or `typing` events
    pub fn subscribe_keyboard<S>(&self, kind: EventKind, subscriber: S)
    where
        S: Subscriber + 'static,
    {
        self.keyboard.subscribe(kind, subscriber);
    }

    /// Publish a synthetic event to mouse subscribers
    pub fn emit_mouse(&self, event: &InputEvent) -> usize {
        self.mouse.bus().publish(event)
    }

    /// Publish a synthetic event to keyboard subscribers
    pub fn emit_keyboard(&self, event: &InputEvent) -> usize {
        self.keyboard.bus().publish(event)
    }

    /// Start both sources on their own threads
    ///
    /// Clicks end keyboard typing mode: the interrupt is registered after
    /// any subscriber added so far, so those see the click first.
    pub fn start_listening(&self) -> Result<(), ListenerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            info!("listener is already running");
            return Ok(());
        }

        let interrupt: Arc<dyn Subscriber> = Arc::new(self.keyboard.typing_interrupt());
        for kind in EventKind::MOUSE {
            self.mouse.bus().subscribe_arc(kind, Arc::clone(&interrupt));
        }

        let started = self.mouse.start().and_then(|()| self.keyboard.start());
        if let Err(e) = started {
            self.mouse.stop();
            for kind in EventKind::MOUSE {
                self.mouse.bus().unsubscribe(kind, &interrupt);
            }
            self.running.store(false, Ordering::SeqCst);
            return Err(e);
        }

        info!("listening for mouse and keyboard events");
        Ok(())
    }

    /// Block until both sources have exited or the listener is stopped
    ///
    /// Each source drains everything its feed delivered before it exits on
    /// a disconnect, so nothing queued is lost to the following stop.
    pub fn wait(&self) {
        self.keyboard.wait();
        self.mouse.wait();
    }

    /// Start, block until the feed ends, then stop
    pub fn run_until_stopped(&self) -> Result<(), ListenerError> {
        self.start_listening()?;
        self.wait();
        self.stop_listening();
        Ok(())
    }

    /// Stop both sources, flushing pending typing; a no-op when stopped
    pub fn stop_listening(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            info!("listener is not running");
            return;
        }

        info!("stopping listeners");
        self.keyboard.close_interrupts();
        self.mouse.stop();
        self.keyboard.stop();
        info!("listeners stopped and all subscribers cleared");
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        self.stop_listening();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MouseButton;
    use crate::feed::{ChannelFeed, RawInput};
    use crate::listener::testing::{collector, wait_until, RECV_TIMEOUT};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    const MS: Duration = Duration::from_millis(1);

    fn listener() -> (Arc<ChannelFeed>, EventListener) {
        let feed = Arc::new(ChannelFeed::new());
        let config = Config {
            poll_interval: Duration::from_millis(10),
            ..Config::default()
        };
        let listener = EventListener::new(&config, feed.clone());
        (feed, listener)
    }

    #[test]
    fn test_subscribe_and_emit_mouse() {
        let (_feed, listener) = listener();
        let (subscriber, rx) = collector();
        listener.subscribe_mouse(EventKind::SingleClick, subscriber);

        let event = InputEvent::single_click(1, 2, &MouseButton::Left);
        assert_eq!(listener.emit_mouse(&event), 1);
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn test_subscribe_and_emit_keyboard() {
        let (_feed, listener) = listener();
        let (subscriber, rx) = collector();
        listener.subscribe_keyboard(EventKind::Hotkey, subscriber);

        let event = InputEvent::hotkey("ctrl+c", vec!["ctrl".into(), "c".into()]);
        listener.emit_keyboard(&event);
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn test_click_flushes_typing_after_click_subscribers() {
        let (feed, listener) = listener();
        let order = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&order);
        listener.subscribe_mouse(EventKind::SingleClick, move |e: &InputEvent| -> anyhow::Result<()> {
            log.lock().unwrap().push(e.kind());
            Ok(())
        });
        let log = Arc::clone(&order);
        listener.subscribe_keyboard(EventKind::Typing, move |e: &InputEvent| -> anyhow::Result<()> {
            log.lock().unwrap().push(e.kind());
            Ok(())
        });
        let (typing, rx) = collector();
        listener.subscribe_keyboard(EventKind::Typing, typing);
        listener.start_listening().unwrap();

        let t0 = Instant::now();
        feed.push(RawInput::press('h', t0));
        feed.push(RawInput::release('h', t0 + 10 * MS));
        feed.push(RawInput::press('i', t0 + 20 * MS));
        feed.push(RawInput::release('i', t0 + 30 * MS));
        assert!(wait_until(|| listener
            .keyboard()
            .with_state(|s| s.buffer() == "hi")));

        feed.push(RawInput::click(50, 60, MouseButton::Left, t0 + 100 * MS));
        assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), InputEvent::typing("hi"));
        assert_eq!(
            *order.lock().unwrap(),
            vec![EventKind::SingleClick, EventKind::Typing]
        );
        assert!(!listener.keyboard().with_state(|s| s.is_typing_mode()));

        listener.stop_listening();
    }

    #[test]
    fn test_stop_is_idempotent_and_clears_subscribers() {
        let (_feed, listener) = listener();
        let (subscriber, _rx) = collector();
        listener.subscribe_mouse(EventKind::DoubleClick, subscriber.clone());
        listener.subscribe_keyboard(EventKind::Typing, subscriber);

        listener.start_listening().unwrap();
        listener.start_listening().unwrap();
        assert!(listener.is_running());

        listener.stop_listening();
        listener.stop_listening();
        assert!(!listener.is_running());
        assert_eq!(listener.mouse().bus().subscriber_count(EventKind::DoubleClick), 0);
        assert_eq!(listener.keyboard().bus().subscriber_count(EventKind::Typing), 0);
    }

    #[test]
    fn test_restart_registers_interrupt_once() {
        let (_feed, listener) = listener();
        listener.start_listening().unwrap();
        listener.stop_listening();
        listener.start_listening().unwrap();
        assert_eq!(listener.mouse().bus().subscriber_count(EventKind::SingleClick), 1);
        listener.stop_listening();
    }

    #[test]
    fn test_start_fails_on_closed_feed() {
        let (feed, listener) = listener();
        feed.close();
        assert!(matches!(
            listener.start_listening(),
            Err(ListenerError::Feed(_))
        ));
        assert!(!listener.is_running());
        assert_eq!(listener.mouse().bus().subscriber_count(EventKind::SingleClick), 0);
    }

    #[test]
    fn test_run_until_stopped_returns_when_feed_ends() {
        let (feed, listener) = listener();
        let (subscriber, rx) = collector();
        let (clicks, click_rx) = collector();
        listener.subscribe_keyboard(EventKind::Typing, subscriber);
        listener.subscribe_mouse(EventKind::SingleClick, clicks);

        let t0 = Instant::now();
        let pusher = {
            let feed = Arc::clone(&feed);
            std::thread::spawn(move || {
                assert!(wait_until(|| feed.receiver_count() == 2));
                feed.push(RawInput::press('q', t0));
                for i in 0..20 {
                    feed.push(RawInput::click(i, i, MouseButton::Left, t0 + i as u32 * 400 * MS));
                }
                feed.close();
            })
        };

        listener.run_until_stopped().unwrap();
        pusher.join().unwrap();
        // Held key never released: flushed by a click or by stop
        assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), InputEvent::typing("q"));
        // Clicks queued right before the feed closed are all classified
        assert_eq!(click_rx.try_iter().count(), 20);
        assert!(!listener.is_running());
    }
}
