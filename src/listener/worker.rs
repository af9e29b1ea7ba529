//! Dedicated thread that drains one feed receiver

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info, warn};

use super::{lock, ListenerError};
use crate::feed::RawInput;

pub(crate) struct Worker {
    name: &'static str,
    /// Stop flag of the current run; every spawned thread gets its own
    running: Mutex<Arc<AtomicBool>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    poll_interval: Duration,
}

impl Worker {
    /// Create a worker that is not running yet
    pub(crate) fn new(name: &'static str, poll_interval: Duration) -> Self {
        Self {
            name,
            running: Mutex::new(Arc::new(AtomicBool::new(false))),
            handle: Mutex::new(None),
            poll_interval,
        }
    }

    /// Check if the current run has been started and not halted
    pub(crate) fn is_running(&self) -> bool {
        lock(&self.running).load(Ordering::SeqCst)
    }

    /// Spawn the thread; `Ok(false)` if it was already running
    ///
    /// The thread runs until [`halt`](Self::halt) is called or the feed
    /// disconnects. Each input is dispatched to completion before the stop
    /// flag is checked again. A thread left behind by a halt from inside its
    /// own callback keeps its halted flag and exits once the callback returns.
    pub(crate) fn start<F>(&self, rx: Receiver<RawInput>, mut dispatch: F) -> Result<bool, ListenerError>
    where
        F: FnMut(RawInput) + Send + 'static,
    {
        let mut current = lock(&self.running);
        if current.load(Ordering::SeqCst) {
            return Ok(false);
        }

        let running = Arc::new(AtomicBool::new(true));
        *current = Arc::clone(&running);
        let poll_interval = self.poll_interval;
        let name = self.name;

        let spawned = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                info!(listener = name, "listener thread started");

                while running.load(Ordering::SeqCst) {
                    match rx.recv_timeout(poll_interval) {
                        Ok(input) => dispatch(input),
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => {
                            warn!(listener = name, "input feed disconnected");
                            break;
                        }
                    }
                }

                info!(listener = name, "listener thread stopped");
            });

        match spawned {
            Ok(handle) => {
                *lock(&self.handle) = Some(handle);
                Ok(true)
            }
            Err(e) => {
                current.store(false, Ordering::SeqCst);
                Err(ListenerError::ThreadSpawn(e.to_string()))
            }
        }
    }

    /// Clear the current run's flag; `false` if it was not running
    pub(crate) fn halt(&self) -> bool {
        lock(&self.running).swap(false, Ordering::SeqCst)
    }

    /// Join the thread unless called from the thread itself
    pub(crate) fn join(&self) {
        let Some(handle) = lock(&self.handle).take() else {
            return;
        };

        if handle.thread().id() == thread::current().id() {
            // Stopped from inside a callback; the loop exits once it returns
            return;
        }

        if handle.join().is_err() {
            error!(listener = self.name, "listener thread panicked");
        }
    }

    /// Block until the thread has exited (or was never started)
    pub(crate) fn wait(&self) {
        loop {
            let finished = match lock(&self.handle).as_ref() {
                None => true,
                Some(handle) => handle.is_finished(),
            };
            if finished {
                return;
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_halted_thread_not_revived_by_restart() {
        let worker = Arc::new(Worker::new("test-worker", Duration::from_millis(10)));
        let (first_tx, first_rx) = mpsc::channel();
        let (seen_tx, seen_rx) = mpsc::channel::<&'static str>();

        let restart = {
            let worker = Arc::clone(&worker);
            let seen_tx = seen_tx.clone();
            move |_: RawInput| {
                seen_tx.send("first").unwrap();
                // Halt and restart from inside the first run's callback
                assert!(worker.halt());
                worker.join();
                let (_unused_tx, second_rx) = mpsc::channel();
                assert!(worker.start(second_rx, |_| {}).unwrap());
            }
        };
        assert!(worker.start(first_rx, restart).unwrap());

        first_tx.send(RawInput::press('a', std::time::Instant::now())).unwrap();
        assert_eq!(seen_rx.recv_timeout(Duration::from_secs(2)).unwrap(), "first");
        assert!(worker.is_running());

        // The first thread exits even though its receiver is still connected
        first_tx.send(RawInput::press('b', std::time::Instant::now())).ok();
        assert!(seen_rx.recv_timeout(Duration::from_millis(200)).is_err());

        worker.halt();
        worker.join();
    }
}
