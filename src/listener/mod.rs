//! Keyboard and mouse input sources
//!
//! Each source drains its own feed receiver on a dedicated thread, drives
//! its classification state, and publishes results on its own
//! [`EventBus`](crate::bus::EventBus). [`EventListener`] combines the two
//! behind a single start/stop lifecycle.

mod combined;
mod keyboard;
mod mouse;
mod worker;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::feed::FeedError;

pub use combined::EventListener;
pub use keyboard::{KeyboardEventSource, TypingInterrupt};
pub use mouse::MouseEventSource;

/// Errors that can occur while starting a listener
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("failed to connect to input feed: {0}")]
    Feed(#[from] FeedError),

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),
}

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
