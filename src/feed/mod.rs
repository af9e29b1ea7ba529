//! Raw platform input and the feeds that deliver it
//!
//! A feed hands every connected source its own receiver and fans each raw
//! input out to all of them. Closing a feed (or losing the platform hook)
//! disconnects the receivers, which ends the source threads.

mod channel;
#[cfg(feature = "native")]
mod native;

use std::sync::mpsc::Receiver;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::events::MouseButton;
use crate::keys::KeyIdentity;

pub use channel::ChannelFeed;
#[cfg(feature = "native")]
pub use native::NativeFeed;

/// One physical transition reported by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawInputKind {
    KeyPress { key: KeyIdentity },
    KeyRelease { key: KeyIdentity },
    Click {
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
    },
}

/// A raw input stamped with its capture time
#[derive(Debug, Clone, PartialEq)]
pub struct RawInput {
    pub at: Instant,
    pub kind: RawInputKind,
}

impl RawInput {
    pub fn new(kind: RawInputKind, at: Instant) -> Self {
        Self { at, kind }
    }

    pub fn now(kind: RawInputKind) -> Self {
        Self::new(kind, Instant::now())
    }

    pub fn press(key: impl Into<KeyIdentity>, at: Instant) -> Self {
        Self::new(RawInputKind::KeyPress { key: key.into() }, at)
    }

    pub fn release(key: impl Into<KeyIdentity>, at: Instant) -> Self {
        Self::new(RawInputKind::KeyRelease { key: key.into() }, at)
    }

    pub fn click(x: i32, y: i32, button: MouseButton, at: Instant) -> Self {
        Self::new(
            RawInputKind::Click {
                x,
                y,
                button,
                pressed: true,
            },
            at,
        )
    }
}

/// Errors raised while connecting to or driving a feed
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("input feed is closed")]
    Closed,

    #[error("malformed raw input on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read raw input: {0}")]
    Io(#[from] std::io::Error),

    #[error("platform input hook failed: {0}")]
    Hook(String),
}

/// Source of raw platform input
pub trait InputFeed: Send + Sync {
    /// Open a new receiver that gets every raw input from now on
    fn connect(&self) -> Result<Receiver<RawInput>, FeedError>;
}
