//! Configuration loading and management

use std::time::Duration;

use crate::state::{DEFAULT_DOUBLE_CLICK_WINDOW, DEFAULT_HOTKEY_TIMEOUT, DEFAULT_TYPING_TIMEOUT};

const TYPING_TIMEOUT_VAR: &str = "TUTORIAL_LISTENER_TYPING_TIMEOUT_MS";
const HOTKEY_TIMEOUT_VAR: &str = "TUTORIAL_LISTENER_HOTKEY_TIMEOUT_MS";
const DOUBLE_CLICK_VAR: &str = "TUTORIAL_LISTENER_DOUBLE_CLICK_MS";
const POLL_VAR: &str = "TUTORIAL_LISTENER_POLL_MS";

/// How often a source thread re-checks whether it was stopped
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidDuration { var: &'static str, value: String },
}

/// Listener timing configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Quiet period after the last key press before typing is flushed on release
    pub typing_timeout: Duration,

    /// Advisory bound for partial chords; recorded, never enforced
    pub hotkey_timeout: Duration,

    /// Window in which a second click becomes a double click
    pub double_click_window: Duration,

    /// Stop-flag poll interval for the source threads
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            typing_timeout: DEFAULT_TYPING_TIMEOUT,
            hotkey_timeout: DEFAULT_HOTKEY_TIMEOUT,
            double_click_window: DEFAULT_DOUBLE_CLICK_WINDOW,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let millis = |var: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(value) => {
                    let parsed = value.trim().parse::<u64>();
                    match parsed {
                        Ok(ms) => Ok(Duration::from_millis(ms)),
                        Err(_) => Err(ConfigError::InvalidDuration { var, value }),
                    }
                }
            }
        };

        Ok(Self {
            typing_timeout: millis(TYPING_TIMEOUT_VAR, defaults.typing_timeout)?,
            hotkey_timeout: millis(HOTKEY_TIMEOUT_VAR, defaults.hotkey_timeout)?,
            double_click_window: millis(DOUBLE_CLICK_VAR, defaults.double_click_window)?,
            poll_interval: millis(POLL_VAR, defaults.poll_interval)?,
        })
    }
}
