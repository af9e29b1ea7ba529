//! Hotkey/typing state machine
//!
//! Consumes key presses and releases and decides, per press, whether the
//! currently held keys form a hotkey or are part of ongoing typing. The
//! machine is clock-injected and never publishes anything itself: each
//! transition returns the events it produced, in emission order.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::events::InputEvent;
use crate::keys::{self, KeyIdentity, NamedKey};

/// Default quiet period after which a finished burst of typing is flushed
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_millis(500);

/// Default bound on how long a partial chord may wait (advisory)
pub const DEFAULT_HOTKEY_TIMEOUT: Duration = Duration::from_millis(100);

const ESC_COMBINATION: &str = "esc";

/// Coarse mode of the machine, derived from its flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Nothing held, not typing
    Idle,
    /// User is believed to be typing prose
    Typing,
    /// At least one hotkey was emitted for the current chord
    HotkeySent,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Idle => write!(f, "Idle"),
            Mode::Typing => write!(f, "Typing"),
            Mode::HotkeySent => write!(f, "HotkeySent"),
        }
    }
}

#[derive(Debug, Clone)]
struct HeldKey {
    key: KeyIdentity,
    pressed_at: Instant,
}

/// Keyboard classification state for one listener
#[derive(Debug)]
pub struct KeyState {
    /// Keys currently down, in press order
    held: Vec<HeldKey>,
    /// Combinations already emitted during the current chord
    sent: HashSet<String>,
    buffer: String,
    typing_mode: bool,
    /// Time of the last newly pressed key
    last_key_at: Option<Instant>,
    last_hotkey_at: Option<Instant>,
    typing_timeout: Duration,
    hotkey_timeout: Duration,
}

impl Default for KeyState {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_TIMEOUT, DEFAULT_HOTKEY_TIMEOUT)
    }
}

impl KeyState {
    /// Create an idle state with the given timeouts
    pub fn new(typing_timeout: Duration, hotkey_timeout: Duration) -> Self {
        Self {
            held: Vec::new(),
            sent: HashSet::new(),
            buffer: String::new(),
            typing_mode: false,
            last_key_at: None,
            last_hotkey_at: None,
            typing_timeout,
            hotkey_timeout,
        }
    }

    /// Current coarse mode
    pub fn mode(&self) -> Mode {
        if self.typing_mode {
            Mode::Typing
        } else if !self.sent.is_empty() {
            Mode::HotkeySent
        } else {
            Mode::Idle
        }
    }

    /// Check if the user is believed to be typing prose
    pub fn is_typing_mode(&self) -> bool {
        self.typing_mode
    }

    /// Text buffered since the last flush
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Number of keys currently down
    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// When `key` went down, if it is currently held
    pub fn pressed_at(&self, key: &KeyIdentity) -> Option<Instant> {
        self.held
            .iter()
            .find(|h| h.key == *key)
            .map(|h| h.pressed_at)
    }

    /// When the last hotkey was emitted
    pub fn last_hotkey_at(&self) -> Option<Instant> {
        self.last_hotkey_at
    }

    /// Configured (advisory) partial-chord timeout
    pub fn hotkey_timeout(&self) -> Duration {
        self.hotkey_timeout
    }

    /// Process a key press
    pub fn on_press(&mut self, key: &KeyIdentity, now: Instant) -> Vec<InputEvent> {
        let mut out = Vec::new();

        // Escape always reports as a hotkey, then continues below
        if key.is_named(&NamedKey::Esc) && !self.sent.contains(ESC_COMBINATION) {
            self.flush_into(&mut out);
            out.push(InputEvent::hotkey(
                ESC_COMBINATION,
                vec![keys::canonical_name(key)],
            ));
            self.sent.insert(ESC_COMBINATION.to_string());
            self.last_hotkey_at = Some(now);
        }

        // Ctrl+<letter> arriving as a single control character
        if let Some(letter) = keys::ctrl_letter(key) {
            let combination = format!("ctrl+{letter}");
            if !self.sent.contains(&combination) {
                self.emit_hotkey(
                    &mut out,
                    combination,
                    vec!["ctrl".to_string(), letter.to_string()],
                    now,
                );
            }
            return out;
        }

        // Auto-repeat
        if self.pressed_at(key).is_some() {
            trace!(%key, "ignoring repeated press");
            return out;
        }

        self.held.push(HeldKey {
            key: key.clone(),
            pressed_at: now,
        });
        self.last_key_at = Some(now);

        if self.is_hotkey_combination() {
            let combination = keys::format_combination(self.held.iter().map(|h| &h.key));
            if self.should_send_now(key) && !self.sent.contains(&combination) {
                let names = self
                    .held
                    .iter()
                    .map(|h| keys::canonical_name(&h.key))
                    .collect();
                self.emit_hotkey(&mut out, combination, names, now);
            }
        } else {
            self.typing_mode = true;
            self.append_typed(key);
        }

        out
    }

    /// Process a key release
    pub fn on_release(&mut self, key: &KeyIdentity, now: Instant) -> Vec<InputEvent> {
        let mut out = Vec::new();

        self.held.retain(|h| h.key != *key);
        if self.held.is_empty() {
            self.sent.clear();
        }

        let quiet = self
            .last_key_at
            .map_or(true, |t| now.saturating_duration_since(t) > self.typing_timeout);

        if self.typing_mode && !self.buffer.is_empty() && self.held.is_empty() && quiet {
            self.flush_into(&mut out);
        }

        out
    }

    /// Read and clear the typing buffer
    pub fn flush_typing(&mut self) -> Option<InputEvent> {
        if self.buffer.is_empty() {
            return None;
        }
        let message = std::mem::take(&mut self.buffer);
        debug!(chars = message.chars().count(), "typing flushed");
        Some(InputEvent::typing(message))
    }

    /// Leave typing mode and flush, used when a click ends a typing burst
    pub fn interrupt_typing(&mut self) -> Option<InputEvent> {
        self.typing_mode = false;
        self.flush_typing()
    }

    /// Clear every piece of state
    pub fn reset(&mut self) {
        self.held.clear();
        self.sent.clear();
        self.buffer.clear();
        self.typing_mode = false;
        self.last_key_at = None;
        self.last_hotkey_at = None;
    }

    fn flush_into(&mut self, out: &mut Vec<InputEvent>) {
        if let Some(event) = self.flush_typing() {
            out.push(event);
        }
    }

    fn emit_hotkey(
        &mut self,
        out: &mut Vec<InputEvent>,
        combination: String,
        names: Vec<String>,
        now: Instant,
    ) {
        self.flush_into(out);
        debug!(%combination, "hotkey detected");
        out.push(InputEvent::hotkey(combination.clone(), names));
        self.sent.insert(combination);
        self.last_hotkey_at = Some(now);
        self.typing_mode = false;
    }

    fn is_hotkey_combination(&self) -> bool {
        match self.held.as_slice() {
            [] => false,
            [only] => {
                let key = &only.key;
                if key.is_named(&NamedKey::Enter) {
                    true
                } else if key.is_named(&NamedKey::Backspace) || keys::is_modifier(key) {
                    false
                } else {
                    keys::is_control_key(key) || keys::is_function_key(key)
                }
            }
            held => {
                let has_modifier = held.iter().any(|h| keys::is_modifier(&h.key));
                let has_regular = held.iter().any(|h| !keys::is_modifier(&h.key));
                // Several regular keys with no modifier count as a chord
                (has_modifier && has_regular) || !has_modifier
            }
        }
    }

    fn should_send_now(&self, pressed: &KeyIdentity) -> bool {
        if pressed.is_named(&NamedKey::Enter) {
            return true;
        }
        if self.held.len() == 1 {
            return !keys::is_modifier(pressed);
        }
        if !keys::is_modifier(pressed) {
            return true;
        }
        // A modifier pressed last completes a chord around held regular keys
        self.held.iter().any(|h| !keys::is_modifier(&h.key))
    }

    fn append_typed(&mut self, key: &KeyIdentity) {
        match key {
            KeyIdentity::Named(NamedKey::Backspace) => {
                self.buffer.pop();
            }
            KeyIdentity::Named(NamedKey::Space) => self.buffer.push(' '),
            KeyIdentity::Char(c) if (*c as u32) >= 32 => self.buffer.push(*c),
            _ => {}
        }
    }
}
