//! Classification state machines
//!
//! - `KeyState`: held keys, sent combinations, and the typing buffer
//! - `ClickState`: debounce window for single vs double clicks
//!
//! Both are plain values driven with explicit timestamps; the listener
//! threads own them and publish whatever they return.

mod click;
mod machine;

pub use click::{ClickState, DEFAULT_DOUBLE_CLICK_WINDOW};
pub use machine::{KeyState, Mode, DEFAULT_HOTKEY_TIMEOUT, DEFAULT_TYPING_TIMEOUT};
