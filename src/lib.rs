//! tutorial-listener: input event classification for guided tutorials
//!
//! Turns a raw stream of global keyboard and mouse transitions into a
//! small set of application events:
//! - `single_click` / `double_click`, debounced by a click window
//! - `hotkey`, de-duplicated per chord (first key down to all keys up)
//! - `typing`, prose buffered outside hotkey mode and flushed on quiet
//!   release, hotkeys, clicks, or stop
//!
//! Recorder and player controllers subscribe through [`EventListener`];
//! screen capture, template matching, and all UI live outside this crate.

pub mod bus;
pub mod config;
pub mod events;
pub mod feed;
pub mod keys;
pub mod lifecycle;
pub mod listener;
pub mod state;

pub use bus::{BroadcastSubscriber, EventBus, Subscriber};
pub use config::Config;
pub use events::{EventKind, InputEvent, MouseButton};
pub use feed::{ChannelFeed, InputFeed, RawInput, RawInputKind};
pub use keys::{KeyIdentity, NamedKey};
pub use listener::{EventListener, KeyboardEventSource, ListenerError, MouseEventSource};
pub use state::{ClickState, KeyState};
