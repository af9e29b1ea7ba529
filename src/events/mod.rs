//! Classified input events published to subscribers
//!
//! Each variant serializes to the payload shape recorder and player
//! controllers consume, tagged with its event type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Events produced by the keyboard and mouse sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// A click outside the double-click window
    SingleClick {
        x: i32,
        y: i32,
        /// `left_click`, `right_click` or `middle_click`
        button: String,
    },

    /// Second click inside the double-click window
    DoubleClick {
        x: i32,
        y: i32,
        /// Always `double_click`
        button: String,
    },

    /// A key combination
    Hotkey {
        /// Duplicate of `combination`, kept for older consumers
        key: String,
        combination: String,
        keys: Vec<String>,
    },

    /// Text typed since the last flush
    Typing {
        message: String,
    },
}

impl InputEvent {
    /// Create a single click reported as `<button>_click`
    pub fn single_click(x: i32, y: i32, button: &MouseButton) -> Self {
        Self::SingleClick {
            x,
            y,
            button: format!("{}_click", button.name()),
        }
    }

    /// Create a double click
    pub fn double_click(x: i32, y: i32) -> Self {
        Self::DoubleClick {
            x,
            y,
            button: "double_click".to_string(),
        }
    }

    /// Create a hotkey event; `key` mirrors `combination`
    pub fn hotkey(combination: impl Into<String>, keys: Vec<String>) -> Self {
        let combination = combination.into();
        Self::Hotkey {
            key: combination.clone(),
            combination,
            keys,
        }
    }

    /// Create a typing event
    pub fn typing(message: impl Into<String>) -> Self {
        Self::Typing {
            message: message.into(),
        }
    }

    /// The subscription key this event is published under
    pub fn kind(&self) -> EventKind {
        match self {
            Self::SingleClick { .. } => EventKind::SingleClick,
            Self::DoubleClick { .. } => EventKind::DoubleClick,
            Self::Hotkey { .. } => EventKind::Hotkey,
            Self::Typing { .. } => EventKind::Typing,
        }
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleClick { x, y, button } | Self::DoubleClick { x, y, button } => {
                write!(f, "{} at ({}, {})", button, x, y)
            }
            Self::Hotkey { combination, .. } => write!(f, "hotkey {}", combination),
            Self::Typing { message } => write!(f, "typing {:?}", message),
        }
    }
}

/// Event types subscribers register for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SingleClick,
    DoubleClick,
    Hotkey,
    Typing,
}

impl EventKind {
    /// Kinds published by the mouse source
    pub const MOUSE: [EventKind; 2] = [EventKind::SingleClick, EventKind::DoubleClick];
    /// Kinds published by the keyboard source
    pub const KEYBOARD: [EventKind; 2] = [EventKind::Hotkey, EventKind::Typing];

    /// Wire name of the event type
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SingleClick => "single_click",
            EventKind::DoubleClick => "double_click",
            EventKind::Hotkey => "hotkey",
            EventKind::Typing => "typing",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mouse buttons as named by the platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(String),
}

impl MouseButton {
    /// Platform name of the button
    pub fn name(&self) -> &str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
            MouseButton::Other(name) => name,
        }
    }
}

impl From<String> for MouseButton {
    fn from(name: String) -> Self {
        match name.to_lowercase().as_str() {
            "left" => MouseButton::Left,
            "right" => MouseButton::Right,
            "middle" => MouseButton::Middle,
            _ => MouseButton::Other(name),
        }
    }
}

impl From<MouseButton> for String {
    fn from(button: MouseButton) -> Self {
        button.name().to_string()
    }
}
