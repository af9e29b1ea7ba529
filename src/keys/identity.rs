//! Raw key identities as delivered by the platform layer

use std::fmt;

use serde::{Deserialize, Serialize};

/// A symbolic (non-printable) key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NamedKey {
    CtrlL,
    CtrlR,
    AltL,
    AltR,
    ShiftL,
    ShiftR,
    CmdL,
    CmdR,
    Tab,
    Esc,
    /// Function key F1..F24
    F(u8),
    Enter,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Insert,
    Space,
    /// Any symbolic key without a dedicated variant, stored by its name
    Other(String),
}

impl NamedKey {
    /// Parse a platform symbolic name such as `"Key.ctrl_l"` or `"F9"`
    ///
    /// Any namespace prefix up to the last `.` is stripped and the rest is
    /// lowercased before matching. Unknown names become [`NamedKey::Other`].
    pub fn from_name(name: &str) -> Self {
        let bare = name.rsplit('.').next().unwrap_or(name).to_lowercase();
        match bare.as_str() {
            "ctrl_l" => Self::CtrlL,
            "ctrl_r" => Self::CtrlR,
            "alt_l" => Self::AltL,
            "alt_r" | "alt_gr" => Self::AltR,
            "shift_l" => Self::ShiftL,
            "shift_r" => Self::ShiftR,
            "cmd_l" => Self::CmdL,
            "cmd_r" => Self::CmdR,
            "tab" => Self::Tab,
            "esc" | "escape" => Self::Esc,
            "enter" | "return" => Self::Enter,
            "backspace" => Self::Backspace,
            "delete" => Self::Delete,
            "home" => Self::Home,
            "end" => Self::End,
            "page_up" => Self::PageUp,
            "page_down" => Self::PageDown,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            "insert" => Self::Insert,
            "space" => Self::Space,
            other => match parse_function_key(other) {
                Some(n) => Self::F(n),
                None => Self::Other(other.to_string()),
            },
        }
    }

    /// The platform-style symbolic name (left/right variants preserved)
    pub fn name(&self) -> String {
        match self {
            Self::CtrlL => "ctrl_l".into(),
            Self::CtrlR => "ctrl_r".into(),
            Self::AltL => "alt_l".into(),
            Self::AltR => "alt_r".into(),
            Self::ShiftL => "shift_l".into(),
            Self::ShiftR => "shift_r".into(),
            Self::CmdL => "cmd_l".into(),
            Self::CmdR => "cmd_r".into(),
            Self::Tab => "tab".into(),
            Self::Esc => "esc".into(),
            Self::F(n) => format!("f{n}"),
            Self::Enter => "enter".into(),
            Self::Backspace => "backspace".into(),
            Self::Delete => "delete".into(),
            Self::Home => "home".into(),
            Self::End => "end".into(),
            Self::PageUp => "page_up".into(),
            Self::PageDown => "page_down".into(),
            Self::Up => "up".into(),
            Self::Down => "down".into(),
            Self::Left => "left".into(),
            Self::Right => "right".into(),
            Self::Insert => "insert".into(),
            Self::Space => "space".into(),
            Self::Other(name) => name.clone(),
        }
    }
}

fn parse_function_key(name: &str) -> Option<u8> {
    let digits = name.strip_prefix('f')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match digits.parse::<u8>() {
        Ok(n @ 1..=24) => Some(n),
        _ => None,
    }
}

impl From<String> for NamedKey {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<NamedKey> for String {
    fn from(key: NamedKey) -> Self {
        key.name()
    }
}

/// A key as read from the platform: a character or a symbolic key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyIdentity {
    /// Key that produced a character (possibly a control character when
    /// Ctrl is held)
    Char(char),
    /// Symbolic key
    Named(NamedKey),
}

impl KeyIdentity {
    /// Shorthand for `KeyIdentity::Named(NamedKey::from_name(name))`
    pub fn named(name: &str) -> Self {
        Self::Named(NamedKey::from_name(name))
    }

    /// Check if this is the symbolic key `key`
    pub fn is_named(&self, key: &NamedKey) -> bool {
        matches!(self, Self::Named(k) if k == key)
    }

    /// The character carried by this key, if any
    pub fn char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            Self::Named(_) => None,
        }
    }
}

impl From<char> for KeyIdentity {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

impl From<NamedKey> for KeyIdentity {
    fn from(key: NamedKey) -> Self {
        Self::Named(key)
    }
}

impl fmt::Display for KeyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) if (*c as u32) < 32 => write!(f, "{:?}", c),
            Self::Char(c) => write!(f, "{c}"),
            Self::Named(key) => write!(f, "Key.{}", key.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_prefix_stripped() {
        assert_eq!(NamedKey::from_name("Key.ctrl_l"), NamedKey::CtrlL);
        assert_eq!(NamedKey::from_name("SHIFT_R"), NamedKey::ShiftR);
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(NamedKey::from_name("f9"), NamedKey::F(9));
        assert_eq!(NamedKey::from_name("Key.f12"), NamedKey::F(12));
        assert_eq!(
            NamedKey::from_name("f99"),
            NamedKey::Other("f99".to_string())
        );
        assert_eq!(NamedKey::from_name("f"), NamedKey::Other("f".to_string()));
    }

    #[test]
    fn test_unknown_name_kept() {
        let key = NamedKey::from_name("Key.media_play_pause");
        assert_eq!(key, NamedKey::Other("media_play_pause".to_string()));
        assert_eq!(key.name(), "media_play_pause");
    }

    #[test]
    fn test_identity_json_shape() {
        let json = serde_json::to_string(&KeyIdentity::named("ctrl_l")).unwrap();
        assert_eq!(json, r#"{"named":"ctrl_l"}"#);

        let key: KeyIdentity = serde_json::from_str(r#"{"char":"a"}"#).unwrap();
        assert_eq!(key, KeyIdentity::Char('a'));
    }
}
