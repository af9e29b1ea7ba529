//! Canonical key names and key-set membership
//!
//! Every reachable [`KeyIdentity`] maps to exactly one canonical name;
//! nothing here fails.

use super::identity::{KeyIdentity, NamedKey};

/// Canonical modifier order used when formatting combinations
pub const MODIFIER_ORDER: [&str; 4] = ["ctrl", "alt", "shift", "cmd"];

/// Map a control character (Ctrl held) back to the key that produced it
///
/// `\x01`..`\x1a` map to `a`..`z` and `\x1b` maps to `esc`.
pub fn control_char_name(c: char) -> Option<&'static str> {
    const LETTERS: [&str; 26] = [
        "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q",
        "r", "s", "t", "u", "v", "w", "x", "y", "z",
    ];
    match c as u32 {
        n @ 0x01..=0x1a => Some(LETTERS[(n - 1) as usize]),
        0x1b => Some("esc"),
        _ => None,
    }
}

/// The letter behind a Ctrl+<letter> chord delivered as one control
/// character, or `None` for any other key
pub fn ctrl_letter(key: &KeyIdentity) -> Option<&'static str> {
    match key {
        KeyIdentity::Char(c) if matches!(*c as u32, 0x01..=0x1a) => control_char_name(*c),
        _ => None,
    }
}

/// Canonical string for a key
pub fn canonical_name(key: &KeyIdentity) -> String {
    match key {
        KeyIdentity::Char(c) if (*c as u32) < 32 => control_char_name(*c)
            .map(str::to_string)
            .unwrap_or_else(|| c.to_string()),
        KeyIdentity::Char(c) => c.to_string(),
        KeyIdentity::Named(named) => match named {
            NamedKey::CtrlL | NamedKey::CtrlR => "ctrl".to_string(),
            NamedKey::AltL | NamedKey::AltR => "alt".to_string(),
            NamedKey::ShiftL | NamedKey::ShiftR => "shift".to_string(),
            NamedKey::CmdL | NamedKey::CmdR => "cmd".to_string(),
            other => other.name(),
        },
    }
}

/// Member of the modifier set: ctrl/alt/shift/cmd variants, tab and esc
///
/// A modifier held alone never forms a hotkey; it waits for a chord.
pub fn is_modifier(key: &KeyIdentity) -> bool {
    matches!(
        key,
        KeyIdentity::Named(
            NamedKey::CtrlL
                | NamedKey::CtrlR
                | NamedKey::AltL
                | NamedKey::AltR
                | NamedKey::ShiftL
                | NamedKey::ShiftR
                | NamedKey::CmdL
                | NamedKey::CmdR
                | NamedKey::Tab
                | NamedKey::Esc
        )
    )
}

/// F1-F12: grouped with modifiers when formatting, but fire on their own
pub fn is_function_key(key: &KeyIdentity) -> bool {
    matches!(key, KeyIdentity::Named(NamedKey::F(1..=12)))
}

/// Member of the navigation/control set
pub fn is_control_key(key: &KeyIdentity) -> bool {
    matches!(
        key,
        KeyIdentity::Named(
            NamedKey::Enter
                | NamedKey::Backspace
                | NamedKey::Delete
                | NamedKey::Home
                | NamedKey::End
                | NamedKey::PageUp
                | NamedKey::PageDown
                | NamedKey::Up
                | NamedKey::Down
                | NamedKey::Left
                | NamedKey::Right
                | NamedKey::Insert
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_characters_map_to_letters() {
        for (offset, letter) in ('a'..='z').enumerate() {
            let c = char::from_u32(offset as u32 + 1).unwrap();
            assert_eq!(canonical_name(&KeyIdentity::Char(c)), letter.to_string());
        }
        assert_eq!(canonical_name(&KeyIdentity::Char('\x1b')), "esc");
    }

    #[test]
    fn test_unknown_control_code_passes_through() {
        assert_eq!(canonical_name(&KeyIdentity::Char('\x1f')), "\x1f");
        assert_eq!(canonical_name(&KeyIdentity::Char('\0')), "\0");
    }

    #[test]
    fn test_printable_verbatim() {
        assert_eq!(canonical_name(&KeyIdentity::Char('A')), "A");
        assert_eq!(canonical_name(&KeyIdentity::Char('é')), "é");
        assert_eq!(canonical_name(&KeyIdentity::Char(' ')), " ");
    }

    #[test]
    fn test_left_right_variants_unified() {
        assert_eq!(canonical_name(&KeyIdentity::named("ctrl_l")), "ctrl");
        assert_eq!(canonical_name(&KeyIdentity::named("ctrl_r")), "ctrl");
        assert_eq!(canonical_name(&KeyIdentity::named("alt_r")), "alt");
        assert_eq!(canonical_name(&KeyIdentity::named("shift_l")), "shift");
        assert_eq!(canonical_name(&KeyIdentity::named("cmd_r")), "cmd");
    }

    #[test]
    fn test_named_keys_pass_through() {
        assert_eq!(canonical_name(&KeyIdentity::named("Key.space")), "space");
        assert_eq!(canonical_name(&KeyIdentity::named("f9")), "f9");
        assert_eq!(canonical_name(&KeyIdentity::named("page_down")), "page_down");
        assert_eq!(canonical_name(&KeyIdentity::named("Key.caps_lock")), "caps_lock");
    }

    #[test]
    fn test_ctrl_letter_only_for_letter_range() {
        assert_eq!(ctrl_letter(&KeyIdentity::Char('\x03')), Some("c"));
        assert_eq!(ctrl_letter(&KeyIdentity::Char('\x1b')), None);
        assert_eq!(ctrl_letter(&KeyIdentity::Char('c')), None);
    }

    #[test]
    fn test_key_sets() {
        assert!(is_modifier(&KeyIdentity::named("ctrl_l")));
        assert!(is_modifier(&KeyIdentity::named("esc")));
        assert!(!is_modifier(&KeyIdentity::named("f12")));
        assert!(is_function_key(&KeyIdentity::named("f12")));
        assert!(!is_function_key(&KeyIdentity::named("f13")));
        assert!(!is_modifier(&KeyIdentity::Char('a')));

        assert!(is_control_key(&KeyIdentity::named("enter")));
        assert!(is_control_key(&KeyIdentity::named("up")));
        assert!(!is_control_key(&KeyIdentity::named("space")));
        assert!(!is_control_key(&KeyIdentity::named("tab")));
    }
}
