//! Hotkey combination formatting

use super::classify::{canonical_name, is_control_key, is_function_key, is_modifier, MODIFIER_ORDER};
use super::identity::KeyIdentity;

/// Format held keys as a `+`-joined combination such as `ctrl+shift+s`
///
/// Modifiers come first in `ctrl, alt, shift, cmd` order, followed by any
/// other modifier or control keys in encounter order (deduplicated), then
/// regular keys sorted lexicographically. The result depends only on the
/// set of keys, not on the order they were pressed in, except for the
/// relative order of non-canonical modifiers.
pub fn format_combination<'a, I>(held: I) -> String
where
    I: IntoIterator<Item = &'a KeyIdentity>,
{
    let mut modifiers: Vec<String> = Vec::new();
    let mut regular: Vec<String> = Vec::new();

    for key in held {
        let name = canonical_name(key);
        if is_modifier(key) || is_function_key(key) || is_control_key(key) {
            modifiers.push(name);
        } else {
            regular.push(name);
        }
    }

    let mut parts: Vec<String> = Vec::with_capacity(modifiers.len() + regular.len());
    for canonical in MODIFIER_ORDER {
        if modifiers.iter().any(|m| m == canonical) {
            parts.push(canonical.to_string());
        }
    }
    for name in modifiers {
        if !parts.contains(&name) {
            parts.push(name);
        }
    }

    regular.sort();
    parts.extend(regular);
    parts.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<KeyIdentity> {
        names
            .iter()
            .map(|n| {
                let mut chars = n.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyIdentity::Char(c),
                    _ => KeyIdentity::named(n),
                }
            })
            .collect()
    }

    #[test]
    fn test_ctrl_shift_s_any_order() {
        let orders = [
            ["ctrl_l", "shift_l", "s"],
            ["s", "shift_l", "ctrl_l"],
            ["shift_l", "s", "ctrl_l"],
        ];
        for order in orders {
            assert_eq!(format_combination(&keys(&order)), "ctrl+shift+s");
        }
    }

    #[test]
    fn test_left_right_variants_collapse() {
        assert_eq!(format_combination(&keys(&["ctrl_l", "ctrl_r", "a"])), "ctrl+a");
    }

    #[test]
    fn test_other_modifiers_after_canonical_four() {
        assert_eq!(
            format_combination(&keys(&["delete", "alt_l", "ctrl_r"])),
            "ctrl+alt+delete"
        );
        assert_eq!(format_combination(&keys(&["tab", "alt_l"])), "alt+tab");
        assert_eq!(format_combination(&keys(&["f4", "x", "alt_r"])), "alt+f4+x");
    }

    #[test]
    fn test_regular_keys_sorted() {
        assert_eq!(format_combination(&keys(&["b", "a"])), "a+b");
        assert_eq!(format_combination(&keys(&["cmd_l", "z", "c"])), "cmd+c+z");
    }

    #[test]
    fn test_empty() {
        assert_eq!(format_combination(std::iter::empty()), "");
    }
}
