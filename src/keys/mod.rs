//! Key identities, canonical names, and hotkey formatting

mod classify;
mod format;
mod identity;

pub use classify::{
    canonical_name, control_char_name, ctrl_letter, is_control_key, is_function_key, is_modifier,
    MODIFIER_ORDER,
};
pub use format::format_combination;
pub use identity::{KeyIdentity, NamedKey};
