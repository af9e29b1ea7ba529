//! Global keyboard/mouse hook backed by rdev
//!
//! rdev's listen loop cannot be stopped once started, so one hook thread
//! serves the whole process and fans out through a shared [`ChannelFeed`].
//! Sources detach by dropping their receivers.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread;

use rdev::{Button, Event, EventType, Key};
use tracing::{error, info, warn};

use super::{ChannelFeed, FeedError, InputFeed, RawInput, RawInputKind};
use crate::events::MouseButton;
use crate::keys::{KeyIdentity, NamedKey};

static HUB: OnceLock<Result<Arc<ChannelFeed>, String>> = OnceLock::new();

/// Process-wide platform input feed
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFeed;

impl NativeFeed {
    /// Handle to the shared hook; the hook starts on first connect
    pub fn new() -> Self {
        Self
    }
}

impl InputFeed for NativeFeed {
    fn connect(&self) -> Result<Receiver<RawInput>, FeedError> {
        match HUB.get_or_init(spawn_hook) {
            Ok(hub) => hub.connect(),
            Err(e) => Err(FeedError::Hook(e.clone())),
        }
    }
}

fn spawn_hook() -> Result<Arc<ChannelFeed>, String> {
    let hub = Arc::new(ChannelFeed::new());
    let hook_hub = Arc::clone(&hub);

    thread::Builder::new()
        .name("rdev-hook".to_string())
        .spawn(move || {
            run_hook(hook_hub, |translator| {
                rdev::listen(move |event| translator.handle(event))
            })
        })
        .map_err(|e| e.to_string())?;

    Ok(hub)
}

/// Drive `listen` until it returns, then close `hub`
///
/// A hook that fails right away still closes the hub, so connected sources
/// see a disconnect and later connects fail with [`FeedError::Closed`].
fn run_hook<F, E>(hub: Arc<ChannelFeed>, listen: F)
where
    F: FnOnce(Translator) -> Result<(), E>,
    E: Debug,
{
    info!("platform input hook started");
    if let Err(e) = listen(Translator::new(Arc::clone(&hub))) {
        error!(?e, "platform input hook failed");
    }
    hub.close();
    warn!("platform input hook exited");
}

/// Turns rdev events into raw input on the shared hub
struct Translator {
    hub: Arc<ChannelFeed>,
    mouse_x: AtomicI32,
    mouse_y: AtomicI32,
    /// Identity assigned at press time, so the release matches it
    pressed: Mutex<Vec<(Key, KeyIdentity)>>,
}

impl Translator {
    fn new(hub: Arc<ChannelFeed>) -> Self {
        Self {
            hub,
            mouse_x: AtomicI32::new(0),
            mouse_y: AtomicI32::new(0),
            pressed: Mutex::new(Vec::new()),
        }
    }

    fn handle(&self, event: Event) {
        let kind = match event.event_type {
            EventType::MouseMove { x, y } => {
                self.mouse_x.store(x as i32, Ordering::Relaxed);
                self.mouse_y.store(y as i32, Ordering::Relaxed);
                return;
            }
            EventType::ButtonPress(button) => self.click(button, true),
            EventType::ButtonRelease(button) => self.click(button, false),
            EventType::KeyPress(key) => {
                let identity = identity_for(key, event.name.as_deref());
                let mut pressed = self.pressed.lock().unwrap_or_else(PoisonError::into_inner);
                if !pressed.iter().any(|(k, _)| *k == key) {
                    pressed.push((key, identity.clone()));
                }
                RawInputKind::KeyPress { key: identity }
            }
            EventType::KeyRelease(key) => {
                let mut pressed = self.pressed.lock().unwrap_or_else(PoisonError::into_inner);
                let identity = match pressed.iter().position(|(k, _)| *k == key) {
                    Some(index) => pressed.remove(index).1,
                    None => identity_for(key, None),
                };
                RawInputKind::KeyRelease { key: identity }
            }
            EventType::Wheel { .. } => return,
        };

        self.hub.push(RawInput::now(kind));
    }

    fn click(&self, button: Button, pressed: bool) -> RawInputKind {
        RawInputKind::Click {
            x: self.mouse_x.load(Ordering::Relaxed),
            y: self.mouse_y.load(Ordering::Relaxed),
            button: match button {
                Button::Left => MouseButton::Left,
                Button::Right => MouseButton::Right,
                Button::Middle => MouseButton::Middle,
                Button::Unknown(n) => MouseButton::Other(format!("button{n}")),
            },
            pressed,
        }
    }
}

fn identity_for(key: Key, name: Option<&str>) -> KeyIdentity {
    if let Some(named) = named_key(key) {
        return KeyIdentity::Named(named);
    }

    let mut chars = name.unwrap_or_default().chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return KeyIdentity::Char(c);
    }

    match key_char(key) {
        Some(c) => KeyIdentity::Char(c),
        None => KeyIdentity::Named(NamedKey::Other(format!("{key:?}").to_lowercase())),
    }
}

fn named_key(key: Key) -> Option<NamedKey> {
    Some(match key {
        Key::ControlLeft => NamedKey::CtrlL,
        Key::ControlRight => NamedKey::CtrlR,
        Key::Alt => NamedKey::AltL,
        Key::AltGr => NamedKey::AltR,
        Key::ShiftLeft => NamedKey::ShiftL,
        Key::ShiftRight => NamedKey::ShiftR,
        Key::MetaLeft => NamedKey::CmdL,
        Key::MetaRight => NamedKey::CmdR,
        Key::Tab => NamedKey::Tab,
        Key::Escape => NamedKey::Esc,
        Key::Return | Key::KpReturn => NamedKey::Enter,
        Key::Backspace => NamedKey::Backspace,
        Key::Delete => NamedKey::Delete,
        Key::Home => NamedKey::Home,
        Key::End => NamedKey::End,
        Key::PageUp => NamedKey::PageUp,
        Key::PageDown => NamedKey::PageDown,
        Key::UpArrow => NamedKey::Up,
        Key::DownArrow => NamedKey::Down,
        Key::LeftArrow => NamedKey::Left,
        Key::RightArrow => NamedKey::Right,
        Key::Insert => NamedKey::Insert,
        Key::Space => NamedKey::Space,
        Key::F1 => NamedKey::F(1),
        Key::F2 => NamedKey::F(2),
        Key::F3 => NamedKey::F(3),
        Key::F4 => NamedKey::F(4),
        Key::F5 => NamedKey::F(5),
        Key::F6 => NamedKey::F(6),
        Key::F7 => NamedKey::F(7),
        Key::F8 => NamedKey::F(8),
        Key::F9 => NamedKey::F(9),
        Key::F10 => NamedKey::F(10),
        Key::F11 => NamedKey::F(11),
        Key::F12 => NamedKey::F(12),
        Key::CapsLock => NamedKey::Other("caps_lock".into()),
        Key::NumLock => NamedKey::Other("num_lock".into()),
        Key::ScrollLock => NamedKey::Other("scroll_lock".into()),
        Key::PrintScreen => NamedKey::Other("print_screen".into()),
        Key::Pause => NamedKey::Other("pause".into()),
        _ => return None,
    })
}

/// Unshifted character for keys rdev did not name
fn key_char(key: Key) -> Option<char> {
    Some(match key {
        Key::KeyA => 'a',
        Key::KeyB => 'b',
        Key::KeyC => 'c',
        Key::KeyD => 'd',
        Key::KeyE => 'e',
        Key::KeyF => 'f',
        Key::KeyG => 'g',
        Key::KeyH => 'h',
        Key::KeyI => 'i',
        Key::KeyJ => 'j',
        Key::KeyK => 'k',
        Key::KeyL => 'l',
        Key::KeyM => 'm',
        Key::KeyN => 'n',
        Key::KeyO => 'o',
        Key::KeyP => 'p',
        Key::KeyQ => 'q',
        Key::KeyR => 'r',
        Key::KeyS => 's',
        Key::KeyT => 't',
        Key::KeyU => 'u',
        Key::KeyV => 'v',
        Key::KeyW => 'w',
        Key::KeyX => 'x',
        Key::KeyY => 'y',
        Key::KeyZ => 'z',
        Key::Num0 | Key::Kp0 => '0',
        Key::Num1 | Key::Kp1 => '1',
        Key::Num2 | Key::Kp2 => '2',
        Key::Num3 | Key::Kp3 => '3',
        Key::Num4 | Key::Kp4 => '4',
        Key::Num5 | Key::Kp5 => '5',
        Key::Num6 | Key::Kp6 => '6',
        Key::Num7 | Key::Kp7 => '7',
        Key::Num8 | Key::Kp8 => '8',
        Key::Num9 | Key::Kp9 => '9',
        Key::Minus | Key::KpMinus => '-',
        Key::Equal => '=',
        Key::KpPlus => '+',
        Key::KpMultiply => '*',
        Key::KpDivide | Key::Slash => '/',
        Key::BackQuote => '`',
        Key::LeftBracket => '[',
        Key::RightBracket => ']',
        Key::SemiColon => ';',
        Key::Quote => '\'',
        Key::BackSlash | Key::IntlBackslash => '\\',
        Key::Comma => ',',
        Key::Dot => '.',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys_win_over_event_name() {
        assert_eq!(identity_for(Key::Space, Some(" ")), KeyIdentity::named("space"));
        assert_eq!(identity_for(Key::Return, Some("\r")), KeyIdentity::named("enter"));
        assert_eq!(identity_for(Key::Escape, Some("\u{1b}")), KeyIdentity::named("esc"));
    }

    #[test]
    fn test_control_character_from_event_name() {
        assert_eq!(identity_for(Key::KeyC, Some("\u{3}")), KeyIdentity::Char('\x03'));
        assert_eq!(identity_for(Key::KeyA, Some("A")), KeyIdentity::Char('A'));
    }

    #[test]
    fn test_fallback_without_name() {
        assert_eq!(identity_for(Key::KeyQ, None), KeyIdentity::Char('q'));
        assert_eq!(
            identity_for(Key::Unknown(99), None),
            KeyIdentity::Named(NamedKey::Other("unknown(99)".into()))
        );
    }

    fn key_event(event_type: EventType, name: Option<&str>) -> Event {
        Event {
            time: std::time::SystemTime::now(),
            name: name.map(str::to_string),
            event_type,
        }
    }

    #[test]
    fn test_failed_hook_disconnects_sources() {
        let hub = Arc::new(ChannelFeed::new());
        let rx = hub.connect().unwrap();

        run_hook(Arc::clone(&hub), |_translator| Err("no display"));

        assert!(rx.recv().is_err());
        assert!(matches!(hub.connect(), Err(FeedError::Closed)));
    }

    #[test]
    fn test_hook_events_reach_connected_sources() {
        let hub = Arc::new(ChannelFeed::new());
        let rx = hub.connect().unwrap();

        run_hook(Arc::clone(&hub), |translator| -> Result<(), String> {
            translator.handle(key_event(EventType::MouseMove { x: 12.0, y: 34.0 }, None));
            translator.handle(key_event(EventType::ButtonPress(Button::Left), None));
            translator.handle(key_event(EventType::KeyPress(Key::KeyC), Some("\u{3}")));
            translator.handle(key_event(EventType::KeyRelease(Key::KeyC), None));
            Ok(())
        });

        let kinds: Vec<RawInputKind> = rx.iter().map(|input| input.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RawInputKind::Click {
                    x: 12,
                    y: 34,
                    button: MouseButton::Left,
                    pressed: true,
                },
                RawInputKind::KeyPress {
                    key: KeyIdentity::Char('\x03')
                },
                // Release carries the identity seen at press time
                RawInputKind::KeyRelease {
                    key: KeyIdentity::Char('\x03')
                },
            ]
        );
    }
}
