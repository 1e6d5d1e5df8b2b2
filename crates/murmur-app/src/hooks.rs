//! Global key-event hook via rdev.
//!
//! rdev's listener blocks its thread for the lifetime of the process, so
//! it runs on a dedicated OS thread and forwards mapped key events into a
//! bounded channel. A hook failure at startup is unrecoverable: on most
//! platforms it means the input-monitoring / accessibility permission is
//! missing.

use std::time::Instant;

use tracing::{error, warn};

use murmur_core::types::{KeyEvent, KeyId};

/// Spawn the listener thread. Exits the process if the hook cannot be
/// installed.
pub fn spawn_key_listener(tx: tokio::sync::mpsc::Sender<KeyEvent>) {
    std::thread::spawn(move || {
        let result = rdev::listen(move |event| {
            let (key, press) = match event.event_type {
                rdev::EventType::KeyPress(key) => (key, true),
                rdev::EventType::KeyRelease(key) => (key, false),
                _ => return,
            };
            let Some(key) = map_key(key) else { return };

            let event = if press {
                KeyEvent::press(key, Instant::now())
            } else {
                KeyEvent::release(key, Instant::now())
            };
            // try_send: the hook callback must never block on a slow consumer.
            if tx.try_send(event).is_err() {
                warn!("Key event channel full, event dropped");
            }
        });
        if let Err(e) = result {
            error!(
                error = ?e,
                "Failed to install the global key hook. Grant this process the \
                 input-monitoring (accessibility) permission and restart."
            );
            std::process::exit(1);
        }
    });
}

/// Map rdev keys onto the key identifiers the gesture detector understands.
///
/// Unmapped keys return `None` and are invisible to gesture recognition.
fn map_key(key: rdev::Key) -> Option<KeyId> {
    use rdev::Key as K;
    Some(match key {
        K::MetaLeft => KeyId::MetaLeft,
        K::MetaRight => KeyId::MetaRight,
        K::ControlLeft => KeyId::ControlLeft,
        K::ControlRight => KeyId::ControlRight,
        K::Alt => KeyId::AltLeft,
        K::AltGr => KeyId::AltRight,
        K::ShiftLeft => KeyId::ShiftLeft,
        K::ShiftRight => KeyId::ShiftRight,
        K::Space => KeyId::Space,
        K::F1 => KeyId::Function(1),
        K::F2 => KeyId::Function(2),
        K::F3 => KeyId::Function(3),
        K::F4 => KeyId::Function(4),
        K::F5 => KeyId::Function(5),
        K::F6 => KeyId::Function(6),
        K::F7 => KeyId::Function(7),
        K::F8 => KeyId::Function(8),
        K::F9 => KeyId::Function(9),
        K::F10 => KeyId::Function(10),
        K::F11 => KeyId::Function(11),
        K::F12 => KeyId::Function(12),
        K::KeyA => KeyId::Char('a'),
        K::KeyB => KeyId::Char('b'),
        K::KeyC => KeyId::Char('c'),
        K::KeyD => KeyId::Char('d'),
        K::KeyE => KeyId::Char('e'),
        K::KeyF => KeyId::Char('f'),
        K::KeyG => KeyId::Char('g'),
        K::KeyH => KeyId::Char('h'),
        K::KeyI => KeyId::Char('i'),
        K::KeyJ => KeyId::Char('j'),
        K::KeyK => KeyId::Char('k'),
        K::KeyL => KeyId::Char('l'),
        K::KeyM => KeyId::Char('m'),
        K::KeyN => KeyId::Char('n'),
        K::KeyO => KeyId::Char('o'),
        K::KeyP => KeyId::Char('p'),
        K::KeyQ => KeyId::Char('q'),
        K::KeyR => KeyId::Char('r'),
        K::KeyS => KeyId::Char('s'),
        K::KeyT => KeyId::Char('t'),
        K::KeyU => KeyId::Char('u'),
        K::KeyV => KeyId::Char('v'),
        K::KeyW => KeyId::Char('w'),
        K::KeyX => KeyId::Char('x'),
        K::KeyY => KeyId::Char('y'),
        K::KeyZ => KeyId::Char('z'),
        K::Num0 => KeyId::Char('0'),
        K::Num1 => KeyId::Char('1'),
        K::Num2 => KeyId::Char('2'),
        K::Num3 => KeyId::Char('3'),
        K::Num4 => KeyId::Char('4'),
        K::Num5 => KeyId::Char('5'),
        K::Num6 => KeyId::Char('6'),
        K::Num7 => KeyId::Char('7'),
        K::Num8 => KeyId::Char('8'),
        K::Num9 => KeyId::Char('9'),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_mapping() {
        assert_eq!(map_key(rdev::Key::MetaRight), Some(KeyId::MetaRight));
        assert_eq!(map_key(rdev::Key::ControlLeft), Some(KeyId::ControlLeft));
        assert_eq!(map_key(rdev::Key::ShiftRight), Some(KeyId::ShiftRight));
    }

    #[test]
    fn test_letter_and_digit_mapping() {
        assert_eq!(map_key(rdev::Key::KeyR), Some(KeyId::Char('r')));
        assert_eq!(map_key(rdev::Key::Num7), Some(KeyId::Char('7')));
        assert_eq!(map_key(rdev::Key::F5), Some(KeyId::Function(5)));
    }

    #[test]
    fn test_unmapped_key_is_none() {
        assert_eq!(map_key(rdev::Key::Escape), None);
        assert_eq!(map_key(rdev::Key::Return), None);
    }
}
