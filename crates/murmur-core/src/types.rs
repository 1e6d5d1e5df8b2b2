//! Domain types shared across the Murmur pipeline.
//!
//! `KeyEvent` and `AudioChunk` are the two raw event streams consumed by
//! the detectors; `Signal` is the only value the detectors hand to the
//! session orchestrator. Monotonic timing uses `std::time::Instant` since
//! gesture windows and silence runs must never go backwards with the wall
//! clock.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::error::{MurmurError, Result};

/// Identifier for a physical key on the global key stream.
///
/// Only keys that can plausibly participate in an activation gesture are
/// modeled; everything else arrives as `Char`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyId {
    MetaLeft,
    MetaRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    ShiftLeft,
    ShiftRight,
    Space,
    /// Function keys F1..F24.
    Function(u8),
    /// A printable key, lowercased.
    Char(char),
}

impl FromStr for KeyId {
    type Err = MurmurError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        let key = match name.as_str() {
            "cmd" | "cmd_l" | "meta" | "meta_left" => KeyId::MetaLeft,
            "cmd_r" | "meta_right" => KeyId::MetaRight,
            "ctrl" | "ctrl_l" | "control" | "control_left" => KeyId::ControlLeft,
            "ctrl_r" | "control_right" => KeyId::ControlRight,
            "alt" | "alt_l" | "option" | "alt_left" => KeyId::AltLeft,
            "alt_r" | "alt_right" => KeyId::AltRight,
            "shift" | "shift_l" | "shift_left" => KeyId::ShiftLeft,
            "shift_r" | "shift_right" => KeyId::ShiftRight,
            "space" => KeyId::Space,
            _ => {
                if let Some(num) = name.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                    if (1..=24).contains(&num) {
                        return Ok(KeyId::Function(num));
                    }
                }
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphanumeric() => KeyId::Char(c),
                    _ => {
                        return Err(MurmurError::Config(format!("Unknown key name: '{}'", s)));
                    }
                }
            }
        };
        Ok(key)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyId::MetaLeft => write!(f, "meta_left"),
            KeyId::MetaRight => write!(f, "meta_right"),
            KeyId::ControlLeft => write!(f, "ctrl"),
            KeyId::ControlRight => write!(f, "ctrl_r"),
            KeyId::AltLeft => write!(f, "alt"),
            KeyId::AltRight => write!(f, "alt_r"),
            KeyId::ShiftLeft => write!(f, "shift"),
            KeyId::ShiftRight => write!(f, "shift_r"),
            KeyId::Space => write!(f, "space"),
            KeyId::Function(n) => write!(f, "f{}", n),
            KeyId::Char(c) => write!(f, "{}", c),
        }
    }
}

/// Press or release edge of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Press,
    Release,
}

/// A single key transition from the OS key-event source.
#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub key: KeyId,
    pub edge: KeyEdge,
    pub at: Instant,
}

impl KeyEvent {
    pub fn press(key: KeyId, at: Instant) -> Self {
        Self {
            key,
            edge: KeyEdge::Press,
            at,
        }
    }

    pub fn release(key: KeyId, at: Instant) -> Self {
        Self {
            key,
            edge: KeyEdge::Release,
            at,
        }
    }
}

/// A chunk of PCM audio from the microphone, 16-bit signed mono.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub at: Instant,
}

impl AudioChunk {
    pub fn new(samples: Vec<i16>, sample_rate: u32, at: Instant) -> Self {
        Self {
            samples,
            sample_rate,
            at,
        }
    }

    /// Duration of this chunk in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// The configured activation gesture.
///
/// Parsed from an `activation` string of the form `double-tap:<key>` or
/// `chord:<key>+<key>[+...]`. The two modes are mutually exclusive by
/// construction; malformed specs are rejected at config load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationSpec {
    DoubleTap { key: KeyId, tap_window: Duration },
    Chord { keys: Vec<KeyId> },
}

impl ActivationSpec {
    /// Parse an activation spec string, using `tap_window` for double-tap mode.
    pub fn parse(spec: &str, tap_window: Duration) -> Result<Self> {
        let (kind, rest) = spec
            .split_once(':')
            .ok_or_else(|| MurmurError::Config(format!("Malformed activation spec: '{}'", spec)))?;

        match kind.trim() {
            "double-tap" => {
                if rest.contains('+') {
                    return Err(MurmurError::Config(format!(
                        "Double-tap takes a single key, got '{}' (use chord: for combinations)",
                        rest
                    )));
                }
                if tap_window.is_zero() {
                    return Err(MurmurError::Config(
                        "Tap window must be greater than zero".to_string(),
                    ));
                }
                Ok(ActivationSpec::DoubleTap {
                    key: rest.parse()?,
                    tap_window,
                })
            }
            "chord" => {
                let keys = rest
                    .split('+')
                    .map(|k| k.parse::<KeyId>())
                    .collect::<Result<Vec<_>>>()?;
                if keys.len() < 2 {
                    return Err(MurmurError::Config(format!(
                        "Chord needs at least two keys, got '{}'",
                        rest
                    )));
                }
                let mut seen = std::collections::HashSet::new();
                for key in &keys {
                    if !seen.insert(*key) {
                        return Err(MurmurError::Config(format!(
                            "Chord lists key '{}' twice",
                            key
                        )));
                    }
                }
                Ok(ActivationSpec::Chord { keys })
            }
            other => Err(MurmurError::Config(format!(
                "Unknown activation kind: '{}' (expected double-tap or chord)",
                other
            ))),
        }
    }
}

impl fmt::Display for ActivationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationSpec::DoubleTap { key, .. } => write!(f, "double-tap:{}", key),
            ActivationSpec::Chord { keys } => {
                write!(f, "chord:")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, "+")?;
                    }
                    write!(f, "{}", key)?;
                }
                Ok(())
            }
        }
    }
}

/// Control signals flowing from the detectors into the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The activation gesture fired (start, or stop if already recording).
    Activate,
    /// Loudness stayed below the silence floor for the configured duration.
    SilenceTimeout,
    /// External request to abandon the in-flight recording.
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_parse_aliases() {
        assert_eq!("cmd_r".parse::<KeyId>().unwrap(), KeyId::MetaRight);
        assert_eq!("meta_right".parse::<KeyId>().unwrap(), KeyId::MetaRight);
        assert_eq!("ctrl".parse::<KeyId>().unwrap(), KeyId::ControlLeft);
        assert_eq!("option".parse::<KeyId>().unwrap(), KeyId::AltLeft);
        assert_eq!("shift".parse::<KeyId>().unwrap(), KeyId::ShiftLeft);
        assert_eq!("space".parse::<KeyId>().unwrap(), KeyId::Space);
        assert_eq!("f9".parse::<KeyId>().unwrap(), KeyId::Function(9));
        assert_eq!("r".parse::<KeyId>().unwrap(), KeyId::Char('r'));
        assert_eq!("R ".parse::<KeyId>().unwrap(), KeyId::Char('r'));
    }

    #[test]
    fn test_key_id_parse_rejects_unknown() {
        assert!("hyperkey".parse::<KeyId>().is_err());
        assert!("f25".parse::<KeyId>().is_err());
        assert!("".parse::<KeyId>().is_err());
    }

    #[test]
    fn test_key_id_display_round_trip() {
        for key in [
            KeyId::MetaRight,
            KeyId::ControlLeft,
            KeyId::ShiftRight,
            KeyId::Space,
            KeyId::Function(12),
            KeyId::Char('v'),
        ] {
            let parsed: KeyId = key.to_string().parse().unwrap();
            assert_eq!(parsed, key);
        }
    }

    #[test]
    fn test_activation_parse_double_tap() {
        let spec = ActivationSpec::parse("double-tap:cmd_r", Duration::from_millis(300)).unwrap();
        assert_eq!(
            spec,
            ActivationSpec::DoubleTap {
                key: KeyId::MetaRight,
                tap_window: Duration::from_millis(300),
            }
        );
    }

    #[test]
    fn test_activation_parse_chord() {
        let spec = ActivationSpec::parse("chord:ctrl+shift+r", Duration::from_millis(300)).unwrap();
        assert_eq!(
            spec,
            ActivationSpec::Chord {
                keys: vec![KeyId::ControlLeft, KeyId::ShiftLeft, KeyId::Char('r')],
            }
        );
    }

    #[test]
    fn test_activation_parse_rejects_mixed_spec() {
        // A double-tap naming several keys would be an ambiguous hybrid.
        let result = ActivationSpec::parse("double-tap:ctrl+r", Duration::from_millis(300));
        assert!(result.is_err());
    }

    #[test]
    fn test_activation_parse_rejects_single_key_chord() {
        assert!(ActivationSpec::parse("chord:ctrl", Duration::from_millis(300)).is_err());
    }

    #[test]
    fn test_activation_parse_rejects_duplicate_chord_key() {
        assert!(ActivationSpec::parse("chord:ctrl+ctrl", Duration::from_millis(300)).is_err());
    }

    #[test]
    fn test_activation_parse_rejects_zero_window() {
        assert!(ActivationSpec::parse("double-tap:cmd_r", Duration::ZERO).is_err());
    }

    #[test]
    fn test_activation_parse_rejects_unknown_kind() {
        assert!(ActivationSpec::parse("triple-tap:cmd_r", Duration::from_millis(300)).is_err());
        assert!(ActivationSpec::parse("cmd_r", Duration::from_millis(300)).is_err());
    }

    #[test]
    fn test_activation_display() {
        let spec = ActivationSpec::parse("chord:ctrl+shift+r", Duration::from_millis(300)).unwrap();
        assert_eq!(spec.to_string(), "chord:ctrl+shift+r");
        let spec = ActivationSpec::parse("double-tap:cmd_r", Duration::from_millis(300)).unwrap();
        assert_eq!(spec.to_string(), "double-tap:meta_right");
    }

    #[test]
    fn test_audio_chunk_duration() {
        let chunk = AudioChunk::new(vec![0i16; 16000], 16000, Instant::now());
        assert!((chunk.duration_secs() - 1.0).abs() < f32::EPSILON);

        let chunk = AudioChunk::new(vec![0i16; 8000], 16000, Instant::now());
        assert!((chunk.duration_secs() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_audio_chunk_zero_rate() {
        let chunk = AudioChunk::new(vec![0i16; 100], 0, Instant::now());
        assert_eq!(chunk.duration_secs(), 0.0);
    }

    #[test]
    fn test_key_event_constructors() {
        let now = Instant::now();
        let press = KeyEvent::press(KeyId::MetaRight, now);
        assert_eq!(press.edge, KeyEdge::Press);
        assert_eq!(press.key, KeyId::MetaRight);

        let release = KeyEvent::release(KeyId::MetaRight, now);
        assert_eq!(release.edge, KeyEdge::Release);
    }
}
