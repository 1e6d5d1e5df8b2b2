//! Murmur gesture crate - activation gesture recognition.
//!
//! Consumes the global key-event stream and recognizes the configured
//! activation gesture: a double-tap of a single key within a time window,
//! or a chord of keys pressed together. Emits exactly one `Signal::Activate`
//! per recognized gesture.
//!
//! The detector's state outlives any dictation session (taps can happen at
//! any time), so the owner keeps one detector alive for the process and
//! feeds it every key event.

use std::collections::HashSet;
use std::time::Instant;

use murmur_core::types::{ActivationSpec, KeyEdge, KeyEvent, KeyId, Signal};

/// Recognizes the activation gesture on a stream of key events.
///
/// Double-tap mode: two presses of the configured key within the tap
/// window (boundary inclusive) fire once. The window expires lazily — a
/// late second tap simply becomes a new first tap. Unrelated keys are
/// transparent, so typing between taps does not break recognition.
///
/// Chord mode: fires once when every chord key is held, then re-arms only
/// after all chord keys have been released, so holding the chord never
/// repeat-fires. OS auto-repeat presses of an already-held key are
/// ignored, as are releases with no matching press.
#[derive(Debug)]
pub struct GestureDetector {
    spec: ActivationSpec,
    last_tap: Option<Instant>,
    pressed: HashSet<KeyId>,
    fired: bool,
}

impl GestureDetector {
    pub fn new(spec: ActivationSpec) -> Self {
        Self {
            spec,
            last_tap: None,
            pressed: HashSet::new(),
            fired: false,
        }
    }

    /// Feed one key event; returns `Signal::Activate` when the gesture completes.
    pub fn on_key_event(&mut self, event: &KeyEvent) -> Option<Signal> {
        match self.spec {
            ActivationSpec::DoubleTap { key, tap_window } => {
                if event.key != key || event.edge != KeyEdge::Press {
                    return None;
                }
                match self.last_tap.take() {
                    Some(prev) if event.at.saturating_duration_since(prev) <= tap_window => {
                        tracing::debug!(key = %key, "Double-tap recognized");
                        Some(Signal::Activate)
                    }
                    _ => {
                        // First tap, or the window elapsed: start a fresh window.
                        self.last_tap = Some(event.at);
                        None
                    }
                }
            }
            ActivationSpec::Chord { ref keys } => {
                if !keys.contains(&event.key) {
                    return None;
                }
                match event.edge {
                    KeyEdge::Press => {
                        if !self.pressed.insert(event.key) {
                            // Auto-repeat of a held key.
                            return None;
                        }
                        if !self.fired && keys.iter().all(|k| self.pressed.contains(k)) {
                            self.fired = true;
                            tracing::debug!(chord = %self.spec, "Chord recognized");
                            return Some(Signal::Activate);
                        }
                        None
                    }
                    KeyEdge::Release => {
                        self.pressed.remove(&event.key);
                        if self.pressed.is_empty() {
                            self.fired = false;
                        }
                        None
                    }
                }
            }
        }
    }

    /// Clear all tracked taps and held keys.
    pub fn reset(&mut self) {
        self.last_tap = None;
        self.pressed.clear();
        self.fired = false;
    }

    pub fn spec(&self) -> &ActivationSpec {
        &self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn double_tap_detector(window_ms: u64) -> GestureDetector {
        GestureDetector::new(ActivationSpec::DoubleTap {
            key: KeyId::MetaRight,
            tap_window: Duration::from_millis(window_ms),
        })
    }

    fn chord_detector(keys: Vec<KeyId>) -> GestureDetector {
        GestureDetector::new(ActivationSpec::Chord { keys })
    }

    fn press(detector: &mut GestureDetector, key: KeyId, at: Instant) -> Option<Signal> {
        detector.on_key_event(&KeyEvent::press(key, at))
    }

    fn release(detector: &mut GestureDetector, key: KeyId, at: Instant) -> Option<Signal> {
        detector.on_key_event(&KeyEvent::release(key, at))
    }

    #[test]
    fn test_double_tap_within_window_fires_once() {
        let mut d = double_tap_detector(300);
        let t0 = Instant::now();

        assert_eq!(press(&mut d, KeyId::MetaRight, t0), None);
        assert_eq!(
            press(&mut d, KeyId::MetaRight, t0 + Duration::from_millis(200)),
            Some(Signal::Activate)
        );
    }

    #[test]
    fn test_double_tap_window_boundary_inclusive() {
        let mut d = double_tap_detector(300);
        let t0 = Instant::now();

        assert_eq!(press(&mut d, KeyId::MetaRight, t0), None);
        assert_eq!(
            press(&mut d, KeyId::MetaRight, t0 + Duration::from_millis(300)),
            Some(Signal::Activate)
        );
    }

    #[test]
    fn test_double_tap_outside_window_does_not_fire() {
        let mut d = double_tap_detector(300);
        let t0 = Instant::now();

        assert_eq!(press(&mut d, KeyId::MetaRight, t0), None);
        assert_eq!(
            press(&mut d, KeyId::MetaRight, t0 + Duration::from_millis(301)),
            None
        );
    }

    #[test]
    fn test_late_tap_starts_fresh_window() {
        let mut d = double_tap_detector(300);
        let t0 = Instant::now();

        assert_eq!(press(&mut d, KeyId::MetaRight, t0), None);
        // Too late — becomes the first tap of a new window.
        let t1 = t0 + Duration::from_millis(500);
        assert_eq!(press(&mut d, KeyId::MetaRight, t1), None);
        assert_eq!(
            press(&mut d, KeyId::MetaRight, t1 + Duration::from_millis(100)),
            Some(Signal::Activate)
        );
    }

    #[test]
    fn test_double_tap_consumes_state() {
        // A third tap right after recognition must not fire again.
        let mut d = double_tap_detector(300);
        let t0 = Instant::now();

        press(&mut d, KeyId::MetaRight, t0);
        assert_eq!(
            press(&mut d, KeyId::MetaRight, t0 + Duration::from_millis(100)),
            Some(Signal::Activate)
        );
        assert_eq!(
            press(&mut d, KeyId::MetaRight, t0 + Duration::from_millis(200)),
            None
        );
    }

    #[test]
    fn test_stray_key_between_taps_is_transparent() {
        let mut d = double_tap_detector(300);
        let t0 = Instant::now();

        assert_eq!(press(&mut d, KeyId::MetaRight, t0), None);
        assert_eq!(
            press(&mut d, KeyId::Char('x'), t0 + Duration::from_millis(100)),
            None
        );
        assert_eq!(
            press(&mut d, KeyId::MetaRight, t0 + Duration::from_millis(200)),
            Some(Signal::Activate)
        );
    }

    #[test]
    fn test_double_tap_ignores_releases() {
        let mut d = double_tap_detector(300);
        let t0 = Instant::now();

        assert_eq!(press(&mut d, KeyId::MetaRight, t0), None);
        assert_eq!(
            release(&mut d, KeyId::MetaRight, t0 + Duration::from_millis(50)),
            None
        );
        assert_eq!(
            press(&mut d, KeyId::MetaRight, t0 + Duration::from_millis(150)),
            Some(Signal::Activate)
        );
    }

    #[test]
    fn test_chord_fires_when_fully_pressed() {
        let mut d = chord_detector(vec![KeyId::ControlLeft, KeyId::ShiftLeft, KeyId::Char('r')]);
        let t0 = Instant::now();

        assert_eq!(press(&mut d, KeyId::ControlLeft, t0), None);
        assert_eq!(press(&mut d, KeyId::ShiftLeft, t0), None);
        assert_eq!(press(&mut d, KeyId::Char('r'), t0), Some(Signal::Activate));
    }

    #[test]
    fn test_chord_does_not_repeat_fire_while_held() {
        let mut d = chord_detector(vec![KeyId::ControlLeft, KeyId::Char('r')]);
        let t0 = Instant::now();

        press(&mut d, KeyId::ControlLeft, t0);
        assert_eq!(press(&mut d, KeyId::Char('r'), t0), Some(Signal::Activate));

        // OS auto-repeat while held.
        assert_eq!(press(&mut d, KeyId::Char('r'), t0), None);
        assert_eq!(press(&mut d, KeyId::Char('r'), t0), None);
    }

    #[test]
    fn test_chord_rearms_only_after_full_release() {
        let mut d = chord_detector(vec![KeyId::ControlLeft, KeyId::Char('r')]);
        let t0 = Instant::now();

        press(&mut d, KeyId::ControlLeft, t0);
        assert_eq!(press(&mut d, KeyId::Char('r'), t0), Some(Signal::Activate));

        // Release only one key, press it again: still armed-off.
        release(&mut d, KeyId::Char('r'), t0);
        assert_eq!(press(&mut d, KeyId::Char('r'), t0), None);

        // Release everything, then the chord fires again.
        release(&mut d, KeyId::Char('r'), t0);
        release(&mut d, KeyId::ControlLeft, t0);
        press(&mut d, KeyId::ControlLeft, t0);
        assert_eq!(press(&mut d, KeyId::Char('r'), t0), Some(Signal::Activate));
    }

    #[test]
    fn test_chord_unmatched_release_is_harmless() {
        let mut d = chord_detector(vec![KeyId::ControlLeft, KeyId::Char('r')]);
        let t0 = Instant::now();

        assert_eq!(release(&mut d, KeyId::Char('r'), t0), None);
        press(&mut d, KeyId::ControlLeft, t0);
        assert_eq!(press(&mut d, KeyId::Char('r'), t0), Some(Signal::Activate));
    }

    #[test]
    fn test_chord_unrelated_keys_transparent() {
        let mut d = chord_detector(vec![KeyId::ControlLeft, KeyId::Char('r')]);
        let t0 = Instant::now();

        press(&mut d, KeyId::ControlLeft, t0);
        assert_eq!(press(&mut d, KeyId::Char('x'), t0), None);
        assert_eq!(press(&mut d, KeyId::Char('r'), t0), Some(Signal::Activate));
    }

    #[test]
    fn test_reset_clears_pending_tap() {
        let mut d = double_tap_detector(300);
        let t0 = Instant::now();

        press(&mut d, KeyId::MetaRight, t0);
        d.reset();
        assert_eq!(
            press(&mut d, KeyId::MetaRight, t0 + Duration::from_millis(100)),
            None
        );
    }

    #[test]
    fn test_reset_clears_held_chord() {
        let mut d = chord_detector(vec![KeyId::ControlLeft, KeyId::Char('r')]);
        let t0 = Instant::now();

        press(&mut d, KeyId::ControlLeft, t0);
        d.reset();
        assert_eq!(press(&mut d, KeyId::Char('r'), t0), None);
    }

    #[test]
    fn test_many_taps_alternate_fire() {
        // Taps at a steady cadence inside the window fire on every 2nd tap.
        let mut d = double_tap_detector(300);
        let t0 = Instant::now();
        let mut fired = 0;
        for i in 0..6 {
            let at = t0 + Duration::from_millis(100 * i);
            if press(&mut d, KeyId::MetaRight, at) == Some(Signal::Activate) {
                fired += 1;
            }
        }
        assert_eq!(fired, 3);
    }
}
