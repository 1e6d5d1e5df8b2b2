//! Session state machine with thread-safe transitions.
//!
//! Enforces valid state transitions for the dictation cycle:
//! - Idle -> Recording (activation gesture, microphone acquired)
//! - Recording -> Transcribing (manual stop or silence timeout)
//! - Recording -> Idle (cancel, discarding captured audio)
//! - Transcribing -> Idle (transcription finished or failed)

use std::fmt;
use std::sync::{Arc, Mutex};

use murmur_core::error::MurmurError;

/// Operational state of the dictation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No session in progress. Ready for the activation gesture.
    Idle,
    /// Microphone active, samples accumulating in the session buffer.
    Recording,
    /// Captured audio handed to the transcription worker.
    Transcribing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Recording => write!(f, "Recording"),
            SessionState::Transcribing => write!(f, "Transcribing"),
        }
    }
}

impl SessionState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            (SessionState::Idle, SessionState::Recording)
                | (SessionState::Recording, SessionState::Transcribing)
                | (SessionState::Recording, SessionState::Idle)
                | (SessionState::Transcribing, SessionState::Idle)
        )
    }
}

/// Thread-safe state machine for the dictation cycle.
///
/// Transitions are validated under the lock, so two concurrent stop signals
/// race for the single Recording -> Transcribing edge and exactly one wins.
/// The loser's transition fails, which is the stop-idempotence guard.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: Arc<Mutex<SessionState>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::Idle)),
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> SessionState {
        *self.state.lock().expect("state mutex poisoned")
    }

    /// Attempt to transition to the target state.
    ///
    /// Returns `Ok(())` if the transition is valid, or `MurmurError::Session`
    /// if the transition is not allowed from the current state.
    pub fn transition(&self, target: SessionState) -> Result<(), MurmurError> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.can_transition_to(&target) {
            tracing::debug!("Session state: {} -> {}", *state, target);
            *state = target;
            Ok(())
        } else {
            Err(MurmurError::Session(format!(
                "Invalid state transition: {} -> {}",
                *state, target
            )))
        }
    }

    /// Force the state machine back to Idle (used for error recovery).
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        tracing::warn!("Session state machine reset to Idle from {}", *state);
        *state = SessionState::Idle;
    }
}
