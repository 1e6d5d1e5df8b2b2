//! Murmur session crate - the dictation cycle orchestrator.
//!
//! Reacts to `Activate`, `SilenceTimeout`, and `Cancel` signals, drives the
//! audio capture start/stop, hands captured audio to the transcription
//! worker, and routes the resulting text to the output dispatcher. The
//! system is single-session: at most one recording exists at a time, and
//! signals that arrive while the cycle is busy are ignored at the state
//! guard rather than queued.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use murmur_audio::{Capture, RecordingBuffer};
use murmur_core::error::MurmurError;
use murmur_core::types::Signal;
use murmur_output::OutputDispatcher;

pub mod state;

pub use state::{SessionState, StateMachine};

/// A function that transcribes audio samples to text.
///
/// Takes `(samples, sample_rate, language_hint)` and returns the transcribed
/// string or an error. Samples are 16-bit PCM, normally at 16 kHz.
pub type TranscribeFn =
    Box<dyn Fn(&[i16], u32, &str) -> Result<String, MurmurError> + Send + Sync>;

/// Why a recording was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The activation gesture fired while recording.
    Gesture,
    /// Sustained silence reached the configured duration.
    Silence,
}

/// Tracks the data associated with the active dictation session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique identifier for this session.
    pub id: Uuid,
    /// When the session was started.
    pub started_at: DateTime<Utc>,
    /// Audio artifact path, set once the recording has been stopped and saved.
    pub audio_path: Option<PathBuf>,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            audio_path: None,
        }
    }
}

/// Drives the record -> transcribe -> dispatch cycle.
///
/// Signal routing consults the state machine, and every stop path funnels
/// through the single Recording -> Transcribing transition, so two racing
/// stop signals produce exactly one `stop()` call on the capture. The
/// transcription call is the only long-blocking step and runs on a blocking
/// worker, leaving the signal path free; the state stays `Transcribing`
/// until the worker finishes, which is what makes a fresh `Activate` during
/// transcription a no-op.
pub struct SessionOrchestrator {
    state: StateMachine,
    session: Arc<Mutex<Option<Session>>>,
    capture: Arc<dyn Capture>,
    dispatcher: Arc<OutputDispatcher>,
    transcribe: Arc<TranscribeFn>,
    language: String,
    auto_stop: bool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SessionOrchestrator {
    pub fn new(
        capture: Arc<dyn Capture>,
        dispatcher: Arc<OutputDispatcher>,
        transcribe: TranscribeFn,
        language: String,
        auto_stop: bool,
    ) -> Self {
        Self {
            state: StateMachine::new(),
            session: Arc::new(Mutex::new(None)),
            capture,
            dispatcher,
            transcribe: Arc::new(transcribe),
            language,
            auto_stop,
            worker: Mutex::new(None),
        }
    }

    /// Returns the current cycle state.
    pub fn current_state(&self) -> SessionState {
        self.state.current()
    }

    /// Returns a clone of the active session, if one exists.
    pub fn current_session(&self) -> Option<Session> {
        self.session.lock().ok().and_then(|guard| guard.clone())
    }

    /// Route one signal through the state machine.
    ///
    /// Never blocks for long: the transcription work this may kick off runs
    /// on a separate worker. Signals that do not apply in the current state
    /// are logged and dropped.
    ///
    /// Signals must be delivered from a single routing task. The state
    /// transitions themselves are atomic, but `start_session` moves to
    /// `Recording` before the capture is running; a second caller racing
    /// into that window could stop a capture that is still starting.
    pub fn on_signal(&self, signal: Signal) {
        match signal {
            Signal::Activate => match self.state.current() {
                SessionState::Idle => self.start_session(),
                SessionState::Recording => self.begin_stop(StopReason::Gesture),
                SessionState::Transcribing => {
                    debug!("Activation ignored: transcription in progress");
                }
            },
            Signal::SilenceTimeout => {
                if !self.auto_stop {
                    debug!("Silence timeout ignored: auto-stop disabled");
                    return;
                }
                if self.state.current() == SessionState::Recording {
                    self.begin_stop(StopReason::Silence);
                } else {
                    debug!("Stale silence timeout ignored");
                }
            }
            Signal::Cancel => self.cancel(),
        }
    }

    /// Block until any in-flight transcription worker has finished.
    pub async fn wait_for_idle(&self) {
        let handle = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Transcription worker panicked");
            }
        }
    }

    fn start_session(&self) {
        if self.state.transition(SessionState::Recording).is_err() {
            debug!("Activation ignored: session already in progress");
            return;
        }
        if let Err(e) = self.capture.start() {
            warn!(error = %e, "Session aborted: could not start audio capture");
            if self.state.transition(SessionState::Idle).is_err() {
                self.state.reset();
            }
            return;
        }

        let session = Session::new();
        info!(session_id = %session.id, "Recording started");
        if let Ok(mut guard) = self.session.lock() {
            *guard = Some(session);
        }
    }

    fn begin_stop(&self, reason: StopReason) {
        // The transition is the stop-idempotence guard: a racing stop signal
        // loses here and never reaches the capture.
        if self.state.transition(SessionState::Transcribing).is_err() {
            debug!(reason = ?reason, "Stop ignored: already leaving Recording");
            return;
        }

        let buffer = match self.capture.stop() {
            Ok(buffer) => buffer,
            Err(e) => {
                error!(error = %e, "Audio capture stop failed");
                finish_cycle(&self.state, &self.session);
                return;
            }
        };
        info!(
            reason = ?reason,
            samples = buffer.len(),
            duration_secs = buffer.duration_secs(),
            "Recording stopped"
        );

        // Under a tenth of a second cannot carry speech.
        if (buffer.len() as u64) < u64::from(buffer.sample_rate) / 10 {
            info!("{}", MurmurError::EmptyRecording);
            finish_cycle(&self.state, &self.session);
            return;
        }

        // The audio artifact is written before transcription so the
        // recording survives an engine crash.
        let audio_path = match self.dispatcher.store().save_audio(&buffer) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "Failed to write audio artifact");
                None
            }
        };
        if let Ok(mut guard) = self.session.lock() {
            if let Some(ref mut session) = *guard {
                session.audio_path = audio_path.clone();
            }
        }

        let state = self.state.clone();
        let session = Arc::clone(&self.session);
        let dispatcher = Arc::clone(&self.dispatcher);
        let transcribe = Arc::clone(&self.transcribe);
        let language = self.language.clone();
        let handle = tokio::task::spawn_blocking(move || {
            run_transcription(
                &state, &session, &dispatcher, &transcribe, &language, buffer, audio_path,
            );
        });
        if let Ok(mut worker) = self.worker.lock() {
            *worker = Some(handle);
        }
    }

    fn cancel(&self) {
        match self.state.current() {
            SessionState::Recording => {
                if self.state.transition(SessionState::Idle).is_err() {
                    debug!("Cancel lost the race against a stop signal");
                    return;
                }
                match self.capture.stop() {
                    Ok(buffer) => {
                        info!(samples = buffer.len(), "Recording cancelled, audio discarded");
                    }
                    Err(e) => warn!(error = %e, "Audio capture stop failed during cancel"),
                }
                if let Ok(mut guard) = self.session.lock() {
                    if let Some(session) = guard.take() {
                        info!(session_id = %session.id, "Session cancelled");
                    }
                }
            }
            SessionState::Transcribing => {
                warn!("Cancel ignored: transcription already in progress");
            }
            SessionState::Idle => debug!("Cancel ignored: no active session"),
        }
    }
}

/// Transcribe the captured audio and dispatch the result.
///
/// Runs on the blocking worker; the state machine stays in `Transcribing`
/// until this returns.
fn run_transcription(
    state: &StateMachine,
    session: &Mutex<Option<Session>>,
    dispatcher: &OutputDispatcher,
    transcribe: &TranscribeFn,
    language: &str,
    buffer: RecordingBuffer,
    audio_path: Option<PathBuf>,
) {
    let started_at = buffer.started_at;
    match transcribe(&buffer.samples, buffer.sample_rate, language) {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                info!("Transcription produced no text");
                dispatcher.discard(audio_path.as_ref());
            } else {
                info!(chars = text.len(), "Transcription complete");
                dispatcher.dispatch(&started_at, audio_path.as_ref(), text);
            }
        }
        Err(e) => {
            // Engine failure keeps the audio artifact no matter what the
            // retention policy says: the recording must not be lost.
            error!(error = %e, "Transcription failed");
            if let Some(path) = audio_path.as_ref() {
                info!(path = %path.display(), "Audio artifact retained for recovery");
            }
        }
    }
    finish_cycle(state, session);
}

/// End the cycle: destroy the session and return to Idle.
fn finish_cycle(state: &StateMachine, session: &Mutex<Option<Session>>) {
    if let Ok(mut guard) = session.lock() {
        if let Some(session) = guard.take() {
            debug!(session_id = %session.id, "Session complete");
        }
    }
    if state.transition(SessionState::Idle).is_err() {
        state.reset();
    }
}
