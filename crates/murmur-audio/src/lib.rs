//! Murmur audio crate - microphone capture and silence detection.
//!
//! Provides the `Capture` seam the orchestrator commands, the
//! `RecordingBuffer` it takes ownership of on stop, the RMS-based
//! `SilenceMonitor`, and two `Capture` implementations: a cpal-backed
//! microphone adapter (feature `device`) and a mock for tests and
//! platforms without audio hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use murmur_core::error::{MurmurError, Result};

#[cfg(feature = "device")]
pub mod mic;
pub mod silence;

pub use silence::SilenceMonitor;

/// Sample rate the transcription engine expects.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// The samples accumulated over one recording session.
///
/// Owned exclusively by the active capture while recording; ownership
/// transfers to the orchestrator on `stop()` and the buffer is destroyed
/// when the session ends. Append-only while owned by the capture.
#[derive(Debug, Clone)]
pub struct RecordingBuffer {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub started_at: DateTime<Utc>,
}

impl RecordingBuffer {
    pub fn new(sample_rate: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            started_at,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the recording in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Service that owns the microphone stream.
///
/// `start` acquires the device and begins buffering; while active, sample
/// chunks are also forwarded to the audio channel for silence monitoring.
/// `stop` flushes, releases the device, and hands the buffer over. A stop
/// with zero chunks captured yields an empty buffer, not an error.
pub trait Capture: Send + Sync {
    fn start(&self) -> Result<()>;
    fn stop(&self) -> Result<RecordingBuffer>;
    fn is_active(&self) -> bool;
}

/// Mock capture for tests and platforms without a microphone.
///
/// Samples are fed in by hand via `push_samples`; pushes while inactive
/// are dropped, which is exactly the lock-step invariant the orchestrator
/// relies on.
pub struct MockCapture {
    active: AtomicBool,
    sample_rate: u32,
    buffer: Mutex<Vec<i16>>,
    started_at: Mutex<Option<DateTime<Utc>>>,
    fail_start: Option<String>,
}

impl Default for MockCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCapture {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            sample_rate: TARGET_SAMPLE_RATE,
            buffer: Mutex::new(Vec::new()),
            started_at: Mutex::new(None),
            fail_start: None,
        }
    }

    /// A capture whose `start` always fails, for device-unavailable paths.
    pub fn unavailable(reason: &str) -> Self {
        Self {
            fail_start: Some(reason.to_string()),
            ..Self::new()
        }
    }

    /// Feed samples as if the device delivered them. Ignored while inactive.
    pub fn push_samples(&self, samples: &[i16]) {
        if !self.active.load(Ordering::Relaxed) {
            tracing::debug!(count = samples.len(), "Samples dropped: capture inactive");
            return;
        }
        if let Ok(mut buf) = self.buffer.lock() {
            buf.extend_from_slice(samples);
        }
    }

    /// Number of samples currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.lock().map(|b| b.len()).unwrap_or(0)
    }
}

impl Capture for MockCapture {
    fn start(&self) -> Result<()> {
        if let Some(ref reason) = self.fail_start {
            return Err(MurmurError::DeviceUnavailable(reason.clone()));
        }
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(MurmurError::Session(
                "Audio capture is already active".to_string(),
            ));
        }
        if let Ok(mut started) = self.started_at.lock() {
            *started = Some(Utc::now());
        }
        tracing::info!("Mock audio capture started");
        Ok(())
    }

    fn stop(&self) -> Result<RecordingBuffer> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Err(MurmurError::Session(
                "Audio capture is not active".to_string(),
            ));
        }
        let started_at = self
            .started_at
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .unwrap_or_else(Utc::now);
        let samples = self
            .buffer
            .lock()
            .map(|mut b| std::mem::take(&mut *b))
            .unwrap_or_default();
        tracing::info!(samples = samples.len(), "Mock audio capture stopped");
        Ok(RecordingBuffer {
            samples,
            sample_rate: self.sample_rate,
            started_at,
        })
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}
