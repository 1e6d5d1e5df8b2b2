//! RMS-based silence detection for auto-stop.
//!
//! Each incoming chunk is reduced to a decibel loudness figure; once
//! loudness has stayed under the configured floor for the configured
//! duration, a single `SilenceTimeout` fires. The monitor is reset at
//! session start so no silence run leaks across sessions.

use std::time::{Duration, Instant};

use murmur_core::types::{AudioChunk, Signal};

/// Loudness reported for an all-zero chunk, well under any usable floor.
const SILENT_FLOOR_DB: f32 = -100.0;

/// Root-mean-square energy of a chunk, normalized to [0, 1].
pub fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples
        .iter()
        .map(|&s| {
            let normalized = f64::from(s) / f64::from(i16::MAX);
            normalized * normalized
        })
        .sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Convert an RMS level to a decibel-like loudness scale.
pub fn rms_to_db(rms: f32) -> f32 {
    if rms > 0.0 {
        20.0 * rms.log10()
    } else {
        SILENT_FLOOR_DB
    }
}

/// Tracks how long loudness has stayed below the silence floor.
///
/// Threshold and duration are fixed for the monitor's lifetime; the
/// orchestration layer constructs it from config at startup and calls
/// `reset` whenever a new session begins.
#[derive(Debug)]
pub struct SilenceMonitor {
    threshold_db: f32,
    duration: Duration,
    below_since: Option<Instant>,
}

impl SilenceMonitor {
    pub fn new(threshold_db: f32, duration: Duration) -> Self {
        Self {
            threshold_db,
            duration,
            below_since: None,
        }
    }

    /// Feed one chunk; returns `SilenceTimeout` when the silence run
    /// reaches the configured duration. Fires at most once per run.
    pub fn on_chunk(&mut self, chunk: &AudioChunk) -> Option<Signal> {
        let db = rms_to_db(rms(&chunk.samples));

        if db >= self.threshold_db {
            self.below_since = None;
            return None;
        }

        match self.below_since {
            None => {
                self.below_since = Some(chunk.at);
                None
            }
            Some(since) if chunk.at.saturating_duration_since(since) >= self.duration => {
                self.below_since = None;
                tracing::debug!(
                    threshold_db = self.threshold_db,
                    "Silence duration reached"
                );
                Some(Signal::SilenceTimeout)
            }
            Some(_) => None,
        }
    }

    /// Forget any in-progress silence run. Called at session start.
    pub fn reset(&mut self) {
        self.below_since = None;
    }
}
