//! Per-session artifacts on disk.
//!
//! Each session produces a WAV file (written before transcription, so the
//! audio survives an engine crash) and a text file with the final
//! transcription. Filenames carry the session start timestamp so artifacts
//! sort chronologically.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use murmur_audio::RecordingBuffer;
use murmur_core::error::{MurmurError, Result};

/// Writes and removes session artifacts under a single directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn stamp(at: &DateTime<Utc>) -> String {
        at.format("%Y%m%d_%H%M%S").to_string()
    }

    /// Write the recording as 16-bit mono PCM WAV.
    ///
    /// Creates the artifact directory on demand. Returns the path written.
    pub fn save_audio(&self, buffer: &RecordingBuffer) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self
            .dir
            .join(format!("recording_{}.wav", Self::stamp(&buffer.started_at)));

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: buffer.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec)
            .map_err(|e| MurmurError::Io(std::io::Error::other(e.to_string())))?;
        for &sample in &buffer.samples {
            writer
                .write_sample(sample)
                .map_err(|e| MurmurError::Io(std::io::Error::other(e.to_string())))?;
        }
        writer
            .finalize()
            .map_err(|e| MurmurError::Io(std::io::Error::other(e.to_string())))?;

        info!(
            path = %path.display(),
            duration_secs = buffer.duration_secs(),
            "Audio artifact written"
        );
        Ok(path)
    }

    /// Write the transcription text next to the audio artifact.
    pub fn save_text(&self, started_at: &DateTime<Utc>, text: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self
            .dir
            .join(format!("transcription_{}.txt", Self::stamp(started_at)));
        std::fs::write(&path, text)?;
        info!(path = %path.display(), chars = text.len(), "Transcription artifact written");
        Ok(path)
    }

    /// Remove an artifact. Failure is logged, never fatal.
    pub fn remove(&self, path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "Artifact removed"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove artifact"),
        }
    }
}
