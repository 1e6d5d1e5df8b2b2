//! Real microphone capture via cpal.
//!
//! Captures from the default input device, downmixes and resamples to
//! 16 kHz mono i16 in the callback, appends to the session buffer, and
//! forwards chunk copies to the audio channel for silence monitoring.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, info};

use murmur_core::error::{MurmurError, Result};
use murmur_core::types::AudioChunk;

use crate::{Capture, RecordingBuffer, TARGET_SAMPLE_RATE};

/// Wrapper to make `cpal::Stream` storable inside a `Mutex`.
///
/// `cpal::Stream` carries a `*mut ()` marker that prevents auto
/// `Send`/`Sync` on some backends. The handle is only ever stored (to keep
/// capture alive) or dropped (to stop it); the audio callback runs on a
/// thread cpal manages itself.
struct SendStream(#[allow(dead_code)] cpal::Stream);

// SAFETY: the Stream handle is never used to share data with the callback;
// all shared state goes through the Arc<Mutex<...>> buffer.
unsafe impl Send for SendStream {}
unsafe impl Sync for SendStream {}

/// cpal-backed implementation of `Capture`.
pub struct MicCapture {
    active: Arc<AtomicBool>,
    buffer: Arc<Mutex<Vec<i16>>>,
    started_at: Mutex<Option<DateTime<Utc>>>,
    chunks: tokio::sync::mpsc::Sender<AudioChunk>,
    stream: Mutex<Option<SendStream>>,
}

impl MicCapture {
    /// Create a capture that forwards live chunks to `chunks`.
    pub fn new(chunks: tokio::sync::mpsc::Sender<AudioChunk>) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            buffer: Arc::new(Mutex::new(Vec::new())),
            started_at: Mutex::new(None),
            chunks,
            stream: Mutex::new(None),
        }
    }
}

/// Downmix interleaved frames to mono by averaging channels.
fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear-interpolation resample from `from_rate` to `to_rate`.
fn resample(mono: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || mono.is_empty() {
        return mono.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = (mono.len() as f64 / ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src = i as f64 * ratio;
        let idx0 = src.floor() as usize;
        let idx1 = (idx0 + 1).min(mono.len() - 1);
        let frac = (src - idx0 as f64) as f32;
        out.push(mono[idx0] * (1.0 - frac) + mono[idx1] * frac);
    }
    out
}

fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

impl Capture for MicCapture {
    fn start(&self) -> Result<()> {
        if self.active.load(Ordering::Relaxed) {
            return Err(MurmurError::Session(
                "Audio capture is already active".to_string(),
            ));
        }

        let host = cpal::default_host();
        let device = host.default_input_device().ok_or_else(|| {
            MurmurError::DeviceUnavailable("No default input device found".to_string())
        })?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = device.default_input_config().map_err(|e| {
            MurmurError::DeviceUnavailable(format!(
                "Cannot query input config for '{}': {}",
                device_name, e
            ))
        })?;
        let stream_config = cpal::StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        let device_rate = stream_config.sample_rate.0;
        let device_channels = stream_config.channels as usize;
        debug!(
            device = %device_name,
            device_rate,
            device_channels,
            "Selected audio device"
        );

        let buffer = Arc::clone(&self.buffer);
        let active = Arc::clone(&self.active);
        let chunks = self.chunks.clone();

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !active.load(Ordering::Relaxed) {
                        return;
                    }
                    let mono = downmix(data, device_channels);
                    let resampled = resample(&mono, device_rate, TARGET_SAMPLE_RATE);
                    let samples = to_i16(&resampled);

                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(&samples);
                    }
                    // Forward a copy for silence monitoring. A full channel
                    // only delays auto-stop; the recording itself is already
                    // safe in the buffer.
                    let chunk = AudioChunk::new(samples, TARGET_SAMPLE_RATE, Instant::now());
                    if chunks.try_send(chunk).is_err() {
                        tracing::warn!("Audio channel full, silence monitor chunk dropped");
                    }
                },
                |err| {
                    tracing::error!(error = %err, "Audio stream error");
                },
                None,
            )
            .map_err(|e| {
                MurmurError::DeviceUnavailable(format!("Failed to build audio stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            MurmurError::DeviceUnavailable(format!("Failed to start audio stream: {}", e))
        })?;

        if let Ok(mut guard) = self.stream.lock() {
            *guard = Some(SendStream(stream));
        }
        if let Ok(mut started) = self.started_at.lock() {
            *started = Some(Utc::now());
        }
        self.active.store(true, Ordering::SeqCst);
        info!(device = %device_name, "Microphone capture started");
        Ok(())
    }

    fn stop(&self) -> Result<RecordingBuffer> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Err(MurmurError::Session(
                "Audio capture is not active".to_string(),
            ));
        }

        // Dropping the stream releases the device.
        if let Ok(mut guard) = self.stream.lock() {
            *guard = None;
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

        info!(samples = samples.len(), "Microphone capture stopped");
        Ok(RecordingBuffer {
            samples,
            sample_rate: TARGET_SAMPLE_RATE,
            started_at,
        })
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}
