//! Murmur application binary - composition root.
//!
//! Ties the crates together into a single executable:
//! 1. Parse CLI flags and overlay them on the TOML config
//! 2. Validate the config (activation spec, timing windows)
//! 3. Build the capture, dispatcher, and orchestrator
//! 4. Start the key-hook, gesture, and silence-monitor tasks
//! 5. Route signals to the orchestrator until Ctrl-C
//!
//! The OS-facing backends (microphone, key hook, clipboard/paste) sit
//! behind the `device`, `hooks`, and `os` features; without them the
//! binary runs against mocks, which is what CI builds exercise.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use murmur_audio::{Capture, SilenceMonitor};
use murmur_core::types::{AudioChunk, KeyEvent, Signal};
use murmur_core::MurmurConfig;
use murmur_gesture::GestureDetector;
use murmur_output::{ArtifactStore, Clipboard, OutputDispatcher, PasteInjector};
use murmur_session::{SessionOrchestrator, SessionState, TranscribeFn};

mod cli;
#[cfg(feature = "hooks")]
mod hooks;

fn build_capture(
    chunk_tx: tokio::sync::mpsc::Sender<AudioChunk>,
) -> Arc<dyn Capture> {
    #[cfg(feature = "device")]
    {
        Arc::new(murmur_audio::mic::MicCapture::new(chunk_tx))
    }
    #[cfg(not(feature = "device"))]
    {
        let _ = chunk_tx;
        tracing::warn!("Built without the `device` feature; using mock audio capture");
        Arc::new(murmur_audio::MockCapture::new())
    }
}

fn build_output_backends() -> (Arc<dyn Clipboard>, Arc<dyn PasteInjector>) {
    #[cfg(feature = "os")]
    {
        (
            Arc::new(murmur_output::os::SystemClipboard::new()),
            Arc::new(murmur_output::os::PasteChord::new()),
        )
    }
    #[cfg(not(feature = "os"))]
    {
        tracing::warn!("Built without the `os` feature; clipboard and paste are mocked");
        (
            Arc::new(murmur_output::MockClipboard::new()),
            Arc::new(murmur_output::MockPaste::new()),
        )
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();

    // The load happens before the subscriber exists, so its outcome is
    // reported again below where it is actually visible.
    let config_file = args.resolve_config_path();
    let loaded = MurmurConfig::load(&config_file);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => MurmurConfig::default(),
    };
    args.apply(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    info!("Starting Murmur v{}", env!("CARGO_PKG_VERSION"));
    match &loaded {
        Ok(_) => info!(path = %config_file.display(), "Configuration loaded"),
        Err(e) => warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
    }

    // Fail before any OS hook is installed if the config is unusable.
    let spec = config.validate()?;
    info!(activation = %spec, "Activation gesture");

    // === Channels ===
    // One bounded channel per event source so a slow consumer on one path
    // never delays the other.
    let (key_tx, mut key_rx) = tokio::sync::mpsc::channel::<KeyEvent>(256);
    let (chunk_tx, mut chunk_rx) = tokio::sync::mpsc::channel::<AudioChunk>(64);
    let (signal_tx, mut signal_rx) = tokio::sync::mpsc::channel::<Signal>(16);

    // === Components ===
    let capture = build_capture(chunk_tx);
    let (clipboard, paste) = build_output_backends();
    let dispatcher = Arc::new(OutputDispatcher::new(
        clipboard,
        paste,
        ArtifactStore::new(&config.output.dir),
        config.output.auto_paste,
        config.output.keep_files,
    ));

    // TODO: wire a whisper backend here; until then the pipeline reports
    // recording duration so every other component stays exercisable.
    let model = config.transcription.model.clone();
    let transcribe: TranscribeFn = Box::new(move |samples, sample_rate, _language| {
        let secs = samples.len() as f32 / sample_rate.max(1) as f32;
        Ok(format!("[{}: {:.1}s of audio]", model, secs))
    });

    let orchestrator = Arc::new(SessionOrchestrator::new(
        capture,
        dispatcher,
        transcribe,
        config.transcription.language.clone(),
        config.silence.auto_stop,
    ));

    // === Key-event source ===
    #[cfg(feature = "hooks")]
    hooks::spawn_key_listener(key_tx);
    #[cfg(not(feature = "hooks"))]
    {
        let _ = key_tx;
        tracing::warn!("Built without the `hooks` feature; no global key events will arrive");
    }

    // === Gesture recognition task ===
    let mut detector = GestureDetector::new(spec);
    let gesture_signals = signal_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = key_rx.recv().await {
            if let Some(signal) = detector.on_key_event(&event) {
                if gesture_signals.send(signal).await.is_err() {
                    break;
                }
            }
        }
    });

    // === Silence monitoring task ===
    let mut monitor = SilenceMonitor::new(config.silence.threshold_db, config.silence.duration());
    let silence_signals = signal_tx.clone();
    let orch = Arc::clone(&orchestrator);
    tokio::spawn(async move {
        // Reset the monitor at each session boundary so the loudness clock
        // starts from zero and never inherits a prior session's run.
        let mut last_session = None;
        while let Some(chunk) = chunk_rx.recv().await {
            if orch.current_state() != SessionState::Recording {
                continue;
            }
            let current = orch.current_session().map(|s| s.id);
            if current != last_session {
                monitor.reset();
                last_session = current;
            }
            if let Some(signal) = monitor.on_chunk(&chunk) {
                if silence_signals.send(signal).await.is_err() {
                    break;
                }
            }
        }
    });

    // === Signal loop ===
    info!("Ready - perform the activation gesture to start dictating");
    loop {
        tokio::select! {
            maybe_signal = signal_rx.recv() => match maybe_signal {
                Some(signal) => orchestrator.on_signal(signal),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                orchestrator.on_signal(Signal::Cancel);
                orchestrator.wait_for_idle().await;
                break;
            }
        }
    }

    Ok(())
}
