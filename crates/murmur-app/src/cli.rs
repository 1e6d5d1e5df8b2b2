//! CLI argument definitions for the Murmur application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use murmur_core::MurmurConfig;

/// Murmur — push-to-talk dictation: gesture in, transcription out.
#[derive(Parser, Debug)]
#[command(name = "murmur", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Activation spec: `double-tap:<key>` or `chord:<key>+<key>[+...]`.
    #[arg(short = 'a', long = "activation")]
    pub activation: Option<String>,

    /// Maximum time between taps for double-tap mode, in milliseconds.
    #[arg(long = "tap-window-ms")]
    pub tap_window_ms: Option<u64>,

    /// Loudness floor in dB below which audio counts as silence.
    #[arg(long = "silence-threshold", allow_negative_numbers = true)]
    pub silence_threshold: Option<f32>,

    /// Seconds of sustained silence before the recording auto-stops.
    #[arg(long = "silence-duration")]
    pub silence_duration: Option<f32>,

    /// Disable auto-stop; recording ends only on the stop gesture.
    #[arg(long = "no-auto-stop")]
    pub no_auto_stop: bool,

    /// Copy to the clipboard only; do not send the paste chord.
    #[arg(long = "no-paste")]
    pub no_paste: bool,

    /// Keep audio and text artifacts after dispatch.
    #[arg(long = "keep-files")]
    pub keep_files: bool,

    /// Directory for per-session artifacts.
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Language hint for transcription: ISO code or "auto".
    #[arg(long = "language")]
    pub language: Option<String>,

    /// Transcription model size name.
    #[arg(long = "model")]
    pub model: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > MURMUR_CONFIG env var > ~/.murmur/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("MURMUR_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Overlay the flags onto a loaded configuration.
    ///
    /// Only flags the user actually passed override file values; boolean
    /// toggles are one-directional (the file enables, the flag disables).
    pub fn apply(&self, config: &mut MurmurConfig) {
        if let Some(ref activation) = self.activation {
            config.gesture.activation = activation.clone();
        }
        if let Some(window) = self.tap_window_ms {
            config.gesture.tap_window_ms = window;
        }
        if let Some(threshold) = self.silence_threshold {
            config.silence.threshold_db = threshold;
        }
        if let Some(duration) = self.silence_duration {
            config.silence.duration_secs = duration;
        }
        if self.no_auto_stop {
            config.silence.auto_stop = false;
        }
        if self.no_paste {
            config.output.auto_paste = false;
        }
        if self.keep_files {
            config.output.keep_files = true;
        }
        if let Some(ref dir) = self.output_dir {
            config.output.dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref language) = self.language {
            config.transcription.language = language.clone();
        }
        if let Some(ref model) = self.model {
            config.transcription.model = model.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".murmur").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".murmur").join("config.toml");
    }
    PathBuf::from("config.toml")
}
