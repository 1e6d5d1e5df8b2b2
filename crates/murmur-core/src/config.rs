use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MurmurError, Result};
use crate::types::ActivationSpec;

/// Top-level configuration for the Murmur dictation pipeline.
///
/// Loaded from `~/.murmur/config.toml` by default. Immutable per run:
/// loaded once at startup, validated, then shared read-only by every
/// component. CLI flags override file values which override defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MurmurConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub silence: SilenceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

impl Default for MurmurConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            gesture: GestureConfig::default(),
            silence: SilenceConfig::default(),
            output: OutputConfig::default(),
            transcription: TranscriptionConfig::default(),
        }
    }
}

impl MurmurConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MurmurConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MurmurError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Validate the configuration, returning the parsed activation spec.
    ///
    /// Rejects malformed activation strings, non-positive timing windows,
    /// and nonsensical silence settings. Called once at startup so a bad
    /// config fails before any OS hook is installed.
    pub fn validate(&self) -> Result<ActivationSpec> {
        if self.gesture.tap_window_ms == 0 {
            return Err(MurmurError::Config(
                "gesture.tap_window_ms must be greater than zero".to_string(),
            ));
        }
        if self.silence.duration_secs <= 0.0 {
            return Err(MurmurError::Config(
                "silence.duration_secs must be greater than zero".to_string(),
            ));
        }
        ActivationSpec::parse(&self.gesture.activation, self.gesture.tap_window())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Activation gesture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Activation spec: `double-tap:<key>` or `chord:<key>+<key>[+...]`.
    pub activation: String,
    /// Maximum time between taps for double-tap mode, in milliseconds.
    pub tap_window_ms: u64,
}

impl GestureConfig {
    pub fn tap_window(&self) -> Duration {
        Duration::from_millis(self.tap_window_ms)
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            activation: "double-tap:meta_right".to_string(),
            tap_window_ms: 300,
        }
    }
}

/// Silence detection (auto-stop) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceConfig {
    /// Loudness floor in dB below which audio counts as silence.
    pub threshold_db: f32,
    /// How long loudness must stay under the floor before auto-stop.
    pub duration_secs: f32,
    /// Whether recording stops automatically after sustained silence.
    pub auto_stop: bool,
}

impl SilenceConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.duration_secs.max(0.0))
    }
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            duration_secs: 2.0,
            auto_stop: true,
        }
    }
}

/// Output and retention configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Paste the transcription into the active application after copying.
    pub auto_paste: bool,
    /// Keep audio and text artifacts after dispatch.
    pub keep_files: bool,
    /// Directory for per-session audio and text artifacts.
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            auto_paste: true,
            keep_files: false,
            dir: "recordings".to_string(),
        }
    }
}

/// Transcription engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Language hint: ISO code or "auto".
    pub language: String,
    /// Model size name passed to the engine.
    pub model: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            model: "small".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyId;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = MurmurConfig::default();
        assert_eq!(config.gesture.activation, "double-tap:meta_right");
        assert_eq!(config.gesture.tap_window_ms, 300);
        assert!((config.silence.threshold_db + 40.0).abs() < f32::EPSILON);
        assert!((config.silence.duration_secs - 2.0).abs() < f32::EPSILON);
        assert!(config.silence.auto_stop);
        assert!(config.output.auto_paste);
        assert!(!config.output.keep_files);
        assert_eq!(config.output.dir, "recordings");
        assert_eq!(config.transcription.language, "auto");
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_default_config_validates() {
        // Defaults must make the system usable with zero flags.
        let spec = MurmurConfig::default().validate().unwrap();
        assert_eq!(
            spec,
            ActivationSpec::DoubleTap {
                key: KeyId::MetaRight,
                tap_window: Duration::from_millis(300),
            }
        );
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[gesture]
activation = "chord:ctrl+shift+r"
tap_window_ms = 450

[silence]
threshold_db = -35.0
duration_secs = 1.5
auto_stop = false

[output]
auto_paste = false
keep_files = true
dir = "/tmp/dictation"

[transcription]
language = "en"
model = "base"
"#;
        let file = create_temp_config(content);
        let config = MurmurConfig::load(file.path()).unwrap();
        assert_eq!(config.gesture.activation, "chord:ctrl+shift+r");
        assert_eq!(config.gesture.tap_window_ms, 450);
        assert!((config.silence.threshold_db + 35.0).abs() < f32::EPSILON);
        assert!(!config.silence.auto_stop);
        assert!(!config.output.auto_paste);
        assert!(config.output.keep_files);
        assert_eq!(config.transcription.language, "en");

        let spec = config.validate().unwrap();
        assert!(matches!(spec, ActivationSpec::Chord { .. }));
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[silence]
threshold_db = -50.0
"#;
        let file = create_temp_config(content);
        let config = MurmurConfig::load(file.path()).unwrap();
        assert!((config.silence.threshold_db + 50.0).abs() < f32::EPSILON);
        assert!((config.silence.duration_secs - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.gesture.activation, "double-tap:meta_right");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = MurmurConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.gesture.activation, "double-tap:meta_right");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(MurmurConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let config = MurmurConfig::default();
        config.save(&path).unwrap();
        assert!(path.exists());

        let reloaded = MurmurConfig::load(&path).unwrap();
        assert_eq!(reloaded.gesture.activation, config.gesture.activation);
        assert_eq!(reloaded.output.dir, config.output.dir);
    }

    #[test]
    fn test_validate_rejects_bad_activation() {
        let mut config = MurmurConfig::default();
        config.gesture.activation = "double-tap:ctrl+r".to_string();
        assert!(config.validate().is_err());

        config.gesture.activation = "wave-hands".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_tap_window() {
        let mut config = MurmurConfig::default();
        config.gesture.tap_window_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_silence_duration() {
        let mut config = MurmurConfig::default();
        config.silence.duration_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serialization_round_trip() {
        let config = MurmurConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let deserialized: MurmurConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.gesture.tap_window_ms, config.gesture.tap_window_ms);
        assert_eq!(deserialized.silence.auto_stop, config.silence.auto_stop);
    }

    #[test]
    fn test_silence_duration_helper() {
        let config = SilenceConfig {
            threshold_db: -40.0,
            duration_secs: 2.5,
            auto_stop: true,
        };
        assert_eq!(config.duration(), Duration::from_millis(2500));
    }
}
