use thiserror::Error;

/// Top-level error type for the Murmur system.
///
/// Subsystem crates return this type directly so the `?` operator works
/// across crate boundaries. Variants mirror the failure taxonomy of the
/// dictation pipeline: device and permission failures are fatal to a
/// session (or to startup), engine and output failures are reported and
/// recovered.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MurmurError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Transcription engine error: {0}")]
    Engine(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Paste injection error: {0}")]
    Injection(String),

    #[error("Recording too short to transcribe")]
    EmptyRecording,

    #[error("Session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for MurmurError {
    fn from(err: toml::de::Error) -> Self {
        MurmurError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MurmurError {
    fn from(err: toml::ser::Error) -> Self {
        MurmurError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Murmur operations.
pub type Result<T> = std::result::Result<T, MurmurError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MurmurError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_empty_recording_display() {
        assert_eq!(
            MurmurError::EmptyRecording.to_string(),
            "Recording too short to transcribe"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MurmurError = io_err.into();
        assert!(matches!(err, MurmurError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let err: MurmurError = parsed.unwrap_err().into();
        assert!(matches!(err, MurmurError::Config(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }

    #[test]
    fn test_error_variants_constructible() {
        let errors: Vec<MurmurError> = vec![
            MurmurError::Config("test".into()),
            MurmurError::DeviceUnavailable("no mic".into()),
            MurmurError::PermissionDenied("accessibility".into()),
            MurmurError::Engine("model crashed".into()),
            MurmurError::Clipboard("denied".into()),
            MurmurError::Injection("no focus".into()),
            MurmurError::EmptyRecording,
            MurmurError::Session("bad transition".into()),
        ];
        assert_eq!(errors.len(), 8);
    }
}
