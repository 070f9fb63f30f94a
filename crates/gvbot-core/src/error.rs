use thiserror::Error;

/// Top-level error type for the GvBot system.
///
/// Subsystem crates define their own error types and convert into this one
/// at the boundary so that the `?` operator works across crates.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GvBotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Relay error: {0}")]
    Relay(String),

    #[error("Knowledge index error: {0}")]
    Knowledge(String),

    #[error("Voice error: {0}")]
    Voice(String),

    #[error("Signal source error: {0}")]
    Signal(String),

    #[error("History error: {0}")]
    History(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for GvBotError {
    fn from(err: toml::de::Error) -> Self {
        GvBotError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GvBotError {
    fn from(err: toml::ser::Error) -> Self {
        GvBotError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for GvBotError {
    fn from(err: serde_json::Error) -> Self {
        GvBotError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for GvBot operations.
pub type Result<T> = std::result::Result<T, GvBotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GvBotError::Config("missing endpoint".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing endpoint");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GvBotError = io_err.into();
        assert!(matches!(err, GvBotError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let err: GvBotError = parsed.unwrap_err().into();
        assert!(matches!(err, GvBotError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ not json }";
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        let err: GvBotError = parsed.unwrap_err().into();
        assert!(matches!(err, GvBotError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(7);
            let _value = io_result?;
            Ok("ok".to_string())
        }
        assert_eq!(inner().unwrap(), "ok");
    }

    #[test]
    fn test_error_variants_display_prefixes() {
        let cases: Vec<(GvBotError, &str)> = vec![
            (GvBotError::Relay("timeout".into()), "Relay error: timeout"),
            (
                GvBotError::Knowledge("bad index".into()),
                "Knowledge index error: bad index",
            ),
            (GvBotError::Voice("no voices".into()), "Voice error: no voices"),
            (
                GvBotError::Signal("all sources failed".into()),
                "Signal source error: all sources failed",
            ),
            (
                GvBotError::History("corrupt file".into()),
                "History error: corrupt file",
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }
}
