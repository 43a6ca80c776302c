use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?}, expected one of text, json, journald")]
    InvalidFormat(String),
    /// Requested `journald` on a non-Linux target or without the `journald` feature.
    #[error("journald output is not available in this build")]
    JournaldNotSupported,
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
    #[error("cannot install tracing subscriber: {0}")]
    InitializationFailed(String),
    #[error("invalid log filter directive {0:?}")]
    InvalidLogLevel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = LoggerError::InvalidFormat("xml".into());
        assert!(err.to_string().contains("\"xml\""));
        let err = LoggerError::InvalidLogLevel("runwatch=loud".into());
        assert!(err.to_string().contains("runwatch=loud"));
    }
}
