use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed status query.
///
/// Produced by the fetcher from structured transport data (HTTP status, decode
/// failure, connection error), never from message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchErrorKind {
    /// The run is not visible yet; creation and status visibility are not atomic on the engine side.
    NotFound,
    /// Connection, DNS or request timeout.
    Network,
    /// The engine answered with an error status.
    Server,
    /// The response could not be decoded into a snapshot.
    Malformed,
    /// The poll task itself failed, e.g. a panicking fetcher or observer.
    Internal,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::NotFound => "not_found",
            FetchErrorKind::Network => "network",
            FetchErrorKind::Server => "server",
            FetchErrorKind::Malformed => "malformed",
            FetchErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::NotFound, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Server, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Malformed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Internal, message)
    }

    /// Only `NotFound` is retried by the poll loop.
    #[inline]
    pub fn is_transient(&self) -> bool {
        self.kind == FetchErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_found_is_transient() {
        assert!(FetchError::not_found("run-1").is_transient());
        assert!(!FetchError::network("refused").is_transient());
        assert!(!FetchError::server("502").is_transient());
        assert!(!FetchError::malformed("bad json").is_transient());
        assert!(!FetchError::internal("task panicked").is_transient());
    }

    #[test]
    fn display_includes_kind() {
        let err = FetchError::server("status 503");
        assert_eq!(err.to_string(), "server: status 503");
    }
}
