use std::time::Duration;

use runwatch_model::{FetchError, ModelError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("registry io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry encoding error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("registry backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    InvalidOptions(#[from] ModelError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Why a tracked run produced no terminal snapshot.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("run did not finish within {elapsed:?}")]
    TimedOut { elapsed: Duration },

    #[error("status fetch failed: {0}")]
    Errored(#[source] FetchError),

    #[error("tracking cancelled")]
    Cancelled,

    #[error("event stream closed before a terminal event")]
    Closed,

    #[error(transparent)]
    Core(#[from] CoreError),
}
