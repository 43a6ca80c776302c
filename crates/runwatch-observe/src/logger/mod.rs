//! Global `tracing` subscriber setup.
//!
//! Call [`logger_init`] (or [`logger_init_from_env`]) once, early in `main`.
//! A second call returns [`LoggerError::AlreadyInitialized`].

mod config;
mod error;
mod format;
mod log;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Filter directive, e.g. `info` or `runwatch_core=debug,info`.
pub const ENV_LOG_LEVEL: &str = "RUNWATCH_LOG";
/// `text`, `json` or `journald`.
pub const ENV_LOG_FORMAT: &str = "RUNWATCH_LOG_FORMAT";

pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    log::install(cfg)
}

/// [`LoggerConfig::from_env`] followed by [`logger_init`].
pub fn logger_init_from_env() -> Result<LoggerConfig, LoggerError> {
    let cfg = LoggerConfig::from_env()?;
    logger_init(&cfg)?;
    Ok(cfg)
}
