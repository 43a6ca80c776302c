use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

#[cfg(all(target_os = "linux", feature = "journald"))]
type JournalLayer = tracing_journald::Layer;
#[cfg(not(all(target_os = "linux", feature = "journald")))]
type JournalLayer = tracing_subscriber::layer::Identity;

/// Builds the layer stack for `cfg.format` and installs it globally.
///
/// Exactly one output layer is `Some`; the others are no-ops.
pub(super) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = parse_filter(&cfg.level)?;
    let timer = local_timer();

    let (text, json, journal) = match cfg.format {
        LoggerFormat::Text => {
            let layer = fmt::layer()
                .with_ansi(cfg.use_color)
                .with_target(cfg.with_targets)
                .with_timer(timer);
            (Some(layer), None, None)
        }
        LoggerFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(cfg.with_targets)
                .with_current_span(true)
                .with_span_list(false)
                .with_timer(timer);
            (None, Some(layer), None)
        }
        LoggerFormat::Journald => (None, None, Some(journal_layer()?)),
    };

    if tracing::dispatcher::has_been_set() {
        return Err(LoggerError::AlreadyInitialized);
    }
    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .with(journal)
        .try_init()
        .map_err(|e| LoggerError::InitializationFailed(e.to_string()))
}

fn parse_filter(directive: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(directive).map_err(|_| LoggerError::InvalidLogLevel(directive.to_string()))
}

/// RFC 3339 timestamps in the host's offset; UTC when the offset is unknown
/// (e.g. multi-threaded processes on some platforms).
fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journal_layer() -> Result<JournalLayer, LoggerError> {
    tracing_journald::layer()
        .map(|l| l.with_syslog_identifier("runwatch".to_string()))
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journal_layer() -> Result<JournalLayer, LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}
