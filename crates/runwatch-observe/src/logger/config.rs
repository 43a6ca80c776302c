use serde::Deserialize;

use crate::logger::{ENV_LOG_FORMAT, ENV_LOG_LEVEL, error::LoggerError, format::LoggerFormat};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `runwatch_core=debug,info`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || atty::is(atty::Stream::Stdout);
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color,
        }
    }
}

impl LoggerConfig {
    /// Defaults overridden by `RUNWATCH_LOG` and `RUNWATCH_LOG_FORMAT` when set.
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggerError> {
        let mut cfg = Self::default();
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            cfg.level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            cfg.format = format.parse()?;
        }
        if cfg.format == LoggerFormat::Json {
            cfg.use_color = false;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let cfg: LoggerConfig = serde_json::from_str(r#"{"format":"json"}"#).unwrap();
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert_eq!(cfg.level, "info");
        assert!(cfg.with_targets);
    }

    #[test]
    fn env_overrides_level_and_format() {
        let cfg = LoggerConfig::from_lookup(|name| match name {
            ENV_LOG_LEVEL => Some("runwatch_core=debug".into()),
            ENV_LOG_FORMAT => Some("JSON".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.level, "runwatch_core=debug");
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert!(!cfg.use_color);
    }

    #[test]
    fn blank_level_keeps_default() {
        let cfg = LoggerConfig::from_lookup(|name| (name == ENV_LOG_LEVEL).then(|| " ".into())).unwrap();
        assert_eq!(cfg.level, "info");
        assert_eq!(cfg.format, LoggerFormat::Text);
    }

    #[test]
    fn bad_format_is_an_error() {
        let res = LoggerConfig::from_lookup(|name| (name == ENV_LOG_FORMAT).then(|| "xml".into()));
        assert!(matches!(res, Err(LoggerError::InvalidFormat(_))));
    }
}
