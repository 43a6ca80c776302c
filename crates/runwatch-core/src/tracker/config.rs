use runwatch_model::{ModelError, TrackOptions};

pub const DEFAULT_NAMESPACE: &str = "runwatch/";
/// Terminates every namespace, so `team/` never matches keys of `team2/`.
pub const NAMESPACE_SEPARATOR: char = '/';

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Prefix of every registry key written by this tracker. Must be non-empty
    /// and end with [`NAMESPACE_SEPARATOR`].
    ///
    /// Trackers sharing one registry must use distinct, non-nested namespaces.
    pub namespace: String,
    /// Options used by [`Tracker::track_default`](super::Tracker::track_default) and [`Tracker::resume`](super::Tracker::resume).
    pub defaults: TrackOptions,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            defaults: TrackOptions::default(),
        }
    }
}

impl TrackerConfig {
    /// Appends the separator when `namespace` lacks it.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let mut namespace = namespace.into();
        if !namespace.is_empty() && !namespace.ends_with(NAMESPACE_SEPARATOR) {
            namespace.push(NAMESPACE_SEPARATOR);
        }
        self.namespace = namespace;
        self
    }

    pub fn with_defaults(mut self, defaults: TrackOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.namespace.trim_end_matches(NAMESPACE_SEPARATOR).trim().is_empty() {
            return Err(ModelError::InvalidOptions(
                "namespace must not be empty".to_string(),
            ));
        }
        if !self.namespace.ends_with(NAMESPACE_SEPARATOR) {
            return Err(ModelError::InvalidOptions(format!(
                "namespace {:?} must end with {NAMESPACE_SEPARATOR:?}",
                self.namespace
            )));
        }
        self.defaults.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(TrackerConfig::default().validate().is_ok());
    }

    #[test]
    fn separator_is_appended() {
        let cfg = TrackerConfig::default().with_namespace("team");
        assert_eq!(cfg.namespace, "team/");
        assert!(cfg.validate().is_ok());

        let cfg = TrackerConfig::default().with_namespace("team/");
        assert_eq!(cfg.namespace, "team/");
    }

    #[test]
    fn empty_namespace_is_rejected() {
        for ns in ["", "/", " /"] {
            let cfg = TrackerConfig::default().with_namespace(ns);
            assert!(cfg.validate().is_err(), "{ns:?} accepted");
        }
    }

    #[test]
    fn namespace_without_separator_is_rejected() {
        let cfg = TrackerConfig {
            namespace: "team".to_string(),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ModelError::InvalidOptions(_))));
    }
}
