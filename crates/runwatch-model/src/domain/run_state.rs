use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Status of a workflow run as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// Accepted by the engine, not started yet.
    Queued,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// The engine gave up on the run after its own deadline.
    TimedOut,
    /// The engine replaced this run with a retry.
    Retried,
    /// Any status this client does not recognise.
    #[serde(other)]
    Unknown,
}

impl RunState {
    /// Returns `true` while the run may still change state (queued or running).
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Queued | RunState::Running)
    }

    /// Returns `true` if polling should stop.
    ///
    /// Everything that is not active is terminal, including [`RunState::Unknown`]:
    /// an unrecognised status is handed back to the caller as-is instead of being retried.
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Queued => "QUEUED",
            RunState::Running => "RUNNING",
            RunState::Succeeded => "SUCCEEDED",
            RunState::Failed => "FAILED",
            RunState::TimedOut => "TIMED_OUT",
            RunState::Retried => "RETRIED",
            RunState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parser: case and `-`/`_` insensitive, unrecognised values map to [`RunState::Unknown`].
impl FromStr for RunState {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Ok(match norm.as_str() {
            "queued" | "pending" => RunState::Queued,
            "running" | "inprogress" => RunState::Running,
            "succeeded" | "success" | "completed" => RunState::Succeeded,
            "failed" | "failure" | "error" => RunState::Failed,
            "timedout" | "timeout" => RunState::TimedOut,
            "retried" => RunState::Retried,
            _ => RunState::Unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_queued_and_running_are_active() {
        assert!(RunState::Queued.is_active());
        assert!(RunState::Running.is_active());

        assert!(RunState::Succeeded.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert!(RunState::TimedOut.is_terminal());
        assert!(RunState::Retried.is_terminal());
        assert!(RunState::Unknown.is_terminal());
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&RunState::TimedOut).unwrap();
        assert_eq!(json, r#""TIMED_OUT""#);

        let back: RunState = serde_json::from_str(r#""RUNNING""#).unwrap();
        assert_eq!(back, RunState::Running);
    }

    #[test]
    fn unrecognised_status_decodes_to_unknown() {
        let state: RunState = serde_json::from_str(r#""PAUSED""#).unwrap();
        assert_eq!(state, RunState::Unknown);
    }

    #[test]
    fn from_str_is_lenient() {
        assert_eq!("succeeded".parse::<RunState>().unwrap(), RunState::Succeeded);
        assert_eq!("Timed_Out".parse::<RunState>().unwrap(), RunState::TimedOut);
        assert_eq!(" running ".parse::<RunState>().unwrap(), RunState::Running);
        assert_eq!("weird".parse::<RunState>().unwrap(), RunState::Unknown);
    }
}
