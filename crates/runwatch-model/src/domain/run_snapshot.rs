use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{RunId, RunState};

/// Result of one status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub run_id: RunId,
    pub state: RunState,
    /// Result, error or context data exactly as the engine returned it.
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(with = "time_serde")]
    pub observed_at: SystemTime,
}

impl RunSnapshot {
    pub fn new(run_id: RunId, state: RunState) -> Self {
        Self {
            run_id,
            state,
            payload: serde_json::Value::Null,
            observed_at: SystemTime::now(),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

mod time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let since_epoch = time
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;
        (since_epoch.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_millis(millis))
    }
}
