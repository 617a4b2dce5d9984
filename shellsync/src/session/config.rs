//! Session timeouts and tunables.
//!
//! Both types deserialize from any serde format; durations are given in
//! seconds (fractions allowed) and every field is optional.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::sync::DEFAULT_THRESHOLD;

/// Per-phase timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Per-expect wait during the login dialogue.
    #[serde(deserialize_with = "seconds")]
    pub login: Duration,

    /// Per-candidate wait while negotiating the prompt.
    #[serde(deserialize_with = "seconds")]
    pub negotiate: Duration,

    /// Default wait for the prompt after a command.
    #[serde(deserialize_with = "seconds")]
    pub command: Duration,

    /// Wait for the shell to exit on logout.
    #[serde(deserialize_with = "seconds")]
    pub logout: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            login: Duration::from_secs(10),
            negotiate: Duration::from_secs(10),
            command: Duration::from_secs(30),
            logout: Duration::from_secs(10),
        }
    }
}

/// Everything tunable about a session apart from where it connects.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub timeouts: Timeouts,

    /// Scales the synchronizer's quiescent-read timings. Raise for slow links.
    pub sync_multiplier: f64,

    /// Edit-distance ratio below which two probes count as the same prompt.
    pub sync_threshold: f64,

    /// Replace the shell prompt with a unique one after login.
    pub auto_prompt_reset: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            sync_multiplier: 1.0,
            sync_threshold: DEFAULT_THRESHOLD,
            auto_prompt_reset: true,
        }
    }
}

fn seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}
