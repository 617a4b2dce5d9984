//! Session-scoped prompt tags.

use std::fmt;

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Improbable marker embedded in a unique prompt.
///
/// Each session generates its own tag so that two automated sessions whose
/// output ends up on the same screen never match each other's prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PromptTag(String);

impl PromptTag {
    /// Length of the random part of a generated tag.
    const RANDOM_LEN: usize = 8;

    /// Generate a fresh tag such as `SYNC-4f9QkZ2a`.
    pub fn generate() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::RANDOM_LEN)
            .map(char::from)
            .collect();
        Self(format!("SYNC-{}", suffix))
    }

    /// Use a caller-chosen tag, e.g. `SHELLSYNC` for a fixed, well-known prompt.
    pub fn fixed(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PromptTag {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for PromptTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
