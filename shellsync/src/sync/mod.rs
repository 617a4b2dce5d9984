//! Prompt synchronization.
//!
//! After login the automation has no idea how much banner, MOTD or echoed
//! input is still in flight. The synchronizer presses enter a few times and
//! compares the answers: once the shell is sitting at a stable prompt, two
//! consecutive empty-line round trips come back nearly identical (the prompt
//! itself). While a banner is still scrolling past they differ substantially.

mod distance;
mod quiescent;

pub use distance::{levenshtein, levenshtein_within};
pub use quiescent::{QuietTimings, read_until_quiet};

use std::time::Duration;

use log::debug;

use crate::channel::ExpectEngine;
use crate::error::EngineError;

/// Default bound on `levenshtein(a, b) / len(a)` for two probes to count as aligned.
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Largest probe response, in bytes, that can still be judged a prompt.
pub const DEFAULT_MAX_SAMPLE: usize = 16 * 1024;

/// Whether two probe responses are close enough to count as the same prompt.
///
/// An empty first sample can never be judged aligned.
pub fn is_aligned(a: &[u8], b: &[u8], threshold: f64) -> bool {
    aligned_distance(a, b, threshold).is_some()
}

/// The distance between `a` and `b` if it is below `threshold × len(a)`.
fn aligned_distance(a: &[u8], b: &[u8], threshold: f64) -> Option<usize> {
    let bound = threshold * a.len() as f64;
    if a.is_empty() || !(bound > 0.0) {
        return None;
    }
    // Strictly below the bound.
    let limit = (bound.ceil() as usize).saturating_sub(1);
    levenshtein_within(a, b, limit)
}

/// What one synchronization attempt observed.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Response to the first counted probe.
    pub first: Vec<u8>,

    /// Response to the second counted probe.
    pub second: Vec<u8>,

    /// Edit distance between the two, when it was within the alignment bound.
    pub distance: Option<usize>,

    /// Whether the probes were judged aligned.
    pub aligned: bool,
}

/// Tunables for [`Synchronizer`].
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Scales all quiescent-read timings.
    pub multiplier: f64,

    /// Alignment threshold, see [`is_aligned`].
    pub threshold: f64,

    /// Pause after the first empty line before draining.
    pub settle: Duration,

    /// Samples longer than this are never aligned and are not compared.
    pub max_sample: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            threshold: DEFAULT_THRESHOLD,
            settle: Duration::from_millis(100),
            max_sample: DEFAULT_MAX_SAMPLE,
        }
    }
}

/// Decides whether the read position is aligned with the remote prompt.
#[derive(Debug, Clone, Default)]
pub struct Synchronizer {
    config: SyncConfig,
}

impl Synchronizer {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    /// Probe the shell and report whether it sits at a stable prompt.
    ///
    /// Worst case this takes three quiescent reads, i.e. `9 s × multiplier`.
    pub async fn synchronize<E: ExpectEngine>(&self, engine: &mut E) -> Result<bool, EngineError> {
        Ok(self.probe(engine).await?.aligned)
    }

    /// Like [`synchronize`](Self::synchronize), returning the raw samples.
    pub async fn probe<E: ExpectEngine>(&self, engine: &mut E) -> Result<SyncReport, EngineError> {
        let timings = QuietTimings::from_multiplier(self.config.multiplier);

        engine.send_line("").await?;
        if !self.config.settle.is_zero() {
            tokio::time::sleep(self.config.settle).await;
        }
        // Whatever is buffered so far is stale.
        let stale = read_until_quiet(engine, &timings).await?;

        engine.send_line("").await?;
        let first = read_until_quiet(engine, &timings).await?;

        engine.send_line("").await?;
        let second = read_until_quiet(engine, &timings).await?;

        let oversized = first.len().max(second.len()) > self.config.max_sample;
        let distance = if oversized {
            None
        } else {
            aligned_distance(&first, &second, self.config.threshold)
        };
        let aligned = distance.is_some();
        debug!(
            "synchronize: drained {} bytes, samples {}/{} bytes, distance {:?}, aligned={}",
            stale.len(),
            first.len(),
            second.len(),
            distance,
            aligned
        );

        Ok(SyncReport {
            first,
            second,
            distance,
            aligned,
        })
    }
}
