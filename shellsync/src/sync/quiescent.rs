//! Timed reads that stop once the stream goes quiet.

use std::time::Duration;

use log::trace;
use tokio::time::Instant;

use crate::channel::{ExpectEngine, ReadOutcome};
use crate::error::EngineError;

/// Bytes requested per read.
const READ_SIZE: usize = 2000;

/// Timing bounds for [`read_until_quiet`], all scaled by one multiplier.
///
/// Fast connections finish almost immediately; the worst case is
/// `total` per call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuietTimings {
    /// Maximum wait for the first byte.
    pub first_char: Duration,

    /// Maximum gap between subsequent bytes.
    pub inter_char: Duration,

    /// Maximum time for the whole read.
    pub total: Duration,
}

impl QuietTimings {
    /// `0.5 s`, `0.1 s` and `3.0 s`, each times `multiplier`.
    pub fn from_multiplier(multiplier: f64) -> Self {
        let multiplier = if multiplier.is_finite() {
            multiplier.max(0.0)
        } else {
            1.0
        };
        Self {
            first_char: Duration::from_secs_f64(0.5 * multiplier),
            inter_char: Duration::from_secs_f64(0.1 * multiplier),
            total: Duration::from_secs_f64(3.0 * multiplier),
        }
    }
}

impl Default for QuietTimings {
    fn default() -> Self {
        Self::from_multiplier(1.0)
    }
}

/// Accumulate output until a read times out or `timings.total` has elapsed.
///
/// A timeout is the normal way this ends and is never an error; EOF ends it
/// the same way. Returns whatever arrived, possibly nothing.
pub async fn read_until_quiet<E: ExpectEngine>(
    engine: &mut E,
    timings: &QuietTimings,
) -> Result<Vec<u8>, EngineError> {
    let begin = Instant::now();
    let mut collected = Vec::new();
    let mut timeout = timings.first_char;

    while begin.elapsed() < timings.total {
        match engine.read_nonblocking(READ_SIZE, timeout).await? {
            ReadOutcome::Data(data) => {
                collected.extend_from_slice(&data);
                timeout = timings.inter_char;
            }
            ReadOutcome::Timeout | ReadOutcome::Eof => break,
        }
    }

    trace!(
        "read_until_quiet: {} bytes in {:?}",
        collected.len(),
        begin.elapsed()
    );
    Ok(collected)
}
