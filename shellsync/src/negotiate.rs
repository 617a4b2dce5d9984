//! Unique prompt negotiation.
//!
//! Each candidate profile gets to send its set-prompt command; the first
//! whose unique prompt comes back is the shell we are talking to.

use std::time::Duration;

use log::{debug, info};

use crate::channel::{ExpectEngine, ExpectOutcome};
use crate::error::{Error, Result};
use crate::interpreter::{InterpreterProfile, ProfileSet};

/// Install a unique prompt, trying `candidates` in order.
///
/// Each attempt waits up to `timeout`. Once a candidate's prompt has been
/// seen the rest are not tried.
pub async fn negotiate<E: ExpectEngine>(
    engine: &mut E,
    candidates: &ProfileSet,
    timeout: Duration,
) -> Result<InterpreterProfile> {
    for profile in candidates.iter() {
        debug!("negotiate: trying {}", profile.kind);
        engine.send_line(&profile.set_prompt_cmd).await?;

        let patterns = std::slice::from_ref(&profile.unique_prompt);
        match engine.expect(patterns, timeout).await? {
            ExpectOutcome::Matched(_) => {
                info!("negotiated {} prompt", profile.kind);
                return Ok(profile.clone());
            }
            ExpectOutcome::Timeout => debug!("negotiate: {} prompt not seen", profile.kind),
            ExpectOutcome::Eof => {
                return Err(Error::connection("connection closed during prompt negotiation"));
            }
        }
    }

    Err(Error::synchronization(
        "could not set shell prompt: no interpreter profile matched",
    ))
}
