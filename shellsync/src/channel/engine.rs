//! The narrow expect-engine interface the session layer is written against.

use std::future::Future;
use std::time::Duration;

use regex::bytes::Regex;

use super::stream::ReadOutcome;
use crate::error::EngineError;
use crate::transport::SpawnCommand;

/// Result of an [`ExpectEngine::expect`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectOutcome {
    /// The pattern at this index of the list matched.
    Matched(usize),

    /// No pattern matched before the deadline.
    Timeout,

    /// The stream closed before any pattern matched.
    Eof,
}

/// An interactive child process that can be written to and matched against.
pub trait ExpectEngine: Send {
    /// Write `text` followed by a line terminator.
    fn send_line(&mut self, text: &str) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Block until one of `patterns` matches, `timeout` elapses, or the stream closes.
    ///
    /// After the call [`before`](Self::before) holds the text that preceded
    /// the match, or everything that was pending on timeout/EOF.
    fn expect(
        &mut self,
        patterns: &[Regex],
        timeout: Duration,
    ) -> impl Future<Output = Result<ExpectOutcome, EngineError>> + Send;

    /// Read up to `max_size` bytes, waiting at most `timeout`.
    fn read_nonblocking(
        &mut self,
        max_size: usize,
        timeout: Duration,
    ) -> impl Future<Output = Result<ReadOutcome, EngineError>> + Send;

    /// Text captured by the last `expect` call.
    fn before(&self) -> &[u8];

    /// Release the child process.
    fn close(&mut self) -> impl Future<Output = Result<(), EngineError>> + Send;
}

/// Starts child processes for a session.
pub trait Spawner: Send {
    /// Engine type produced by this spawner.
    type Engine: ExpectEngine;

    /// Start `command`, failing with [`EngineError::Spawn`] if it cannot run.
    fn spawn(&mut self, command: &SpawnCommand) -> Result<Self::Engine, EngineError>;
}
