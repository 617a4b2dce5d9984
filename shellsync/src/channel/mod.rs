//! Channel layer: the expect engine sessions are driven through.
//!
//! This module handles spawning the child process, pattern-based reads with
//! deadlines, and ANSI stripping.

mod buffer;
mod engine;
mod expect;
mod patterns;
mod pty;
mod stream;

pub use buffer::PatternBuffer;
pub use engine::{ExpectEngine, ExpectOutcome, Spawner};
pub use expect::{Channel, ChannelConfig};
pub use patterns::{PatternMatch, compile_insensitive, first_match};
pub use pty::{PtyConfig, PtySpawner, PtyStream};
pub use stream::{ByteStream, IoStream, ReadOutcome};

#[cfg(test)]
pub(crate) mod scripted;
