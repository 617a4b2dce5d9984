//! Expect loop over a [`ByteStream`].

use std::time::Duration;

use log::{debug, trace};
use regex::bytes::Regex;
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use super::engine::{ExpectEngine, ExpectOutcome};
use super::stream::{ByteStream, ReadOutcome};
use crate::error::EngineError;

/// Configuration for channel behavior.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Line terminator appended by `send_line`.
    pub line_ending: &'static str,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            line_ending: "\n",
        }
    }
}

/// Expect engine over a raw byte stream.
///
/// Output is accumulated in a [`PatternBuffer`]; every `expect` call computes
/// one monotonic deadline and re-tests all patterns after each chunk.
#[derive(Debug)]
pub struct Channel<S> {
    stream: S,
    buffer: PatternBuffer,
    before: Vec<u8>,
    config: ChannelConfig,
    eof: bool,
    closed: bool,
}

impl<S: ByteStream> Channel<S> {
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, ChannelConfig::default())
    }

    pub fn with_config(stream: S, config: ChannelConfig) -> Self {
        Self {
            stream,
            buffer: PatternBuffer::new(),
            before: Vec::new(),
            config,
            eof: false,
            closed: false,
        }
    }

    /// Get a reference to the pending (unmatched) output.
    pub fn buffer(&self) -> &PatternBuffer {
        &self.buffer
    }

    /// Whether the stream reported end of file.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.closed {
            Err(EngineError::Closed)
        } else {
            Ok(())
        }
    }
}

impl<S: ByteStream> ExpectEngine for Channel<S> {
    async fn send_line(&mut self, text: &str) -> Result<(), EngineError> {
        self.ensure_open()?;
        let mut line = Vec::with_capacity(text.len() + self.config.line_ending.len());
        line.extend_from_slice(text.as_bytes());
        line.extend_from_slice(self.config.line_ending.as_bytes());
        // Content is not logged: this carries passwords.
        trace!("send_line: {} bytes", line.len());
        self.stream.write_all(&line).await
    }

    async fn expect(
        &mut self,
        patterns: &[Regex],
        timeout: Duration,
    ) -> Result<ExpectOutcome, EngineError> {
        self.ensure_open()?;
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(m) = self.buffer.find_first(patterns) {
                self.before = self.buffer.consume_through(&m);
                trace!("expect: pattern {} matched at {}..{}", m.index, m.start, m.end);
                return Ok(ExpectOutcome::Matched(m.index));
            }

            if self.eof {
                self.before = self.buffer.take();
                debug!("expect: EOF with {} bytes pending", self.before.len());
                return Ok(ExpectOutcome::Eof);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                self.before = self.buffer.as_slice().to_vec();
                debug!("expect: timed out after {:?}", timeout);
                return Ok(ExpectOutcome::Timeout);
            }

            match self.stream.read_chunk(remaining).await? {
                ReadOutcome::Data(chunk) => self.buffer.extend(&chunk),
                ReadOutcome::Timeout => {}
                ReadOutcome::Eof => self.eof = true,
            }
        }
    }

    async fn read_nonblocking(
        &mut self,
        max_size: usize,
        timeout: Duration,
    ) -> Result<ReadOutcome, EngineError> {
        self.ensure_open()?;
        if !self.buffer.is_empty() {
            return Ok(ReadOutcome::Data(self.buffer.take_front(max_size)));
        }
        if self.eof {
            return Ok(ReadOutcome::Eof);
        }

        match self.stream.read_chunk(timeout).await? {
            ReadOutcome::Data(chunk) => {
                self.buffer.extend(&chunk);
                Ok(ReadOutcome::Data(self.buffer.take_front(max_size)))
            }
            ReadOutcome::Timeout => Ok(ReadOutcome::Timeout),
            ReadOutcome::Eof => {
                self.eof = true;
                Ok(ReadOutcome::Eof)
            }
        }
    }

    fn before(&self) -> &[u8] {
        &self.before
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.buffer.clear();
        self.stream.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::IoStream;

    fn regexes(patterns: &[&str]) -> Vec<Regex> {
        patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_expect_matches_across_chunks() {
        let mock = tokio_test::io::Builder::new()
            .read(b"Last login: today\r\nus")
            .read(b"er@host:~$ ")
            .build();
        let mut channel = Channel::new(IoStream::new(mock));

        let outcome = channel
            .expect(&regexes(&[r"[#$] "]), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(outcome, ExpectOutcome::Matched(0));
        assert_eq!(channel.before(), b"Last login: today\r\nuser@host:~");
    }

    #[tokio::test]
    async fn test_expect_reports_eof_with_pending_text() {
        let mock = tokio_test::io::Builder::new()
            .read(b"Connection to host closed.\r\n")
            .build();
        let mut channel = Channel::new(IoStream::new(mock));

        let outcome = channel
            .expect(&regexes(&["never"]), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(outcome, ExpectOutcome::Eof);
        assert_eq!(channel.before(), b"Connection to host closed.\r\n");
    }

    #[tokio::test]
    async fn test_expect_timeout_keeps_buffer() {
        let (client, mut server) = tokio::io::duplex(256);
        tokio::io::AsyncWriteExt::write_all(&mut server, b"partial")
            .await
            .unwrap();
        let mut channel = Channel::new(IoStream::new(client));

        let outcome = channel
            .expect(&regexes(&["prompt>"]), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(outcome, ExpectOutcome::Timeout);
        assert_eq!(channel.before(), b"partial");
        assert_eq!(channel.buffer().as_slice(), b"partial");
    }

    #[tokio::test]
    async fn test_send_line_appends_terminator() {
        let mock = tokio_test::io::Builder::new().write(b"uptime\n").build();
        let mut channel = Channel::new(IoStream::new(mock));
        channel.send_line("uptime").await.unwrap();
    }

    #[tokio::test]
    async fn test_read_nonblocking_serves_buffer_first() {
        let mock = tokio_test::io::Builder::new().read(b"abc$ def").build();
        let mut channel = Channel::new(IoStream::new(mock));
        channel
            .expect(&regexes(&[r"\$ "]), Duration::from_secs(1))
            .await
            .unwrap();

        let read = channel
            .read_nonblocking(2, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(read, ReadOutcome::Data(b"de".to_vec()));
        let read = channel
            .read_nonblocking(10, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(read, ReadOutcome::Data(b"f".to_vec()));
        let read = channel
            .read_nonblocking(10, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(read, ReadOutcome::Eof);
    }

    #[tokio::test]
    async fn test_closed_channel_rejects_io() {
        let (client, _server) = tokio::io::duplex(64);
        let mut channel = Channel::new(IoStream::new(client));
        channel.close().await.unwrap();
        assert!(matches!(
            channel.send_line("ls").await,
            Err(EngineError::Closed)
        ));
        channel.close().await.unwrap();
    }
}
