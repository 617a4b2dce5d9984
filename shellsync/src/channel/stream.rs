//! Raw byte streams the expect engine runs on.

use std::future::Future;
use std::io;
use std::time::Duration;

use log::trace;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::EngineError;

/// Outcome of a bounded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes arrived before the deadline.
    Data(Vec<u8>),

    /// Nothing arrived in time. This is not an error.
    Timeout,

    /// The stream is closed.
    Eof,
}

/// A bidirectional byte stream to a child process or remote peer.
pub trait ByteStream: Send {
    /// Write all of `data` and flush it.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Read whatever is available, waiting at most `timeout` for the first byte.
    fn read_chunk(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<ReadOutcome, EngineError>> + Send;

    /// Release the stream.
    fn close(&mut self) -> impl Future<Output = Result<(), EngineError>> + Send;
}

/// [`ByteStream`] over any tokio reader/writer (TCP sockets, duplex pipes).
#[derive(Debug)]
pub struct IoStream<T> {
    io: T,
    chunk_size: usize,
}

impl<T> IoStream<T> {
    /// Wrap `io`, reading at most 4096 bytes per chunk.
    pub fn new(io: T) -> Self {
        Self::with_chunk_size(io, 4096)
    }

    pub fn with_chunk_size(io: T, chunk_size: usize) -> Self {
        Self {
            io,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<T> ByteStream for IoStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, data: &[u8]) -> Result<(), EngineError> {
        self.io.write_all(data).await?;
        self.io.flush().await?;
        Ok(())
    }

    async fn read_chunk(&mut self, timeout: Duration) -> Result<ReadOutcome, EngineError> {
        let mut chunk = vec![0u8; self.chunk_size];
        match tokio::time::timeout(timeout, self.io.read(&mut chunk)).await {
            Err(_) => Ok(ReadOutcome::Timeout),
            Ok(Ok(0)) => Ok(ReadOutcome::Eof),
            Ok(Ok(n)) => {
                chunk.truncate(n);
                trace!("io stream: read {} bytes", n);
                Ok(ReadOutcome::Data(chunk))
            }
            Ok(Err(e)) => Err(e.into()),
        }
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        match self.io.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
