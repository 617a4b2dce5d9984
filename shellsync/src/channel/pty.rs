//! PTY-backed child processes.
//!
//! The child runs on the slave side of a pseudo-terminal so that programs
//! like `ssh` and `telnet` talk to it exactly as they would to a user. The
//! master side is blocking, so a dedicated reader thread forwards output to
//! the async side over a channel and writes run on the blocking pool.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize};
use tokio::sync::mpsc;

use super::engine::Spawner;
use super::expect::{Channel, ChannelConfig};
use super::stream::{ByteStream, ReadOutcome};
use crate::error::EngineError;
use crate::transport::SpawnCommand;

/// Configuration for spawned PTYs.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Terminal width.
    pub terminal_width: u16,

    /// Terminal height.
    pub terminal_height: u16,

    /// Channel settings for the resulting engine.
    pub channel: ChannelConfig,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            terminal_width: 511,
            terminal_height: 24,
            channel: ChannelConfig::default(),
        }
    }
}

/// A program running inside a PTY.
pub struct PtyStream {
    // Held so the PTY stays open for the child.
    _master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    output: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl PtyStream {
    /// Spawn `command` in a fresh PTY.
    pub fn spawn(command: &SpawnCommand, config: &PtyConfig) -> Result<Self, EngineError> {
        let spawn_error = |message: String| EngineError::Spawn {
            command: command.to_string(),
            message,
        };

        let pair = portable_pty::native_pty_system()
            .openpty(PtySize {
                rows: config.terminal_height,
                cols: config.terminal_width,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| spawn_error(e.to_string()))?;

        let mut builder = CommandBuilder::new(&command.program);
        builder.args(&command.args);

        let child = pair
            .slave
            .spawn_command(builder)
            .map_err(|e| spawn_error(e.to_string()))?;
        // Only the child holds the slave side, so its exit shows up as EOF.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| spawn_error(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| spawn_error(e.to_string()))?;

        debug!("pty: spawned {}", command);

        Ok(Self {
            _master: pair.master,
            child,
            writer: Arc::new(Mutex::new(writer)),
            output: spawn_reader(reader),
        })
    }

    /// Check if the child process is still running.
    pub fn is_running(&mut self) -> bool {
        self.child.try_wait().ok().flatten().is_none()
    }
}

/// Forward everything the PTY produces until EOF or the receiver goes away.
fn spawn_reader(mut reader: Box<dyn Read + Send>) -> mpsc::UnboundedReceiver<Vec<u8>> {
    let (tx, rx) = mpsc::unbounded_channel();

    thread::spawn(move || {
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
                // EIO is how Linux reports a hung-up slave.
                Err(_) => break,
            }
        }
    });

    rx
}

impl ByteStream for PtyStream {
    async fn write_all(&mut self, data: &[u8]) -> Result<(), EngineError> {
        let writer = Arc::clone(&self.writer);
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut writer = writer
                .lock()
                .map_err(|_| io::Error::other("pty writer lock poisoned"))?;
            writer.write_all(&data)?;
            writer.flush()
        })
        .await
        .map_err(io::Error::other)??;
        Ok(())
    }

    async fn read_chunk(&mut self, timeout: Duration) -> Result<ReadOutcome, EngineError> {
        match tokio::time::timeout(timeout, self.output.recv()).await {
            Err(_) => Ok(ReadOutcome::Timeout),
            Ok(Some(chunk)) => Ok(ReadOutcome::Data(chunk)),
            Ok(None) => Ok(ReadOutcome::Eof),
        }
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.output.close();
        if self.is_running() {
            if let Err(e) = self.child.kill() {
                warn!("pty: failed to kill child: {}", e);
            }
        }
        Ok(())
    }
}

/// [`Spawner`] that runs commands in a local PTY.
#[derive(Debug, Clone, Default)]
pub struct PtySpawner {
    config: PtyConfig,
}

impl PtySpawner {
    pub fn new(config: PtyConfig) -> Self {
        Self { config }
    }
}

impl Spawner for PtySpawner {
    type Engine = Channel<PtyStream>;

    fn spawn(&mut self, command: &SpawnCommand) -> Result<Self::Engine, EngineError> {
        let stream = PtyStream::spawn(command, &self.config)?;
        Ok(Channel::with_config(stream, self.config.channel.clone()))
    }
}
