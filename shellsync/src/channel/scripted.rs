//! Scripted engine for unit tests: replays canned outcomes and records input.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use regex::bytes::Regex;

use super::engine::{ExpectEngine, ExpectOutcome, Spawner};
use super::stream::ReadOutcome;
use crate::error::EngineError;
use crate::transport::SpawnCommand;

#[derive(Debug, Default)]
pub(crate) struct ScriptState {
    expects: VecDeque<(ExpectOutcome, Vec<u8>)>,
    reads: VecDeque<ReadOutcome>,
    /// Lines written via `send_line`, in order.
    pub sent: Vec<String>,
    /// Pattern lists passed to each `expect` call.
    pub patterns: Vec<Vec<String>>,
    /// Commands passed to the spawner.
    pub spawned: Vec<String>,
    pub closed: bool,
}

/// Shared handle onto a scripted engine's state.
#[derive(Debug, Clone, Default)]
pub(crate) struct Script {
    state: Arc<Mutex<ScriptState>>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap()
    }

    /// Queue an expect outcome with the text that preceded it.
    pub fn expect(self, outcome: ExpectOutcome, before: &str) -> Self {
        self.lock()
            .expects
            .push_back((outcome, before.as_bytes().to_vec()));
        self
    }

    pub fn matched(self, index: usize) -> Self {
        self.expect(ExpectOutcome::Matched(index), "")
    }

    pub fn timeout(self) -> Self {
        self.expect(ExpectOutcome::Timeout, "")
    }

    /// Queue one `read_nonblocking` result.
    pub fn read(self, outcome: ReadOutcome) -> Self {
        self.lock().reads.push_back(outcome);
        self
    }

    pub fn read_text(self, text: &str) -> Self {
        self.read(ReadOutcome::Data(text.as_bytes().to_vec()))
    }

    pub fn sent(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    pub fn patterns(&self) -> Vec<Vec<String>> {
        self.lock().patterns.clone()
    }

    pub fn spawned(&self) -> Vec<String> {
        self.lock().spawned.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn engine(&self) -> ScriptedEngine {
        ScriptedEngine {
            script: self.clone(),
            before: Vec::new(),
        }
    }

    pub fn spawner(&self) -> ScriptedSpawner {
        ScriptedSpawner {
            script: self.clone(),
            fail: false,
        }
    }
}

/// Engine that replays a [`Script`]. Unscripted expects and reads time out.
#[derive(Debug)]
pub(crate) struct ScriptedEngine {
    script: Script,
    before: Vec<u8>,
}

impl ExpectEngine for ScriptedEngine {
    async fn send_line(&mut self, text: &str) -> Result<(), EngineError> {
        let mut state = self.script.lock();
        if state.closed {
            return Err(EngineError::Closed);
        }
        state.sent.push(text.to_string());
        Ok(())
    }

    async fn expect(
        &mut self,
        patterns: &[Regex],
        _timeout: Duration,
    ) -> Result<ExpectOutcome, EngineError> {
        let mut state = self.script.lock();
        state
            .patterns
            .push(patterns.iter().map(|p| p.as_str().to_string()).collect());
        let (outcome, before) = state
            .expects
            .pop_front()
            .unwrap_or((ExpectOutcome::Timeout, Vec::new()));
        self.before = before;
        Ok(outcome)
    }

    async fn read_nonblocking(
        &mut self,
        max_size: usize,
        _timeout: Duration,
    ) -> Result<ReadOutcome, EngineError> {
        let mut state = self.script.lock();
        Ok(match state.reads.pop_front() {
            Some(ReadOutcome::Data(mut data)) => {
                data.truncate(max_size);
                ReadOutcome::Data(data)
            }
            Some(other) => other,
            None => ReadOutcome::Timeout,
        })
    }

    fn before(&self) -> &[u8] {
        &self.before
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.script.lock().closed = true;
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct ScriptedSpawner {
    script: Script,
    fail: bool,
}

impl ScriptedSpawner {
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl Spawner for ScriptedSpawner {
    type Engine = ScriptedEngine;

    fn spawn(&mut self, command: &SpawnCommand) -> Result<Self::Engine, EngineError> {
        self.script.lock().spawned.push(command.to_string());
        if self.fail {
            return Err(EngineError::Spawn {
                command: command.to_string(),
                message: "No such file or directory".into(),
            });
        }
        Ok(self.script.engine())
    }
}
