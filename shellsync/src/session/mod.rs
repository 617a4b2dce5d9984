//! The session facade.
//!
//! A [`Session`] owns one child process and walks it from login to a shell
//! prompt it can reliably match, then runs commands against that prompt.

mod builder;
mod config;
mod state;

pub use builder::SessionBuilder;
pub use config::{SessionConfig, Timeouts};
pub use state::SessionState;

use std::time::Duration;

use log::{debug, info, warn};
use regex::bytes::Regex;

use crate::channel::{ExpectEngine, ExpectOutcome, PtySpawner, Spawner, compile_insensitive};
use crate::error::{EngineError, Error, ErrorKind, Result};
use crate::interpreter::{InterpreterProfile, ProfileSet, PromptTag};
use crate::login::{Credentials, LoginMachine, LoginTable, TransitionHook};
use crate::negotiate::negotiate;
use crate::sync::{SyncConfig, Synchronizer};
use crate::transport::Transport;

/// An automated login to an interactive shell.
///
/// Every method that touches the child takes `&mut self`, so one session
/// only ever has one operation in flight. Any failure closes the child
/// and leaves the session [`Closed`](SessionState::Closed).
pub struct Session<S: Spawner = PtySpawner> {
    spawner: S,
    transport: Option<Transport>,
    candidates: ProfileSet,
    tag: PromptTag,
    config: SessionConfig,
    hook: Option<TransitionHook>,

    engine: Option<S::Engine>,
    state: SessionState,
    active_profile: Option<InterpreterProfile>,
    prompt: Option<Regex>,
    last_output: String,
}

impl Session<PtySpawner> {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }
}

impl<S: Spawner> Session<S> {
    fn new(
        spawner: S,
        transport: Option<Transport>,
        candidates: ProfileSet,
        tag: PromptTag,
        config: SessionConfig,
        hook: Option<TransitionHook>,
    ) -> Self {
        Self {
            spawner,
            transport,
            candidates,
            tag,
            config,
            hook,
            engine: None,
            state: SessionState::Disconnected,
            active_profile: None,
            prompt: None,
            last_output: String::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// The profile whose prompt is in force, once logged in.
    pub fn active_profile(&self) -> Option<&InterpreterProfile> {
        self.active_profile.as_ref()
    }

    /// Text that preceded the last prompt match, or everything pending if
    /// the last wait timed out.
    pub fn last_output(&self) -> &str {
        &self.last_output
    }

    /// The tag embedded in the unique prompt.
    pub fn tag(&self) -> &PromptTag {
        &self.tag
    }

    pub fn candidates(&self) -> &ProfileSet {
        &self.candidates
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replace the pattern used to recognise the prompt.
    ///
    /// Needed after changing the prompt by hand, or when logging in with
    /// `auto_prompt_reset` disabled and a known prompt.
    pub fn set_prompt_pattern(&mut self, pattern: Regex) {
        self.prompt = Some(pattern);
    }

    /// Spawn the transport, log in and align with the shell prompt.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        self.require(SessionState::Disconnected, "login")?;
        match self.establish(credentials).await {
            Ok(()) => Ok(()),
            Err(err) => Err(self.abort(err).await),
        }
    }

    async fn establish(&mut self, credentials: &Credentials) -> Result<()> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| Error::configuration("no transport configured"))?;
        let command = transport.command()?;
        let first = self
            .candidates
            .first()
            .cloned()
            .ok_or_else(|| Error::configuration("no interpreter configured"))?;
        let table = if transport.is_ssh() {
            LoginTable::ssh(&first.default_prompt)?
        } else {
            LoginTable::generic()?
        };

        self.state = SessionState::Authenticating;
        info!("spawning {}", command);
        let engine = self.engine.insert(self.spawner.spawn(&command)?);

        let report = LoginMachine::new(
            &table,
            credentials,
            &first.terminal_type,
            self.config.timeouts.login,
        )
        .with_hook(self.hook.as_ref())
        .run(engine)
        .await?;
        if report.presumed {
            debug!("login presumed complete after {} rounds", report.transitions.len());
        }

        self.state = SessionState::Synchronizing;
        let synchronizer = Synchronizer::new(SyncConfig {
            multiplier: self.config.sync_multiplier,
            threshold: self.config.sync_threshold,
            ..SyncConfig::default()
        });
        if !synchronizer.synchronize(engine).await? {
            return Err(Error::synchronization(
                "could not synchronize with original prompt",
            ));
        }

        let (profile, prompt) = if self.config.auto_prompt_reset {
            self.state = SessionState::NegotiatingPrompt;
            let profile = negotiate(engine, &self.candidates, self.config.timeouts.negotiate).await?;
            let prompt = profile.unique_prompt.clone();
            (profile, prompt)
        } else {
            let prompt = first.default_prompt.clone();
            (first, prompt)
        };

        info!("session ready ({} prompt)", profile.kind);
        self.active_profile = Some(profile);
        self.prompt = Some(prompt);
        self.last_output.clear();
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Wait up to the default command timeout for the prompt.
    pub async fn prompt(&mut self) -> Result<bool> {
        self.prompt_with_timeout(self.config.timeouts.command).await
    }

    /// Wait for the next prompt; `false` if it did not show up in time.
    ///
    /// Always replaces [`last_output`](Self::last_output), even on timeout.
    pub async fn prompt_with_timeout(&mut self, timeout: Duration) -> Result<bool> {
        self.require(SessionState::Ready, "prompt")?;
        match self.wait_for_prompt(timeout).await {
            Ok(matched) => Ok(matched),
            Err(err) => Err(self.abort(err).await),
        }
    }

    async fn wait_for_prompt(&mut self, timeout: Duration) -> Result<bool> {
        let (Some(engine), Some(prompt)) = (self.engine.as_mut(), self.prompt.as_ref()) else {
            return Err(Error::new(ErrorKind::InvalidState, "no prompt to wait for"));
        };

        let outcome = engine.expect(std::slice::from_ref(prompt), timeout).await?;
        self.last_output = String::from_utf8_lossy(engine.before()).into_owned();
        match outcome {
            ExpectOutcome::Matched(_) => Ok(true),
            ExpectOutcome::Timeout => Ok(false),
            ExpectOutcome::Eof => Err(Error::connection(
                "connection closed while waiting for the prompt",
            )),
        }
    }

    /// Run `text` with the default command timeout and return its output lines.
    pub async fn command(&mut self, text: &str) -> Result<Vec<String>> {
        self.command_with_timeout(text, self.config.timeouts.command).await
    }

    /// Run `text` and return its output lines, without the echoed command.
    pub async fn command_with_timeout(&mut self, text: &str, timeout: Duration) -> Result<Vec<String>> {
        self.require(SessionState::Ready, "command")?;
        match self.run_command(text, timeout).await {
            Ok(lines) => Ok(lines),
            Err(err) => Err(self.abort(err).await),
        }
    }

    async fn run_command(&mut self, text: &str, timeout: Duration) -> Result<Vec<String>> {
        debug!("command: {}", text);
        self.engine
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::InvalidState, "no child process"))?
            .send_line(text)
            .await?;

        if !self.wait_for_prompt(timeout).await? {
            return Err(Error::command(format!(
                "prompt did not return within {:?} after {:?}",
                timeout, text
            )));
        }
        Ok(output_lines(&self.last_output))
    }

    /// Run several commands in order, stopping at the first failure.
    pub async fn send_commands(&mut self, commands: &[&str]) -> Result<Vec<Vec<String>>> {
        let mut outputs = Vec::with_capacity(commands.len());
        for command in commands {
            outputs.push(self.command(command).await?);
        }
        Ok(outputs)
    }

    /// Negotiate the unique prompt again, e.g. after `su` started a new shell.
    pub async fn reset_prompt(&mut self) -> Result<()> {
        self.require(SessionState::Ready, "reset_prompt")?;
        let Some(engine) = self.engine.as_mut() else {
            return Err(Error::new(ErrorKind::InvalidState, "no child process"));
        };

        self.state = SessionState::NegotiatingPrompt;
        match negotiate(engine, &self.candidates, self.config.timeouts.negotiate).await {
            Ok(profile) => {
                self.prompt = Some(profile.unique_prompt.clone());
                self.active_profile = Some(profile);
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(err) => Err(self.abort(err).await),
        }
    }

    /// Exit the shell and release the child.
    ///
    /// Leaves the session closed whatever happens.
    pub async fn logout(&mut self) -> Result<()> {
        match self.state {
            SessionState::Closed => return Err(closed("logout")),
            SessionState::Disconnected => {
                self.state = SessionState::Closed;
                return Ok(());
            }
            _ => {}
        }

        let result = self.exit_shell().await;
        self.shutdown().await;
        result
    }

    async fn exit_shell(&mut self) -> Result<()> {
        let timeout = self.config.timeouts.logout;
        let Some(engine) = self.engine.as_mut() else {
            return Ok(());
        };
        let stopped_jobs = compile_insensitive("there are stopped jobs").map_err(EngineError::from)?;

        engine.send_line("exit").await?;
        match engine.expect(std::slice::from_ref(&stopped_jobs), timeout).await? {
            ExpectOutcome::Matched(_) => {
                debug!("logout: stopped jobs, sending exit again");
                engine.send_line("exit").await?;
                if engine.expect(&[], timeout).await? != ExpectOutcome::Eof {
                    warn!("logout: shell still running after second exit");
                }
            }
            ExpectOutcome::Eof => {}
            ExpectOutcome::Timeout => warn!("logout: shell did not exit within {:?}", timeout),
        }
        Ok(())
    }

    fn require(&self, expected: SessionState, operation: &str) -> Result<()> {
        match self.state {
            state if state == expected => Ok(()),
            SessionState::Closed => Err(closed(operation)),
            state => Err(Error::new(
                ErrorKind::InvalidState,
                format!("{} needs a {} session, not {}", operation, expected, state),
            )),
        }
    }

    async fn abort(&mut self, err: Error) -> Error {
        warn!("session failed in {} state: {}", self.state, err);
        self.shutdown().await;
        err
    }

    async fn shutdown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            if let Err(e) = engine.close().await {
                debug!("close failed: {}", e);
            }
        }
        self.prompt = None;
        self.state = SessionState::Closed;
    }
}

fn closed(operation: &str) -> Error {
    Error::new(ErrorKind::Closed, format!("{} on a closed session", operation))
}

/// Split command output into lines, dropping the echoed command line.
fn output_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut start = 0;
    for end in memchr::memchr_iter(b'\n', text.as_bytes()) {
        lines.push(&text[start..end]);
        start = end + 1;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }

    lines
        .into_iter()
        .skip(1)
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}
