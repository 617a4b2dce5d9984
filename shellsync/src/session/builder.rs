//! Builder for sessions.

use std::sync::Arc;

use super::Session;
use super::config::{SessionConfig, Timeouts};
use crate::channel::{PtyConfig, PtySpawner, Spawner};
use crate::interpreter::{ProfileSet, PromptTag, ShellKind};
use crate::login::{Transition, TransitionHook};
use crate::transport::Transport;

/// Builder for constructing a [`Session`].
///
/// # Example
///
/// ```rust,no_run
/// use shellsync::{Credentials, SessionBuilder, SshConfig, Transport};
///
/// # async fn example() -> Result<(), shellsync::Error> {
/// let mut session = SessionBuilder::new()
///     .transport(Transport::Ssh(SshConfig::new("db1", "admin")))
///     .build();
///
/// session.login(&Credentials::new("admin", "secret")).await?;
/// let uptime = session.command("uptime").await?;
/// session.logout().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    transport: Option<Transport>,
    interpreters: Vec<ShellKind>,
    terminal_type: Option<String>,
    tag: Option<PromptTag>,
    config: SessionConfig,
    hook: Option<TransitionHook>,
    pty: PtyConfig,
}

impl SessionBuilder {
    /// Create a builder with every built-in interpreter as a candidate.
    pub fn new() -> Self {
        Self {
            transport: None,
            interpreters: ShellKind::ALL.to_vec(),
            terminal_type: None,
            tag: None,
            config: SessionConfig::default(),
            hook: None,
            pty: PtyConfig::default(),
        }
    }

    /// Set how to reach the shell.
    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Only try this interpreter.
    pub fn interpreter(mut self, kind: ShellKind) -> Self {
        self.interpreters = vec![kind];
        self
    }

    /// Try these interpreters, in order. Duplicates are dropped.
    pub fn interpreters(mut self, kinds: impl IntoIterator<Item = ShellKind>) -> Self {
        self.interpreters = kinds.into_iter().collect();
        self
    }

    /// Answer to "terminal type?" prompts (default: `ansi`).
    pub fn terminal_type(mut self, terminal_type: impl Into<String>) -> Self {
        self.terminal_type = Some(terminal_type.into());
        self
    }

    /// Pin the unique prompt tag instead of generating one.
    pub fn tag(mut self, tag: PromptTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.config.timeouts = timeouts;
        self
    }

    /// Whether to install a unique prompt after login (default: true).
    pub fn auto_prompt_reset(mut self, enabled: bool) -> Self {
        self.config.auto_prompt_reset = enabled;
        self
    }

    /// Scale the synchronizer timings for slow links.
    pub fn sync_multiplier(mut self, multiplier: f64) -> Self {
        self.config.sync_multiplier = multiplier;
        self
    }

    /// Observe every login transition.
    pub fn on_transition(mut self, hook: impl Fn(&Transition) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Set PTY dimensions.
    pub fn terminal_size(mut self, width: u16, height: u16) -> Self {
        self.pty.terminal_width = width;
        self.pty.terminal_height = height;
        self
    }

    /// Build a session that spawns its child in a PTY.
    ///
    /// This does not connect. Call `login()` on the returned session.
    pub fn build(self) -> Session<PtySpawner> {
        let spawner = PtySpawner::new(self.pty.clone());
        self.build_with(spawner)
    }

    /// Build a session around a custom spawner.
    pub fn build_with<S: Spawner>(self, spawner: S) -> Session<S> {
        let tag = self.tag.unwrap_or_default();
        let mut candidates = ProfileSet::new();
        for kind in self.interpreters {
            let mut profile = kind.profile(&tag);
            if let Some(terminal_type) = &self.terminal_type {
                profile = profile.with_terminal_type(terminal_type.clone());
            }
            candidates.insert(profile);
        }

        Session::new(
            spawner,
            self.transport,
            candidates,
            tag,
            self.config,
            self.hook,
        )
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
