//! Login dialogues as data.
//!
//! A [`LoginTable`] is a list of stages. Each stage is an ordered list of
//! rules; one expect round matches all of a stage's patterns at once and the
//! matching rule says what to send and where to go next. Swapping the table
//! is all it takes to support another protocol's dialogue.

use regex::bytes::Regex;

use super::events::{LoginEvent, Reply};
use crate::channel::compile_insensitive;
use crate::error::{EngineError, Error, ErrorKind};

/// A fatal login outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub detail: &'static str,
}

impl Failure {
    pub const fn new(kind: ErrorKind, detail: &'static str) -> Self {
        Self { kind, detail }
    }

    pub fn to_error(self) -> Error {
        Error::new(self.kind, self.detail)
    }
}

/// Where the dialogue goes after a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Expect again within the same stage.
    Continue,

    /// Move to the next stage; past the last stage the login is complete.
    Advance,

    /// Login is complete.
    Finish,

    /// Abort the login.
    Fail(Failure),
}

/// One row of a login table.
#[derive(Debug, Clone)]
pub struct LoginRule {
    pub event: LoginEvent,
    pub pattern: Regex,
    pub reply: Option<Reply>,
    pub step: Step,

    /// Failure raised when this event fires a second time in one dialogue.
    pub on_repeat: Option<Failure>,
}

impl LoginRule {
    pub fn new(event: LoginEvent, pattern: Regex, step: Step) -> Self {
        Self {
            event,
            pattern,
            reply: None,
            step,
            on_repeat: None,
        }
    }

    pub fn reply(mut self, reply: Reply) -> Self {
        self.reply = Some(reply);
        self
    }

    pub fn on_repeat(mut self, kind: ErrorKind, detail: &'static str) -> Self {
        self.on_repeat = Some(Failure::new(kind, detail));
        self
    }
}

/// A stage's rules plus their patterns, in rule order.
#[derive(Debug, Clone)]
pub struct Stage {
    rules: Vec<LoginRule>,
    patterns: Vec<Regex>,
}

impl Stage {
    pub fn new(rules: Vec<LoginRule>) -> Self {
        let patterns = rules.iter().map(|r| r.pattern.clone()).collect();
        Self { rules, patterns }
    }

    pub fn rules(&self) -> &[LoginRule] {
        &self.rules
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }
}

/// A complete login dialogue.
#[derive(Debug, Clone)]
pub struct LoginTable {
    pub name: &'static str,
    pub stages: Vec<Stage>,

    /// Upper bound on expect rounds before the dialogue is declared stuck.
    pub max_rounds: usize,
}

impl LoginTable {
    /// Generic `login:` / `password:` dialogue used by telnet and local shells.
    ///
    /// Each stage ends on its prompt or on a timeout; a timeout means the
    /// step was already behind us.
    pub fn generic() -> Result<Self, EngineError> {
        let user = Stage::new(vec![
            LoginRule::new(LoginEvent::LoginPrompt, compile_insensitive("login")?, Step::Advance)
                .reply(Reply::Username),
            LoginRule::new(
                LoginEvent::UsernamePrompt,
                compile_insensitive(r"user\s*name")?,
                Step::Advance,
            )
            .reply(Reply::Username),
        ]);
        let password = Stage::new(vec![
            LoginRule::new(LoginEvent::PasswordPrompt, compile_insensitive("password")?, Step::Advance)
                .reply(Reply::Password),
        ]);

        Ok(Self {
            name: "generic",
            stages: vec![user, password],
            max_rounds: 4,
        })
    }

    /// OpenSSH client dialogue.
    ///
    /// `shell_prompt` is the interpreter's default prompt; seeing it means a
    /// key or agent already logged us in.
    pub fn ssh(shell_prompt: &Regex) -> Result<Self, EngineError> {
        let rules = vec![
            LoginRule::new(
                LoginEvent::HostKeyConfirmation,
                compile_insensitive("are you sure you want to continue connecting")?,
                Step::Continue,
            )
            .reply(Reply::Text("yes"))
            .on_repeat(ErrorKind::Protocol, "weird, asked twice to confirm the host key"),
            LoginRule::new(LoginEvent::ShellPrompt, shell_prompt.clone(), Step::Finish),
            LoginRule::new(
                LoginEvent::PasswordPrompt,
                compile_insensitive("(?:password)|(?:passphrase for key)")?,
                Step::Continue,
            )
            .reply(Reply::Password)
            .on_repeat(ErrorKind::Authentication, "password refused"),
            LoginRule::new(
                LoginEvent::PermissionDenied,
                compile_insensitive("permission denied")?,
                Step::Fail(Failure::new(ErrorKind::Authentication, "permission denied")),
            ),
            LoginRule::new(
                LoginEvent::TerminalType,
                compile_insensitive("terminal type")?,
                Step::Continue,
            )
            .reply(Reply::TerminalType)
            .on_repeat(ErrorKind::Protocol, "weird, asked twice for the terminal type"),
            LoginRule::new(
                LoginEvent::ConnectionClosed,
                compile_insensitive("connection closed by remote host")?,
                Step::Fail(Failure::new(ErrorKind::Connection, "connection closed")),
            ),
        ];

        Ok(Self {
            name: "ssh",
            stages: vec![Stage::new(rules)],
            max_rounds: 8,
        })
    }
}
