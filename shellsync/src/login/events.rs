//! Login vocabulary and the transition hook.

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

/// Something the login dialogue can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginEvent {
    /// `login:` prompt.
    LoginPrompt,

    /// `username:` prompt.
    UsernamePrompt,

    /// Password, or passphrase for a key.
    PasswordPrompt,

    /// First contact with an unknown host key.
    HostKeyConfirmation,

    /// The shell's default prompt.
    ShellPrompt,

    /// The server rejected the credentials.
    PermissionDenied,

    /// The remote asked for a terminal type.
    TerminalType,

    /// "Connection closed by remote host".
    ConnectionClosed,

    /// Nothing matched within the login timeout.
    Timeout,

    /// The child process exited.
    Eof,
}

impl fmt::Display for LoginEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoginEvent::LoginPrompt => "login-prompt",
            LoginEvent::UsernamePrompt => "username-prompt",
            LoginEvent::PasswordPrompt => "password-prompt",
            LoginEvent::HostKeyConfirmation => "host-key-confirmation",
            LoginEvent::ShellPrompt => "shell-prompt",
            LoginEvent::PermissionDenied => "permission-denied",
            LoginEvent::TerminalType => "terminal-type",
            LoginEvent::ConnectionClosed => "connection-closed",
            LoginEvent::Timeout => "timeout",
            LoginEvent::Eof => "eof",
        };
        f.write_str(name)
    }
}

/// What the machine answers to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Username,
    Password,
    TerminalType,
    /// A fixed answer such as `yes`.
    Text(&'static str),
}

/// One step of the login dialogue, as reported to a [`TransitionHook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// 1-based expect round.
    pub round: usize,

    /// What was observed.
    pub event: LoginEvent,

    /// What was sent back, if anything. Passwords are reported as [`Reply::Password`] only.
    pub reply: Option<Reply>,
}

/// Observer called for every login transition.
pub type TransitionHook = Arc<dyn Fn(&Transition) + Send + Sync>;

/// Username and password for the login dialogue.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Credentials for key-based or pre-authenticated logins.
    pub fn username_only(username: impl Into<String>) -> Self {
        Self::new(username, String::new())
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}
