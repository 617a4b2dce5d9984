//! # shellsync
//!
//! Async login automation for interactive remote shells.
//!
//! shellsync drives a terminal client (`ssh`, `telnet` or a local shell)
//! through its login dialogue, works out when the remote shell is really
//! sitting at a prompt, and replaces that prompt with a unique one so that
//! command output can be delimited without guesswork.
//!
//! ## Features
//!
//! - PTY-backed child processes via portable-pty
//! - Data-driven login dialogues for OpenSSH and generic `login:` prompts
//! - Prompt synchronization by edit distance between probe responses
//! - Unique prompt negotiation across POSIX and csh dialects
//! - ANSI escape stripping on everything read from the child
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shellsync::{Credentials, SessionBuilder, SshConfig, Transport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), shellsync::Error> {
//!     let mut session = SessionBuilder::new()
//!         .transport(Transport::Ssh(SshConfig::new("192.168.1.1", "admin")))
//!         .build();
//!
//!     session.login(&Credentials::new("admin", "secret")).await?;
//!
//!     for line in session.command("uname -a").await? {
//!         println!("{}", line);
//!     }
//!
//!     session.logout().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod interpreter;
pub mod login;
pub mod negotiate;
pub mod session;
pub mod sync;
pub mod transport;

// Re-export main types for convenience
pub use channel::{ExpectEngine, ExpectOutcome, PtySpawner, Spawner};
pub use error::{EngineError, Error, ErrorKind, Result};
pub use interpreter::{InterpreterProfile, ProfileSet, PromptTag, ShellKind};
pub use login::{Credentials, LoginEvent, Reply, Transition, TransitionHook};
pub use negotiate::negotiate;
pub use session::{Session, SessionBuilder, SessionConfig, SessionState, Timeouts};
pub use sync::Synchronizer;
pub use transport::{SpawnCommand, SshConfig, Transport};
