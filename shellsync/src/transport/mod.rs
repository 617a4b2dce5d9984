//! Transports: how the child process reaching the shell is started.

pub mod config;

use std::fmt;

use serde::Deserialize;

pub use config::SshConfig;

use crate::error::{Error, Result};

/// A program and its arguments, ready to be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SpawnCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for SpawnCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// The way a session reaches its shell.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transport {
    /// The system `ssh` client.
    Ssh(SshConfig),

    /// The system `telnet` client.
    Telnet { host: String, port: Option<u16> },

    /// A shell on this machine, e.g. `/bin/sh -i`.
    Local { program: String, args: Vec<String> },
}

impl Transport {
    /// Validate the transport and build the command to spawn.
    pub fn command(&self) -> Result<SpawnCommand> {
        match self {
            Transport::Ssh(config) => config.command(),
            Transport::Telnet { host, port } => {
                if host.is_empty() {
                    return Err(Error::configuration("no telnet host configured"));
                }
                let cmd = SpawnCommand::new("telnet").arg(host);
                Ok(match port {
                    Some(port) => cmd.arg(port.to_string()),
                    None => cmd,
                })
            }
            Transport::Local { program, args } => {
                if program.is_empty() {
                    return Err(Error::configuration("no executable configured"));
                }
                Ok(args
                    .iter()
                    .fold(SpawnCommand::new(program), |cmd, arg| cmd.arg(arg)))
            }
        }
    }

    /// Whether the SSH login dialogue applies.
    pub fn is_ssh(&self) -> bool {
        matches!(self, Transport::Ssh(_))
    }
}
