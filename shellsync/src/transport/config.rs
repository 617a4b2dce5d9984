//! SSH client configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

use super::SpawnCommand;

/// Options for the system `ssh` client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port; `None` leaves the client default.
    pub port: Option<u16>,

    /// Login name passed with `-l`.
    pub username: String,

    /// Private key passed with `-i`.
    pub key_file: Option<PathBuf>,

    /// Pass `-q` to silence warnings and banners.
    pub quiet: bool,

    /// Disable public key authentication so the password prompt appears.
    pub force_password: bool,

    /// Skip host key checks for localhost.
    pub no_host_auth_for_localhost: bool,

    /// Extra `-o` options, e.g. `ConnectTimeout=5`.
    pub options: Vec<String>,

    /// Client executable.
    pub executable: String,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: None,
            username: String::new(),
            key_file: None,
            quiet: true,
            force_password: false,
            no_host_auth_for_localhost: false,
            options: Vec::new(),
            executable: "ssh".to_string(),
        }
    }
}

impl SshConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    /// Validate the configuration and build the client command line.
    pub fn command(&self) -> Result<SpawnCommand> {
        if self.executable.is_empty() {
            return Err(Error::configuration("no ssh executable configured"));
        }
        if self.host.is_empty() {
            return Err(Error::configuration("no ssh host configured"));
        }

        let mut cmd = SpawnCommand::new(&self.executable);
        if self.quiet {
            cmd = cmd.arg("-q");
        }
        if self.no_host_auth_for_localhost {
            cmd = cmd.arg("-o").arg("NoHostAuthenticationForLocalhost=yes");
        }
        if self.force_password {
            cmd = cmd.arg("-o").arg("PubkeyAuthentication=no");
        }
        for option in &self.options {
            cmd = cmd.arg("-o").arg(option);
        }
        if let Some(port) = self.port {
            cmd = cmd.arg("-p").arg(port.to_string());
        }
        if let Some(ref key) = self.key_file {
            if !key.is_file() {
                return Err(Error::configuration(format!(
                    "private ssh key does not exist: {}",
                    key.display()
                )));
            }
            cmd = cmd.arg("-i").arg(key.display().to_string());
        }
        if !self.username.is_empty() {
            cmd = cmd.arg("-l").arg(&self.username);
        }
        Ok(cmd.arg(&self.host))
    }
}
