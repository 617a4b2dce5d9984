//! Log into a host with the system `ssh` client and run a few commands.
//!
//! # Usage
//!
//! With password authentication:
//! ```bash
//! cargo run --example remote_uptime -- --host localhost --user your_username --password your_password
//! ```
//!
//! With an SSH key (an empty password is fine):
//! ```bash
//! cargo run --example remote_uptime -- --host localhost --user your_username --key ~/.ssh/id_rsa
//! ```
//!
//! Set `RUST_LOG=debug` to watch the login dialogue and synchronization.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use shellsync::{Credentials, SessionBuilder, SshConfig, Timeouts, Transport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let ssh = SshConfig {
        port: args.port,
        key_file: args.key.clone(),
        force_password: args.password.is_some() && args.key.is_none(),
        ..SshConfig::new(&args.host, &args.user)
    };

    let mut session = SessionBuilder::new()
        .transport(Transport::Ssh(ssh))
        .timeouts(Timeouts {
            command: Duration::from_secs(args.timeout),
            ..Timeouts::default()
        })
        .on_transition(|t| println!("  login: {} -> {:?}", t.event, t.reply))
        .build();

    println!("Logging into {}...", args.host);
    let credentials = Credentials::new(&args.user, args.password.clone().unwrap_or_default());
    session.login(&credentials).await?;
    if let Some(profile) = session.active_profile() {
        println!("Logged in, {} prompt installed", profile.kind);
    }

    for command in ["uptime", "whoami", "uname -a"] {
        println!("\n$ {}", command);
        println!("{}", "-".repeat(50));
        for line in session.command(command).await? {
            println!("{}", line);
        }
    }

    println!("\nLogging out...");
    session.logout().await?;
    println!("Done!");

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: Option<u16>,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut port = None;
        let mut user = env::var("USER").unwrap_or_else(|_| "root".to_string());
        let mut password = None;
        let mut key = None;
        let mut timeout = 30u64;

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => host = value.unwrap_or(host),
                "--port" | "-p" => port = value.and_then(|v| v.parse().ok()),
                "--user" | "-u" => user = value.unwrap_or(user),
                "--password" | "-P" => password = value,
                "--key" | "-k" => key = value.map(PathBuf::from),
                "--timeout" | "-t" => timeout = value.and_then(|v| v.parse().ok()).unwrap_or(30),
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {}", other);
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        Self {
            host,
            port,
            user,
            password,
            key,
            timeout,
        }
    }

    fn print_help() {
        println!(
            r#"shellsync remote_uptime example

USAGE:
    cargo run --example remote_uptime -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>        Target host [default: localhost]
    -p, --port <PORT>        SSH port [default: client default]
    -u, --user <USER>        Username [default: $USER]
    -P, --password <PASS>    Password for authentication
    -k, --key <PATH>         Path to SSH private key
    -t, --timeout <SECS>     Per-command timeout [default: 30]
    --help                   Print this help message
"#
        );
    }
}
