//! Runs a [`LoginTable`] against an expect engine.

use std::collections::HashSet;
use std::time::Duration;

use log::{debug, warn};

use super::events::{Credentials, LoginEvent, Reply, Transition, TransitionHook};
use super::table::{LoginTable, Step};
use crate::channel::{ExpectEngine, ExpectOutcome};
use crate::error::{Error, Result};

/// What a completed login went through.
#[derive(Debug, Clone, Default)]
pub struct LoginReport {
    pub transitions: Vec<Transition>,

    /// The dialogue ended on a timeout rather than a recognised prompt,
    /// so success is assumed rather than observed.
    pub presumed: bool,
}

/// Drives one login dialogue.
///
/// Holds only borrowed inputs; build one per login attempt.
pub struct LoginMachine<'a> {
    table: &'a LoginTable,
    credentials: &'a Credentials,
    terminal_type: &'a str,
    timeout: Duration,
    hook: Option<&'a TransitionHook>,
}

impl<'a> LoginMachine<'a> {
    pub fn new(
        table: &'a LoginTable,
        credentials: &'a Credentials,
        terminal_type: &'a str,
        timeout: Duration,
    ) -> Self {
        Self {
            table,
            credentials,
            terminal_type,
            timeout,
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: Option<&'a TransitionHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Run the dialogue to completion.
    ///
    /// Does not close the engine on failure; that is up to the caller.
    pub async fn run<E: ExpectEngine>(&self, engine: &mut E) -> Result<LoginReport> {
        let mut report = LoginReport::default();
        let mut seen: HashSet<LoginEvent> = HashSet::new();
        let mut stage = 0;
        let mut round = 0;

        loop {
            let Some(current) = self.table.stages.get(stage) else {
                return Ok(report);
            };
            if round >= self.table.max_rounds {
                warn!("{} login: no progress after {} rounds", self.table.name, round);
                return Err(Error::protocol("unexpected login response"));
            }
            round += 1;

            match engine.expect(current.patterns(), self.timeout).await? {
                ExpectOutcome::Timeout => {
                    self.record(&mut report, round, LoginEvent::Timeout, None);
                    report.presumed = true;
                    stage += 1;
                }
                ExpectOutcome::Eof => {
                    self.record(&mut report, round, LoginEvent::Eof, None);
                    return Err(Error::connection("connection closed during login"));
                }
                ExpectOutcome::Matched(index) => {
                    let rule = &current.rules()[index];
                    if !seen.insert(rule.event) {
                        if let Some(failure) = rule.on_repeat {
                            self.record(&mut report, round, rule.event, None);
                            return Err(failure.to_error());
                        }
                    }

                    if let Some(reply) = rule.reply {
                        engine.send_line(self.reply_text(reply)).await?;
                    }
                    self.record(&mut report, round, rule.event, rule.reply);

                    match rule.step {
                        Step::Continue => {}
                        Step::Advance => stage += 1,
                        Step::Finish => return Ok(report),
                        Step::Fail(failure) => return Err(failure.to_error()),
                    }
                }
            }
        }
    }

    fn reply_text(&self, reply: Reply) -> &str {
        match reply {
            Reply::Username => &self.credentials.username,
            Reply::Password => self.credentials.password(),
            Reply::TerminalType => self.terminal_type,
            Reply::Text(text) => text,
        }
    }

    fn record(
        &self,
        report: &mut LoginReport,
        round: usize,
        event: LoginEvent,
        reply: Option<Reply>,
    ) {
        let transition = Transition {
            round,
            event,
            reply,
        };
        let name = self.table.name;
        match reply {
            None => debug!("{name} login round {round}: {event}"),
            Some(Reply::Password) => debug!("{name} login round {round}: {event} -> <password>"),
            Some(reply) => debug!("{name} login round {round}: {event} -> {reply:?}"),
        }
        if let Some(hook) = self.hook {
            hook(&transition);
        }
        report.transitions.push(transition);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use regex::bytes::Regex;

    use super::*;
    use crate::channel::scripted::Script;
    use crate::error::ErrorKind;
    use crate::login::table::{LoginRule, Stage};
    use crate::interpreter::DEFAULT_PROMPT;

    // Indices into the ssh table.
    const HOST_KEY: usize = 0;
    const PROMPT: usize = 1;
    const PASSWORD: usize = 2;
    const DENIED: usize = 3;
    const TERMINAL: usize = 4;
    const CLOSED: usize = 5;

    fn ssh() -> LoginTable {
        LoginTable::ssh(&Regex::new(DEFAULT_PROMPT).unwrap()).unwrap()
    }

    fn creds() -> Credentials {
        Credentials::new("admin", "s3cret")
    }

    async fn run(table: &LoginTable, script: &Script) -> Result<LoginReport> {
        let creds = creds();
        let machine = LoginMachine::new(table, &creds, "vt100", Duration::from_secs(10));
        machine.run(&mut script.engine()).await
    }

    #[tokio::test]
    async fn test_prompt_without_password() {
        let script = Script::new().matched(PROMPT);
        let report = run(&ssh(), &script).await.unwrap();
        assert!(!report.presumed);
        assert!(script.sent().is_empty());
    }

    #[tokio::test]
    async fn test_password_then_prompt() {
        let script = Script::new().matched(PASSWORD).matched(PROMPT);
        run(&ssh(), &script).await.unwrap();
        assert_eq!(script.sent(), ["s3cret"]);
    }

    #[tokio::test]
    async fn test_host_key_then_password_then_prompt() {
        let script = Script::new()
            .matched(HOST_KEY)
            .matched(PASSWORD)
            .matched(PROMPT);
        let report = run(&ssh(), &script).await.unwrap();
        assert_eq!(script.sent(), ["yes", "s3cret"]);
        assert_eq!(report.transitions.len(), 3);
    }

    #[tokio::test]
    async fn test_second_password_prompt_is_refused() {
        let script = Script::new().matched(PASSWORD).matched(PASSWORD);
        let err = run(&ssh(), &script).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.detail(), "password refused");
        assert_eq!(script.sent(), ["s3cret"]);
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let script = Script::new().matched(PASSWORD).matched(DENIED);
        let err = run(&ssh(), &script).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_permission_denied_at_any_point() {
        let cases: [(&[usize], &[&str]); 3] = [
            (&[], &[]),
            (&[HOST_KEY], &["yes"]),
            (&[TERMINAL], &["vt100"]),
        ];
        for (before, replies) in cases {
            let script = before
                .iter()
                .fold(Script::new(), |script, &index| script.matched(index))
                .matched(DENIED);
            let err = run(&ssh(), &script).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Authentication);
            assert_eq!(script.sent(), replies);
        }
    }

    #[tokio::test]
    async fn test_host_key_twice() {
        let script = Script::new().matched(HOST_KEY).matched(HOST_KEY);
        let err = run(&ssh(), &script).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(script.sent(), ["yes"]);
    }

    #[tokio::test]
    async fn test_terminal_type() {
        let script = Script::new().matched(TERMINAL).matched(PROMPT);
        run(&ssh(), &script).await.unwrap();
        assert_eq!(script.sent(), ["vt100"]);

        let script = Script::new().matched(TERMINAL).matched(TERMINAL);
        let err = run(&ssh(), &script).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_connection_closed() {
        let script = Script::new().matched(CLOSED);
        let err = run(&ssh(), &script).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);

        let script = Script::new().matched(PASSWORD).expect(ExpectOutcome::Eof, "");
        let err = run(&ssh(), &script).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn test_timeout_is_presumed_success() {
        let script = Script::new().matched(PASSWORD).timeout();
        let report = run(&ssh(), &script).await.unwrap();
        assert!(report.presumed);
        assert_eq!(report.transitions.last().unwrap().event, LoginEvent::Timeout);
    }

    #[tokio::test]
    async fn test_stuck_dialogue_hits_round_cap() {
        let table = LoginTable {
            name: "loop",
            stages: vec![Stage::new(vec![LoginRule::new(
                LoginEvent::LoginPrompt,
                Regex::new("again").unwrap(),
                Step::Continue,
            )])],
            max_rounds: 2,
        };
        let script = Script::new().matched(0).matched(0).matched(0);
        let err = run(&table, &script).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(err.detail(), "unexpected login response");
        assert_eq!(script.patterns().len(), 2);
    }

    #[tokio::test]
    async fn test_generic_login_dialogue() {
        let table = LoginTable::generic().unwrap();
        let script = Script::new().matched(0).matched(0);
        let report = run(&table, &script).await.unwrap();
        assert_eq!(script.sent(), ["admin", "s3cret"]);
        assert!(!report.presumed);

        let patterns = script.patterns();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].len(), 2);
        assert_eq!(patterns[1], ["(?i)password"]);
    }

    #[tokio::test]
    async fn test_generic_timeouts_skip_steps() {
        let table = LoginTable::generic().unwrap();
        let script = Script::new().timeout().timeout();
        let report = run(&table, &script).await.unwrap();
        assert!(script.sent().is_empty());
        assert!(report.presumed);
    }

    #[tokio::test]
    async fn test_hook_records_transitions_without_secrets() {
        let seen: Arc<Mutex<Vec<Transition>>> = Arc::default();
        let sink = seen.clone();
        let hook: TransitionHook = Arc::new(move |t: &Transition| sink.lock().unwrap().push(t.clone()));

        let table = ssh();
        let creds = creds();
        let script = Script::new().matched(PASSWORD).matched(PROMPT);
        LoginMachine::new(&table, &creds, "ansi", Duration::from_secs(1))
            .with_hook(Some(&hook))
            .run(&mut script.engine())
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            [
                Transition {
                    round: 1,
                    event: LoginEvent::PasswordPrompt,
                    reply: Some(Reply::Password),
                },
                Transition {
                    round: 2,
                    event: LoginEvent::ShellPrompt,
                    reply: None,
                },
            ]
        );
        assert!(!format!("{:?}", *seen).contains("s3cret"));
    }
}
