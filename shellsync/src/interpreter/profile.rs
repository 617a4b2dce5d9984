//! Interpreter profiles: one shell dialect's prompt conventions.

use std::fmt;

use regex::bytes::Regex;
use serde::Deserialize;

use super::tag::PromptTag;

/// Generic `#`/`$` prompt shared by every built-in dialect.
pub const DEFAULT_PROMPT: &str = r"[#$]";

/// Terminal type sent when the remote asks for one.
pub const DEFAULT_TERMINAL_TYPE: &str = "ansi";

/// Shell dialects with built-in profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShellKind {
    /// Bourne-style shells: sh, bash, ksh, zsh, dash.
    Posix,

    /// csh and tcsh.
    CShell,
}

impl ShellKind {
    /// Every built-in kind, in negotiation order.
    pub const ALL: [ShellKind; 2] = [ShellKind::Posix, ShellKind::CShell];

    pub fn name(self) -> &'static str {
        match self {
            ShellKind::Posix => "posix",
            ShellKind::CShell => "csh",
        }
    }

    /// The command that installs `prompt` as the shell prompt.
    fn set_prompt_cmd(self, prompt: &str) -> String {
        match self {
            ShellKind::Posix => format!("PS1='{}'", prompt),
            ShellKind::CShell => format!("set prompt='{}'", prompt),
        }
    }

    /// Build this dialect's profile around `tag`.
    pub fn profile(self, tag: &PromptTag) -> InterpreterProfile {
        // The set command writes `\$`, which the shell turns into `$`. The
        // echoed command therefore never matches the unique prompt regex.
        let set_prompt_cmd = self.set_prompt_cmd(&format!("[{}]\\$ ", tag.as_str()));
        let unique_prompt = format!(r"\[{}\][\$\#] ", regex::escape(tag.as_str()));

        InterpreterProfile {
            kind: self,
            terminal_type: DEFAULT_TERMINAL_TYPE.to_string(),
            default_prompt: Regex::new(DEFAULT_PROMPT).expect("default prompt pattern is valid"),
            unique_prompt: Regex::new(&unique_prompt).expect("escaped tag pattern is valid"),
            set_prompt_cmd,
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable description of a shell dialect's prompt conventions.
#[derive(Debug, Clone)]
pub struct InterpreterProfile {
    /// Dialect this profile was built for.
    pub kind: ShellKind,

    /// Answer to a "terminal type?" login prompt.
    pub terminal_type: String,

    /// Pattern matching the shell's prompt before negotiation.
    pub default_prompt: Regex,

    /// Pattern matching the prompt installed by `set_prompt_cmd`.
    pub unique_prompt: Regex,

    /// Command that makes the shell emit `unique_prompt` from now on.
    pub set_prompt_cmd: String,
}

impl InterpreterProfile {
    /// Override the terminal type.
    pub fn with_terminal_type(mut self, terminal_type: impl Into<String>) -> Self {
        self.terminal_type = terminal_type.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag() -> PromptTag {
        PromptTag::fixed("SHELLSYNC")
    }

    #[test]
    fn test_posix_profile() {
        let profile = ShellKind::Posix.profile(&tag());
        assert_eq!(profile.terminal_type, "ansi");
        assert_eq!(profile.set_prompt_cmd, r"PS1='[SHELLSYNC]\$ '");
        assert!(profile.unique_prompt.is_match(b"[SHELLSYNC]$ "));
        assert!(profile.unique_prompt.is_match(b"[SHELLSYNC]# "));
    }

    #[test]
    fn test_csh_differs_only_in_set_command() {
        let posix = ShellKind::Posix.profile(&tag());
        let csh = ShellKind::CShell.profile(&tag());
        assert_eq!(csh.set_prompt_cmd, r"set prompt='[SHELLSYNC]\$ '");
        assert_eq!(csh.unique_prompt.as_str(), posix.unique_prompt.as_str());
        assert_eq!(csh.default_prompt.as_str(), posix.default_prompt.as_str());
        assert_eq!(csh.terminal_type, posix.terminal_type);
    }

    #[test]
    fn test_echoed_set_command_does_not_match() {
        for kind in ShellKind::ALL {
            let profile = kind.profile(&tag());
            assert!(!profile.unique_prompt.is_match(profile.set_prompt_cmd.as_bytes()));
        }
    }

    #[test]
    fn test_default_prompt() {
        let profile = ShellKind::Posix.profile(&tag());
        assert!(profile.default_prompt.is_match(b"user@host:~$ "));
        assert!(profile.default_prompt.is_match(b"root@host:~# "));
        assert!(!profile.default_prompt.is_match(b"Password: "));
    }

    #[test]
    fn test_tag_is_escaped() {
        let profile = ShellKind::Posix.profile(&PromptTag::fixed("a.b+c"));
        assert!(profile.unique_prompt.is_match(b"[a.b+c]$ "));
        assert!(!profile.unique_prompt.is_match(b"[aXbbc]$ "));
    }
}
