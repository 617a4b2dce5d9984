use std::fmt;

/// Lifecycle of a [`Session`](super::Session).
///
/// Moves forward through the login phases to `Ready`; any fatal failure
/// goes straight to `Closed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Authenticating,
    Synchronizing,
    NegotiatingPrompt,
    Ready,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Authenticating => "authenticating",
            SessionState::Synchronizing => "synchronizing",
            SessionState::NegotiatingPrompt => "negotiating prompt",
            SessionState::Ready => "ready",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
