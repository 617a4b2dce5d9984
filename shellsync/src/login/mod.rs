//! Login state machine.
//!
//! Answers host-key, password and terminal-type prompts until the remote
//! shell is reached or the dialogue fails. The dialogue itself is a
//! [`LoginTable`]; [`LoginMachine`] only walks it.

mod events;
mod machine;
mod table;

pub use events::{Credentials, LoginEvent, Reply, Transition, TransitionHook};
pub use machine::{LoginMachine, LoginReport};
pub use table::{Failure, LoginRule, LoginTable, Stage, Step};
