//! Interpreter profiles for the shell dialects a session can negotiate.
//!
//! A profile is plain data looked up from a [`ShellKind`]; the candidates a
//! session tries during negotiation are an ordered [`ProfileSet`].

mod profile;
mod tag;

pub use profile::{DEFAULT_PROMPT, DEFAULT_TERMINAL_TYPE, InterpreterProfile, ShellKind};
pub use tag::PromptTag;

use indexmap::IndexMap;

/// Ordered candidate profiles, at most one per dialect.
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    profiles: IndexMap<ShellKind, InterpreterProfile>,
}

impl ProfileSet {
    /// Create a new empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Profiles for `kinds`, in the given order, built around `tag`.
    pub fn from_kinds(kinds: impl IntoIterator<Item = ShellKind>, tag: &PromptTag) -> Self {
        let mut set = Self::new();
        for kind in kinds {
            set.insert(kind.profile(tag));
        }
        set
    }

    /// Add a profile; replacing an existing one keeps its position.
    pub fn insert(&mut self, profile: InterpreterProfile) {
        self.profiles.insert(profile.kind, profile);
    }

    pub fn get(&self, kind: ShellKind) -> Option<&InterpreterProfile> {
        self.profiles.get(&kind)
    }

    /// The first candidate.
    pub fn first(&self) -> Option<&InterpreterProfile> {
        self.profiles.values().next()
    }

    /// Candidates in negotiation order.
    pub fn iter(&self) -> impl Iterator<Item = &InterpreterProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kinds_keeps_order() {
        let tag = PromptTag::fixed("T");
        let set = ProfileSet::from_kinds([ShellKind::CShell, ShellKind::Posix], &tag);
        let kinds: Vec<_> = set.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, [ShellKind::CShell, ShellKind::Posix]);
        assert_eq!(set.first().unwrap().kind, ShellKind::CShell);
    }

    #[test]
    fn test_insert_deduplicates_by_kind() {
        let tag = PromptTag::fixed("T");
        let mut set = ProfileSet::from_kinds(ShellKind::ALL, &tag);
        set.insert(ShellKind::Posix.profile(&tag).with_terminal_type("vt100"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.first().unwrap().terminal_type, "vt100");
    }

    #[test]
    fn test_empty_set() {
        let set = ProfileSet::new();
        assert!(set.is_empty());
        assert!(set.first().is_none());
        assert!(set.get(ShellKind::Posix).is_none());
    }
}
