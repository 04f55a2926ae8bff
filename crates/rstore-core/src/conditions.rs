//! If-Match / If-None-Match conditions.
//!
//! Tokens are opaque strings compared by set membership. The wildcard is
//! just another member of the set; only `If-None-Match` on writes gives it
//! meaning ("fail if anything exists").

use std::collections::BTreeSet;

use rstore_ledger::Version;

/// The wildcard token.
pub const WILDCARD: &str = "*";

/// A set of client-supplied version tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionTokens(BTreeSet<String>);

impl VersionTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    /// The single-token set `{*}`.
    pub fn wildcard() -> Self {
        Self::new([WILDCARD])
    }

    pub fn has_wildcard(&self) -> bool {
        self.0.contains(WILDCARD)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// `true` when `current` exists and its rendered form is in the set.
    pub fn matches(&self, current: Option<&Version>) -> bool {
        current.is_some_and(|version| self.contains(&version.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for VersionTokens {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Preconditions for one operation. Absent fields impose nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conditions {
    pub if_match: Option<VersionTokens>,
    pub if_none_match: Option<VersionTokens>,
}

impl Conditions {
    /// No preconditions.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn if_match<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.if_match = Some(VersionTokens::new(tokens));
        self
    }

    pub fn if_none_match<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.if_none_match = Some(VersionTokens::new(tokens));
        self
    }

    /// Fails when If-Match was given without the current version.
    pub(crate) fn if_match_fails(&self, current: Option<&Version>) -> bool {
        self.if_match
            .as_ref()
            .is_some_and(|tokens| !tokens.matches(current))
    }

    /// If-None-Match was given and includes the current version.
    pub(crate) fn if_none_match_hits(&self, current: Option<&Version>) -> bool {
        self.if_none_match
            .as_ref()
            .is_some_and(|tokens| tokens.matches(current))
    }

    /// If-None-Match includes the wildcard and something exists.
    pub(crate) fn forbids_existing(&self, current: Option<&Version>) -> bool {
        current.is_some()
            && self
                .if_none_match
                .as_ref()
                .is_some_and(VersionTokens::has_wildcard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_matching() {
        let v = Version::new(2, "abc");
        let tokens = VersionTokens::new(["1:abc", "2:abc"]);
        assert!(tokens.matches(Some(&v)));
        assert!(!tokens.matches(None));
        assert!(!VersionTokens::new(["2:abd"]).matches(Some(&v)));
        // The wildcard is a plain member; it never equals a version.
        assert!(!VersionTokens::wildcard().matches(Some(&v)));
    }

    #[test]
    fn absent_conditions_impose_nothing() {
        let c = Conditions::none();
        assert!(!c.if_match_fails(None));
        assert!(!c.if_none_match_hits(Some(&Version::new(1, "x"))));
        assert!(!c.forbids_existing(Some(&Version::new(1, "x"))));
    }

    #[test]
    fn if_match_on_missing_target_fails() {
        let c = Conditions::none().if_match(["incorrect version"]);
        assert!(c.if_match_fails(None));
        assert!(c.if_match_fails(Some(&Version::new(1, "x"))));
        assert!(!Conditions::none()
            .if_match(["1:x"])
            .if_match_fails(Some(&Version::new(1, "x"))));
    }

    #[test]
    fn wildcard_none_match() {
        let c = Conditions::none().if_none_match([WILDCARD]);
        assert!(!c.forbids_existing(None));
        assert!(c.forbids_existing(Some(&Version::new(1, "x"))));
        assert!(!Conditions::none()
            .if_none_match(["1:x"])
            .forbids_existing(Some(&Version::new(1, "x"))));
    }

    #[test]
    fn collect_tokens() {
        let tokens: VersionTokens = vec!["a".to_string(), "b".to_string()].into_iter().collect();
        assert!(tokens.contains("a"));
        assert!(!tokens.has_wildcard());
        assert!(!tokens.is_empty());
    }
}
