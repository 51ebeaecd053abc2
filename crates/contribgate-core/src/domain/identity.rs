//! Author identity model.
//!
//! An [`Identity`] is the resolved view of a commit author: the display name
//! and email taken from the commit itself, optionally enriched with the
//! secondary email addresses and username of a local platform account.
//! Identities are immutable once constructed for a given commit.

use std::collections::BTreeSet;

/// A commit author or pusher identity.
///
/// # Invariants
///
/// `primary_email` is always a member of `known_emails`; the constructor
/// maintains this, so every fan-out over known emails covers the commit
/// email itself. Construction is the only way in, so the invariant cannot
/// be bypassed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    display_name: String,
    primary_email: String,
    known_emails: BTreeSet<String>,
    username: Option<String>,
}

impl Identity {
    /// Create an identity from commit credentials (display name + email).
    pub fn new(display_name: impl Into<String>, primary_email: impl Into<String>) -> Self {
        let primary_email = primary_email.into();
        let mut known_emails = BTreeSet::new();
        known_emails.insert(primary_email.clone());
        Self {
            display_name: display_name.into(),
            primary_email,
            known_emails,
            username: None,
        }
    }

    /// Attach the username of a resolved local account.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Add a secondary email address learned from a local account.
    pub fn with_known_email(mut self, email: impl Into<String>) -> Self {
        self.known_emails.insert(email.into());
        self
    }

    /// Add several secondary email addresses at once.
    pub fn with_known_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for email in emails {
            self.known_emails.insert(email.into());
        }
        self
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The email address recorded on the commit itself.
    pub fn primary_email(&self) -> &str {
        &self.primary_email
    }

    /// All email addresses attributable to this identity, primary included.
    pub fn known_emails(&self) -> impl Iterator<Item = &str> {
        self.known_emails.iter().map(String::as_str)
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Whether this identity carries a resolved local account.
    pub fn has_account(&self) -> bool {
        self.username.is_some()
    }

    /// Whether two identities refer to the same account.
    ///
    /// Usernames are compared when both sides carry one; otherwise the
    /// commit email addresses decide.
    pub fn same_account(&self, other: &Identity) -> bool {
        match (&self.username, &other.username) {
            (Some(a), Some(b)) => a == b,
            _ => self.primary_email == other.primary_email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_email_is_always_known() {
        let id = Identity::new("Grace Hopper", "grace@navy.mil");
        assert!(id.known_emails().any(|e| e == "grace@navy.mil"));
    }

    #[test]
    fn secondary_emails_accumulate() {
        let id = Identity::new("Grace Hopper", "grace@navy.mil")
            .with_known_email("grace@example.org")
            .with_known_emails(["g.hopper@example.org"]);
        let emails: Vec<&str> = id.known_emails().collect();
        assert_eq!(emails.len(), 3);
        assert!(emails.contains(&"grace@example.org"));
    }

    #[test]
    fn same_account_prefers_usernames() {
        let a = Identity::new("A", "a@example.org").with_username("alice");
        let b = Identity::new("A (alt)", "other@example.org").with_username("alice");
        assert!(a.same_account(&b));
    }

    #[test]
    fn same_account_falls_back_to_email() {
        let a = Identity::new("A", "a@example.org");
        let b = Identity::new("Someone", "a@example.org").with_username("alice");
        assert!(a.same_account(&b));

        let c = Identity::new("C", "c@example.org");
        assert!(!a.same_account(&c));
    }
}
