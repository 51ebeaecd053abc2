//! Commit metadata as extracted by the host.
//!
//! The host (the platform receiving the push) owns the version-control
//! object model; it hands the gate a [`CommitSubmission`] with the fields
//! the checks need: identities, hash/parents, and the raw trailer lines
//! from the end of the commit message.

use serde::{Deserialize, Serialize};

use crate::trailer;

/// Name and email pair as recorded on a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitPerson {
    pub name: String,
    pub mail: String,
}

impl GitPerson {
    pub fn new(name: impl Into<String>, mail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mail: mail.into(),
        }
    }
}

/// A single commit submitted for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSubmission {
    /// Full commit hash.
    pub hash: String,
    /// First line of the commit message.
    pub subject: String,
    /// Full commit message body.
    pub body: String,
    /// Parent commit hashes.
    pub parents: Vec<String>,
    /// Author credentials recorded on the commit.
    pub author: GitPerson,
    /// Committer credentials recorded on the commit.
    pub committer: GitPerson,
    /// Raw trailer lines from the end of the commit message.
    #[serde(default)]
    pub trailer_lines: Vec<String>,
}

impl CommitSubmission {
    /// Abbreviated hash used in diagnostics (first 8 characters).
    pub fn abbrev_hash(&self) -> &str {
        let end = self.hash.len().min(8);
        &self.hash[..end]
    }

    /// Email addresses found in `Signed-off-by` trailer lines.
    pub fn sign_off_emails(&self) -> Vec<String> {
        trailer::sign_off_emails(&self.trailer_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(hash: &str, trailers: &[&str]) -> CommitSubmission {
        CommitSubmission {
            hash: hash.to_string(),
            subject: "Fix the frobnicator".to_string(),
            body: "Fix the frobnicator\n\nLonger explanation.".to_string(),
            parents: vec!["1111111111111111111111111111111111111111".to_string()],
            author: GitPerson::new("Ada Lovelace", "ada@example.org"),
            committer: GitPerson::new("Ada Lovelace", "ada@example.org"),
            trailer_lines: trailers.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn abbrev_hash_is_eight_chars() {
        let c = submission("0123456789abcdef0123456789abcdef01234567", &[]);
        assert_eq!(c.abbrev_hash(), "01234567");
    }

    #[test]
    fn abbrev_hash_handles_short_input() {
        let c = submission("abc", &[]);
        assert_eq!(c.abbrev_hash(), "abc");
    }

    #[test]
    fn deserializes_host_payload_without_trailers() {
        let commit: CommitSubmission = serde_json::from_str(
            r#"{
                "hash": "0123456789abcdef0123456789abcdef01234567",
                "subject": "Add widget",
                "body": "Add widget",
                "parents": [],
                "author": {"name": "Ada", "mail": "ada@example.org"},
                "committer": {"name": "Ada", "mail": "ada@example.org"}
            }"#,
        )
        .unwrap();
        assert!(commit.trailer_lines.is_empty());
        assert!(commit.sign_off_emails().is_empty());
    }

    #[test]
    fn sign_off_emails_come_from_trailers() {
        let c = submission(
            "0123456789abcdef0123456789abcdef01234567",
            &["Signed-off-by: Ada Lovelace <ada@example.org>"],
        );
        assert_eq!(c.sign_off_emails(), vec!["ada@example.org".to_string()]);
    }
}
