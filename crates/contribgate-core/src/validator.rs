//! Commit validation orchestrator.
//!
//! Sequences the authorization checks for one commit (committer, agreement,
//! bot exemption, sign-off, delegation, in that fixed order) into a single
//! [`ValidationOutcome`]. Every blocking failure found in the
//! agreement/bot/sign-off phase is collected before the commit is rejected,
//! so a submitter can fix everything in one cycle instead of iterating.
//!
//! Checks 2 and 3 fan out concurrent queries internally (see the resolver in
//! `contribgate-remote`), but the checks themselves run sequentially: most
//! authors already hold an agreement, so the bot-registry lookup only runs
//! when the cheaper common case has failed.

use std::sync::Arc;

use crate::directory::{AccountDirectory, AuthoritySource, CommitterRegistry};
use crate::domain::{CommitSubmission, Identity, Result, ValidationOutcome, ValidationStep};
use crate::obs;

const SEPARATOR: &str = "----------";

/// Orchestrates the per-commit authorization decision.
pub struct CommitValidator {
    committers: Arc<dyn CommitterRegistry>,
    accounts: Arc<dyn AccountDirectory>,
    authority: Arc<dyn AuthoritySource>,
    docs_url: String,
}

impl CommitValidator {
    pub fn new(
        committers: Arc<dyn CommitterRegistry>,
        accounts: Arc<dyn AccountDirectory>,
        authority: Arc<dyn AuthoritySource>,
    ) -> Self {
        Self {
            committers,
            accounts,
            authority,
            docs_url: "https://docs.contribgate.dev/contributing".to_string(),
        }
    }

    /// Override the documentation pointer appended to rejections.
    pub fn with_docs_url(mut self, docs_url: impl Into<String>) -> Self {
        self.docs_url = docs_url.into();
        self
    }

    /// Validate a single commit. Invoked once per commit in a push; commits
    /// within a push may be validated concurrently by the host.
    ///
    /// Returns `Ok` with a passed or failed [`ValidationOutcome`]; `Err`
    /// means the remote service could not be consulted and the commit must
    /// be blocked with a "could not verify" message rather than a content
    /// rejection.
    pub async fn validate(
        &self,
        project: &str,
        pusher: &Identity,
        commit: &CommitSubmission,
    ) -> Result<ValidationOutcome> {
        let _span = obs::ValidationSpan::enter(commit.abbrev_hash());
        obs::emit_validation_started(commit.abbrev_hash(), project);

        let mut outcome = ValidationOutcome::new();
        outcome.push_note(SEPARATOR);
        outcome.push_note(format!("Reviewing commit: {}", commit.abbrev_hash()));
        outcome.push_note(format!(
            "Authored by: {} <{}>",
            commit.author.name, commit.author.mail
        ));
        outcome.push_note("");

        let author = self.resolve_author(commit, &mut outcome).await;

        let author_is_committer = author.has_account()
            && self.committers.is_committer(&author, project).await;
        obs::emit_check_resolved(
            commit.abbrev_hash(),
            ValidationStep::CommitterCheck,
            author_is_committer,
        );

        if author_is_committer {
            outcome.push_info(
                ValidationStep::CommitterCheck,
                "The author is a committer on the project.",
            );
        } else {
            outcome.push_info(
                ValidationStep::CommitterCheck,
                "The author is not a committer on the project.",
            );
            self.check_agreement(commit, &author, &mut outcome).await?;
            self.check_sign_off(commit, &author, &mut outcome);

            if !outcome.passed() {
                outcome.push_note(format!("Please see {}", self.docs_url));
                obs::emit_validation_finished(
                    commit.abbrev_hash(),
                    false,
                    outcome.errors().len(),
                );
                return Ok(outcome);
            }
        }
        outcome.push_note("");

        if !self
            .check_delegation(project, commit, pusher, &author, &mut outcome)
            .await
        {
            outcome.push_note(format!("Please see {}", self.docs_url));
            obs::emit_validation_finished(commit.abbrev_hash(), false, outcome.errors().len());
            return Ok(outcome);
        }

        outcome.push_note("This commit passes validation.");
        obs::emit_validation_finished(commit.abbrev_hash(), true, 0);
        Ok(outcome)
    }

    /// Build the author identity from the commit credentials, enriched with
    /// the username and secondary emails of a local account when one exists.
    async fn resolve_author(
        &self,
        commit: &CommitSubmission,
        outcome: &mut ValidationOutcome,
    ) -> Identity {
        let mut author = Identity::new(&commit.author.name, &commit.author.mail);
        match self.accounts.resolve(&commit.author.mail).await {
            Some(account) => {
                author = author
                    .with_username(account.username)
                    .with_known_emails(account.emails);
            }
            None => {
                outcome.push_note("The author does not have an account on this server.");
            }
        }
        author
    }

    /// Agreement check, falling through to the bot-exemption check before
    /// deciding: registered automation identities need no agreement.
    async fn check_agreement(
        &self,
        commit: &CommitSubmission,
        author: &Identity,
        outcome: &mut ValidationOutcome,
    ) -> Result<()> {
        let has_agreement = self
            .authority
            .has_signed_agreement(author)
            .await
            .map_err(|e| {
                obs::emit_resolution_failed(
                    commit.abbrev_hash(),
                    ValidationStep::AgreementCheck,
                    &e,
                );
                e
            })?;
        obs::emit_check_resolved(
            commit.abbrev_hash(),
            ValidationStep::AgreementCheck,
            has_agreement,
        );

        if has_agreement {
            outcome.push_info(
                ValidationStep::AgreementCheck,
                "The author has a current contributor agreement on file.",
            );
            return Ok(());
        }

        let bot_exempt = self.authority.is_bot_exempt(author).await.map_err(|e| {
            obs::emit_resolution_failed(
                commit.abbrev_hash(),
                ValidationStep::BotExemptionCheck,
                &e,
            );
            e
        })?;
        obs::emit_check_resolved(
            commit.abbrev_hash(),
            ValidationStep::BotExemptionCheck,
            bot_exempt,
        );

        if bot_exempt {
            outcome.push_info(
                ValidationStep::BotExemptionCheck,
                "The author is a registered automation account and is exempt \
                 from the agreement requirement.",
            );
        } else {
            outcome.push_error(
                ValidationStep::AgreementCheck,
                "The author does not have a current contributor agreement on file.\n\
                 If there are multiple commits, please ensure that each author \
                 has a current agreement.",
            );
            outcome.block("An agreement is required.");
        }
        Ok(())
    }

    /// The commit must carry a sign-off whose email matches the author's
    /// commit email or any email registered with the author's account.
    fn check_sign_off(
        &self,
        commit: &CommitSubmission,
        author: &Identity,
        outcome: &mut ValidationOutcome,
    ) {
        let signed_off = commit
            .sign_off_emails()
            .iter()
            .any(|email| author.known_emails().any(|known| known == email));
        obs::emit_check_resolved(commit.abbrev_hash(), ValidationStep::SignOffCheck, signed_off);

        if signed_off {
            outcome.push_info(
                ValidationStep::SignOffCheck,
                "The author has signed off on the contribution.",
            );
        } else {
            outcome.push_error(
                ValidationStep::SignOffCheck,
                "The author has not signed off on the contribution.\n\
                 If there are multiple commits, please ensure that each commit \
                 is signed off.",
            );
            outcome.block("The contributor must sign off on the contribution.");
        }
    }

    /// Only committers can push on behalf of other users. Returns whether
    /// the check passed.
    async fn check_delegation(
        &self,
        project: &str,
        commit: &CommitSubmission,
        pusher: &Identity,
        author: &Identity,
        outcome: &mut ValidationOutcome,
    ) -> bool {
        let pushing_own_commit = author.has_account() && author.same_account(pusher);
        if pushing_own_commit {
            return true;
        }

        let pusher_is_committer = self.committers.is_committer(pusher, project).await;
        obs::emit_check_resolved(
            commit.abbrev_hash(),
            ValidationStep::DelegationCheck,
            pusher_is_committer,
        );
        if pusher_is_committer {
            return true;
        }

        outcome.push_error(ValidationStep::DelegationCheck, "You are not a project committer.");
        outcome.push_error(
            ValidationStep::DelegationCheck,
            "Only project committers can push on behalf of others.",
        );
        outcome.block("You must be a committer to push on behalf of others.");
        false
    }
}
