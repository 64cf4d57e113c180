//! Lifecycle of one remote edit transaction.
//!
//! All staged changes hang off a single server-assigned edit id and become
//! visible only on commit. A session moves `Unopened -> Open -> Committed`
//! and is never reused: re-reading server state after an ambiguous commit
//! goes through a brand-new session.

use crate::error::Result;
use crate::play::PublishApi;
use crate::play::models::Apk;

/// Lifecycle state of an edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EditState {
    Unopened,
    Open { edit_id: String },
    Committed,
}

/// One transactional edit against a single application.
pub struct EditSession<'a, A> {
    api: &'a A,
    application_id: &'a str,
    state: EditState,
}

impl<'a, A: PublishApi> EditSession<'a, A> {
    /// Creates an unopened session for `application_id`.
    pub fn new(api: &'a A, application_id: &'a str) -> Self {
        Self {
            api,
            application_id,
            state: EditState::Unopened,
        }
    }

    /// Opens the edit. This doubles as a credential and connectivity check,
    /// since it is the first call of every run.
    ///
    /// # Panics
    /// Panics if the session was already opened; sessions are never reused,
    /// a fresh read of server state gets a fresh session.
    pub async fn open(&mut self) -> Result<&str> {
        assert!(
            self.state == EditState::Unopened,
            "edit session cannot be reopened"
        );
        let edit = self.api.open_edit(self.application_id).await?;
        log::debug!("opened edit {} for {}", edit.id, self.application_id);
        self.state = EditState::Open { edit_id: edit.id };
        Ok(self.edit_id())
    }

    /// The server-assigned edit id.
    ///
    /// # Panics
    /// Panics if the session has not been opened; the orchestration always
    /// opens before staging changes.
    pub fn edit_id(&self) -> &str {
        match &self.state {
            EditState::Open { edit_id } => edit_id,
            _ => panic!("edit session is not open"),
        }
    }

    /// Lists the APKs the application currently has. An absent list from the
    /// server reads as empty.
    pub async fn list_existing_apks(&self) -> Result<Vec<Apk>> {
        let apks = self
            .api
            .list_apks(self.application_id, self.edit_id())
            .await?;
        Ok(apks)
    }

    /// Commits all staged changes. On success the session is finished and
    /// cannot stage further calls.
    ///
    /// A timeout here is an ambiguous outcome, not a failure: the server may
    /// well have applied the change. Callers match
    /// [`crate::error::ApiError::Timeout`] and
    /// run [`versions_now_present`] against a fresh session to find out.
    pub async fn commit(&mut self) -> Result<()> {
        let edit_id = self.edit_id().to_string();
        self.api.commit_edit(self.application_id, &edit_id).await?;
        self.state = EditState::Committed;
        Ok(())
    }
}

/// Re-reads server state through a brand-new edit and reports which of
/// `version_codes` are now present.
///
/// Used after an ambiguous commit: committing is not safely retryable, but
/// querying state is. The timed-out edit is simply abandoned; the API
/// reclaims it.
pub async fn versions_now_present<A: PublishApi>(
    api: &A,
    application_id: &str,
    version_codes: &[i64],
) -> Result<Vec<i64>> {
    let mut session = EditSession::new(api, application_id);
    session.open().await?;

    let current = session.list_existing_apks().await?;
    let present = version_codes
        .iter()
        .copied()
        .filter(|vc| current.iter().any(|apk| apk.version_code == *vc))
        .collect();
    Ok(present)
}
