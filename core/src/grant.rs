//! Administrator grant.
//!
//! `AdminGrant::make_admin` is the gated operation: authorize the caller,
//! resolve the target email, merge `isAdmin = true` into the target's claims,
//! then write the advisory mirror record. `AdminGrant::bootstrap` runs the
//! same lookup and merge without a caller and is only reachable from the
//! operator CLI, which is how the first administrator gets created.

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::directory::Account;
use crate::directory::Directory;
use crate::directory::DirectoryError;
use crate::error::GrantError;
use crate::mirror::AdminMirror;
use crate::mirror::AdminRoleRecord;
use crate::token::DecodedToken;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MakeAdminRequest {
    #[serde(default)]
    pub email: Option<String>,
}

impl MakeAdminRequest {
    pub fn for_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeAdminResponse {
    pub message: String,
}

/// Fails unless the caller's token carries `isAdmin = true`.
pub fn authorize(caller: &DecodedToken) -> Result<(), GrantError> {
    if caller.is_admin() {
        return Ok(());
    }
    debug!(caller = %caller.sub, "make-admin denied: caller is not an administrator");
    Err(GrantError::PermissionDenied)
}

#[derive(Clone)]
pub struct AdminGrant {
    directory: Arc<dyn Directory>,
    mirror: Option<Arc<dyn AdminMirror>>,
}

impl AdminGrant {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self {
            directory,
            mirror: None,
        }
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn AdminMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub async fn make_admin(
        &self,
        caller: &DecodedToken,
        request: MakeAdminRequest,
    ) -> Result<MakeAdminResponse, GrantError> {
        authorize(caller)?;
        let email = required_email(request.email.as_deref())?;

        let account = self.promote(email).await?;
        info!(caller = %caller.sub, uid = %account.uid, email, "granted administrator claim");

        Ok(MakeAdminResponse {
            message: format!("Success! {email} has been made an admin."),
        })
    }

    /// Operator-only grant that skips the caller check.
    pub async fn bootstrap(&self, email: &str) -> Result<Account, GrantError> {
        let account = self.find_account(email).await?;
        self.bootstrap_account(account).await
    }

    /// Resolves the bootstrap target without changing anything.
    pub async fn find_account(&self, email: &str) -> Result<Account, GrantError> {
        let email = required_email(Some(email))?;
        self.lookup(email).await
    }

    /// Second half of [`AdminGrant::bootstrap`] for an account already
    /// resolved with [`AdminGrant::find_account`].
    pub async fn bootstrap_account(&self, account: Account) -> Result<Account, GrantError> {
        let account = self.grant_claim(account).await?;
        info!(uid = %account.uid, email = %account.email, "bootstrapped administrator claim");
        Ok(account)
    }

    async fn promote(&self, email: &str) -> Result<Account, GrantError> {
        let account = self.lookup(email).await?;
        self.grant_claim(account).await
    }

    async fn grant_claim(&self, mut account: Account) -> Result<Account, GrantError> {
        let claims = account.custom_claims.with_admin();
        self.directory
            .set_custom_claims(&account.uid, claims.clone())
            .await
            .map_err(|err| internal("set custom claims", err))?;
        account.custom_claims = claims;

        self.record_mirror(&account.uid).await;
        Ok(account)
    }

    async fn lookup(&self, email: &str) -> Result<Account, GrantError> {
        match self.directory.get_account_by_email(email).await {
            Ok(account) => Ok(account),
            Err(DirectoryError::AccountNotFound(_)) => Err(GrantError::NotFound {
                email: email.to_string(),
            }),
            Err(err) => Err(internal("look up account", err)),
        }
    }

    async fn record_mirror(&self, uid: &str) {
        let Some(mirror) = self.mirror.as_ref() else {
            return;
        };
        let record = AdminRoleRecord::granted_now(uid);
        if let Err(err) = mirror.record_grant(&record).await {
            warn!(uid, "failed to write admin role mirror: {err:#}");
        }
    }
}

impl std::fmt::Debug for AdminGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGrant")
            .field("mirror", &self.mirror.is_some())
            .finish_non_exhaustive()
    }
}

fn required_email(email: Option<&str>) -> Result<&str, GrantError> {
    match email {
        Some(email) if !email.trim().is_empty() => Ok(email),
        _ => Err(GrantError::InvalidArgument),
    }
}

fn internal(step: &str, err: DirectoryError) -> GrantError {
    error!("make-admin failed to {step}: {err:#}");
    GrantError::Internal(anyhow::Error::new(err).context(format!("failed to {step}")))
}
