use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::claims::ClaimSet;

/// An account as held by the identity directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub custom_claims: ClaimSet,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("no account matches {0}")]
    AccountNotFound(String),

    #[error("an account already exists for {0}")]
    AccountExists(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// System of record for accounts and their custom claims.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolves an email to its account. Matching is case-insensitive.
    async fn get_account_by_email(&self, email: &str) -> Result<Account, DirectoryError>;

    /// Replaces the custom claim set stored for `uid`. Callers that want to
    /// keep existing claims must merge before calling.
    async fn set_custom_claims(&self, uid: &str, claims: ClaimSet) -> Result<(), DirectoryError>;
}
