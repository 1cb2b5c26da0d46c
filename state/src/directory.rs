use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;
use chrono::Utc;
use memorial_core::Account;
use memorial_core::ClaimSet;
use memorial_core::Directory;
use memorial_core::DirectoryError;
use memorial_core::profile::UserProfile;
use tracing::info;
use uuid::Uuid;

use crate::json_file::read_json;
use crate::json_file::run_blocking;
use crate::json_file::write_json;
use crate::model::StoredAccount;

type Accounts = BTreeMap<String, StoredAccount>;

/// Identity directory kept in a single `accounts.json` document keyed by
/// account id.
///
/// Every operation re-reads the file under a process-local lock, so several
/// processes may share a data directory but writes from them are not
/// coordinated beyond the atomic rename.
#[derive(Debug, Clone)]
pub struct JsonDirectory {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Signup: creates an account with an empty claim set and its profile.
    pub fn create_account(&self, email: &str, full_name: &str) -> Result<Account, DirectoryError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(DirectoryError::Backend(anyhow::anyhow!("email must not be empty")));
        }

        let _guard = self.guard()?;
        let mut accounts = self.load()?;
        if find_by_email(&accounts, email).is_some() {
            return Err(DirectoryError::AccountExists(email.to_string()));
        }

        let uid = Uuid::new_v4().simple().to_string();
        let profile = UserProfile::from_signup(&uid, email, full_name);
        let display_name = profile.display_name();
        let account = Account {
            uid: uid.clone(),
            email: email.to_string(),
            display_name: (!display_name.is_empty()).then_some(display_name),
            custom_claims: ClaimSet::new(),
            created_at: Utc::now(),
        };
        accounts.insert(
            uid.clone(),
            StoredAccount {
                account: account.clone(),
                profile: Some(profile),
            },
        );
        self.save(&accounts)?;
        info!(uid = %uid, email, "created account");
        Ok(account)
    }

    pub fn profile(&self, uid: &str) -> Result<Option<UserProfile>, DirectoryError> {
        let _guard = self.guard()?;
        Ok(self
            .load()?
            .remove(uid)
            .and_then(|stored| stored.profile))
    }

    pub fn get_account(&self, uid: &str) -> Result<Account, DirectoryError> {
        let _guard = self.guard()?;
        self.load()?
            .remove(uid)
            .map(|stored| stored.account)
            .ok_or_else(|| DirectoryError::AccountNotFound(uid.to_string()))
    }

    fn lookup_email(&self, email: &str) -> Result<Account, DirectoryError> {
        let _guard = self.guard()?;
        let accounts = self.load()?;
        find_by_email(&accounts, email)
            .map(|stored| stored.account.clone())
            .ok_or_else(|| DirectoryError::AccountNotFound(email.to_string()))
    }

    fn replace_claims(&self, uid: &str, claims: ClaimSet) -> Result<(), DirectoryError> {
        let _guard = self.guard()?;
        let mut accounts = self.load()?;
        let stored = accounts
            .get_mut(uid)
            .ok_or_else(|| DirectoryError::AccountNotFound(uid.to_string()))?;
        stored.account.custom_claims = claims;
        self.save(&accounts)
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, DirectoryError> {
        self.lock
            .lock()
            .map_err(|_| DirectoryError::Backend(anyhow::anyhow!("directory lock poisoned")))
    }

    fn load(&self) -> Result<Accounts, DirectoryError> {
        Ok(read_json(&self.path)?)
    }

    fn save(&self, accounts: &Accounts) -> Result<(), DirectoryError> {
        Ok(write_json(&self.path, accounts)?)
    }
}

#[async_trait]
impl Directory for JsonDirectory {
    async fn get_account_by_email(&self, email: &str) -> Result<Account, DirectoryError> {
        let directory = self.clone();
        let email = email.to_string();
        run_blocking(move || directory.lookup_email(&email)).await
    }

    async fn set_custom_claims(&self, uid: &str, claims: ClaimSet) -> Result<(), DirectoryError> {
        let directory = self.clone();
        let uid = uid.to_string();
        run_blocking(move || directory.replace_claims(&uid, claims)).await
    }
}

fn find_by_email<'a>(accounts: &'a Accounts, email: &str) -> Option<&'a StoredAccount> {
    let email = email.trim().to_lowercase();
    accounts
        .values()
        .find(|stored| stored.account.email.to_lowercase() == email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use memorial_core::ADMIN_CLAIM;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn directory() -> (tempfile::TempDir, JsonDirectory) {
        let dir = tempfile::tempdir().expect("tempdir");
        let directory = JsonDirectory::new(dir.path().join("accounts.json"));
        (dir, directory)
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let (_dir, directory) = directory();
        let created = directory
            .create_account("User@Example.com", "Jane Smith")
            .expect("create");

        let found = directory
            .get_account_by_email("user@example.COM")
            .await
            .expect("lookup");
        assert_eq!(found.uid, created.uid);
        assert_eq!(found.display_name.as_deref(), Some("Jane Smith"));
    }

    #[tokio::test]
    async fn lookup_folds_non_ascii_case() {
        let (_dir, directory) = directory();
        let created = directory
            .create_account("ÜSER@example.com", "Jane Smith")
            .expect("create");

        let found = directory
            .get_account_by_email("üser@example.com")
            .await
            .expect("lookup");
        assert_eq!(found.uid, created.uid);
        let err = directory
            .create_account("üser@EXAMPLE.com", "Someone Else")
            .expect_err("same address");
        assert_matches!(err, DirectoryError::AccountExists(_));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_claim_writes_for_different_accounts_all_persist() {
        let (_dir, directory) = directory();
        let first = directory
            .create_account("first@example.com", "First")
            .expect("create");
        let second = directory
            .create_account("second@example.com", "Second")
            .expect("create");

        let (a, b) = tokio::join!(
            directory.set_custom_claims(&first.uid, ClaimSet::from_iter([("tier", json!("gold"))])),
            directory.set_custom_claims(&second.uid, ClaimSet::new().with_admin()),
        );
        a.expect("first write");
        b.expect("second write");

        assert_eq!(
            directory.get_account(&first.uid).expect("get").custom_claims.get("tier"),
            Some(&json!("gold"))
        );
        assert!(directory.get_account(&second.uid).expect("get").custom_claims.is_admin());
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let (_dir, directory) = directory();
        let err = directory
            .get_account_by_email("ghost@example.com")
            .await
            .expect_err("no accounts");
        assert_matches!(err, DirectoryError::AccountNotFound(email) if email == "ghost@example.com");
    }

    #[test]
    fn duplicate_signup_is_rejected() {
        let (_dir, directory) = directory();
        directory
            .create_account("user@example.com", "Jane Smith")
            .expect("create");
        let err = directory
            .create_account("USER@example.com", "Someone Else")
            .expect_err("duplicate");
        assert_matches!(err, DirectoryError::AccountExists(_));
    }

    #[test]
    fn signup_writes_profile() {
        let (_dir, directory) = directory();
        let account = directory
            .create_account("ana@example.com", "Ana Maria Souza")
            .expect("create");

        let profile = directory
            .profile(&account.uid)
            .expect("profile read")
            .expect("profile present");
        assert_eq!(profile.first_name, "Ana");
        assert_eq!(profile.last_name, "Maria Souza");
        assert_eq!(profile.user_role, "free user");
        assert!(account.custom_claims.is_empty());
    }

    #[tokio::test]
    async fn set_custom_claims_replaces_and_persists() {
        let (dir, directory) = directory();
        let account = directory
            .create_account("user@example.com", "Jane Smith")
            .expect("create");

        let claims = ClaimSet::from_iter([("tier", json!("gold")), (ADMIN_CLAIM, json!(true))]);
        directory
            .set_custom_claims(&account.uid, claims.clone())
            .await
            .expect("set claims");

        let reopened = JsonDirectory::new(dir.path().join("accounts.json"));
        assert_eq!(
            reopened.get_account(&account.uid).expect("get").custom_claims,
            claims
        );
    }

    #[tokio::test]
    async fn set_custom_claims_for_unknown_uid_fails() {
        let (_dir, directory) = directory();
        let err = directory
            .set_custom_claims("missing", ClaimSet::new())
            .await
            .expect_err("unknown uid");
        assert_matches!(err, DirectoryError::AccountNotFound(_));
    }
}
