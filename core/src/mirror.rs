use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Advisory copy of an administrator grant, keyed by account id.
///
/// Never read back for authorization; the `isAdmin` claim is the only
/// authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRoleRecord {
    pub uid: String,
    pub is_admin: bool,
    pub granted_at: DateTime<Utc>,
}

impl AdminRoleRecord {
    pub fn granted_now(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            is_admin: true,
            granted_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait AdminMirror: Send + Sync {
    async fn record_grant(&self, record: &AdminRoleRecord) -> anyhow::Result<()>;
}
