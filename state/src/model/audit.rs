use chrono::DateTime;
use chrono::Utc;
use memorial_core::AdminRoleRecord;
use serde::Deserialize;
use serde::Serialize;

/// Stored shape of a `roles_admin` entry. The account id is the map key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRoleRow {
    pub is_admin: bool,
    pub granted_at: DateTime<Utc>,
}

impl AdminRoleRow {
    pub fn into_record(self, uid: &str) -> AdminRoleRecord {
        AdminRoleRecord {
            uid: uid.to_string(),
            is_admin: self.is_admin,
            granted_at: self.granted_at,
        }
    }
}

impl From<&AdminRoleRecord> for AdminRoleRow {
    fn from(record: &AdminRoleRecord) -> Self {
        Self {
            is_admin: record.is_admin,
            granted_at: record.granted_at,
        }
    }
}
