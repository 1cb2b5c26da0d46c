use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use memorial_core::AdminMirror;
use memorial_core::AdminRoleRecord;

use crate::json_file::read_json;
use crate::json_file::run_blocking;
use crate::json_file::write_json;
use crate::model::AdminRoleRow;

type Roles = BTreeMap<String, AdminRoleRow>;

/// `roles_admin` mirror: one entry per promoted account. A repeated grant
/// overwrites the entry with the newer timestamp.
#[derive(Debug, Clone)]
pub struct JsonAdminMirror {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonAdminMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn get(&self, uid: &str) -> anyhow::Result<Option<AdminRoleRecord>> {
        let roles: Roles = read_json(&self.path)?;
        Ok(roles.get(uid).cloned().map(|row| row.into_record(uid)))
    }

    pub fn list(&self) -> anyhow::Result<Vec<AdminRoleRecord>> {
        let roles: Roles = read_json(&self.path)?;
        Ok(roles
            .into_iter()
            .map(|(uid, row)| row.into_record(&uid))
            .collect())
    }

    fn upsert(&self, uid: String, row: AdminRoleRow) -> anyhow::Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("roles_admin lock poisoned"))?;
        let mut roles: Roles = read_json(&self.path)?;
        roles.insert(uid, row);
        write_json(&self.path, &roles).context("failed to write roles_admin")
    }
}

#[async_trait]
impl AdminMirror for JsonAdminMirror {
    async fn record_grant(&self, record: &AdminRoleRecord) -> anyhow::Result<()> {
        let mirror = self.clone();
        let uid = record.uid.clone();
        let row = AdminRoleRow::from(record);
        run_blocking(move || mirror.upsert(uid, row)).await
    }
}
