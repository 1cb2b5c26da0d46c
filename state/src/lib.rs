//! File-backed state for the memorial service: the identity directory, the
//! `roles_admin` mirror and memorial pages, each a JSON document under one
//! data directory.

mod directory;
mod json_file;
mod memorials;
mod mirror;
pub mod model;

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use memorial_core::AdminGrant;
use memorial_core::config::Config;

pub use directory::JsonDirectory;
pub use memorials::MemorialStore;
pub use memorials::StoreError;
pub use mirror::JsonAdminMirror;

pub const ACCOUNTS_FILE: &str = "accounts.json";
pub const ROLES_ADMIN_FILE: &str = "roles_admin.json";
pub const MEMORIALS_FILE: &str = "memorials.json";

/// Stores opened once at process start and shared from there.
#[derive(Debug, Clone)]
pub struct StateRuntime {
    pub data_dir: PathBuf,
    pub directory: Arc<JsonDirectory>,
    pub mirror: Option<Arc<JsonAdminMirror>>,
    pub memorials: Arc<MemorialStore>,
}

impl StateRuntime {
    pub fn open(data_dir: &Path, audit_mirror: bool) -> Self {
        let mirror =
            audit_mirror.then(|| Arc::new(JsonAdminMirror::new(data_dir.join(ROLES_ADMIN_FILE))));
        Self {
            data_dir: data_dir.to_path_buf(),
            directory: Arc::new(JsonDirectory::new(data_dir.join(ACCOUNTS_FILE))),
            mirror,
            memorials: Arc::new(MemorialStore::new(data_dir.join(MEMORIALS_FILE))),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::open(&config.data_dir, config.audit_mirror)
    }

    /// The grant operation wired to these stores.
    pub fn admin_grant(&self) -> AdminGrant {
        let grant = AdminGrant::new(self.directory.clone());
        match self.mirror.clone() {
            Some(mirror) => grant.with_mirror(mirror),
            None => grant,
        }
    }
}
