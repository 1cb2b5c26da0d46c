use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

use chrono::Utc;
use memorial_core::memorial::Editor;
use memorial_core::memorial::Memorial;
use memorial_core::memorial::MemorialError;
use memorial_core::memorial::MemorialPatch;
use memorial_core::memorial::NewMemorial;
use memorial_core::memorial::unique_slug;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::json_file::read_json;
use crate::json_file::write_json;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("memorial not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Invalid(#[from] MemorialError),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Memorial pages stored as one `memorials.json` array.
#[derive(Debug)]
pub struct MemorialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MemorialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn create(&self, author_id: &str, draft: NewMemorial) -> Result<Memorial, StoreError> {
        draft.validate()?;
        let _guard = self.guard()?;
        let mut memorials = self.load()?;

        let name = draft.name.trim().to_string();
        let slug = unique_slug(&name, |candidate| {
            memorials.iter().any(|memorial| memorial.slug == candidate)
        });
        let now = Utc::now();
        let memorial = Memorial {
            id: Uuid::new_v4().simple().to_string(),
            author_id: author_id.to_string(),
            slug,
            name,
            life_span: draft.life_span.trim().to_string(),
            bio: draft.bio.filter(|bio| !bio.trim().is_empty()),
            profile_image: draft.profile_image,
            created_at: now,
            updated_at: now,
        };
        memorials.push(memorial.clone());
        self.save(&memorials)?;
        info!(id = %memorial.id, slug = %memorial.slug, author = author_id, "created memorial");
        Ok(memorial)
    }

    pub fn get(&self, id: &str) -> Result<Memorial, StoreError> {
        let _guard = self.guard()?;
        self.load()?
            .into_iter()
            .find(|memorial| memorial.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn find_by_slug(&self, slug: &str) -> Result<Memorial, StoreError> {
        let _guard = self.guard()?;
        self.load()?
            .into_iter()
            .find(|memorial| memorial.slug == slug)
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))
    }

    /// Newest first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<Memorial>, StoreError> {
        let _guard = self.guard()?;
        let mut memorials = self.load()?;
        memorials.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        memorials.truncate(limit);
        Ok(memorials)
    }

    pub fn list_by_author(&self, author_id: &str) -> Result<Vec<Memorial>, StoreError> {
        let _guard = self.guard()?;
        let mut memorials: Vec<Memorial> = self
            .load()?
            .into_iter()
            .filter(|memorial| memorial.author_id == author_id)
            .collect();
        memorials.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(memorials)
    }

    pub fn update(
        &self,
        id: &str,
        editor: Editor<'_>,
        patch: MemorialPatch,
    ) -> Result<Memorial, StoreError> {
        let _guard = self.guard()?;
        let mut memorials = self.load()?;
        let memorial = memorials
            .iter_mut()
            .find(|memorial| memorial.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        memorial.ensure_editable_by(editor)?;
        memorial.apply(patch, Utc::now())?;
        let updated = memorial.clone();
        self.save(&memorials)?;
        info!(id, editor = editor.uid, "updated memorial");
        Ok(updated)
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Backend(anyhow::anyhow!("memorial store lock poisoned")))
    }

    fn load(&self) -> Result<Vec<Memorial>, StoreError> {
        Ok(read_json(&self.path)?)
    }

    fn save(&self, memorials: &[Memorial]) -> Result<(), StoreError> {
        Ok(write_json(&self.path, memorials)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn store() -> (tempfile::TempDir, MemorialStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MemorialStore::new(dir.path().join("memorials.json"));
        (dir, store)
    }

    fn draft(name: &str) -> NewMemorial {
        NewMemorial {
            name: name.to_string(),
            life_span: "1950 - 2024".to_string(),
            bio: Some("Loved woodworking.".to_string()),
            profile_image: None,
        }
    }

    #[test]
    fn create_assigns_unique_slugs() {
        let (_dir, store) = store();
        let first = store.create("author", draft("John Doe")).expect("first");
        let second = store.create("author", draft("John Doe")).expect("second");

        assert_eq!(first.slug, "john-doe");
        assert_eq!(second.slug, "john-doe-2");
        assert_eq!(store.find_by_slug("john-doe-2").expect("by slug").id, second.id);
    }

    #[test]
    fn create_rejects_invalid_draft() {
        let (_dir, store) = store();
        let err = store.create("author", draft("J")).expect_err("too short");
        assert_matches!(err, StoreError::Invalid(MemorialError::NameTooShort));
        assert!(store.list_recent(8).expect("list").is_empty());
    }

    #[test]
    fn list_recent_is_newest_first_and_limited() {
        let (_dir, store) = store();
        for name in ["Alpha One", "Beta Two", "Gamma Three"] {
            store.create("author", draft(name)).expect("create");
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let names: Vec<String> = store
            .list_recent(2)
            .expect("list")
            .into_iter()
            .map(|memorial| memorial.name)
            .collect();
        assert_eq!(names, vec!["Gamma Three".to_string(), "Beta Two".to_string()]);
    }

    #[test]
    fn list_by_author_filters() {
        let (_dir, store) = store();
        store.create("a", draft("Alpha One")).expect("create");
        store.create("b", draft("Beta Two")).expect("create");

        let mine = store.list_by_author("a").expect("list");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].author_id, "a");
    }

    #[test]
    fn update_enforces_editor() {
        let (_dir, store) = store();
        let memorial = store.create("author", draft("John Doe")).expect("create");
        let patch = MemorialPatch {
            bio: Some("Updated".to_string()),
            ..MemorialPatch::default()
        };

        let err = store
            .update(
                &memorial.id,
                Editor {
                    uid: "stranger",
                    is_admin: false,
                },
                patch.clone(),
            )
            .expect_err("stranger");
        assert_matches!(err, StoreError::Invalid(MemorialError::NotEditable(_)));

        let updated = store
            .update(
                &memorial.id,
                Editor {
                    uid: "stranger",
                    is_admin: true,
                },
                patch,
            )
            .expect("admin may edit");
        assert_eq!(updated.bio.as_deref(), Some("Updated"));
        assert_eq!(store.get(&memorial.id).expect("get"), updated);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let (_dir, store) = store();
        let err = store
            .update(
                "nope",
                Editor {
                    uid: "author",
                    is_admin: false,
                },
                MemorialPatch::default(),
            )
            .expect_err("missing");
        assert_matches!(err, StoreError::NotFound(id) if id == "nope");
    }
}
