//! Memorial page documents.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

const MIN_NAME_CHARS: usize = 2;
const MIN_LIFE_SPAN_CHARS: usize = 4;

/// Number of memorials shown in the "recent" listing.
pub const RECENT_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(default)]
    pub hint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memorial {
    pub id: String,
    pub author_id: String,
    pub slug: String,
    pub name: String,
    pub life_span: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image: Option<ImageRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMemorial {
    pub name: String,
    pub life_span: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image: Option<ImageRef>,
}

/// Partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorialPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub life_span: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image: Option<ImageRef>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemorialError {
    #[error("name must be at least 2 characters")]
    NameTooShort,

    #[error("life span must be at least 4 characters (e.g. 1950 - 2024)")]
    LifeSpanTooShort,

    #[error("only the author or an administrator may edit memorial {0}")]
    NotEditable(String),
}

/// Who is acting on a memorial.
#[derive(Debug, Clone, Copy)]
pub struct Editor<'a> {
    pub uid: &'a str,
    pub is_admin: bool,
}

impl NewMemorial {
    pub fn validate(&self) -> Result<(), MemorialError> {
        validate_name(&self.name)?;
        validate_life_span(&self.life_span)
    }
}

impl Memorial {
    pub fn ensure_editable_by(&self, editor: Editor<'_>) -> Result<(), MemorialError> {
        if editor.is_admin || editor.uid == self.author_id {
            Ok(())
        } else {
            Err(MemorialError::NotEditable(self.id.clone()))
        }
    }

    /// Applies `patch` after validating the fields it touches. The slug is
    /// kept stable across renames so existing links keep working.
    pub fn apply(&mut self, patch: MemorialPatch, now: DateTime<Utc>) -> Result<(), MemorialError> {
        if let Some(name) = patch.name.as_deref() {
            validate_name(name)?;
        }
        if let Some(life_span) = patch.life_span.as_deref() {
            validate_life_span(life_span)?;
        }

        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(life_span) = patch.life_span {
            self.life_span = life_span.trim().to_string();
        }
        if let Some(bio) = patch.bio {
            self.bio = Some(bio);
        }
        if let Some(image) = patch.profile_image {
            self.profile_image = Some(image);
        }
        self.updated_at = now;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), MemorialError> {
    if name.trim().chars().count() < MIN_NAME_CHARS {
        return Err(MemorialError::NameTooShort);
    }
    Ok(())
}

fn validate_life_span(life_span: &str) -> Result<(), MemorialError> {
    if life_span.trim().chars().count() < MIN_LIFE_SPAN_CHARS {
        return Err(MemorialError::LifeSpanTooShort);
    }
    Ok(())
}

/// Lower-case, hyphen separated form of `name`, e.g. `John Doe` -> `john-doe`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_dash = true;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "memorial".to_string()
    } else {
        slug
    }
}

/// First slug derived from `name` that `taken` does not already contain:
/// `john-doe`, then `john-doe-2`, `john-doe-3`, ...
pub fn unique_slug<F>(name: &str, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base = slugify(name);
    if !taken(&base) {
        return base;
    }
    let mut suffix = 2usize;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
