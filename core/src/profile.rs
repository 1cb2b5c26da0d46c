use serde::Deserialize;
use serde::Serialize;

/// Role assigned to every account at signup.
pub const DEFAULT_USER_ROLE: &str = "free user";

/// Profile document created next to the directory account at signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_role: String,
}

impl UserProfile {
    /// Splits `full_name` at the first space: the first word becomes the
    /// first name, everything after it the last name, spacing kept as typed.
    pub fn from_signup(id: impl Into<String>, email: impl Into<String>, full_name: &str) -> Self {
        let (first_name, last_name) = full_name
            .split_once(' ')
            .unwrap_or((full_name, ""));
        Self {
            id: id.into(),
            email: email.into(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            user_role: DEFAULT_USER_ROLE.to_string(),
        }
    }

    pub fn display_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}
