use memorial_core::Account;
use memorial_core::profile::UserProfile;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAccount {
    #[serde(flatten)]
    pub account: Account,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}
