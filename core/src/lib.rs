//! Core domain for the memorial pages service.
//!
//! The interesting contract here is the administrator grant: a caller holding
//! a token with `isAdmin = true` may promote another account, identified by
//! email, to administrator. The grant is expressed against the [`Directory`]
//! and [`AdminMirror`] traits so the hosting process decides where accounts
//! and mirror records actually live.

pub mod claims;
pub mod config;
pub mod directory;
pub mod error;
pub mod grant;
pub mod memorial;
pub mod mirror;
pub mod profile;
pub mod token;

pub use claims::ADMIN_CLAIM;
pub use claims::ClaimSet;
pub use directory::Account;
pub use directory::Directory;
pub use directory::DirectoryError;
pub use error::ErrorKind;
pub use error::GrantError;
pub use grant::AdminGrant;
pub use grant::MakeAdminRequest;
pub use grant::MakeAdminResponse;
pub use mirror::AdminMirror;
pub use mirror::AdminRoleRecord;
pub use token::DecodedToken;
pub use token::TokenKeys;
