mod account;
mod audit;

pub use account::StoredAccount;
pub use audit::AdminRoleRow;
