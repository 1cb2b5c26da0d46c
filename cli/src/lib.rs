pub mod accounts_cmd;
pub mod make_admin_cmd;
pub mod memorials_cmd;

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use memorial_core::config::Config;
use memorial_core::config::find_memorial_home;

pub use accounts_cmd::AccountsCommand;
pub use accounts_cmd::TokenCommand;
pub use make_admin_cmd::MakeAdminCommand;
pub use memorials_cmd::MemorialsCommand;

/// Loads configuration from `home`, or from the default memorial home.
pub fn load_config(home: Option<PathBuf>) -> Result<Config> {
    let home = match home {
        Some(home) => home,
        None => find_memorial_home().context("failed to resolve MEMORIAL_HOME")?,
    };
    Config::load(&home)
}
