use anyhow::Result;
use clap::Parser;
use memorial_core::GrantError;
use memorial_core::config::Config;
use memorial_state::StateRuntime;
use tracing::info;
use tracing::warn;

/// Operator bootstrap: grants the administrator claim without a caller token.
///
/// This is the only way to create the first administrator. It runs with
/// direct access to the data directory, so anyone who can run it already
/// controls the deployment.
#[derive(Debug, Parser)]
pub struct MakeAdminCommand {
    /// Email of the account to promote.
    #[arg(value_name = "EMAIL")]
    pub email: Option<String>,
}

impl MakeAdminCommand {
    pub async fn run(self, config: &Config) -> Result<()> {
        let Some(email) = self.email.filter(|email| !email.trim().is_empty()) else {
            anyhow::bail!(
                "provide an email address as an argument.\nUsage: memorial make-admin you@example.com"
            );
        };

        let runtime = StateRuntime::from_config(config);
        println!("Using data directory {}.", runtime.data_dir.display());
        println!("Attempting to make \"{email}\" an administrator...");

        let grant = runtime.admin_grant();
        let outcome = match grant.find_account(&email).await {
            Ok(account) => {
                println!("Found user: {}", account.uid);
                grant.bootstrap_account(account).await
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(account) => {
                info!(uid = %account.uid, "make-admin bootstrap complete");
                println!("\nSuccess! The user \"{email}\" is now an administrator.");
                println!("Sign out and sign back in to see the changes.");
                Ok(())
            }
            Err(GrantError::NotFound { .. }) => {
                warn!(email = %email, "bootstrap target not found");
                anyhow::bail!("user with email \"{email}\" not found.")
            }
            Err(GrantError::Internal(source)) => {
                Err(source.context("an unexpected error occurred"))
            }
            Err(err) => Err(err.into()),
        }
    }
}
