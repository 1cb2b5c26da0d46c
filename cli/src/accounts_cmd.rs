use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use memorial_core::Directory;
use memorial_core::TokenKeys;
use memorial_core::config::Config;
use memorial_state::StateRuntime;

#[derive(Debug, Parser)]
pub struct AccountsCommand {
    #[command(subcommand)]
    subcommand: AccountsSubcommand,
}

#[derive(Debug, Subcommand)]
enum AccountsSubcommand {
    /// Sign up a new account.
    Add(AddArgs),
    /// Print an account, its claims and profile as JSON.
    Show(ShowArgs),
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Email address for the account.
    #[arg(long)]
    email: String,
    /// Full name; the first word becomes the first name.
    #[arg(long)]
    name: String,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Email of the account.
    #[arg(value_name = "EMAIL")]
    email: String,
}

impl AccountsCommand {
    pub async fn run(self, config: &Config) -> Result<()> {
        let runtime = StateRuntime::from_config(config);
        match self.subcommand {
            AccountsSubcommand::Add(args) => run_add(&runtime, args),
            AccountsSubcommand::Show(args) => run_show(&runtime, args).await,
        }
    }
}

fn run_add(runtime: &StateRuntime, args: AddArgs) -> Result<()> {
    let account = runtime
        .directory
        .create_account(&args.email, &args.name)
        .with_context(|| format!("failed to create account for {}", args.email))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "status": "ok",
            "uid": account.uid,
            "email": account.email,
        }))?
    );
    Ok(())
}

async fn run_show(runtime: &StateRuntime, args: ShowArgs) -> Result<()> {
    let account = runtime
        .directory
        .get_account_by_email(&args.email)
        .await
        .with_context(|| format!("failed to look up {}", args.email))?;
    let profile = runtime.directory.profile(&account.uid)?;
    let mirror = match runtime.mirror.as_ref() {
        Some(mirror) => mirror.get(&account.uid)?,
        None => None,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "account": account,
            "profile": profile,
            "rolesAdmin": mirror,
        }))?
    );
    Ok(())
}

/// Mints a fresh identity token for an account, reflecting its current
/// claims. Clients need a fresh token before a new claim takes effect.
#[derive(Debug, Parser)]
pub struct TokenCommand {
    /// Email of the account.
    #[arg(value_name = "EMAIL")]
    email: String,

    /// Token lifetime in seconds (defaults to the configured TTL).
    #[arg(long)]
    ttl_secs: Option<u64>,
}

impl TokenCommand {
    pub async fn run(self, config: &Config) -> Result<()> {
        let keys = TokenKeys::from_secret(config.require_token_secret()?.as_bytes());
        let runtime = StateRuntime::from_config(config);
        let account = runtime
            .directory
            .get_account_by_email(&self.email)
            .await
            .with_context(|| format!("failed to look up {}", self.email))?;
        let ttl = self
            .ttl_secs
            .map_or(config.token_ttl, Duration::from_secs);
        let token = keys.issue(&account, ttl)?;
        println!("{token}");
        Ok(())
    }
}
