use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use memorial_cli::AccountsCommand;
use memorial_cli::MakeAdminCommand;
use memorial_cli::MemorialsCommand;
use memorial_cli::TokenCommand;
use memorial_cli::load_config;
use tracing_subscriber::EnvFilter;

/// Memorial pages: operator tooling and the hosted functions server.
#[derive(Debug, Parser)]
#[command(name = "memorial", version)]
struct MemorialCli {
    /// Directory holding config.toml and the data directory
    /// (defaults to $MEMORIAL_HOME or ~/.memorial).
    #[arg(long, env = "MEMORIAL_HOME", global = true)]
    memorial_home: Option<PathBuf>,

    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
enum Subcommand {
    /// Grant the administrator claim to an account (operator bootstrap).
    MakeAdmin(MakeAdminCommand),
    /// Serve the callable functions over HTTP.
    Serve,
    /// Manage accounts.
    Accounts(AccountsCommand),
    /// Mint a fresh identity token for an account.
    Token(TokenCommand),
    /// Manage memorial pages.
    Memorials(MemorialsCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = MemorialCli::parse();
    init_tracing(matches!(cli.subcommand, Subcommand::Serve));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: MemorialCli) -> anyhow::Result<()> {
    let config = load_config(cli.memorial_home)?;
    match cli.subcommand {
        Subcommand::MakeAdmin(cmd) => cmd.run(&config).await,
        Subcommand::Serve => memorial_functions::serve(&config).await,
        Subcommand::Accounts(cmd) => cmd.run(&config).await,
        Subcommand::Token(cmd) => cmd.run(&config).await,
        Subcommand::Memorials(cmd) => cmd.run(&config).await,
    }
}

/// Logs go to stderr; stdout carries command output only.
fn init_tracing(serving: bool) {
    let default_level = if serving { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
