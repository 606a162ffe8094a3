use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use contractkit_tools::commands;
use contractkit_tools::config::{Config, EnvInput, ToolkitSettings};
use contractkit_tools::network::validate_profile;
use contractkit_tools::{backend_for, WalletKeys};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "contractkit")]
#[command(about = "Network profiles and account diagnostics for contract development")]
struct Cli {
    /// Network profile to use (defaults to `defaultNetwork`)
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// Settings file (defaults to ./contractkit.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Validate the selected profile before connecting
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the list of accounts
    Accounts,
    /// Print the balances of all accounts
    Balances,
    /// List the configured network profiles
    Networks,
    /// Show the resolved configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check every network profile for missing secrets and malformed URLs
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env = EnvInput::from_process();
    let settings = ToolkitSettings::load(cli.config.as_deref())?;
    let config = Config::resolve(&env, settings, &WalletKeys::embedded())?;
    let profile = config.select(cli.network.as_deref())?;

    init_tracing(profile.verbose_logging);
    env.warn_skipped();
    info!(network = %profile.name, kind = %profile.kind, "resolved network profile");

    if cli.strict {
        let issues = validate_profile(profile);
        for issue in &issues {
            warn!(%issue, "profile issue");
        }
        if !issues.is_empty() {
            bail!("network {} failed validation ({} issues)", profile.name, issues.len());
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Accounts => {
            let backend = backend_for(profile)
                .with_context(|| format!("connecting to network {}", profile.name))?;
            commands::list_accounts(backend.as_ref(), &mut out).await?;
        }
        Commands::Balances => {
            let backend = backend_for(profile)
                .with_context(|| format!("connecting to network {}", profile.name))?;
            commands::list_balances(backend.as_ref(), &mut out).await?;
        }
        Commands::Networks => {
            commands::list_networks(&config.profiles, &mut out)?;
        }
        Commands::Config { json } => {
            if json {
                writeln!(out, "{}", config.to_json()?)?;
            } else {
                config.print_summary(profile);
            }
        }
        Commands::Check => {
            let issues = config.profiles.validate();
            if commands::report_issues(&issues, &mut out)? > 0 {
                bail!("{} configuration issues found", issues.len());
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}
