//! nodehost CLI - command-line tool for the nodehost provisioning API
//!
//! Signs every request with the shared application secret and exposes the
//! account, provisioning, dashboard and log-streaming operations.

mod commands;
mod config;
mod output;
mod session_store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nodehost_client::{ClientConfig, NodehostClient};
use secrecy::SecretString;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::output::{OutputContext, OutputFormat};
use crate::session_store::TomlSessionStore;

#[derive(Parser)]
#[command(name = "nodehost-cli")]
#[command(author, version, about = "Nodehost provisioning CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// API base URL
    #[arg(
        short,
        long,
        env = "NODEHOST_API_URL",
        default_value = "http://localhost:5000"
    )]
    server: String,

    /// Shared signing secret
    #[arg(long, env = "NODEHOST_APP_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "NODEHOST_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register {
        /// Display name
        username: String,

        /// Email address
        email: String,

        /// Password
        password: String,
    },

    /// Log in and store the session
    Login {
        /// Email address
        email: String,

        /// Password
        password: String,
    },

    /// Discard the stored session
    Logout,

    /// Confirm an email address
    VerifyEmail {
        /// Verification token from the email
        token: String,

        /// Email address being verified
        email: String,
    },

    /// List provisioned projects with live instance status
    Projects,

    /// Create a project record
    CreateProject {
        /// Catalog project id
        project_id: i64,

        /// Node software version
        version: String,
    },

    /// Provision a VM for a project and set it up end to end
    Provision {
        /// Catalog project id
        project_id: i64,

        /// Wallet type to generate for the node
        #[arg(long, default_value = "solana")]
        wallet_type: String,
    },

    /// Cancel a provisioned instance
    Cancel {
        /// Instance id (e.g. vmi-1001)
        instance_id: String,
    },

    /// Tail live logs from an instance (Ctrl+C to stop)
    Logs {
        /// Instance IP address
        ip_address: String,
    },

    /// Consume the numeric test stream
    Numbers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(Some(&cli.server), cli.secret.as_deref(), cli.no_color);

    // Create output context
    let ctx = OutputContext::new(cli.output, merged.no_color, cli.quiet);

    let sessions = TomlSessionStore::default_path()?;

    match &cli.command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            let client = create_client(&merged)?;
            commands::register(&client, username, email, password, &ctx).await?;
        }

        Commands::Login { email, password } => {
            let client = create_client(&merged)?;
            commands::login(&client, &sessions, email, password, &ctx).await?;
        }

        Commands::Logout => {
            commands::logout(&sessions, &ctx)?;
        }

        Commands::VerifyEmail { token, email } => {
            let client = create_client(&merged)?;
            commands::verify_email(&client, token, email, &ctx).await?;
        }

        Commands::Projects => {
            let client = create_client(&merged)?;
            commands::projects(&client, &sessions, &ctx).await?;
        }

        Commands::CreateProject {
            project_id,
            version,
        } => {
            let client = create_client(&merged)?;
            commands::create_project(&client, &sessions, *project_id, version, &ctx).await?;
        }

        Commands::Provision {
            project_id,
            wallet_type,
        } => {
            let client = create_client(&merged)?;
            commands::provision(&client, &sessions, *project_id, wallet_type, &ctx).await?;
        }

        Commands::Cancel { instance_id } => {
            let client = create_client(&merged)?;
            commands::cancel(&client, instance_id, &ctx).await?;
        }

        Commands::Logs { ip_address } => {
            let client = create_client(&merged)?;
            commands::logs(&client, ip_address, &ctx).await?;
        }

        Commands::Numbers => {
            let client = create_client(&merged)?;
            commands::numbers(&client, &ctx).await?;
        }
    }

    Ok(())
}

/// Create a signing client from the resolved configuration
fn create_client(merged: &config::MergedConfig) -> Result<NodehostClient> {
    let secret = merged
        .secret
        .as_deref()
        .context("No signing secret configured (set NODEHOST_APP_SECRET or --secret)")?;

    let config = ClientConfig::new(&merged.server, SecretString::from(secret.to_string()))
        .context("Invalid client configuration")?;

    NodehostClient::new(config).context("Failed to create nodehost client")
}
