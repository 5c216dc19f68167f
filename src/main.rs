use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "factory-scope")]
#[command(version, about = "Inspect and drive the session's factory scope")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to factory-scope.toml. Defaults to the platform config dir.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Where session/selection state is kept. Overrides the config file.
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in: load the factory list and initialize the scope
    Login {
        /// User id of the signing-in user
        #[arg(long)]
        user: String,
        /// Role: system_admin, admin, user, or viewer
        #[arg(long)]
        role: String,
        /// The factory id this user is assigned to, if any
        #[arg(long)]
        assigned_factory: Option<uuid::Uuid>,
    },
    /// Show the current scope without touching the network
    Status,
    /// List the active factories served by the backend
    Factories,
    /// Switch the active factory (system admin only)
    Use {
        /// Factory id or code
        factory: String,
    },
    /// Observe another factory without changing the active one
    Observe {
        /// Factory id or code
        factory: Option<String>,
        /// Stop observing and return to the active factory
        #[arg(long)]
        stop: bool,
    },
    /// Sign out: clear scope state and persisted selection
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = factory_scope::config::ScopeConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.state_dir.clone() {
        config.state_dir = Some(dir);
    }

    match &cli.command {
        Commands::Login {
            user,
            role,
            assigned_factory,
        } => cmd::cmd_login(&config, user, role, *assigned_factory).await?,
        Commands::Status => cmd::cmd_status(&config)?,
        Commands::Factories => cmd::cmd_factories(&config).await?,
        Commands::Use { factory } => cmd::cmd_use(&config, factory).await?,
        Commands::Observe { factory, stop } => {
            cmd::cmd_observe(&config, factory.as_deref(), *stop).await?
        }
        Commands::Reset => cmd::cmd_reset(&config)?,
    }

    Ok(())
}
