use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use linode_cli::commands::{self, configure::ConfigureOptions};
use linode_cli::config::CliConfig;
use linode_cli::prompt::Prompter;

#[derive(Parser)]
#[command(name = "linode-cli", about = "Linode CLI - Manage your Linode account")]
#[command(version, propagate_version = true)]
struct Cli {
    /// Run as this configured user instead of the default one
    #[arg(long, global = true)]
    as_user: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or update a user and their defaults
    Configure {
        /// Personal Access Token (prompted for if omitted)
        #[arg(long, env = "LINODE_CLI_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Don't ask for default region, type, image and so on
        #[arg(long)]
        no_defaults: bool,
    },

    /// Set the default user
    SetUser {
        /// Configured username
        username: String,
    },

    /// Remove a configured user
    RemoveUser {
        /// Configured username
        username: String,
    },

    /// List configured users
    ShowUsers,

    /// Show the account of the active user
    Profile,
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut prompter = Prompter::stdio();

    match cli.command {
        Commands::Configure { token, no_defaults } => {
            let mut config = CliConfig::load(None)?;
            commands::configure::run(
                &mut config,
                ConfigureOptions { token, no_defaults },
                &mut prompter,
            )
            .await
        }
        Commands::SetUser { username } => {
            let mut config = CliConfig::load(None)?;
            commands::users::set_user(&mut config, &username)
        }
        Commands::RemoveUser { username } => {
            let mut config = CliConfig::load(None)?;
            commands::users::remove_user(&mut config, &username)
        }
        Commands::ShowUsers => {
            let config = CliConfig::load(None)?;
            commands::users::show_users(&config)
        }
        Commands::Profile => {
            let config = commands::load_resolved(cli.as_user, &mut prompter).await?;
            commands::profile::run(&config).await
        }
    }
}
