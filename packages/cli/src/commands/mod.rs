pub mod configure;
pub mod profile;
pub mod users;

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};

use crate::api::ApiClient;
use crate::config::CliConfig;
use crate::prompt::Prompter;
use crate::resolver::{IdentityLookup, Resolution};

/// Load the config and make sure an active user exists, running
/// `configure` when nothing usable is stored.
pub async fn load_resolved<R: BufRead, W: Write>(
    as_user: Option<String>,
    prompter: &mut Prompter<R, W>,
) -> Result<CliConfig> {
    let mut config = CliConfig::load(as_user)?;
    let identity = ApiClient::new(config.default_base_url(), None)?;

    resolve_or_configure(
        &mut config,
        &identity,
        configure::ConfigureOptions::default(),
        prompter,
    )
    .await?;

    Ok(config)
}

/// Resolve the default user, falling back to `configure` with `options`.
/// Returns the default user afterwards.
pub async fn resolve_or_configure<I, R, W>(
    config: &mut CliConfig,
    identity: &I,
    options: configure::ConfigureOptions,
    prompter: &mut Prompter<R, W>,
) -> Result<String>
where
    I: IdentityLookup + ?Sized,
    R: BufRead,
    W: Write,
{
    match config.ensure_default_user(identity, prompter).await? {
        Resolution::Resolved(user) => Ok(user),
        Resolution::Reconfigure => {
            println!("{}", "No valid configuration found, starting setup.".yellow());
            configure::run_with(config, options, identity, prompter).await?;
            config
                .settings
                .default_user()
                .map(str::to_string)
                .context("Configuration finished without a default user")
        }
    }
}
