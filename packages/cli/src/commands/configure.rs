use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use tracing::warn;

use crate::api::{ApiClient, SshKey};
use crate::browser::{self, BrowserEnv};
use crate::config::CliConfig;
use crate::prompt::{Choice, Prompter};
use crate::resolver::IdentityLookup;
use crate::settings::{Settings, TOKEN_KEY};

const TOKEN_URL: &str = "https://cloud.linode.com/profile/tokens";

#[derive(Debug, Default)]
pub struct ConfigureOptions {
    /// Use this token instead of asking for one
    pub token: Option<String>,
    /// Skip the default region/type/image/... questions
    pub no_defaults: bool,
}

/// Option lists offered as per-user defaults
#[derive(Debug, Default)]
pub struct Catalog {
    pub regions: Vec<String>,
    pub types: Vec<String>,
    pub images: Vec<String>,
    pub mysql_engines: Vec<String>,
    pub postgresql_engines: Vec<String>,
    pub ssh_keys: Vec<SshKey>,
}

impl Catalog {
    /// Fetch every list. A list the token cannot read is left empty.
    pub async fn fetch(api: &ApiClient) -> Self {
        let (regions, types, images, mysql_engines, postgresql_engines, ssh_keys) = tokio::join!(
            api.regions(),
            api.linode_types(),
            api.images(),
            api.database_engines("mysql"),
            api.database_engines("postgresql"),
            api.ssh_keys(),
        );

        Self {
            regions: or_empty("regions", regions),
            types: or_empty("types", types),
            images: or_empty("images", images),
            mysql_engines: or_empty("mysql engines", mysql_engines),
            postgresql_engines: or_empty("postgresql engines", postgresql_engines),
            ssh_keys: or_empty("ssh keys", ssh_keys),
        }
    }
}

fn or_empty<T>(what: &str, result: Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(catalog = what, error = %err, "could not list options, skipping");
        Vec::new()
    })
}

/// Interactively add or update a user and their defaults
pub async fn run<R: BufRead, W: Write>(
    config: &mut CliConfig,
    options: ConfigureOptions,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let identity = ApiClient::new(config.default_base_url(), None)?;
    run_with(config, options, &identity, prompter).await
}

/// [`run`] with the token check going through `identity`.
pub async fn run_with<I, R, W>(
    config: &mut CliConfig,
    options: ConfigureOptions,
    identity: &I,
    prompter: &mut Prompter<R, W>,
) -> Result<()>
where
    I: IdentityLookup + ?Sized,
    R: BufRead,
    W: Write,
{
    println!("{}", "Welcome to the Linode CLI.".bold());
    println!("This will walk you through creating a new user or updating an existing one.");

    let token = match options.token {
        Some(token) => token,
        None => read_token(prompter)?,
    };

    let Some(username) = identity.username_for(&token).await? else {
        bail!("Invalid token: the API rejected it. Create a new one at {}", TOKEN_URL);
    };

    println!();
    println!("Configuring {}", username.cyan());
    config.settings.set_value(&username, TOKEN_KEY, &token);

    if !options.no_defaults {
        let api = ApiClient::new(config.default_base_url(), Some(token.clone()))?;
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
                .template("{spinner:.blue} {msg}")?,
        );
        spinner.set_message("Fetching available options...");
        let catalog = Catalog::fetch(&api).await;
        spinner.finish_and_clear();

        choose_defaults(&mut config.settings, &username, &catalog, prompter)?;
    }

    settle_default_user(&mut config.settings, &username, prompter)?;
    config.save()?;

    println!();
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        config.path().display().to_string().dimmed()
    );
    if config.settings.default_user() == Some(username.as_str()) {
        println!("  Active user is now {}", username.cyan());
    }

    Ok(())
}

fn read_token<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>) -> Result<String> {
    let handlers = browser::detect_handlers(&BrowserEnv::from_env());

    match browser::check_browsers(&handlers, prompter)? {
        Some(handler) => {
            println!("Opening {} to create a Personal Access Token...", TOKEN_URL);
            if let Err(err) = handler.open(TOKEN_URL) {
                warn!(browser = %handler.name, error = %err, "could not launch browser");
                println!("Visit {} to create a Personal Access Token.", TOKEN_URL);
            }
        }
        None => println!("Visit {} to create a Personal Access Token.", TOKEN_URL),
    }

    let token: String = Password::new()
        .with_prompt("Personal Access Token")
        .interact()?;
    let token = token.trim().to_string();

    if token.is_empty() {
        bail!("Token cannot be empty");
    }
    Ok(token)
}

/// Ask for each per-user default the catalog has options for.
pub fn choose_defaults<R: BufRead, W: Write>(
    settings: &mut Settings,
    user: &str,
    catalog: &Catalog,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let questions: [(&str, &[String], &str, &str, &str); 5] = [
        (
            "region",
            &catalog.regions,
            "Default Region for operations.",
            "Default Region (Optional): ",
            "Please select a valid Region, or press Enter to skip",
        ),
        (
            "type",
            &catalog.types,
            "Default Type of Linode to deploy.",
            "Default Type of Linode (Optional): ",
            "Please select a valid Type, or press Enter to skip",
        ),
        (
            "image",
            &catalog.images,
            "Default Image to deploy to new Linodes.",
            "Default Image (Optional): ",
            "Please select a valid Image, or press Enter to skip",
        ),
        (
            "mysql_engine",
            &catalog.mysql_engines,
            "Default Engine to create a Managed MySQL Database.",
            "Default Engine (Optional): ",
            "Please select a valid MySQL Database Engine, or press Enter to skip",
        ),
        (
            "postgresql_engine",
            &catalog.postgresql_engines,
            "Default Engine to create a Managed PostgreSQL Database.",
            "Default Engine (Optional): ",
            "Please select a valid PostgreSQL Database Engine, or press Enter to skip",
        ),
    ];

    for (key, options, ask, prompt, error) in questions {
        if options.is_empty() {
            continue;
        }
        let current = settings.profile_value(user, key).map(str::to_string);
        let choice = prompter.choose(ask, options, prompt, error, true, current.as_deref())?;
        apply_choice(settings, user, key, choice);
    }

    if !catalog.ssh_keys.is_empty() {
        let labels: Vec<&str> = catalog.ssh_keys.iter().map(|k| k.label.as_str()).collect();
        let current = settings
            .profile_value(user, "authorized_keys")
            .map(str::to_string);
        let choice = prompter.choose(
            "Default SSH key to add to new Linodes.",
            &labels,
            "Default SSH Key (Optional): ",
            "Please select a valid SSH key, or press Enter to skip",
            true,
            current.as_deref(),
        )?;

        // Menu shows labels, the profile stores the key itself.
        let choice = match choice {
            Choice::Selected(label) => catalog
                .ssh_keys
                .iter()
                .find(|k| k.label == label)
                .map(|k| Choice::Selected(k.ssh_key.clone()))
                .unwrap_or(Choice::Unchanged),
            other => other,
        };
        apply_choice(settings, user, "authorized_keys", choice);
    }

    Ok(())
}

pub fn apply_choice(settings: &mut Settings, user: &str, key: &str, choice: Choice) {
    match choice {
        Choice::Selected(value) => settings.set_value(user, key, &value),
        Choice::Cleared => {
            settings.remove_value(user, key);
        }
        Choice::Unchanged => {}
    }
}

/// Make `user` the default when there is no usable default yet, otherwise
/// ask. Returns whether `user` is the default afterwards.
pub fn settle_default_user<R: BufRead, W: Write>(
    settings: &mut Settings,
    user: &str,
    prompter: &mut Prompter<R, W>,
) -> Result<bool> {
    let make_default = match settings.default_user() {
        Some(current) if current == user => return Ok(true),
        Some(current) if settings.has_profile(current) => prompter.confirm(
            &format!("Make {} the default user? [y/N]: ", user),
            false,
        )?,
        _ => true,
    };

    if make_default {
        settings.set_default_user(user);
    }
    Ok(make_default)
}
