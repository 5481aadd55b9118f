use anyhow::Result;
use colored::Colorize;

use crate::api::ApiClient;
use crate::config::CliConfig;

/// Show the account the active token belongs to
pub async fn run(config: &CliConfig) -> Result<()> {
    let api = ApiClient::new(config.base_url()?, Some(config.token()?))?;
    let profile = api.profile().await?;

    println!("{}", "Profile:".bold());
    println!("  Username: {}", profile.username.cyan());
    println!(
        "  Email:    {}",
        profile.email.as_deref().unwrap_or("(not set)").cyan()
    );
    println!("  API URL:  {}", api.base_url().dimmed());

    Ok(())
}
