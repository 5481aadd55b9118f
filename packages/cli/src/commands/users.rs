use anyhow::Result;
use colored::Colorize;

use crate::config::CliConfig;

/// Change the default user
pub fn set_user(config: &mut CliConfig, name: &str) -> Result<()> {
    config.set_user(name)?;
    println!("{} Default user set to {}", "✓".green().bold(), name.cyan());
    Ok(())
}

/// Remove a stored user
pub fn remove_user(config: &mut CliConfig, name: &str) -> Result<()> {
    config.remove_user(name)?;
    println!("{} Removed user {}", "✓".green().bold(), name.cyan());
    Ok(())
}

/// List configured users, marking the default one
pub fn show_users(config: &CliConfig) -> Result<()> {
    let users = config.users();

    if users.is_empty() {
        println!("{}", "No users configured.".dimmed());
        return Ok(());
    }

    println!("{}", "Configured Users:".bold());
    for (name, is_default) in &users {
        if *is_default {
            println!("*  {}", name.cyan().bold());
        } else {
            println!("   {}", name);
        }
    }

    Ok(())
}
