//! Default user resolution
//!
//! Picks the active profile when `default-user` is not set: promote a lone
//! profile, migrate a bare DEFAULT token into a named profile, or ask.

use anyhow::Result;
use async_trait::async_trait;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::prompt::Prompter;
use crate::settings::{Settings, TOKEN_KEY};

/// Looks up which account a token belongs to.
#[async_trait]
pub trait IdentityLookup {
    /// `Ok(None)` means the API rejected the token.
    async fn username_for(&self, token: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// `default-user` now names this profile and the file has been written.
    Resolved(String),
    /// Nothing usable is stored; the caller must run a full configure.
    Reconfigure,
}

pub async fn resolve_default_user<I, R, W>(
    settings: &mut Settings,
    path: &Path,
    identity: &I,
    prompter: &mut Prompter<R, W>,
) -> Result<Resolution>
where
    I: IdentityLookup + ?Sized,
    R: BufRead,
    W: Write,
{
    let users = settings.profile_names();

    match users.as_slice() {
        [only] => {
            info!(user = %only, "single profile, making it the default");
            settings.set_default_user(only);
            settings.persist(path)?;
            Ok(Resolution::Resolved(only.clone()))
        }
        [] => migrate_default_token(settings, path, identity).await,
        _ => choose_active_user(settings, path, &users, prompter),
    }
}

/// Zero profiles: a token left in DEFAULT by an old release becomes a
/// profile named after its owner.
async fn migrate_default_token<I>(
    settings: &mut Settings,
    path: &Path,
    identity: &I,
) -> Result<Resolution>
where
    I: IdentityLookup + ?Sized,
{
    let Some(token) = settings.default_value(TOKEN_KEY).map(str::to_string) else {
        debug!("no profiles and no token, configuration required");
        return Ok(Resolution::Reconfigure);
    };

    let Some(username) = identity.username_for(&token).await? else {
        info!("stored token was rejected, configuration required");
        return Ok(Resolution::Reconfigure);
    };

    info!(user = %username, "migrating DEFAULT token into a profile");
    settings.promote_defaults_to_profile(&username, &token);
    settings.set_default_user(&username);
    settings.persist(path)?;
    Ok(Resolution::Resolved(username))
}

fn choose_active_user<R: BufRead, W: Write>(
    settings: &mut Settings,
    path: &Path,
    users: &[String],
    prompter: &mut Prompter<R, W>,
) -> Result<Resolution> {
    prompter.say("Please choose the active user.  Configured users are:")?;
    for user in users {
        prompter.say(&format!(" {}", user))?;
    }
    prompter.say("")?;

    loop {
        let username = prompter.ask("Active user: ")?;
        if users.contains(&username) {
            settings.set_default_user(&username);
            settings.persist(path)?;
            return Ok(Resolution::Resolved(username));
        }
        prompter.say(&format!("No user {}", username))?;
    }
}
