//! CLI Configuration
//!
//! Ties the located settings file to the user selected for this invocation
//! and hands out the token and API base URL the request layer needs.

use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::api;
use crate::prompt::Prompter;
use crate::resolver::{self, IdentityLookup, Resolution};
use crate::settings::{self, Settings, TOKEN_KEY};

pub const TOKEN_ENV: &str = "LINODE_CLI_TOKEN";

#[derive(Debug)]
pub struct CliConfig {
    path: PathBuf,
    pub settings: Settings,
    as_user: Option<String>,
}

impl CliConfig {
    /// Locate and load the settings file.
    pub fn load(as_user: Option<String>) -> Result<Self> {
        let path = settings::locate()?;
        Self::load_from(path, as_user)
    }

    pub fn load_from(path: PathBuf, as_user: Option<String>) -> Result<Self> {
        let settings = Settings::load(&path)?;
        debug!(path = %path.display(), "using settings file");
        Ok(Self {
            path,
            settings,
            as_user,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.settings.persist(&self.path)
    }

    /// Make sure `default-user` is set, resolving it when missing.
    ///
    /// Returns `Resolution::Reconfigure` when nothing usable is stored.
    pub async fn ensure_default_user<I, R, W>(
        &mut self,
        identity: &I,
        prompter: &mut Prompter<R, W>,
    ) -> Result<Resolution>
    where
        I: IdentityLookup + ?Sized,
        R: BufRead,
        W: Write,
    {
        if let Some(user) = self.settings.default_user() {
            return Ok(Resolution::Resolved(user.to_string()));
        }
        resolver::resolve_default_user(&mut self.settings, &self.path, identity, prompter).await
    }

    /// The `--as-user` override if given, else `default-user`.
    pub fn active_user(&self) -> Result<Option<&str>> {
        if let Some(user) = self.as_user.as_deref() {
            if !self.settings.has_profile(user) {
                bail!("User {} is not configured.", user);
            }
            return Ok(Some(user));
        }
        Ok(self.settings.default_user())
    }

    /// Setting for the active user, falling back to `[DEFAULT]`.
    pub fn value(&self, key: &str) -> Result<Option<&str>> {
        Ok(match self.active_user()? {
            Some(user) => self.settings.value(user, key),
            None => self.settings.default_value(key),
        })
    }

    /// Token for API calls. `LINODE_CLI_TOKEN` wins over the settings file.
    pub fn token(&self) -> Result<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                return Ok(token);
            }
        }
        self.value(TOKEN_KEY)?
            .map(str::to_string)
            .context("No token configured. Run `linode-cli configure` first.")
    }

    pub fn base_url(&self) -> Result<String> {
        Ok(api::base_url(
            self.value("api_scheme")?,
            self.value("api_host")?,
            self.value("api_version")?,
        ))
    }

    /// Base URL from `[DEFAULT]` only, for calls made before a user is known.
    pub fn default_base_url(&self) -> String {
        api::base_url(
            self.settings.default_value("api_scheme"),
            self.settings.default_value("api_host"),
            self.settings.default_value("api_version"),
        )
    }

    /// Make `name` the default user.
    pub fn set_user(&mut self, name: &str) -> Result<()> {
        if !self.settings.has_profile(name) {
            bail!("No user {}", name);
        }
        self.settings.set_default_user(name);
        self.save()
    }

    /// Drop a stored user. The default user cannot be removed.
    pub fn remove_user(&mut self, name: &str) -> Result<()> {
        if self.settings.default_user() == Some(name) {
            bail!(
                "Cannot remove {} as they are the default user! You can change the default user with: linode-cli set-user USERNAME",
                name
            );
        }
        if !self.settings.remove_profile(name) {
            bail!("No user {}", name);
        }
        self.save()
    }

    /// Configured users, each paired with whether it is the default.
    pub fn users(&self) -> Vec<(String, bool)> {
        let default = self.settings.default_user();
        self.settings
            .profile_names()
            .into_iter()
            .map(|name| {
                let is_default = default == Some(name.as_str());
                (name, is_default)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[DEFAULT]
default-user = bob
api_host = api.example.test

[bob]
token = b-token

[carol]
token = c-token
api_version = v4beta
";

    fn config(as_user: Option<&str>) -> (tempfile::TempDir, CliConfig) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linode-cli");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = CliConfig::load_from(path, as_user.map(str::to_string)).unwrap();
        (dir, config)
    }

    #[test]
    fn test_active_user_defaults_and_override() {
        let (_dir, cfg) = config(None);
        assert_eq!(cfg.active_user().unwrap(), Some("bob"));

        let (_dir, cfg) = config(Some("carol"));
        assert_eq!(cfg.active_user().unwrap(), Some("carol"));

        let (_dir, cfg) = config(Some("mallory"));
        assert!(cfg.active_user().is_err());
    }

    #[test]
    fn test_base_url_follows_active_user() {
        let (_dir, cfg) = config(None);
        assert_eq!(cfg.base_url().unwrap(), "https://api.example.test/v4");

        let (_dir, cfg) = config(Some("carol"));
        assert_eq!(cfg.base_url().unwrap(), "https://api.example.test/v4beta");
    }

    #[test]
    fn test_profile_token_for_active_user() {
        let (_dir, cfg) = config(Some("carol"));
        assert_eq!(cfg.value(TOKEN_KEY).unwrap(), Some("c-token"));
    }

    #[test]
    fn test_set_user_persists() {
        let (_dir, mut cfg) = config(None);
        cfg.set_user("carol").unwrap();
        assert!(cfg.set_user("mallory").is_err());

        let stored = Settings::load(cfg.path()).unwrap();
        assert_eq!(stored.default_user(), Some("carol"));
    }

    #[test]
    fn test_remove_user_refuses_default_and_unknown() {
        let (_dir, mut cfg) = config(None);
        assert!(cfg.remove_user("bob").is_err());
        assert!(cfg.remove_user("mallory").is_err());

        cfg.remove_user("carol").unwrap();
        let stored = Settings::load(cfg.path()).unwrap();
        assert_eq!(stored.profile_names(), vec!["bob"]);
    }

    #[test]
    fn test_users_marks_default() {
        let (_dir, cfg) = config(None);
        assert_eq!(
            cfg.users(),
            vec![("bob".to_string(), true), ("carol".to_string(), false)]
        );
    }
}
