//! Settings file
//!
//! Reads and writes the INI credentials file. The file holds a `[DEFAULT]`
//! section (active user plus shared fallbacks) and one section per user.

use anyhow::{Context, Result};
use ini::{EscapePolicy, Ini, ParseOption, WriteOption};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_SECTION: &str = "DEFAULT";
pub const DEFAULT_USER_KEY: &str = "default-user";
pub const TOKEN_KEY: &str = "token";

const LEGACY_CONFIG_NAME: &str = ".linode-cli";
const CONFIG_NAME: &str = "linode-cli";

/// Shared defaults that a new profile inherits from `[DEFAULT]`.
pub const INHERITABLE_KEYS: &[&str] = &[
    "region",
    "type",
    "image",
    "mysql_engine",
    "postgresql_engine",
    "authorized_keys",
];

type Section = BTreeMap<String, String>;

/// In-memory view of the settings file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    defaults: Section,
    profiles: BTreeMap<String, Section>,
}

/// Find the settings file, preferring the legacy dotfile when it exists.
pub fn locate() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let xdg = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
    Ok(locate_in(&home, xdg.as_deref()))
}

/// Same as [`locate`], with the home and XDG config directories given.
pub fn locate_in(home: &Path, xdg_config_home: Option<&Path>) -> PathBuf {
    let legacy = home.join(LEGACY_CONFIG_NAME);
    if legacy.exists() {
        return legacy;
    }

    match xdg_config_home {
        Some(dir) => dir.join(CONFIG_NAME),
        None => home.join(".config").join(CONFIG_NAME),
    }
}

impl Settings {
    /// Load settings from disk. A missing file is an empty configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, starting empty");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let settings = Self::parse(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        debug!(
            path = %path.display(),
            profiles = settings.profiles.len(),
            "settings loaded"
        );
        Ok(settings)
    }

    /// Overwrite the file at `path` with the full settings.
    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, self.to_ini_string()?)
            .with_context(|| format!("Failed to write config at {}", path.display()))?;
        debug!(path = %path.display(), "settings written");
        Ok(())
    }

    pub fn parse(content: &str) -> Result<Self> {
        // Values are literal, as configparser stores them.
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..Default::default()
        };
        let ini = Ini::load_from_str_opt(content, options)?;
        let mut settings = Self::default();

        for (name, props) in ini.iter() {
            // Keys above the first header count as DEFAULT.
            let section = match name {
                None | Some(DEFAULT_SECTION) => &mut settings.defaults,
                Some(user) => settings.profiles.entry(user.to_string()).or_default(),
            };
            for (key, value) in props.iter() {
                section.insert(key.to_lowercase(), value.to_string());
            }
        }

        Ok(settings)
    }

    pub fn to_ini_string(&self) -> Result<String> {
        let mut ini = Ini::new();
        for (key, value) in &self.defaults {
            ini.set_to(Some(DEFAULT_SECTION), key.clone(), value.clone());
        }
        for (user, section) in &self.profiles {
            ini.with_section(Some(user.as_str()));
            for (key, value) in section {
                ini.set_to(Some(user.as_str()), key.clone(), value.clone());
            }
        }

        let mut buf = Vec::new();
        let options = WriteOption {
            escape_policy: EscapePolicy::Nothing,
            kv_separator: " = ",
            ..Default::default()
        };
        ini.write_to_opt(&mut buf, options)
            .context("Failed to serialize config")?;
        String::from_utf8(buf).context("Serialized config is not UTF-8")
    }

    /// Profile names, `[DEFAULT]` excluded.
    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    pub fn has_profile(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn default_user(&self) -> Option<&str> {
        self.default_value(DEFAULT_USER_KEY)
    }

    pub fn set_default_user(&mut self, name: &str) {
        self.set_default_value(DEFAULT_USER_KEY, name);
    }

    pub fn default_value(&self, key: &str) -> Option<&str> {
        self.defaults.get(key).map(String::as_str)
    }

    pub fn set_default_value(&mut self, key: &str, value: &str) {
        self.defaults.insert(key.to_lowercase(), value.to_string());
    }

    pub fn remove_default_value(&mut self, key: &str) -> Option<String> {
        self.defaults.remove(key)
    }

    /// Value set directly on the profile, without DEFAULT fallback.
    pub fn profile_value(&self, user: &str, key: &str) -> Option<&str> {
        self.profiles
            .get(user)
            .and_then(|section| section.get(key))
            .map(String::as_str)
    }

    /// Profile value, falling back to `[DEFAULT]`.
    pub fn value(&self, user: &str, key: &str) -> Option<&str> {
        self.profile_value(user, key)
            .or_else(|| self.default_value(key))
    }

    /// Set a profile key, creating the profile if needed.
    pub fn set_value(&mut self, user: &str, key: &str, value: &str) {
        self.profiles
            .entry(user.to_string())
            .or_default()
            .insert(key.to_lowercase(), value.to_string());
    }

    pub fn remove_value(&mut self, user: &str, key: &str) -> Option<String> {
        self.profiles.get_mut(user).and_then(|section| section.remove(key))
    }

    /// Add an empty profile. Returns false if it already existed.
    pub fn add_profile(&mut self, name: &str) -> bool {
        if self.profiles.contains_key(name) {
            return false;
        }
        self.profiles.insert(name.to_string(), Section::new());
        true
    }

    pub fn remove_profile(&mut self, name: &str) -> bool {
        self.profiles.remove(name).is_some()
    }

    /// Create `name` with `token` and every inheritable key present in DEFAULT.
    pub fn promote_defaults_to_profile(&mut self, name: &str, token: &str) {
        self.add_profile(name);
        self.set_value(name, TOKEN_KEY, token);

        let inherited: Vec<(&str, String)> = INHERITABLE_KEYS
            .iter()
            .filter_map(|key| self.default_value(key).map(|v| (*key, v.to_string())))
            .collect();
        for (key, value) in inherited {
            self.set_value(name, key, &value);
        }
    }
}
