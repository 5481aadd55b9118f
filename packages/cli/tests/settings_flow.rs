//! Settings file integration tests
//!
//! Locate → load → resolve → persist → reload, through the public API.

use anyhow::Result;
use async_trait::async_trait;
use std::io::Cursor;

use linode_cli::config::CliConfig;
use linode_cli::prompt::Prompter;
use linode_cli::resolver::{IdentityLookup, Resolution};
use linode_cli::settings::{self, Settings};

struct StaticIdentity(Option<&'static str>);

#[async_trait]
impl IdentityLookup for StaticIdentity {
    async fn username_for(&self, _token: &str) -> Result<Option<String>> {
        Ok(self.0.map(str::to_string))
    }
}

fn no_input() -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
    Prompter::new(Cursor::new(Vec::new()), Vec::new())
}

#[tokio::test]
async fn legacy_token_is_migrated_and_used() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(
        home.path().join(".linode-cli"),
        "[DEFAULT]\ntoken = legacy-token\nregion = us-east\ntype = g6-nanode-1\n",
    )
    .unwrap();

    let path = settings::locate_in(home.path(), None);
    assert_eq!(path, home.path().join(".linode-cli"));

    let mut config = CliConfig::load_from(path.clone(), None).unwrap();
    let resolution = config
        .ensure_default_user(&StaticIdentity(Some("alice")), &mut no_input())
        .await
        .unwrap();
    assert_eq!(resolution, Resolution::Resolved("alice".to_string()));

    let reloaded = CliConfig::load_from(path, None).unwrap();
    assert_eq!(reloaded.active_user().unwrap(), Some("alice"));
    assert_eq!(reloaded.value("token").unwrap(), Some("legacy-token"));
    assert_eq!(
        reloaded.settings.profile_value("alice", "type"),
        Some("g6-nanode-1")
    );
    assert_eq!(reloaded.base_url().unwrap(), "https://api.linode.com/v4");
}

#[tokio::test]
async fn existing_default_user_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = settings::locate_in(dir.path(), Some(&dir.path().join("xdg")));
    let mut stored = Settings::default();
    stored.set_value("bob", "token", "b");
    stored.set_value("carol", "token", "c");
    stored.set_default_user("carol");
    stored.persist(&path).unwrap();

    let mut config = CliConfig::load_from(path.clone(), None).unwrap();
    let resolution = config
        .ensure_default_user(&StaticIdentity(None), &mut no_input())
        .await
        .unwrap();

    assert_eq!(resolution, Resolution::Resolved("carol".to_string()));
    assert_eq!(Settings::load(&path).unwrap(), stored);
}

#[tokio::test]
async fn rejected_legacy_token_asks_for_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("linode-cli");
    std::fs::write(&path, "[DEFAULT]\ntoken = revoked\n").unwrap();

    let mut config = CliConfig::load_from(path.clone(), None).unwrap();
    let resolution = config
        .ensure_default_user(&StaticIdentity(None), &mut no_input())
        .await
        .unwrap();

    assert_eq!(resolution, Resolution::Reconfigure);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "[DEFAULT]\ntoken = revoked\n"
    );
}
