//! Linode CLI
//!
//! Configuration layer of the command-line client: the settings file, default
//! user resolution and the interactive prompts used during setup.

pub mod api;
pub mod browser;
pub mod commands;
pub mod config;
pub mod prompt;
pub mod resolver;
pub mod settings;
