//! Browser detection
//!
//! Web-based token acquisition needs a graphical browser. Text-mode browsers
//! can be launched but cannot finish the redirect, so they only count after
//! the user agrees to try.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::prompt::Prompter;

/// Browsers known to complete a web login.
pub const KNOWN_GOOD_BROWSERS: &[&str] = &[
    "chrome",
    "firefox",
    "mozilla",
    "netscape",
    "opera",
    "safari",
    "chromium",
    "chromium-browser",
    "epiphany",
];

const GRAPHICAL_HANDLERS: &[&str] = &[
    "xdg-open",
    "gio",
    "gnome-open",
    "x-www-browser",
    "firefox",
    "mozilla",
    "netscape",
    "google-chrome",
    "chrome",
    "chromium",
    "chromium-browser",
    "opera",
    "epiphany",
];

const CONSOLE_HANDLERS: &[&str] = &["www-browser", "links", "elinks", "lynx", "w3m"];

/// A command that can open a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserHandler {
    pub name: String,
    pub command: String,
}

impl BrowserHandler {
    fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }

    pub fn is_known_good(&self) -> bool {
        KNOWN_GOOD_BROWSERS.contains(&self.name.as_str())
    }

    /// Launch the handler on `url` without waiting for it.
    pub fn open(&self, url: &str) -> Result<()> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().context("Empty browser command")?;
        let args: Vec<&str> = parts.collect();

        let mut cmd = Command::new(program);
        if args.iter().any(|a| a.contains("%s")) {
            cmd.args(args.iter().map(|a| a.replace("%s", url)));
        } else {
            cmd.args(&args).arg(url);
        }
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch {}", self.command))?;
        Ok(())
    }
}

/// What handler discovery looks at
#[derive(Debug, Clone, Default)]
pub struct BrowserEnv {
    /// Contents of `BROWSER`, colon separated.
    pub browser_var: Option<String>,
    /// Whether a graphical session is available.
    pub graphical: bool,
    pub search_path: Vec<PathBuf>,
    pub macos: bool,
}

impl BrowserEnv {
    pub fn from_env() -> Self {
        let graphical = std::env::var_os("DISPLAY").is_some()
            || std::env::var_os("WAYLAND_DISPLAY").is_some();
        let search_path = std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();

        Self {
            browser_var: std::env::var("BROWSER").ok(),
            graphical: graphical || cfg!(target_os = "macos"),
            search_path,
            macos: cfg!(target_os = "macos"),
        }
    }

    fn on_path(&self, program: &str) -> bool {
        self.search_path.iter().any(|dir| dir.join(program).is_file())
    }
}

/// Handlers in the order they would be tried.
pub fn detect_handlers(env: &BrowserEnv) -> Vec<BrowserHandler> {
    let mut handlers: Vec<BrowserHandler> = Vec::new();

    let mut push = |handler: BrowserHandler| {
        if !handlers.iter().any(|h| h.name == handler.name) {
            handlers.push(handler);
        }
    };

    if let Some(var) = env.browser_var.as_deref() {
        for command in var.split(':').map(str::trim).filter(|c| !c.is_empty()) {
            let program = command.split_whitespace().next().unwrap_or(command);
            let name = Path::new(program)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| program.to_string());
            push(BrowserHandler::new(name, command));
        }
    }

    if env.macos {
        push(BrowserHandler::new("safari", "open -a Safari"));
    }

    if env.graphical {
        for name in GRAPHICAL_HANDLERS.iter().filter(|n| env.on_path(n)) {
            push(BrowserHandler::new(*name, *name));
        }
    }

    for name in CONSOLE_HANDLERS.iter().filter(|n| env.on_path(n)) {
        push(BrowserHandler::new(*name, *name));
    }

    debug!(
        handlers = ?handlers.iter().map(|h| h.name.as_str()).collect::<Vec<_>>(),
        "browser handlers detected"
    );
    handlers
}

/// Pick a browser for web login, asking when only unknown ones exist.
///
/// Returns `None` when there is nothing usable (or the user declined).
pub fn check_browsers<R: BufRead, W: Write>(
    handlers: &[BrowserHandler],
    prompter: &mut Prompter<R, W>,
) -> Result<Option<BrowserHandler>> {
    let Some(first) = handlers.first() else {
        return Ok(None);
    };

    if let Some(good) = handlers.iter().find(|h| h.is_known_good()) {
        return Ok(Some(good.clone()));
    }

    prompter.say("")?;
    prompter.say("This tool defaults to web-based authentication,")?;
    prompter.say("however no known-working browsers were found.")?;

    if prompter.confirm("Try it anyway? [y/N]: ", false)? {
        Ok(Some(first.clone()))
    } else {
        Ok(None)
    }
}
