//! Server and client configuration.
//!
//! Both structs deserialize from TOML with every field optional; missing
//! fields fall back to the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BashError, Result};

/// Default prompt for unauthenticated sessions.
pub const GUEST_PROMPT: &str = "guest@bashstory:~$ ";

/// Default terminal foreground colour.
pub const DEFAULT_THEME: &str = "#4AFB7F";

/// Server configuration (`bashstory.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Host name shown in prompts and broadcast messages.
    #[serde(default = "default_hostname")]
    pub hostname: String,
    /// Records older than this are swept to `completed`.
    #[serde(default = "default_retention")]
    pub process_retention_secs: u64,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_theme_cookie")]
    pub theme_cookie: String,
    #[serde(default = "default_session_max_age")]
    pub session_max_age_secs: u64,
    #[serde(default = "default_theme_max_age")]
    pub theme_max_age_secs: u64,
    /// Seed the in-memory store with an admin account and sample quotes.
    #[serde(default = "yes")]
    pub seed_demo_data: bool,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_hostname() -> String {
    "bashstory".to_string()
}
fn default_retention() -> u64 {
    3600
}
fn default_session_cookie() -> String {
    "session_token".to_string()
}
fn default_theme_cookie() -> String {
    "theme_color".to_string()
}
fn default_session_max_age() -> u64 {
    7 * 24 * 3600
}
fn default_theme_max_age() -> u64 {
    365 * 24 * 3600
}
fn yes() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind(),
            port: default_port(),
            log_level: default_log_level(),
            hostname: default_hostname(),
            process_retention_secs: default_retention(),
            session_cookie: default_session_cookie(),
            theme_cookie: default_theme_cookie(),
            session_max_age_secs: default_session_max_age(),
            theme_max_age_secs: default_theme_max_age(),
            seed_demo_data: true,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| BashError::Config(format!("server config: {e}")))
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)?;
                Self::from_toml(&text)
            },
            None => Ok(Self::default()),
        }
    }

    /// Apply `BASHSTORY_PORT`/`PORT` and `BASHSTORY_BIND` overrides.
    ///
    /// `lookup` abstracts the environment so tests do not have to mutate
    /// process state.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("BASHSTORY_PORT").or_else(|| lookup("PORT")) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| BashError::Config(format!("invalid port: {port}")))?;
        }
        if let Some(bind) = lookup("BASHSTORY_BIND") {
            self.bind_address = bind;
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Prompt for an authenticated user.
    pub fn user_prompt(&self, username: &str) -> String {
        format!("{username}@{}:~$ ", self.hostname)
    }

    /// Prompt for anonymous sessions.
    pub fn guest_prompt(&self) -> String {
        self.user_prompt("guest")
    }
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Full URL of the command endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_top_ms")]
    pub top_interval_ms: u64,
    #[serde(default = "default_tail_ms")]
    pub tail_interval_ms: u64,
    /// Window in which a second Tab lists all candidates.
    #[serde(default = "default_double_tab_ms")]
    pub double_tab_ms: u64,
    #[serde(default = "default_history")]
    pub max_history: usize,
    #[serde(default = "default_scrollback")]
    pub max_scrollback: usize,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:3000/api/command".to_string()
}
fn default_prompt() -> String {
    GUEST_PROMPT.to_string()
}
fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}
fn default_top_ms() -> u64 {
    1000
}
fn default_tail_ms() -> u64 {
    2000
}
fn default_double_tab_ms() -> u64 {
    2000
}
fn default_history() -> usize {
    100
}
fn default_scrollback() -> usize {
    1000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            prompt: default_prompt(),
            theme: default_theme(),
            top_interval_ms: default_top_ms(),
            tail_interval_ms: default_tail_ms(),
            double_tab_ms: default_double_tab_ms(),
            max_history: default_history(),
            max_scrollback: default_scrollback(),
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| BashError::Config(format!("client config: {e}")))
    }
}
