//! Error types for bashstory.

use std::io;

use crate::protocol::CommandOutcome;

/// Errors produced by the bashstory crates.
///
/// Domain conditions (bad credentials, missing ids, permission checks) are
/// never represented here; they travel as ordinary `CommandOutcome`s. An
/// `Err` always means an unexpected fault or an infrastructure failure.
#[derive(Debug, thiserror::Error)]
pub enum BashError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status. The body is still a
    /// renderable outcome.
    #[error("server answered {status}")]
    Status {
        status: u16,
        outcome: Box<CommandOutcome>,
    },

    #[error("command error: {0}")]
    Command(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BashError>;
