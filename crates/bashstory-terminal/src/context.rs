//! Per-request state handed to command handlers.

use bashstory_store::{Store, User, UserId};
use bashstory_types::config::ServerConfig;

use crate::catalog::Catalog;
use crate::process::ProcessRegistry;

/// Who is calling. Rebuilt from the session token on every request and
/// never mutated by handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub is_privileged: bool,
    pub origin_ip: String,
}

impl SessionContext {
    pub fn anonymous(origin_ip: impl Into<String>) -> Self {
        Self {
            user_id: None,
            username: None,
            is_privileged: false,
            origin_ip: origin_ip.into(),
        }
    }

    pub fn for_user(user: &User, origin_ip: impl Into<String>) -> Self {
        Self {
            user_id: Some(user.id),
            username: Some(user.username.clone()),
            is_privileged: user.role.is_privileged(),
            origin_ip: origin_ip.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Name used as process owner and in broadcast messages.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("guest")
    }
}

/// Session side effect a handler asks the boundary to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionDirective {
    #[default]
    Keep,
    /// Create a session for this user and hand its token to the client.
    Start(UserId),
    /// Delete the caller's session and expire its cookies.
    End,
}

/// Everything a handler may touch.
pub struct CommandContext<'a> {
    pub session: &'a SessionContext,
    pub store: &'a mut dyn Store,
    pub processes: &'a ProcessRegistry,
    pub catalog: &'a Catalog,
    pub config: &'a ServerConfig,
    /// Written by handlers, read by the resolver after they return.
    pub directive: SessionDirective,
}

impl CommandContext<'_> {
    /// Prompt for the given user on this host.
    pub fn prompt_for(&self, username: &str) -> String {
        self.config.user_prompt(username)
    }
}
