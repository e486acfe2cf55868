//! The single entry point from a request to an outcome.
//!
//! Phase-tagged requests skip the tokenizer entirely and go to their flow's
//! continuation with the carried arguments untouched. Everything else is
//! trimmed, split on whitespace and dispatched through the catalog.

use std::time::Instant;

use bashstory_store::Store;
use bashstory_types::config::ServerConfig;
use bashstory_types::error::Result;
use bashstory_types::protocol::{CommandOutcome, CommandRequest, Phase};

use crate::catalog::{Catalog, parse_line, wants_help};
use crate::context::{CommandContext, SessionContext, SessionDirective};
use crate::process::{ProcessId, ProcessRegistry};
use crate::{account_commands, quote_commands, system_commands};

/// Session change the HTTP boundary must reflect in its cookies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionChange {
    #[default]
    Keep,
    /// A session was created; hand this token to the client.
    Started(String),
    /// The caller's session was deleted; expire the client's cookies.
    Ended,
}

/// Result of resolving one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: CommandOutcome,
    pub session: SessionChange,
}

/// Stateless command resolver. One instance serves every request.
#[derive(Debug)]
pub struct Resolver {
    catalog: Catalog,
    processes: ProcessRegistry,
    config: ServerConfig,
}

/// Rebuild the caller's session context from an opaque token.
pub fn identify(
    store: &dyn Store,
    token: Option<&str>,
    origin_ip: &str,
) -> Result<SessionContext> {
    let user = match token {
        Some(t) if !t.is_empty() => store.session_user(t)?,
        _ => None,
    };
    Ok(match user {
        Some(u) => SessionContext::for_user(&u, origin_ip),
        None => SessionContext::anonymous(origin_ip),
    })
}

fn not_found(name: &str) -> CommandOutcome {
    CommandOutcome::line(format!(
        "bash: command not found: {name}. Type help for a list of commands."
    ))
}

impl Resolver {
    /// A resolver with every built-in command.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_catalog(Catalog::with_builtins(), config)
    }

    pub fn with_catalog(catalog: Catalog, config: ServerConfig) -> Self {
        let processes = ProcessRegistry::with_retention(config.process_retention_secs);
        Self {
            catalog,
            processes,
            config,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn processes(&self) -> &ProcessRegistry {
        &self.processes
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Resolve one request.
    ///
    /// `token` is the caller's current session token, needed to end the
    /// session on logout. Domain failures come back as ordinary outcomes;
    /// `Err` means an unexpected fault.
    pub fn resolve(
        &self,
        request: &CommandRequest,
        session: &SessionContext,
        token: Option<&str>,
        store: &mut dyn Store,
    ) -> Result<Resolution> {
        let started = Instant::now();
        self.processes.sweep();

        let process = self.register_process(request, session);
        let mut ctx = CommandContext {
            session,
            store,
            processes: &self.processes,
            catalog: &self.catalog,
            config: &self.config,
            directive: SessionDirective::Keep,
        };
        let result = self.dispatch(request, &mut ctx);
        let directive = ctx.directive;
        if let Some(id) = process {
            self.processes.complete(id);
        }
        let outcome = result?;

        let session_change = match directive {
            SessionDirective::Keep => SessionChange::Keep,
            SessionDirective::Start(user) => {
                // A fresh login replaces whatever session the caller held.
                if let Some(t) = token.filter(|t| !t.is_empty()) {
                    store.delete_session(t)?;
                }
                SessionChange::Started(store.create_session(user)?)
            },
            SessionDirective::End => {
                if let Some(t) = token {
                    store.delete_session(t)?;
                }
                SessionChange::Ended
            },
        };

        log::debug!(
            "resolved {:?} phase={} in {:?}",
            command_name(request),
            request.phase,
            started.elapsed()
        );
        Ok(Resolution {
            outcome,
            session: session_change,
        })
    }

    /// Register a process record unless the command is excluded. Polling
    /// refreshes and client-local steps, which are only ever rejected, are
    /// never registered.
    fn register_process(
        &self,
        request: &CommandRequest,
        session: &SessionContext,
    ) -> Option<ProcessId> {
        if request.phase.is_polling() || request.phase.is_client_local() {
            return None;
        }
        let name = command_name(request)?;
        if !self.catalog.is_tracked(&name) {
            return None;
        }
        // Phase requests record only the flow's command, never carried values.
        let command_line = if request.phase.is_none() {
            request.command.trim()
        } else {
            name.as_str()
        };
        Some(self.processes.register(command_line, session.display_name()))
    }

    fn dispatch(
        &self,
        request: &CommandRequest,
        ctx: &mut CommandContext<'_>,
    ) -> Result<CommandOutcome> {
        match request.phase {
            Phase::None => self.dispatch_line(&request.command, ctx),
            Phase::LoginPassword => account_commands::login_continue(&request.args, ctx),
            Phase::RegisterPassword2 => account_commands::register_continue(&request.args, ctx),
            Phase::SecretChangeCurrent => account_commands::passwd_current(&request.args, ctx),
            Phase::SecretChangeNew => account_commands::passwd_new(&request.args, ctx),
            Phase::Composition => {
                quote_commands::submit_continue(request.free_text.as_deref(), ctx)
            },
            Phase::PollingTop => system_commands::top_refresh(&request.args, ctx),
            Phase::PollingTail => quote_commands::tail_refresh(&request.args, ctx),
            Phase::LoginUsername => Ok(out_of_sequence("login")),
            Phase::RegisterUsername | Phase::RegisterPassword1 => Ok(out_of_sequence("register")),
        }
    }

    fn dispatch_line(&self, line: &str, ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
        let Some(parsed) = parse_line(line) else {
            return Ok(CommandOutcome::empty());
        };
        let Some(spec) = self.catalog.lookup(&parsed.name) else {
            return Ok(not_found(&parsed.name));
        };
        if wants_help(&parsed.args) {
            return Ok(CommandOutcome::lines(spec.usage_lines()));
        }
        (spec.handler)(&parsed.args, ctx)
    }
}

/// Client-local steps are never sent by a well-behaved client.
fn out_of_sequence(flow: &str) -> CommandOutcome {
    CommandOutcome::line(format!("{flow}: unexpected input step."))
}

/// Lowercased first word of the command field, without touching any
/// carried arguments.
fn command_name(request: &CommandRequest) -> Option<String> {
    request
        .command
        .split_whitespace()
        .next()
        .map(str::to_lowercase)
}
