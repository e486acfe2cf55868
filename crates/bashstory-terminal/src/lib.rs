//! Server-side command resolution for bashstory.
//!
//! The [`Resolver`] turns a [`CommandRequest`](bashstory_types::protocol::CommandRequest)
//! into a [`CommandOutcome`](bashstory_types::protocol::CommandOutcome). Phase
//! requests go straight to their flow's continuation; everything else is
//! tokenized and dispatched through the [`Catalog`].

pub mod account_commands;
pub mod catalog;
pub mod context;
pub mod process;
pub mod quote_commands;
pub mod resolver;
pub mod system_commands;

pub use catalog::{Catalog, CommandSpec, Handler};
pub use context::{CommandContext, SessionContext, SessionDirective};
pub use process::{ProcessId, ProcessRecord, ProcessRegistry, ProcessStatus};
pub use resolver::{Resolution, Resolver, SessionChange, identify};

/// Register every built-in command into a catalog.
pub fn register_builtins(catalog: &mut Catalog) {
    account_commands::register(catalog);
    quote_commands::register(catalog);
    system_commands::register(catalog);
}
