//! Command catalog: a plain mapping from command name to handler function.
//!
//! Handlers share nothing but the [`Handler`] signature, so the catalog is a
//! lookup table of function pointers rather than a trait hierarchy.

use std::collections::{BTreeMap, HashMap};

use bashstory_types::error::Result;
use bashstory_types::protocol::CommandOutcome;

use crate::context::CommandContext;

/// Signature shared by every steady-state command.
pub type Handler = fn(&[&str], &mut CommandContext<'_>) -> Result<CommandOutcome>;

/// One catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// The command name (what the user types).
    pub name: &'static str,
    /// Alternative names dispatching to the same handler.
    pub aliases: &'static [&'static str],
    /// One-line description for `help`.
    pub description: &'static str,
    /// Usage string (e.g. "ls \[-n N\] \[-l\] \[-a\]").
    pub usage: &'static str,
    /// Extra lines shown by `<cmd> --help`.
    pub details: &'static [&'static str],
    /// Category for grouping in `help` output.
    pub category: &'static str,
    pub handler: Handler,
    /// Whether invocations appear in the process table.
    pub tracked: bool,
}

impl CommandSpec {
    /// The block printed for `<cmd> --help` and `help <cmd>`.
    pub fn usage_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Usage: {}", self.usage), String::new()];
        lines.push(self.description.to_string());
        if !self.aliases.is_empty() {
            lines.push(format!("Aliases: {}", self.aliases.join(", ")));
        }
        if !self.details.is_empty() {
            lines.push(String::new());
            lines.extend(self.details.iter().map(|d| d.to_string()));
        }
        lines
    }
}

/// A tokenized steady-state line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    /// First token, lowercased.
    pub name: String,
    pub args: Vec<&'a str>,
}

/// Split a command line on whitespace.
///
/// Returns `None` for blank input. There is no quoting: the grammar is
/// deliberately just words.
pub fn parse_line(line: &str) -> Option<ParsedLine<'_>> {
    let mut words = line.split_whitespace();
    let name = words.next()?.to_lowercase();
    Some(ParsedLine {
        name,
        args: words.collect(),
    })
}

/// Whether the first argument asks for usage.
pub fn wants_help(args: &[&str]) -> bool {
    matches!(args.first(), Some(&"--help") | Some(&"-h"))
}

/// The registry of available commands.
#[derive(Debug, Default)]
pub struct Catalog {
    commands: HashMap<&'static str, CommandSpec>,
    aliases: HashMap<&'static str, &'static str>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding every built-in command.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        crate::register_builtins(&mut catalog);
        catalog
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, spec: CommandSpec) {
        for alias in spec.aliases {
            self.aliases.insert(*alias, spec.name);
        }
        self.commands.insert(spec.name, spec);
    }

    /// Find a command by name or alias. `name` must already be lowercased.
    pub fn lookup(&self, name: &str) -> Option<&CommandSpec> {
        let canonical = self.aliases.get(name).copied().unwrap_or(name);
        self.commands.get(canonical)
    }

    /// Whether an invocation of `name` gets a process record. Unknown names
    /// are tracked like any other non-trivial command.
    pub fn is_tracked(&self, name: &str) -> bool {
        self.lookup(name).is_none_or(|spec| spec.tracked)
    }

    /// Static command list grouped by category.
    pub fn help_lines(&self) -> Vec<String> {
        let mut categories: BTreeMap<&str, Vec<&CommandSpec>> = BTreeMap::new();
        for spec in self.commands.values() {
            categories.entry(spec.category).or_default().push(spec);
        }

        let mut lines = vec![format!("Commands ({}):", self.commands.len())];
        for (category, mut specs) in categories {
            specs.sort_by_key(|s| s.name);
            lines.push(String::new());
            lines.push(format!("  [{category}]"));
            for spec in specs {
                lines.push(format!("    {:<24} {}", spec.usage, spec.description));
            }
        }
        lines.push(String::new());
        lines.push("Type '<command> --help' for details.".to_string());
        lines
    }
}
