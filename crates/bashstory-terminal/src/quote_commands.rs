//! Quote commands: ls, cat, grep, vote, fortune, cowsay, tail, submit and
//! the moderation queue (queue, publish, reject).

use bashstory_store::{Quote, QuoteId, QuoteStatus, VoteDirection, VoteOutcome, Voter};
use bashstory_types::error::Result;
use bashstory_types::protocol::{CommandOutcome, Phase};

use crate::catalog::{Catalog, CommandSpec};
use crate::context::CommandContext;

const LS_DEFAULT: usize = 10;
const LS_MAX: usize = 50;
const LS_ALL: usize = 100;
const GREP_LIMIT: usize = 20;
const COW_WIDTH: usize = 40;
const QUOTE_MIN: usize = 10;
const QUOTE_MAX: usize = 1000;

pub const COMPOSE_PROMPT: &str = "> ";

pub fn register(catalog: &mut Catalog) {
    catalog.register(CommandSpec {
        name: "ls",
        aliases: &["dir"],
        description: "List recent quotes",
        usage: "ls [-n N] [-l] [-a]",
        details: &[
            "  -n N    number of quotes (default 10, max 50)",
            "  -l      longer previews",
            "  -a      list up to 100 quotes",
        ],
        category: "quotes",
        handler: cmd_ls,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "cat",
        aliases: &[],
        description: "Show a quote in full",
        usage: "cat <id>",
        details: &[],
        category: "quotes",
        handler: cmd_cat,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "grep",
        aliases: &[],
        description: "Search quotes",
        usage: "grep <text>",
        details: &["Case-insensitive substring search, at most 20 results."],
        category: "quotes",
        handler: cmd_grep,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "vote",
        aliases: &[],
        description: "Vote a quote up or down",
        usage: "vote <+|-> <id>",
        details: &["One vote per quote per user (or per address when logged out)."],
        category: "quotes",
        handler: cmd_vote,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "fortune",
        aliases: &[],
        description: "Print a random quote",
        usage: "fortune",
        details: &[],
        category: "quotes",
        handler: cmd_fortune,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "cowsay",
        aliases: &[],
        description: "A quote, as told by a cow",
        usage: "cowsay [id]",
        details: &["Without an id a random quote is used."],
        category: "quotes",
        handler: cmd_cowsay,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "tail",
        aliases: &[],
        description: "Show the newest quotes",
        usage: "tail [-f] [-n N]",
        details: &[
            "  -f, --follow   refresh every 2 seconds (Ctrl+C to exit)",
            "  -n N           number of quotes (default 10, max 50)",
        ],
        category: "quotes",
        handler: cmd_tail,
        tracked: false,
    });
    catalog.register(CommandSpec {
        name: "submit",
        aliases: &["nano"],
        description: "Write a new quote",
        usage: "submit",
        details: &[
            "Opens the editor. Ctrl+S sends the quote to moderation, Ctrl+X cancels.",
            "Quotes are 10 to 1000 characters.",
        ],
        category: "quotes",
        handler: cmd_submit,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "queue",
        aliases: &[],
        description: "List quotes awaiting moderation",
        usage: "queue",
        details: &["Moderators only."],
        category: "moderation",
        handler: cmd_queue,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "publish",
        aliases: &[],
        description: "Approve a pending quote",
        usage: "publish <id>",
        details: &["Moderators only."],
        category: "moderation",
        handler: cmd_publish,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "reject",
        aliases: &[],
        description: "Reject a pending quote",
        usage: "reject <id>",
        details: &["Moderators only."],
        category: "moderation",
        handler: cmd_reject,
        tracked: true,
    });
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// `+3`, `0` is shown as `+0`, `-2`.
pub fn format_rating(rating: i64) -> String {
    if rating >= 0 {
        format!("+{rating}")
    } else {
        rating.to_string()
    }
}

/// Single-line preview truncated to `max` characters.
pub fn preview(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    }
}

fn date(quote: &Quote) -> String {
    quote.created_at.format("%Y-%m-%d").to_string()
}

fn parse_id(s: &str) -> Option<QuoteId> {
    s.strip_prefix('#').unwrap_or(s).parse().ok()
}

/// `[#id] (+r) author, date:` followed by the indented text.
fn full_entry(quote: &Quote, lines: &mut Vec<String>) {
    lines.push(format!(
        "[#{}] ({}) {}, {}:",
        quote.id,
        format_rating(quote.rating),
        quote.author,
        date(quote)
    ));
    lines.extend(quote.text.lines().map(|l| format!("  {l}")));
}

/// Word-wrap for the cow's speech bubble. Words longer than `width` are
/// split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: String = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            lines.push(head);
        }
        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn cow(text: &str) -> Vec<String> {
    let body = wrap(text, COW_WIDTH);
    let width = body.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let border = "-".repeat(width + 2);
    let mut lines = vec![format!(" {border}")];
    for l in &body {
        let pad = width - l.chars().count();
        lines.push(format!("| {l}{} |", " ".repeat(pad)));
    }
    lines.push(format!(" {border}"));
    lines.extend(
        [
            "        \\   ^__^",
            "         \\  (oo)\\_______",
            "            (__)\\       )\\/\\",
            "                ||----w |",
            "                ||     ||",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    lines
}

/// Parse `-n N`, clamped to `1..=LS_MAX`. Unparsable values fall back to the
/// default.
fn count_flag(args: &[&str]) -> usize {
    args.iter()
        .position(|a| *a == "-n")
        .and_then(|i| args.get(i + 1))
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map_or(LS_DEFAULT, |n| n.min(LS_MAX))
}

// ---------------------------------------------------------------------------
// Browsing
// ---------------------------------------------------------------------------

fn cmd_ls(args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let long = args.contains(&"-l");
    let limit = if args.contains(&"-a") {
        LS_ALL
    } else {
        count_flag(args)
    };
    let width = if long { 80 } else { 50 };

    let quotes = ctx.store.quotes(QuoteStatus::Approved, limit)?;
    if quotes.is_empty() {
        return Ok(CommandOutcome::line("No quotes yet."));
    }
    Ok(CommandOutcome::lines(quotes.iter().map(|q| {
        format!(
            "  #{} ({}) \"{}\" -- {}, {}",
            q.id,
            format_rating(q.rating),
            preview(&q.text, width),
            q.author,
            date(q)
        )
    })))
}

fn approved(ctx: &CommandContext<'_>, id: QuoteId) -> Result<Option<Quote>> {
    Ok(ctx
        .store
        .quote(id)?
        .filter(|q| q.status == QuoteStatus::Approved))
}

fn cmd_cat(args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let Some(raw) = args.first() else {
        return Ok(CommandOutcome::line("Usage: cat <id>"));
    };
    let Some(id) = parse_id(raw) else {
        return Ok(CommandOutcome::line(format!("cat: invalid quote id: {raw}")));
    };
    let Some(quote) = approved(ctx, id)? else {
        return Ok(CommandOutcome::line(format!("cat: quote #{id} not found.")));
    };
    let mut lines = Vec::new();
    full_entry(&quote, &mut lines);
    Ok(CommandOutcome::lines(lines).rich())
}

fn cmd_grep(args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    if args.is_empty() {
        return Ok(CommandOutcome::line("Usage: grep <text>"));
    }
    let needle = args.join(" ");
    let hits = ctx.store.search(&needle, GREP_LIMIT)?;
    if hits.is_empty() {
        return Ok(CommandOutcome::line(format!(
            "grep: nothing found for '{needle}'."
        )));
    }
    let mut lines = vec![format!("Found: {}", hits.len())];
    lines.extend(hits.iter().map(|q| {
        format!(
            "  #{} ({}) \"{}\"",
            q.id,
            format_rating(q.rating),
            preview(&q.text, 60)
        )
    }));
    Ok(CommandOutcome::lines(lines))
}

fn cmd_vote(args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let (Some(dir), Some(raw)) = (args.first(), args.get(1)) else {
        return Ok(CommandOutcome::line("Usage: vote <+|-> <id>"));
    };
    let Some(direction) = VoteDirection::parse(dir) else {
        return Ok(CommandOutcome::line("vote: direction must be + or -."));
    };
    let Some(id) = parse_id(raw) else {
        return Ok(CommandOutcome::line(format!("vote: invalid quote id: {raw}")));
    };
    let voter = match ctx.session.user_id {
        Some(uid) => Voter::User(uid),
        None => Voter::Address(ctx.session.origin_ip.clone()),
    };
    let line = match ctx.store.vote(id, &voter, direction)? {
        VoteOutcome::Counted(rating) => format!(
            "Vote counted. Current rating of quote #{id}: {}",
            format_rating(rating)
        ),
        VoteOutcome::AlreadyVoted => "You have already voted for this quote.".to_string(),
        VoteOutcome::NotFound => format!("vote: quote #{id} not found."),
    };
    Ok(CommandOutcome::line(line))
}

fn cmd_fortune(_args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let Some(quote) = ctx.store.random_quote()? else {
        return Ok(CommandOutcome::line("No quotes yet."));
    };
    let mut lines: Vec<String> = quote.text.lines().map(str::to_string).collect();
    lines.push(format!("    -- {} (#{})", quote.author, quote.id));
    Ok(CommandOutcome::lines(lines))
}

fn cmd_cowsay(args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let quote = match args.first() {
        Some(raw) => {
            let Some(id) = parse_id(raw) else {
                return Ok(CommandOutcome::line(format!("cowsay: invalid quote id: {raw}")));
            };
            match approved(ctx, id)? {
                Some(q) => q,
                None => return Ok(CommandOutcome::line(format!("cowsay: quote #{id} not found."))),
            }
        },
        None => match ctx.store.random_quote()? {
            Some(q) => q,
            None => return Ok(CommandOutcome::lines(cow("Moo!"))),
        },
    };
    Ok(CommandOutcome::lines(cow(&quote.text)))
}

/// Newest approved quotes in full. Shared by `tail` and its refresh.
fn tail_frame(args: &[&str], ctx: &CommandContext<'_>) -> Result<Vec<String>> {
    let quotes = ctx.store.quotes(QuoteStatus::Approved, count_flag(args))?;
    if quotes.is_empty() {
        return Ok(vec!["No quotes yet.".to_string()]);
    }
    let mut lines = Vec::new();
    for q in &quotes {
        full_entry(q, &mut lines);
    }
    Ok(lines)
}

fn cmd_tail(args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let follow = args.iter().any(|a| *a == "-f" || *a == "--follow");
    let outcome = CommandOutcome::lines(tail_frame(args, ctx)?);
    Ok(if follow {
        outcome.polling(Phase::PollingTail)
    } else {
        outcome
    })
}

/// `polling-tail`: one refresh frame, args are the original tail options.
pub fn tail_refresh(args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    Ok(CommandOutcome::lines(tail_frame(&args, ctx)?))
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

fn login_required() -> CommandOutcome {
    CommandOutcome::lines([
        "Only logged-in users can submit quotes.",
        "Use login or register.",
    ])
}

fn cmd_submit(_args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    if !ctx.session.is_authenticated() {
        return Ok(login_required());
    }
    Ok(CommandOutcome::line("Ctrl+S: send to moderation   Ctrl+X: cancel")
        .enter(Phase::Composition, COMPOSE_PROMPT))
}

/// `composition`: the editor buffer arrives as free text.
pub fn submit_continue(text: Option<&str>, ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let Some(author) = ctx.session.user_id else {
        return Ok(login_required());
    };
    let text = text.unwrap_or_default().trim();
    let len = text.chars().count();
    if len == 0 {
        return Ok(CommandOutcome::line("Submission cancelled."));
    }
    if len < QUOTE_MIN {
        return Ok(CommandOutcome::line(
            "submit: quote too short (minimum 10 characters).",
        ));
    }
    if len > QUOTE_MAX {
        return Ok(CommandOutcome::line(
            "submit: quote too long (maximum 1000 characters).",
        ));
    }
    let id = ctx.store.insert_quote(text, author)?;
    log::info!("quote #{id} submitted by {}", ctx.session.display_name());
    Ok(CommandOutcome::line(format!(
        "Quote submitted for moderation (ID: #{id})."
    )))
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

fn denied(cmd: &str) -> CommandOutcome {
    CommandOutcome::line(format!("{cmd}: permission denied (moderators only)."))
}

fn cmd_queue(_args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    if !ctx.session.is_privileged {
        return Ok(denied("queue"));
    }
    let pending = ctx.store.quotes(QuoteStatus::Pending, LS_ALL)?;
    if pending.is_empty() {
        return Ok(CommandOutcome::line("Moderation queue is empty."));
    }
    let mut lines = vec![format!("Pending: {}", pending.len())];
    for q in &pending {
        full_entry(q, &mut lines);
    }
    Ok(CommandOutcome::lines(lines))
}

fn moderate(
    cmd: &str,
    args: &[&str],
    ctx: &mut CommandContext<'_>,
    status: QuoteStatus,
) -> Result<CommandOutcome> {
    if !ctx.session.is_privileged {
        return Ok(denied(cmd));
    }
    let Some(raw) = args.first() else {
        return Ok(CommandOutcome::line(format!("Usage: {cmd} <id>")));
    };
    let Some(id) = parse_id(raw) else {
        return Ok(CommandOutcome::line(format!("{cmd}: invalid quote id: {raw}")));
    };
    match ctx.store.quote(id)? {
        None => Ok(CommandOutcome::line(format!("{cmd}: quote #{id} not found."))),
        Some(q) if q.status != QuoteStatus::Pending => Ok(CommandOutcome::line(format!(
            "{cmd}: quote #{id} is not pending ({}).",
            q.status.as_str()
        ))),
        Some(_) => {
            ctx.store.set_status(id, status)?;
            log::info!("quote #{id} {} by {}", status.as_str(), ctx.session.display_name());
            Ok(CommandOutcome::line(format!("Quote #{id} {}.", status.as_str())))
        },
    }
}

fn cmd_publish(args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    moderate("publish", args, ctx, QuoteStatus::Approved)
}

fn cmd_reject(args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    moderate("reject", args, ctx, QuoteStatus::Rejected)
}
