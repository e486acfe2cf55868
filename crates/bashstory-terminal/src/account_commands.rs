//! Account commands: login, register, passwd, logout, whoami.
//!
//! The steady-state handlers only open a flow. Credentials arrive later as
//! positional arguments on the flow's continuation request.

use bashstory_types::error::Result;
use bashstory_types::protocol::{CommandOutcome, Phase};

use crate::catalog::{Catalog, CommandSpec};
use crate::context::{CommandContext, SessionDirective};

pub const LOGIN_PROMPT: &str = "login: ";
pub const CURRENT_SECRET_PROMPT: &str = "(passwd) Current password: ";
pub const NEW_SECRET_PROMPT: &str = "(passwd) New password: ";

const MIN_PASSWORD: usize = 4;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=20;

pub fn register(catalog: &mut Catalog) {
    catalog.register(CommandSpec {
        name: "login",
        aliases: &[],
        description: "Log in to an existing account",
        usage: "login",
        details: &["Prompts for username and password.", "Ctrl+C cancels."],
        category: "account",
        handler: cmd_login,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "register",
        aliases: &[],
        description: "Create a new account",
        usage: "register",
        details: &[
            "Prompts for username and password (twice).",
            "Usernames are 3-20 characters of a-z, A-Z, 0-9 and _.",
            "Passwords need at least 4 characters.",
        ],
        category: "account",
        handler: cmd_register,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "passwd",
        aliases: &[],
        description: "Change your password",
        usage: "passwd",
        details: &["Prompts for the current and the new password."],
        category: "account",
        handler: cmd_passwd,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "logout",
        aliases: &["exit"],
        description: "End the session",
        usage: "logout",
        details: &[],
        category: "account",
        handler: cmd_logout,
        tracked: false,
    });
    catalog.register(CommandSpec {
        name: "whoami",
        aliases: &[],
        description: "Print the current user",
        usage: "whoami",
        details: &[],
        category: "account",
        handler: cmd_whoami,
        tracked: false,
    });
}

// ---------------------------------------------------------------------------
// Flow starters
// ---------------------------------------------------------------------------

fn cmd_login(_args: &[&str], _ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    Ok(CommandOutcome::empty().enter(Phase::LoginUsername, LOGIN_PROMPT))
}

fn cmd_register(_args: &[&str], _ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    Ok(CommandOutcome::empty().enter(Phase::RegisterUsername, LOGIN_PROMPT))
}

fn cmd_passwd(_args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    if !ctx.session.is_authenticated() {
        return Ok(CommandOutcome::line("passwd: authentication required."));
    }
    Ok(CommandOutcome::empty().enter(Phase::SecretChangeCurrent, CURRENT_SECRET_PROMPT))
}

fn cmd_logout(_args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    if !ctx.session.is_authenticated() {
        return Ok(CommandOutcome::line("You are not logged in."));
    }
    log::info!("{} logged out", ctx.session.display_name());
    ctx.directive = SessionDirective::End;
    Ok(CommandOutcome::line("Goodbye!").with_prompt(ctx.config.guest_prompt()))
}

fn cmd_whoami(_args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let line = match &ctx.session.username {
        Some(name) if ctx.session.is_privileged => format!("{name} (moderator)"),
        Some(name) => name.clone(),
        None => "guest".to_string(),
    };
    Ok(CommandOutcome::line(line))
}

// ---------------------------------------------------------------------------
// Continuations
// ---------------------------------------------------------------------------

fn arg(args: &[String], i: usize) -> Option<&str> {
    args.get(i).map(String::as_str).filter(|s| !s.is_empty())
}

/// `login-password`: args `[username, password]`.
pub fn login_continue(args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let (Some(username), Some(password)) = (arg(args, 0), arg(args, 1)) else {
        return Ok(CommandOutcome::line("login: username and password are required."));
    };
    match ctx.store.verify_credentials(username, password)? {
        Some(user) => {
            log::info!("{} logged in", user.username);
            ctx.directive = SessionDirective::Start(user.id);
            Ok(CommandOutcome::empty().with_prompt(ctx.prompt_for(&user.username)))
        },
        None => Ok(CommandOutcome::line("login: invalid username or password.")),
    }
}

/// `register-password-2`: args `[username, password, confirmation]`.
pub fn register_continue(args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let (Some(username), Some(password), Some(confirmation)) =
        (arg(args, 0), arg(args, 1), arg(args, 2))
    else {
        return Ok(CommandOutcome::line(
            "register: username and password (twice) are required.",
        ));
    };
    if password != confirmation {
        return Ok(CommandOutcome::line("register: passwords do not match."));
    }
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Ok(CommandOutcome::line(
            "register: username must be 3 to 20 characters long.",
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Ok(CommandOutcome::line(
            "register: username may only contain latin letters, digits and _.",
        ));
    }
    if password.chars().count() < MIN_PASSWORD {
        return Ok(CommandOutcome::line(
            "register: password too short (minimum 4 characters).",
        ));
    }
    if ctx.store.find_user(username)?.is_some() {
        return Ok(CommandOutcome::line(format!(
            "register: user '{username}' already exists."
        )));
    }

    let user = ctx.store.create_user(username, password)?;
    log::info!("registered new user {}", user.username);
    ctx.directive = SessionDirective::Start(user.id);
    Ok(CommandOutcome::empty().with_prompt(ctx.prompt_for(&user.username)))
}

fn current_secret_ok(current: Option<&str>, ctx: &CommandContext<'_>) -> Result<bool> {
    let (Some(name), Some(current)) = (ctx.session.username.as_deref(), current) else {
        return Ok(false);
    };
    Ok(ctx.store.verify_credentials(name, current)?.is_some())
}

/// `secret-change-current`: args `[current]`.
pub fn passwd_current(args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    if !ctx.session.is_authenticated() {
        return Ok(CommandOutcome::line("passwd: authentication required."));
    }
    if !current_secret_ok(arg(args, 0), ctx)? {
        return Ok(CommandOutcome::line("passwd: authentication failed."));
    }
    Ok(CommandOutcome::empty().enter(Phase::SecretChangeNew, NEW_SECRET_PROMPT))
}

/// `secret-change-new`: args `[current, new]`. The current secret is
/// verified again; the earlier round trip is not trusted.
pub fn passwd_new(args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let Some(user_id) = ctx.session.user_id else {
        return Ok(CommandOutcome::line("passwd: authentication required."));
    };
    if !current_secret_ok(arg(args, 0), ctx)? {
        return Ok(CommandOutcome::line("passwd: authentication failed."));
    }
    match arg(args, 1) {
        Some(new) if new.chars().count() >= MIN_PASSWORD => {
            ctx.store.set_password(user_id, new)?;
            log::info!("{} changed password", ctx.session.display_name());
            Ok(CommandOutcome::line("passwd: password updated."))
        },
        _ => Ok(CommandOutcome::line(
            "passwd: password too short (minimum 4 characters).",
        )),
    }
}
