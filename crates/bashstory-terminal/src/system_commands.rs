//! System commands: help, clear, theme, reboot, top, date, echo.

use bashstory_types::error::Result;
use bashstory_types::protocol::{CommandOutcome, Phase};
use chrono::{DateTime, Utc};

use crate::catalog::{Catalog, CommandSpec};
use crate::context::{CommandContext, SessionDirective};
use crate::process::ProcessRegistry;

/// Maximum rows in a `top` frame.
const TOP_ROWS: usize = 15;

pub fn register(catalog: &mut Catalog) {
    catalog.register(CommandSpec {
        name: "help",
        aliases: &[],
        description: "List commands",
        usage: "help [command]",
        details: &[],
        category: "system",
        handler: cmd_help,
        tracked: false,
    });
    catalog.register(CommandSpec {
        name: "clear",
        aliases: &[],
        description: "Clear the screen",
        usage: "clear",
        details: &[],
        category: "system",
        handler: cmd_clear,
        tracked: false,
    });
    catalog.register(CommandSpec {
        name: "theme",
        aliases: &[],
        description: "Change the terminal colour",
        usage: "theme <#RRGGBB>",
        details: &["Example: theme #FFB000"],
        category: "system",
        handler: cmd_theme,
        tracked: false,
    });
    catalog.register(CommandSpec {
        name: "reboot",
        aliases: &[],
        description: "Restart the terminal and end the session",
        usage: "reboot",
        details: &[],
        category: "system",
        handler: cmd_reboot,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "top",
        aliases: &[],
        description: "Live process monitor",
        usage: "top",
        details: &["Refreshes every second. Press q to quit."],
        category: "system",
        handler: cmd_top,
        tracked: false,
    });
    catalog.register(CommandSpec {
        name: "date",
        aliases: &[],
        description: "Print the server date and time",
        usage: "date",
        details: &[],
        category: "system",
        handler: cmd_date,
        tracked: true,
    });
    catalog.register(CommandSpec {
        name: "echo",
        aliases: &[],
        description: "Print arguments",
        usage: "echo [text...]",
        details: &[],
        category: "system",
        handler: cmd_echo,
        tracked: true,
    });
}

// ---------------------------------------------------------------------------
// help / clear / theme / reboot
// ---------------------------------------------------------------------------

fn cmd_help(args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    match args.first() {
        None => Ok(CommandOutcome::lines(ctx.catalog.help_lines())),
        Some(name) => match ctx.catalog.lookup(&name.to_lowercase()) {
            Some(spec) => Ok(CommandOutcome::lines(spec.usage_lines())),
            None => Ok(CommandOutcome::line(format!("help: no such command: {name}"))),
        },
    }
}

fn cmd_clear(_args: &[&str], _ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    Ok(CommandOutcome::empty().clearing())
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn cmd_theme(args: &[&str], _ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    let Some(color) = args.first() else {
        return Ok(CommandOutcome::lines([
            "Usage: theme <#RRGGBB>",
            "Example: theme #FFB000",
        ]));
    };
    if !is_hex_color(color) {
        return Ok(CommandOutcome::line(format!(
            "theme: invalid colour '{color}'. Use #RRGGBB."
        )));
    }
    let color = color.to_ascii_uppercase();
    Ok(CommandOutcome::line(format!("Theme colour set to {color}.")).with_theme(color))
}

fn cmd_reboot(_args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    ctx.directive = SessionDirective::End;
    log::info!("reboot requested by {}", ctx.session.display_name());
    Ok(CommandOutcome::lines([
        String::new(),
        format!(
            "Broadcast message from {}@{}:",
            ctx.session.display_name(),
            ctx.config.hostname
        ),
        "  The system is going down for reboot NOW!".to_string(),
        String::new(),
    ])
    .clearing())
}

// ---------------------------------------------------------------------------
// top
// ---------------------------------------------------------------------------

struct TopRow {
    pid: u32,
    user: String,
    cpu: f32,
    mem: f32,
    elapsed_secs: i64,
    command: String,
}

/// Fixed rows so the table is never empty.
fn kernel_rows(uptime_secs: i64) -> Vec<TopRow> {
    [
        (1, "root", 0.1, 0.5, "init"),
        (2, "root", 0.0, 0.0, "kthreadd"),
        (45, "www-data", 2.3, 4.2, "bashstory-server"),
        (128, "www-data", 5.1, 8.7, "bashstory-worker"),
    ]
    .into_iter()
    .map(|(pid, user, cpu, mem, command)| TopRow {
        pid,
        user: user.to_string(),
        cpu,
        mem,
        elapsed_secs: uptime_secs,
        command: command.to_string(),
    })
    .collect()
}

fn format_uptime(secs: i64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    match days {
        0 => format!("{hours}:{minutes:02}"),
        1 => format!("1 day, {hours:2}:{minutes:02}"),
        d => format!("{d} days, {hours:2}:{minutes:02}"),
    }
}

fn format_cpu_time(secs: i64) -> String {
    format!("{}:{:02}.00", secs / 60, secs % 60)
}

/// Render one monitor frame from the registry at `now`.
pub fn top_frame(processes: &ProcessRegistry, now: DateTime<Utc>) -> Vec<String> {
    let uptime = (now - processes.started_at()).num_seconds().max(0);
    let mut rows = kernel_rows(uptime);
    let running = processes.running();
    let mut users: Vec<&str> = running.iter().map(|r| r.owner.as_str()).collect();
    users.sort_unstable();
    users.dedup();

    rows.extend(running.iter().map(|r| TopRow {
        pid: r.pid,
        user: r.owner.clone(),
        cpu: r.cpu_load,
        mem: r.mem_load,
        elapsed_secs: (now - r.created_at).num_seconds().max(0),
        command: r.command_line.clone(),
    }));
    rows.sort_by(|a, b| b.cpu.total_cmp(&a.cpu));
    rows.truncate(TOP_ROWS);

    let total_cpu: f32 = rows.iter().map(|r| r.cpu).sum();
    let active = rows.iter().filter(|r| r.cpu > 0.0).count();
    let load = total_cpu / 100.0;

    let mut lines = vec![
        format!(
            "top - {} up {},  {} user{},  load average: {:.2}, {:.2}, {:.2}",
            now.format("%H:%M:%S"),
            format_uptime(uptime),
            users.len().max(1),
            if users.len() > 1 { "s" } else { "" },
            load,
            load * 0.9,
            load * 0.8
        ),
        format!(
            "Tasks: {} total,   {} running,   {} sleeping,   0 stopped,   0 zombie",
            rows.len(),
            active,
            rows.len() - active
        ),
        format!(
            "%Cpu(s):  {:.1} us,  1.2 sy,  0.0 ni,  {:.1} id,  0.0 wa,  0.0 hi,  0.0 si,  0.0 st",
            total_cpu,
            (100.0 - total_cpu).max(0.0)
        ),
        "MiB Mem :   8192.0 total,   2048.0 free,   1536.0 used,   4608.0 buff/cache".to_string(),
        "MiB Swap:   2048.0 total,   2048.0 free,      0.0 used.   6144.0 avail Mem".to_string(),
        String::new(),
        "  PID USER      PR  NI    VIRT    RES    SHR S  %CPU  %MEM     TIME+ COMMAND".to_string(),
    ];
    for r in &rows {
        let virt = (r.mem * 4096.0) as u32 + 10_240;
        let res = (r.mem * 1024.0) as u32 + 2048;
        let shr = (r.mem * 256.0) as u32 + 1024;
        let state = if r.cpu > 0.0 { 'R' } else { 'S' };
        lines.push(format!(
            "{:>5} {:<9} {:>3} {:>3} {:>7} {:>6} {:>6} {} {:>5.1} {:>5.1} {:>9} {}",
            r.pid,
            truncate(&r.user, 9),
            20,
            0,
            virt,
            res,
            shr,
            state,
            r.cpu,
            r.mem,
            format_cpu_time(r.elapsed_secs),
            r.command
        ));
    }
    lines
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('+');
        out
    }
}

fn cmd_top(_args: &[&str], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    Ok(CommandOutcome::lines(top_frame(ctx.processes, Utc::now())).polling(Phase::PollingTop))
}

/// `polling-top`: one refresh frame.
pub fn top_refresh(_args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    Ok(CommandOutcome::lines(top_frame(ctx.processes, Utc::now())))
}

// ---------------------------------------------------------------------------
// date / echo
// ---------------------------------------------------------------------------

fn cmd_date(_args: &[&str], _ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    Ok(CommandOutcome::line(
        Utc::now().format("%a %b %e %H:%M:%S UTC %Y").to_string(),
    ))
}

fn cmd_echo(args: &[&str], _ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
    Ok(CommandOutcome::line(args.join(" ")))
}
