//! Line-mode host for the bashstory terminal.
//!
//! Reads whole lines from stdin and replays them as key events. A line of
//! `^C`, `^S` or `^X` sends the matching control gesture, a line naming one
//! key in angle brackets (`<ArrowUp>`, `<Home>`) presses that key, and a
//! trailing tab requests completion instead of submitting. Pass a client
//! TOML file as the first argument, or set `BASHSTORY_ENDPOINT`.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::Result;
use bashstory_client::{HttpTransport, Terminal, Transport};
use bashstory_types::config::ClientConfig;
use bashstory_types::input::InputEvent;

const FRAME_WAIT: Duration = Duration::from_millis(100);

fn load_config() -> Result<ClientConfig> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::from_toml(&std::fs::read_to_string(&path)?)?,
        None => ClientConfig::default(),
    };
    if let Ok(endpoint) = std::env::var("BASHSTORY_ENDPOINT") {
        config.endpoint = endpoint;
    }
    Ok(config)
}

/// A whole line that stands for a single key press.
fn gesture(line: &str) -> Option<InputEvent> {
    let line = line.trim();
    if let Some(key) = line.strip_prefix('^') {
        return InputEvent::from_key(key, true);
    }
    line.strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .filter(|name| !name.is_empty())
        .and_then(|name| InputEvent::from_key(name, false))
}

fn feed<T: Transport>(term: &mut Terminal<T>, line: &str, now: Instant) {
    if let Some(event) = gesture(line) {
        term.handle_event(event, now);
        return;
    }
    let (text, complete) = match line.strip_suffix('\t') {
        Some(text) => (text, true),
        None => (line, false),
    };
    for ch in text.chars() {
        term.handle_event(InputEvent::TextInput(ch), now);
    }
    let last = if complete {
        InputEvent::Tab
    } else {
        InputEvent::Enter
    };
    term.handle_event(last, now);
}

fn render<T: Transport>(term: &Terminal<T>) -> io::Result<()> {
    let mut out = io::stdout().lock();
    write!(out, "\x1b[2J\x1b[H")?;
    if let Some(poller) = term.interactive() {
        for line in poller.frame() {
            writeln!(out, "{line}")?;
        }
        writeln!(out, "{}", poller.footer())?;
    } else if let Some(editor) = term.editor() {
        writeln!(out, "{}", bashstory_client::editor::EDITOR_TITLE)?;
        for line in editor.lines() {
            writeln!(out, "{line}")?;
        }
        writeln!(out, "{}", bashstory_client::editor::EDITOR_FOOTER)?;
    } else {
        for line in term.screen() {
            writeln!(out, "{}", line.text)?;
        }
        if let Some(s) = term.suggestion() {
            writeln!(out, "{s}")?;
        }
        write!(out, "{}{}", term.prompt(), term.visible_input())?;
    }
    out.flush()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = load_config()?;
    log::info!("bashstory client talking to {}", config.endpoint);
    let transport = HttpTransport::new(config.endpoint.clone())?;
    let mut term = Terminal::new(transport, config);

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut drawn = None;
    loop {
        if drawn != Some(term.revision()) {
            render(&term)?;
            drawn = Some(term.revision());
        }
        match rx.recv_timeout(FRAME_WAIT) {
            Ok(line) => feed(&mut term, &line, Instant::now()),
            Err(RecvTimeoutError::Timeout) => {},
            Err(RecvTimeoutError::Disconnected) => break,
        }
        term.tick(Instant::now());
    }
    writeln!(io::stdout())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_lines_are_gestures() {
        assert_eq!(gesture("^C"), Some(InputEvent::Interrupt));
        assert_eq!(gesture(" ^s "), Some(InputEvent::SaveBuffer));
        assert_eq!(gesture("^X"), Some(InputEvent::CloseBuffer));
    }

    #[test]
    fn bracketed_key_names() {
        assert_eq!(gesture("<ArrowUp>"), Some(InputEvent::HistoryPrev));
        assert_eq!(gesture("<End>"), Some(InputEvent::End));
        assert_eq!(gesture("<>"), None);
        assert_eq!(gesture("<F5>"), None);
    }

    #[test]
    fn ordinary_text_is_not_a_gesture() {
        assert_eq!(gesture("ls -n 3"), None);
        assert_eq!(gesture("echo ^C"), None);
    }
}
