//! Tab completion over an authentication-gated command vocabulary.

use std::time::{Duration, Instant};

use crate::line::LineBuffer;

/// Commands offered to guests.
pub const PRE_AUTH_COMMANDS: &[&str] = &[
    "cat", "clear", "cowsay", "date", "dir", "echo", "fortune", "grep", "help", "login", "ls",
    "reboot", "register", "tail", "theme", "top", "vote", "whoami",
];

/// Commands offered once logged in.
pub const POST_AUTH_COMMANDS: &[&str] = &[
    "cat", "clear", "cowsay", "date", "dir", "echo", "exit", "fortune", "grep", "help", "logout",
    "ls", "nano", "passwd", "publish", "queue", "reboot", "reject", "submit", "tail", "theme",
    "top", "vote", "whoami",
];

/// The vocabulary for the current authentication state.
pub fn vocabulary(authenticated: bool) -> &'static [&'static str] {
    if authenticated {
        POST_AUTH_COMMANDS
    } else {
        PRE_AUTH_COMMANDS
    }
}

/// What a completion request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Nothing to do: empty word, no match, or first Tab on an ambiguous word.
    None,
    /// The word was replaced by the single match.
    Completed,
    /// The word was extended to the common prefix of several matches.
    Extended,
    /// Second Tab inside the window: list the candidates, buffer untouched.
    Candidates(Vec<String>),
}

/// Tab completion with a double-Tab listing window.
#[derive(Debug, Clone)]
pub struct Completer {
    window: Duration,
    /// Word left in the buffer by the last ambiguous completion, and when.
    last: Option<(String, Instant)>,
}

fn common_prefix<'a>(words: &[&'a str]) -> &'a str {
    let Some(first) = words.first() else {
        return "";
    };
    let mut len = first.len();
    for w in &words[1..] {
        len = first
            .char_indices()
            .zip(w.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8())
            .min(len);
    }
    &first[..len]
}

impl Completer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Complete the word under the cursor against `vocab`.
    ///
    /// The word runs from just after the nearest space before the cursor up
    /// to the cursor. Matching ignores case, as the resolver does.
    pub fn complete(&mut self, buffer: &mut LineBuffer, vocab: &[&str], now: Instant) -> Completion {
        let before = buffer.before_cursor();
        let word_start = before.rfind(' ').map_or(0, |i| i + 1);
        let word = before[word_start..].to_lowercase();
        if word.is_empty() {
            return Completion::None;
        }
        let start_char = before[..word_start].chars().count();
        let end_char = buffer.cursor();

        let matches: Vec<&str> = vocab.iter().copied().filter(|c| c.starts_with(&word)).collect();
        match matches.as_slice() {
            [] => Completion::None,
            [only] => {
                buffer.replace_range(start_char, end_char, only);
                self.last = None;
                Completion::Completed
            },
            _ => {
                let prefix = common_prefix(&matches);
                if word.len() < prefix.len() {
                    buffer.replace_range(start_char, end_char, prefix);
                    self.last = Some((prefix.to_string(), now));
                    return Completion::Extended;
                }
                let repeat = self
                    .last
                    .as_ref()
                    .is_some_and(|(w, at)| *w == word && now.duration_since(*at) <= self.window);
                if repeat {
                    Completion::Candidates(matches.iter().map(|m| m.to_string()).collect())
                } else {
                    self.last = Some((word, now));
                    Completion::None
                }
            },
        }
    }
}

impl Default for Completer {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const LOG: &[&str] = &["login", "logout"];

    fn buffer(s: &str) -> LineBuffer {
        let mut b = LineBuffer::new();
        b.set(s);
        b
    }

    #[test]
    fn common_prefix_of_words() {
        assert_eq!(common_prefix(&["login", "logout"]), "log");
        assert_eq!(common_prefix(&["ls"]), "ls");
        assert_eq!(common_prefix(&["cat", "dir"]), "");
    }

    #[test]
    fn double_tab_lists_candidates() {
        let mut c = Completer::default();
        let mut b = buffer("lo");
        let t0 = Instant::now();
        assert_eq!(c.complete(&mut b, LOG, t0), Completion::Extended);
        assert_eq!(b.text(), "log");
        let listed = c.complete(&mut b, LOG, t0 + Duration::from_millis(500));
        assert_eq!(listed, Completion::Candidates(vec!["login".into(), "logout".into()]));
        assert_eq!(b.text(), "log");
        assert_eq!(b.cursor(), 3);
    }

    #[test]
    fn second_tab_after_window_does_not_list() {
        let mut c = Completer::default();
        let mut b = buffer("lo");
        let t0 = Instant::now();
        c.complete(&mut b, LOG, t0);
        let late = c.complete(&mut b, LOG, t0 + Duration::from_millis(2500));
        assert_eq!(late, Completion::None);
        // That Tab re-armed the window.
        let again = c.complete(&mut b, LOG, t0 + Duration::from_millis(3000));
        assert!(matches!(again, Completion::Candidates(_)));
    }

    #[test]
    fn unique_match_replaces_word() {
        let mut c = Completer::default();
        let mut b = buffer("fort");
        assert_eq!(c.complete(&mut b, PRE_AUTH_COMMANDS, Instant::now()), Completion::Completed);
        assert_eq!(b.text(), "fortune");
        assert_eq!(b.cursor(), 7);
    }

    #[test]
    fn completes_word_under_cursor_only() {
        let mut c = Completer::default();
        let mut b = buffer("who -x");
        b.set_cursor(3);
        c.complete(&mut b, PRE_AUTH_COMMANDS, Instant::now());
        assert_eq!(b.text(), "whoami -x");
        assert_eq!(b.cursor(), 6);
    }

    #[test]
    fn matching_ignores_case() {
        let now = Instant::now();
        let mut c = Completer::default();
        let mut b = buffer("WHO");
        assert_eq!(c.complete(&mut b, POST_AUTH_COMMANDS, now), Completion::Completed);
        assert_eq!(b.text(), "whoami");

        let mut b = buffer("Lo");
        assert_eq!(c.complete(&mut b, LOG, now), Completion::Extended);
        assert_eq!(b.text(), "log");
    }

    #[test]
    fn empty_word_and_no_match_are_noops() {
        let mut c = Completer::default();
        let mut b = buffer("ls ");
        assert_eq!(c.complete(&mut b, PRE_AUTH_COMMANDS, Instant::now()), Completion::None);
        let mut b = buffer("zz");
        assert_eq!(c.complete(&mut b, PRE_AUTH_COMMANDS, Instant::now()), Completion::None);
        assert_eq!(b.text(), "zz");
    }

    #[test]
    fn vocabulary_depends_on_auth() {
        assert!(vocabulary(false).contains(&"login"));
        assert!(!vocabulary(false).contains(&"logout"));
        assert!(vocabulary(true).contains(&"submit"));
        assert!(!vocabulary(true).contains(&"register"));
    }

    proptest! {
        #[test]
        fn unique_completion_is_idempotent(idx in 0..POST_AUTH_COMMANDS.len()) {
            let name = POST_AUTH_COMMANDS[idx];
            let unique = POST_AUTH_COMMANDS.iter().filter(|c| c.starts_with(name)).count() == 1;
            prop_assume!(unique);
            let mut c = Completer::default();
            let mut b = buffer(name);
            b.home();
            b.end();
            c.complete(&mut b, POST_AUTH_COMMANDS, Instant::now());
            prop_assert_eq!(b.text(), name);
            prop_assert_eq!(b.cursor(), name.chars().count());
        }
    }
}
