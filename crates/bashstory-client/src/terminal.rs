//! The terminal facade a host drives with input events and clock ticks.
//!
//! Owns the screen, prompt, input line, history, completion, the input-mode
//! machine, and whichever of the editor or the poller is active. Hosts feed
//! it [`InputEvent`]s together with a monotonic [`Instant`] and call
//! [`Terminal::tick`] regularly; nothing here spawns threads or timers.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use bashstory_types::config::ClientConfig;
use bashstory_types::error::BashError;
use bashstory_types::input::InputEvent;
use bashstory_types::protocol::{CommandOutcome, CommandRequest, Phase};

use crate::completion::{Completer, Completion, vocabulary};
use crate::editor::{Editor, EditorAction};
use crate::history::History;
use crate::line::LineBuffer;
use crate::machine::{InputMachine, Submission, Transition};
use crate::poller::Poller;
use crate::transport::Transport;

/// Shown on start, after logout and after reboot.
pub const BANNER: &[&str] = &[
    "+------------------------------------------+",
    "|  bashstory :: quotes from the terminal   |",
    "+------------------------------------------+",
    "Type 'help' for a list of commands.",
    "",
];

pub const CONNECTION_ERROR: &str = "Connection error.";
pub const CANCEL_MARKER: &str = "^C";
pub const SUBMISSION_CANCELLED: &str = "Submission cancelled.";

/// How a scrollback line is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Resolver output.
    Output,
    /// An echoed command line, prompt included.
    Command,
    /// The prompt of a secret step, echoed without the secret.
    Prompt,
}

/// One line of scrollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub kind: LineKind,
    /// Render as markdown.
    pub rich: bool,
}

/// Client-side terminal session.
pub struct Terminal<T: Transport> {
    transport: T,
    config: ClientConfig,
    screen: VecDeque<Line>,
    /// Bumped on every visible change so hosts know when to redraw.
    revision: u64,
    prompt: String,
    theme: String,
    input: LineBuffer,
    history: History,
    completer: Completer,
    machine: InputMachine,
    editor: Option<Editor>,
    poller: Option<Poller>,
    authenticated: bool,
    suggestion: Option<String>,
}

fn first_word(line: &str) -> String {
    line.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

impl<T: Transport> Terminal<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        let mut term = Self {
            transport,
            screen: VecDeque::new(),
            revision: 0,
            prompt: config.prompt.clone(),
            theme: config.theme.clone(),
            input: LineBuffer::new(),
            history: History::new(config.max_history),
            completer: Completer::new(Duration::from_millis(config.double_tab_ms)),
            machine: InputMachine::new(),
            editor: None,
            poller: None,
            authenticated: false,
            suggestion: None,
            config,
        };
        term.show_banner();
        term
    }

    // -----------------------------------------------------------------------
    // Read side for hosts
    // -----------------------------------------------------------------------

    pub fn screen(&self) -> impl Iterator<Item = &Line> {
        self.screen.iter()
    }

    /// Scrollback text only, for hosts and tests that ignore styling.
    pub fn screen_text(&self) -> Vec<&str> {
        self.screen.iter().map(|l| l.text.as_str()).collect()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Prompt for the next line: the active step's, else the session's.
    pub fn prompt(&self) -> &str {
        self.machine.prompt().unwrap_or(&self.prompt)
    }

    /// The input line as it should be drawn. Blank while a secret is typed.
    pub fn visible_input(&self) -> &str {
        if self.machine.phase().is_secret() {
            ""
        } else {
            self.input.text()
        }
    }

    pub fn cursor(&self) -> usize {
        if self.machine.phase().is_secret() {
            0
        } else {
            self.input.cursor()
        }
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn editor(&self) -> Option<&Editor> {
        self.editor.as_ref()
    }

    /// The active polling display, if any.
    pub fn interactive(&self) -> Option<&Poller> {
        self.poller.as_ref()
    }

    /// Candidates listed by a double Tab, shown under the input line.
    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // -----------------------------------------------------------------------
    // Screen
    // -----------------------------------------------------------------------

    fn push(&mut self, text: impl Into<String>, kind: LineKind, rich: bool) {
        self.screen.push_back(Line {
            text: text.into(),
            kind,
            rich,
        });
        while self.screen.len() > self.config.max_scrollback {
            self.screen.pop_front();
        }
        self.revision += 1;
    }

    fn output(&mut self, text: impl Into<String>) {
        self.push(text, LineKind::Output, false);
    }

    fn clear_screen(&mut self) {
        self.screen.clear();
        self.revision += 1;
    }

    fn show_banner(&mut self) {
        self.clear_screen();
        for line in BANNER {
            self.output(*line);
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Feed one input event.
    pub fn handle_event(&mut self, event: InputEvent, now: Instant) {
        self.suggestion = None;
        if self.poller.is_some() {
            self.handle_polling(&event);
        } else if self.editor.is_some() {
            self.handle_editor(&event, now);
        } else {
            self.handle_line(event, now);
        }
        self.revision += 1;
    }

    fn handle_polling(&mut self, event: &InputEvent) {
        if self.poller.as_ref().is_some_and(|p| p.is_exit(event)) {
            self.poller = None;
            self.machine.reset();
        }
    }

    fn handle_editor(&mut self, event: &InputEvent, now: Instant) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        match editor.handle(event) {
            EditorAction::None => {},
            EditorAction::Save(text) => {
                self.editor = None;
                let request = CommandRequest::composition("submit", text);
                if let Some(outcome) = self.send(&request) {
                    self.apply(outcome, "submit", None, now);
                }
            },
            EditorAction::Close => {
                self.editor = None;
                self.machine.reset();
                self.output(SUBMISSION_CANCELLED);
            },
        }
    }

    fn handle_line(&mut self, event: InputEvent, now: Instant) {
        let steady = self.machine.phase().is_none();
        match event {
            InputEvent::TextInput(ch) => self.input.insert(ch),
            InputEvent::Backspace => self.input.backspace(),
            InputEvent::Delete => self.input.delete(),
            InputEvent::CursorLeft => self.input.move_left(),
            InputEvent::CursorRight => self.input.move_right(),
            InputEvent::Home => self.input.home(),
            InputEvent::End => self.input.end(),
            InputEvent::HistoryPrev if steady => {
                if let Some(entry) = self.history.prev(self.input.text()) {
                    self.input.set(entry);
                }
            },
            InputEvent::HistoryNext if steady => {
                if let Some(entry) = self.history.next() {
                    self.input.set(entry);
                }
            },
            InputEvent::Tab if steady => {
                let vocab = vocabulary(self.authenticated);
                if let Completion::Candidates(list) =
                    self.completer.complete(&mut self.input, vocab, now)
                {
                    self.suggestion = Some(list.join(" "));
                }
            },
            InputEvent::Enter => self.submit_line(now),
            InputEvent::Interrupt => self.interrupt(),
            _ => {},
        }
    }

    fn interrupt(&mut self) {
        if self.machine.cancel() {
            self.input.clear();
            self.output(CANCEL_MARKER);
            return;
        }
        let line = format!("{}{}{}", self.prompt, self.input.take(), CANCEL_MARKER);
        self.push(line, LineKind::Command, false);
        self.history.reset_navigation();
    }

    fn submit_line(&mut self, now: Instant) {
        let phase = self.machine.phase();
        let line = self.input.take();
        let prompt = self.prompt().to_string();
        if phase.is_secret() {
            self.push(prompt, LineKind::Prompt, false);
        } else {
            self.push(format!("{prompt}{line}"), LineKind::Command, false);
        }
        if phase.is_none() {
            self.history.push(&line);
        }

        let flow_user = self.machine.pending_user().map(str::to_string);
        let Submission::Remote {
            request,
            clear_screen,
        } = self.machine.submit(&line)
        else {
            return;
        };
        if clear_screen {
            self.clear_screen();
        }
        if let Some(outcome) = self.send(&request) {
            self.apply(outcome, &line, flow_user, now);
        }
    }

    /// Foreground round trip. Failures become one output line and abort
    /// any flow in progress.
    fn send(&mut self, request: &CommandRequest) -> Option<CommandOutcome> {
        match self.transport.send(request) {
            Ok(outcome) => Some(outcome),
            Err(BashError::Status { status, outcome }) => {
                log::warn!("server answered {status}");
                Some(*outcome)
            },
            Err(e) => {
                log::warn!("request failed: {e}");
                self.machine.reset();
                self.output(CONNECTION_ERROR);
                None
            },
        }
    }

    // -----------------------------------------------------------------------
    // Outcomes
    // -----------------------------------------------------------------------

    fn apply(&mut self, outcome: CommandOutcome, line: &str, flow_user: Option<String>, now: Instant) {
        let Transition { from, to } = self.machine.apply(&outcome);
        if let Some(color) = &outcome.theme_color {
            self.theme = color.clone();
        }

        if from.is_credential_step() && to.is_none() {
            if let (Some(prompt), Some(user)) = (&outcome.new_prompt, flow_user) {
                self.authenticated = true;
                self.prompt = prompt.clone();
                self.show_banner();
                self.output(format!("Welcome, {user}!"));
                self.output("");
                return;
            }
        }

        if from.is_none() && self.ends_session(line, &outcome) {
            self.end_session(outcome.new_prompt.as_deref());
            for text in outcome.output {
                self.output(text);
            }
            return;
        }

        if outcome.clear {
            self.clear_screen();
        }
        if let Some(prompt) = outcome.new_prompt {
            self.prompt = prompt;
        }
        if to.is_polling() && from != to {
            let interval = match to {
                Phase::PollingTail => self.config.tail_interval_ms,
                _ => self.config.top_interval_ms,
            };
            let interval = Duration::from_millis(interval);
            self.poller = Some(Poller::new(to, line, interval, now, outcome.output));
            return;
        }

        let rich = outcome.render_rich.unwrap_or(false);
        for text in outcome.output {
            self.push(text, LineKind::Output, rich);
        }
        if to == Phase::Composition && from != Phase::Composition {
            self.editor = Some(Editor::new());
        }
    }

    fn ends_session(&self, line: &str, outcome: &CommandOutcome) -> bool {
        match first_word(line).as_str() {
            "logout" | "exit" => outcome.new_prompt.is_some(),
            "reboot" => outcome.clear,
            _ => false,
        }
    }

    fn end_session(&mut self, prompt: Option<&str>) {
        self.authenticated = false;
        self.prompt = prompt.unwrap_or(&self.config.prompt).to_string();
        self.theme = self.config.theme.clone();
        self.history.clear();
        self.completer.reset();
        self.show_banner();
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Advance the poller. Returns `true` when a refresh was sent. Refresh
    /// failures keep the previous frame and stay in the mode.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(request) = self.poller.as_mut().and_then(|p| p.due_request(now)) else {
            return false;
        };
        match self.transport.send(&request) {
            Ok(outcome) => {
                if let Some(poller) = self.poller.as_mut() {
                    poller.accept(outcome.output);
                    self.revision += 1;
                }
            },
            // The previous frame stays up, including on a server fault.
            Err(e) => log::debug!("poll refresh failed: {e}"),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use bashstory_types::error::{BashError, Result};

    use super::*;

    /// Replies from a queue and records every request.
    #[derive(Default)]
    struct Scripted {
        replies: VecDeque<Result<CommandOutcome>>,
        sent: Vec<CommandRequest>,
    }

    impl Scripted {
        fn reply(mut self, outcome: CommandOutcome) -> Self {
            self.replies.push_back(Ok(outcome));
            self
        }

        fn fail(mut self) -> Self {
            self.replies
                .push_back(Err(BashError::Transport("connection refused".into())));
            self
        }

        fn fault(mut self) -> Self {
            self.replies.push_back(Err(BashError::Status {
                status: 500,
                outcome: Box::new(CommandOutcome::internal_error()),
            }));
            self
        }
    }

    impl Transport for Scripted {
        fn send(&mut self, request: &CommandRequest) -> Result<CommandOutcome> {
            self.sent.push(request.clone());
            self.replies
                .pop_front()
                .unwrap_or_else(|| Ok(CommandOutcome::empty()))
        }
    }

    fn term(script: Scripted) -> Terminal<Scripted> {
        Terminal::new(script, ClientConfig::default())
    }

    fn type_line(t: &mut Terminal<Scripted>, line: &str, now: Instant) {
        for ch in line.chars() {
            t.handle_event(InputEvent::TextInput(ch), now);
        }
        t.handle_event(InputEvent::Enter, now);
    }

    #[test]
    fn starts_with_banner_and_guest_prompt() {
        let t = term(Scripted::default());
        assert_eq!(t.screen_text(), BANNER.to_vec());
        assert_eq!(t.prompt(), "guest@bashstory:~$ ");
        assert_eq!(t.theme(), "#4AFB7F");
    }

    #[test]
    fn steady_line_echoes_and_prints() {
        let now = Instant::now();
        let mut t = term(Scripted::default().reply(CommandOutcome::line("guest")));
        type_line(&mut t, "whoami", now);
        let text = t.screen_text();
        assert_eq!(text[text.len() - 2], "guest@bashstory:~$ whoami");
        assert_eq!(text[text.len() - 1], "guest");
        assert_eq!(t.history().entries().collect::<Vec<_>>(), vec!["whoami"]);
    }

    #[test]
    fn login_success_shows_welcome() {
        let now = Instant::now();
        let script = Scripted::default()
            .reply(CommandOutcome::empty().enter(Phase::LoginUsername, "login: "))
            .reply(CommandOutcome::empty().with_prompt("alice@bashstory:~$ "));
        let mut t = term(script);
        type_line(&mut t, "login", now);
        assert_eq!(t.phase(), Phase::LoginUsername);
        assert_eq!(t.prompt(), "login: ");
        type_line(&mut t, "alice", now);
        assert_eq!(t.prompt(), "password: ");

        for ch in "hunter2".chars() {
            t.handle_event(InputEvent::TextInput(ch), now);
        }
        assert_eq!(t.visible_input(), "");
        t.handle_event(InputEvent::Enter, now);

        assert!(t.is_authenticated());
        assert_eq!(t.prompt(), "alice@bashstory:~$ ");
        let text = t.screen_text();
        assert_eq!(&text[..BANNER.len()], BANNER);
        assert_eq!(text[BANNER.len()], "Welcome, alice!");
        assert!(t.screen().all(|l| !l.text.contains("hunter2")));
        assert_eq!(t.history().entries().collect::<Vec<_>>(), vec!["login"]);

        let sent = &t.transport().sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].args, vec!["alice", "hunter2"]);
    }

    #[test]
    fn register_mismatch_returns_to_steady_state() {
        let now = Instant::now();
        let script = Scripted::default()
            .reply(CommandOutcome::empty().enter(Phase::RegisterUsername, "login: "))
            .reply(CommandOutcome::line("register: passwords do not match."));
        let mut t = term(script);
        for line in ["register", "bob", "pass1", "pass2"] {
            type_line(&mut t, line, now);
        }
        assert_eq!(t.phase(), Phase::None);
        assert!(!t.is_authenticated());
        assert_eq!(t.screen_text().last(), Some(&"register: passwords do not match."));
        assert_eq!(t.prompt(), "guest@bashstory:~$ ");
        let last = t.transport().sent.last().unwrap();
        assert_eq!(last.args, vec!["bob", "pass1", "pass2"]);
    }

    #[test]
    fn interrupt_cancels_flow_without_round_trip() {
        let now = Instant::now();
        let script =
            Scripted::default().reply(CommandOutcome::empty().enter(Phase::LoginUsername, "login: "));
        let mut t = term(script);
        type_line(&mut t, "login", now);
        type_line(&mut t, "alice", now);
        t.handle_event(InputEvent::TextInput('x'), now);
        t.handle_event(InputEvent::Interrupt, now);
        assert_eq!(t.phase(), Phase::None);
        assert_eq!(t.screen_text().last(), Some(&CANCEL_MARKER));
        assert_eq!(t.transport().sent.len(), 1);
        assert_eq!(t.visible_input(), "");
    }

    #[test]
    fn interrupt_at_new_secret_forgets_current_one() {
        let now = Instant::now();
        let script = Scripted::default()
            .reply(CommandOutcome::empty().enter(Phase::SecretChangeCurrent, "(passwd) Current password: "))
            .reply(CommandOutcome::empty().enter(Phase::SecretChangeNew, "(passwd) New password: "))
            .reply(CommandOutcome::line("alice"));
        let mut t = term(script);
        type_line(&mut t, "passwd", now);
        type_line(&mut t, "old secret", now);
        assert_eq!(t.phase(), Phase::SecretChangeNew);

        t.handle_event(InputEvent::Interrupt, now);
        assert_eq!(t.phase(), Phase::None);
        assert_eq!(t.screen_text().last(), Some(&CANCEL_MARKER));
        assert_eq!(t.transport().sent.len(), 2);

        type_line(&mut t, "whoami", now);
        assert_eq!(t.transport().sent.last(), Some(&CommandRequest::line("whoami")));
        assert!(t.screen().all(|l| !l.text.contains("old secret")));
    }

    #[test]
    fn connection_error_is_one_line() {
        let now = Instant::now();
        let mut t = term(Scripted::default().fail());
        type_line(&mut t, "ls", now);
        assert_eq!(t.screen_text().last(), Some(&CONNECTION_ERROR));
        assert_eq!(t.phase(), Phase::None);
    }

    #[test]
    fn top_polls_twice_then_quits() {
        let t0 = Instant::now();
        let script = Scripted::default()
            .reply(CommandOutcome::line("frame 0").polling(Phase::PollingTop))
            .reply(CommandOutcome::line("frame 1"))
            .reply(CommandOutcome::line("frame 2"));
        let mut t = term(script);
        type_line(&mut t, "top", t0);
        assert_eq!(t.interactive().unwrap().frame(), ["frame 0".to_string()]);
        assert!(!t.screen_text().contains(&"frame 0"));

        assert!(!t.tick(t0 + Duration::from_millis(500)));
        assert!(t.tick(t0 + Duration::from_secs(1)));
        assert!(t.tick(t0 + Duration::from_secs(2)));
        assert_eq!(t.interactive().unwrap().frame(), ["frame 2".to_string()]);

        // Typing is ignored while polling.
        t.handle_event(InputEvent::TextInput('x'), t0);
        t.handle_event(InputEvent::TextInput('q'), t0 + Duration::from_millis(2100));
        assert!(t.interactive().is_none());
        assert_eq!(t.phase(), Phase::None);
        assert_eq!(t.visible_input(), "");

        let polls: Vec<_> = t
            .transport()
            .sent
            .iter()
            .filter(|r| r.phase == Phase::PollingTop)
            .collect();
        assert_eq!(polls.len(), 2);
        assert!(!t.tick(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn poll_failure_keeps_frame() {
        let t0 = Instant::now();
        let script = Scripted::default()
            .reply(CommandOutcome::line("news").polling(Phase::PollingTail))
            .fail();
        let mut t = term(script);
        type_line(&mut t, "tail -f", t0);
        assert!(t.tick(t0 + Duration::from_secs(2)));
        let poller = t.interactive().unwrap();
        assert_eq!(poller.frame(), ["news".to_string()]);
        assert_eq!(poller.phase(), Phase::PollingTail);
        // 'q' does not leave tail; Ctrl+C does.
        t.handle_event(InputEvent::TextInput('q'), t0);
        assert!(t.interactive().is_some());
        t.handle_event(InputEvent::Interrupt, t0);
        assert!(t.interactive().is_none());
    }

    #[test]
    fn poll_server_fault_keeps_frame() {
        let t0 = Instant::now();
        let script = Scripted::default()
            .reply(CommandOutcome::line("frame 0").polling(Phase::PollingTop))
            .fault()
            .reply(CommandOutcome::line("frame 2"));
        let mut t = term(script);
        type_line(&mut t, "top", t0);
        assert!(t.tick(t0 + Duration::from_secs(1)));
        assert_eq!(t.interactive().unwrap().frame(), ["frame 0".to_string()]);
        assert!(t.tick(t0 + Duration::from_secs(2)));
        assert_eq!(t.interactive().unwrap().frame(), ["frame 2".to_string()]);
    }

    #[test]
    fn foreground_server_fault_prints_its_body() {
        let now = Instant::now();
        let mut t = term(Scripted::default().fault());
        type_line(&mut t, "ls", now);
        assert_eq!(t.screen_text().last(), Some(&"Internal server error."));
        assert_eq!(t.phase(), Phase::None);
    }

    #[test]
    fn editor_save_and_close() {
        let now = Instant::now();
        let script = Scripted::default()
            .reply(CommandOutcome::empty().enter(Phase::Composition, "> "))
            .reply(CommandOutcome::line("Quote submitted for moderation (ID: #11)."))
            .reply(CommandOutcome::empty().enter(Phase::Composition, "> "));
        let mut t = term(script);
        type_line(&mut t, "submit", now);
        assert!(t.editor().is_some());
        for ch in "<a> hi".chars() {
            t.handle_event(InputEvent::TextInput(ch), now);
        }
        t.handle_event(InputEvent::Enter, now);
        t.handle_event(InputEvent::TextInput('!'), now);
        t.handle_event(InputEvent::SaveBuffer, now);
        assert!(t.editor().is_none());
        assert_eq!(t.phase(), Phase::None);
        let req = t.transport().sent.last().unwrap();
        assert_eq!(req.free_text.as_deref(), Some("<a> hi\n!"));

        type_line(&mut t, "nano", now);
        t.handle_event(InputEvent::CloseBuffer, now);
        assert!(t.editor().is_none());
        assert_eq!(t.screen_text().last(), Some(&SUBMISSION_CANCELLED));
        assert_eq!(t.transport().sent.len(), 3);
    }

    #[test]
    fn logout_resets_session_state() {
        let now = Instant::now();
        let script = Scripted::default()
            .reply(CommandOutcome::empty().enter(Phase::LoginUsername, "login: "))
            .reply(CommandOutcome::empty().with_prompt("alice@bashstory:~$ "))
            .reply(CommandOutcome::line("Theme colour set to #FF0000.").with_theme("#FF0000"))
            .reply(CommandOutcome::line("Goodbye!").with_prompt("guest@bashstory:~$ "));
        let mut t = term(script);
        for line in ["login", "alice", "pw12", "theme #ff0000"] {
            type_line(&mut t, line, now);
        }
        assert_eq!(t.theme(), "#FF0000");
        assert_eq!(t.history().len(), 2);
        type_line(&mut t, "logout", now);
        assert!(!t.is_authenticated());
        assert_eq!(t.theme(), "#4AFB7F");
        assert_eq!(t.prompt(), "guest@bashstory:~$ ");
        assert!(t.history().is_empty());
        let text = t.screen_text();
        assert_eq!(&text[..BANNER.len()], BANNER);
        assert_eq!(text.last(), Some(&"Goodbye!"));
    }

    #[test]
    fn double_tab_lists_in_suggestion() {
        let t0 = Instant::now();
        let mut t = term(Scripted::default());
        t.handle_event(InputEvent::TextInput('r'), t0);
        t.handle_event(InputEvent::TextInput('e'), t0);
        t.handle_event(InputEvent::Tab, t0);
        t.handle_event(InputEvent::Tab, t0 + Duration::from_millis(300));
        assert_eq!(t.suggestion(), Some("reboot register"));
        assert_eq!(t.visible_input(), "re");
        t.handle_event(InputEvent::TextInput('g'), t0);
        assert_eq!(t.suggestion(), None);
        t.handle_event(InputEvent::Tab, t0);
        assert_eq!(t.visible_input(), "register");
    }

    #[test]
    fn history_suspended_during_flow() {
        let now = Instant::now();
        let script = Scripted::default()
            .reply(CommandOutcome::line("x"))
            .reply(CommandOutcome::empty().enter(Phase::LoginUsername, "login: "));
        let mut t = term(script);
        type_line(&mut t, "fortune", now);
        type_line(&mut t, "login", now);
        t.handle_event(InputEvent::HistoryPrev, now);
        assert_eq!(t.visible_input(), "");
        t.handle_event(InputEvent::Interrupt, now);
        t.handle_event(InputEvent::HistoryPrev, now);
        assert_eq!(t.visible_input(), "login");
    }
}
