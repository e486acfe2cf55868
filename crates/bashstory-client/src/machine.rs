//! Client-side input-mode state machine.
//!
//! Decides for each submitted line whether it is consumed locally (the
//! next value of a credential flow) or forwarded to the resolver, and which
//! phase tag and carried values go with it. Carried values live only here
//! and only for the duration of one flow.

use bashstory_types::protocol::{CommandOutcome, CommandRequest, Phase};

pub const USERNAME_PROMPT: &str = "login: ";
pub const PASSWORD_PROMPT: &str = "password: ";
pub const REPEAT_PROMPT: &str = "repeat password: ";

/// What to do with a submitted line.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Consumed without a round trip.
    Local,
    /// Send `request`. `clear_screen` asks the host to blank the screen
    /// first, as credential flows do on entry.
    Remote {
        request: CommandRequest,
        clear_screen: bool,
    },
}

impl Submission {
    pub fn consumed_locally(&self) -> bool {
        matches!(self, Self::Local)
    }

    pub fn request(&self) -> Option<&CommandRequest> {
        match self {
            Self::Local => None,
            Self::Remote { request, .. } => Some(request),
        }
    }
}

/// Phase change caused by applying an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
}

/// The flow-starting commands that enter their first step before the
/// round trip.
fn local_entry(name: &str) -> Option<(Phase, &'static str)> {
    match name {
        "login" => Some((Phase::LoginUsername, USERNAME_PROMPT)),
        "register" => Some((Phase::RegisterUsername, USERNAME_PROMPT)),
        "passwd" => Some((Phase::SecretChangeCurrent, "")),
        _ => None,
    }
}

/// Input-mode state machine. Exactly one phase is active at a time.
#[derive(Debug, Clone, Default)]
pub struct InputMachine {
    phase: Phase,
    prompt: String,
    carried: Vec<String>,
}

impl InputMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Values collected so far in the active flow.
    pub fn carried(&self) -> &[String] {
        &self.carried
    }

    /// Prompt override for the active step, if any.
    pub fn prompt(&self) -> Option<&str> {
        if self.phase.is_none() || self.prompt.is_empty() {
            None
        } else {
            Some(&self.prompt)
        }
    }

    /// Username collected by a login or register flow.
    pub fn pending_user(&self) -> Option<&str> {
        match self.phase {
            Phase::LoginPassword | Phase::RegisterPassword1 | Phase::RegisterPassword2 => {
                self.carried.first().map(String::as_str)
            },
            _ => None,
        }
    }

    fn enter(&mut self, phase: Phase, prompt: &str) {
        if !phase.can_follow(self.phase) && phase != self.phase {
            log::warn!("illegal phase transition {} -> {}", self.phase, phase);
            self.reset();
            return;
        }
        self.phase = phase;
        self.prompt = prompt.to_string();
    }

    /// Return to steady state and drop carried values.
    pub fn reset(&mut self) {
        self.phase = Phase::None;
        self.prompt.clear();
        self.carried.clear();
    }

    /// Interrupt gesture. Returns `true` when a flow was cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.phase.is_none() {
            return false;
        }
        self.reset();
        true
    }

    /// Decide what a submitted line means in the current phase.
    pub fn submit(&mut self, line: &str) -> Submission {
        match self.phase {
            Phase::None => self.submit_steady(line),
            Phase::LoginUsername => {
                self.carried.push(line.trim().to_string());
                self.enter(Phase::LoginPassword, PASSWORD_PROMPT);
                Submission::Local
            },
            Phase::RegisterUsername => {
                self.carried.push(line.trim().to_string());
                self.enter(Phase::RegisterPassword1, PASSWORD_PROMPT);
                Submission::Local
            },
            Phase::RegisterPassword1 => {
                self.carried.push(line.to_string());
                self.enter(Phase::RegisterPassword2, REPEAT_PROMPT);
                Submission::Local
            },
            Phase::LoginPassword => self.finish("login", line),
            Phase::RegisterPassword2 => self.finish("register", line),
            Phase::SecretChangeCurrent => {
                // The current secret is carried into the next step.
                self.carried = vec![line.to_string()];
                self.remote(CommandRequest::continuation(
                    "passwd",
                    Phase::SecretChangeCurrent,
                    self.carried.clone(),
                ))
            },
            Phase::SecretChangeNew => self.finish("passwd", line),
            // The editor and the poller own input in these modes.
            Phase::Composition | Phase::PollingTop | Phase::PollingTail => Submission::Local,
        }
    }

    fn submit_steady(&mut self, line: &str) -> Submission {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Submission::Local;
        };
        let name = first.to_lowercase();
        if words.next().is_none() {
            if let Some((phase, prompt)) = local_entry(&name) {
                self.carried.clear();
                self.enter(phase, prompt);
                return Submission::Remote {
                    request: CommandRequest::line(name),
                    clear_screen: true,
                };
            }
        }
        self.remote(CommandRequest::line(line.trim()))
    }

    /// Terminating step: send every carried value plus this one.
    fn finish(&mut self, command: &str, line: &str) -> Submission {
        let mut args = std::mem::take(&mut self.carried);
        args.push(line.to_string());
        let request = CommandRequest::continuation(command, self.phase, args);
        self.remote(request)
    }

    fn remote(&self, request: CommandRequest) -> Submission {
        Submission::Remote {
            request,
            clear_screen: false,
        }
    }

    /// Apply the resolver's answer to the last forwarded request.
    ///
    /// An outcome naming the current phase confirms it; one naming a legal
    /// next phase moves there; anything else ends the flow.
    pub fn apply(&mut self, outcome: &CommandOutcome) -> Transition {
        let from = self.phase;
        match outcome.next_phase {
            Some(next) if !next.is_none() => {
                let prompt = outcome.next_phase_prompt.as_deref().unwrap_or_default();
                let prompt = if prompt.is_empty() && next == from {
                    self.prompt.clone()
                } else {
                    prompt.to_string()
                };
                self.enter(next, &prompt);
            },
            _ => self.reset(),
        }
        Transition {
            from,
            to: self.phase,
        }
    }
}
