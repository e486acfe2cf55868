//! Interactive poller for `top` and `tail -f`.
//!
//! Driven by the host's clock: the host calls [`Poller::due_request`] with
//! the current instant and sends whatever comes back. There is no timer
//! thread, so stopping the poller is just dropping it.

use std::time::{Duration, Instant};

use bashstory_types::input::InputEvent;
use bashstory_types::protocol::{CommandRequest, Phase};

pub const TOP_FOOTER: &str = "q: quit";
pub const TAIL_FOOTER: &str = "-- Ctrl+C: exit --";

/// A repeating refresh of one display frame.
#[derive(Debug, Clone)]
pub struct Poller {
    phase: Phase,
    request: CommandRequest,
    interval: Duration,
    next_due: Instant,
    frame: Vec<String>,
    issued: u32,
}

impl Poller {
    /// Start polling. `line` is the command that entered the mode and
    /// `first_frame` its output.
    pub fn new(
        phase: Phase,
        line: &str,
        interval: Duration,
        now: Instant,
        first_frame: Vec<String>,
    ) -> Self {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or(phase.as_str()).to_lowercase();
        let args = words.map(str::to_string).collect();
        Self {
            phase,
            request: CommandRequest::continuation(command, phase, args),
            interval,
            next_due: now + interval,
            frame: first_frame,
            issued: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The frame currently on display.
    pub fn frame(&self) -> &[String] {
        &self.frame
    }

    pub fn footer(&self) -> &'static str {
        match self.phase {
            Phase::PollingTail => TAIL_FOOTER,
            _ => TOP_FOOTER,
        }
    }

    /// How many refresh requests have been handed out.
    pub fn issued(&self) -> u32 {
        self.issued
    }

    /// The refresh request if a tick is due. Late ticks do not pile up:
    /// the next one is scheduled a full interval from `now`.
    pub fn due_request(&mut self, now: Instant) -> Option<CommandRequest> {
        if now < self.next_due {
            return None;
        }
        self.next_due = now + self.interval;
        self.issued += 1;
        Some(self.request.clone())
    }

    /// Replace the frame with a refresh's output.
    pub fn accept(&mut self, frame: Vec<String>) {
        self.frame = frame;
    }

    /// Whether `event` is this mode's exit key.
    pub fn is_exit(&self, event: &InputEvent) -> bool {
        match self.phase {
            Phase::PollingTop => matches!(event, InputEvent::TextInput('q' | 'Q')),
            _ => matches!(event, InputEvent::Interrupt),
        }
    }
}
