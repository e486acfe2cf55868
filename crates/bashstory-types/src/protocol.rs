//! Wire protocol between the terminal client and the command resolver.
//!
//! Every request is independent. A multi-turn conversation (login, register,
//! password change, composition, polling) is reconstructed from the phase tag
//! and the positional arguments the client carries on each request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which multi-step flow, if any, a request continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Steady state: an ordinary command line.
    #[default]
    None,
    LoginUsername,
    LoginPassword,
    RegisterUsername,
    #[serde(rename = "register-password-1")]
    RegisterPassword1,
    #[serde(rename = "register-password-2")]
    RegisterPassword2,
    SecretChangeCurrent,
    SecretChangeNew,
    /// Free-text composition in the full-screen editor.
    Composition,
    /// Process monitor refresh.
    PollingTop,
    /// Log-follow refresh.
    PollingTail,
}

impl Phase {
    /// The kebab-case name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::LoginUsername => "login-username",
            Self::LoginPassword => "login-password",
            Self::RegisterUsername => "register-username",
            Self::RegisterPassword1 => "register-password-1",
            Self::RegisterPassword2 => "register-password-2",
            Self::SecretChangeCurrent => "secret-change-current",
            Self::SecretChangeNew => "secret-change-new",
            Self::Composition => "composition",
            Self::PollingTop => "polling-top",
            Self::PollingTail => "polling-tail",
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::None
    }

    /// Steps whose typed value must never be echoed or logged.
    pub fn is_secret(self) -> bool {
        matches!(
            self,
            Self::LoginPassword
                | Self::RegisterPassword1
                | Self::RegisterPassword2
                | Self::SecretChangeCurrent
                | Self::SecretChangeNew
        )
    }

    /// Interactive display modes driven by a repeating timer.
    pub fn is_polling(self) -> bool {
        matches!(self, Self::PollingTop | Self::PollingTail)
    }

    /// Credential steps that collect one value each from the line buffer.
    pub fn is_credential_step(self) -> bool {
        matches!(
            self,
            Self::LoginUsername
                | Self::LoginPassword
                | Self::RegisterUsername
                | Self::RegisterPassword1
                | Self::RegisterPassword2
                | Self::SecretChangeCurrent
                | Self::SecretChangeNew
        )
    }

    /// Steps the client consumes locally without a round trip.
    pub fn is_client_local(self) -> bool {
        matches!(
            self,
            Self::LoginUsername | Self::RegisterUsername | Self::RegisterPassword1
        )
    }

    /// The step that must immediately precede this one, if it is not a
    /// flow's first step.
    pub fn predecessor(self) -> Option<Phase> {
        match self {
            Self::LoginPassword => Some(Self::LoginUsername),
            Self::RegisterPassword1 => Some(Self::RegisterUsername),
            Self::RegisterPassword2 => Some(Self::RegisterPassword1),
            Self::SecretChangeNew => Some(Self::SecretChangeCurrent),
            _ => None,
        }
    }

    /// Whether a client currently in `from` may move to `self`.
    ///
    /// Returning to steady state is always allowed. A flow's first step can
    /// only be entered from steady state, and every later step only from its
    /// immediate predecessor, so flows cannot interleave.
    pub fn can_follow(self, from: Phase) -> bool {
        if self == Self::None {
            return true;
        }
        match self.predecessor() {
            Some(prev) => from == prev,
            None => from == Self::None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request to the command resolver.
#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    /// The raw command line, or the flow's command name for phase requests.
    #[serde(default)]
    pub command: String,
    #[serde(default, skip_serializing_if = "Phase::is_none")]
    pub phase: Phase,
    /// Carried fields, flushed positionally on a flow's terminating step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Composition body.
    #[serde(default, alias = "submitText", skip_serializing_if = "Option::is_none")]
    pub free_text: Option<String>,
}

impl CommandRequest {
    /// A steady-state command line.
    pub fn line(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// A phase continuation carrying positional arguments.
    pub fn continuation(command: impl Into<String>, phase: Phase, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            phase,
            args,
            free_text: None,
        }
    }

    /// A composition submission.
    pub fn composition(command: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            phase: Phase::Composition,
            args: Vec::new(),
            free_text: Some(text.into()),
        }
    }
}

// Carried fields may hold secrets, so Debug never prints them verbatim.
impl fmt::Debug for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<&str> = if self.phase.is_credential_step() {
            self.args.iter().map(|_| "***").collect()
        } else {
            self.args.iter().map(String::as_str).collect()
        };
        f.debug_struct("CommandRequest")
            .field("command", &self.command)
            .field("phase", &self.phase)
            .field("args", &args)
            .field("free_text", &self.free_text.as_ref().map(|t| t.len()))
            .finish()
    }
}

/// The uniform result of every command handler.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    #[serde(default)]
    pub output: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_prompt: Option<String>,
    #[serde(default)]
    pub clear: bool,
    #[serde(rename = "inputMode", default, skip_serializing_if = "Option::is_none")]
    pub next_phase: Option<Phase>,
    #[serde(rename = "inputPrompt", default, skip_serializing_if = "Option::is_none")]
    pub next_phase_prompt: Option<String>,
    #[serde(rename = "renderMarkdown", default, skip_serializing_if = "Option::is_none")]
    pub render_rich: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
}

impl CommandOutcome {
    /// No output, no directives.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single output line.
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            output: vec![text.into()],
            ..Self::default()
        }
    }

    /// Several output lines.
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            output: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// The fixed body returned with a non-success status on internal faults.
    pub fn internal_error() -> Self {
        Self::line("Internal server error.")
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.new_prompt = Some(prompt.into());
        self
    }

    pub fn clearing(mut self) -> Self {
        self.clear = true;
        self
    }

    /// Ask the client to enter `phase`, showing `prompt` for the next line.
    pub fn enter(mut self, phase: Phase, prompt: impl Into<String>) -> Self {
        self.next_phase = Some(phase);
        self.next_phase_prompt = Some(prompt.into());
        self
    }

    /// Ask the client to enter a polling phase (no input prompt).
    pub fn polling(mut self, phase: Phase) -> Self {
        self.next_phase = Some(phase);
        self
    }

    pub fn rich(mut self) -> Self {
        self.render_rich = Some(true);
        self
    }

    pub fn with_theme(mut self, color: impl Into<String>) -> Self {
        self.theme_color = Some(color.into());
        self
    }
}
