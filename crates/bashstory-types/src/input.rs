//! Platform-agnostic input event types.
//!
//! Hosts map their native keyboard events to these. The client terminal
//! never sees raw platform input.

/// A platform-agnostic input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Character typed.
    TextInput(char),
    /// Backspace / delete-left.
    Backspace,
    /// Delete-right.
    Delete,
    CursorLeft,
    CursorRight,
    Home,
    End,
    /// Arrow up: previous history entry.
    HistoryPrev,
    /// Arrow down: next history entry.
    HistoryNext,
    /// Completion request.
    Tab,
    /// Submit the current line (newline inside the editor).
    Enter,
    /// Ctrl+C.
    Interrupt,
    /// Editor save gesture (Ctrl+S / Ctrl+O).
    SaveBuffer,
    /// Editor quit gesture (Ctrl+X / Escape).
    CloseBuffer,
}

impl InputEvent {
    /// Map a key name plus modifier state to an event.
    ///
    /// Names follow the DOM `KeyboardEvent.key` convention so that browser
    /// and native hosts can share the mapping.
    pub fn from_key(key: &str, ctrl: bool) -> Option<Self> {
        if ctrl {
            return match key.to_ascii_lowercase().as_str() {
                "c" => Some(Self::Interrupt),
                "s" | "o" => Some(Self::SaveBuffer),
                "x" => Some(Self::CloseBuffer),
                _ => None,
            };
        }
        match key {
            "Backspace" => Some(Self::Backspace),
            "Delete" => Some(Self::Delete),
            "ArrowLeft" => Some(Self::CursorLeft),
            "ArrowRight" => Some(Self::CursorRight),
            "ArrowUp" => Some(Self::HistoryPrev),
            "ArrowDown" => Some(Self::HistoryNext),
            "Home" => Some(Self::Home),
            "End" => Some(Self::End),
            "Tab" => Some(Self::Tab),
            "Enter" => Some(Self::Enter),
            "Escape" => Some(Self::CloseBuffer),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_control() => Some(Self::TextInput(c)),
                    _ => None,
                }
            },
        }
    }
}
