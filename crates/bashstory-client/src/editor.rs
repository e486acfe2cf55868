//! Full-screen composition editor.
//!
//! Enter inserts a newline. The only ways out are the save gesture, which
//! hands the buffer to the caller, and the close gesture, which discards it.

use bashstory_types::input::InputEvent;

use crate::line::LineBuffer;

pub const EDITOR_TITLE: &str = "bashstory nano -- new quote";
pub const EDITOR_FOOTER: &str = "^S Send to moderation   ^X Cancel";

/// Result of feeding one event to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    /// Keep editing.
    None,
    /// Send this text.
    Save(String),
    /// Discard the buffer.
    Close,
}

/// Multi-line text surface, separate from the command line.
#[derive(Debug, Clone, Default)]
pub struct Editor {
    buffer: LineBuffer,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    /// Buffer split into display lines (always at least one).
    pub fn lines(&self) -> Vec<&str> {
        self.buffer.text().split('\n').collect()
    }

    /// Cursor as (row, column) in characters.
    pub fn cursor_position(&self) -> (usize, usize) {
        let before = self.buffer.before_cursor();
        let row = before.matches('\n').count();
        let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count());
        (row, col)
    }

    /// Character index where the cursor's line starts.
    fn line_start(&self) -> usize {
        let (_, col) = self.cursor_position();
        self.buffer.cursor() - col
    }

    fn line_end(&self) -> usize {
        let rest = &self.buffer.text()[self.buffer.before_cursor().len()..];
        self.buffer.cursor() + rest.split('\n').next().map_or(0, |l| l.chars().count())
    }

    /// Move to the same column on the line above (`up`) or below, clamped
    /// to that line's length. No-op on the first or last line.
    fn move_vertical(&mut self, up: bool) {
        let (row, col) = self.cursor_position();
        let lines = self.lines();
        let target = if up {
            match row.checked_sub(1) {
                Some(r) => r,
                None => return,
            }
        } else if row + 1 < lines.len() {
            row + 1
        } else {
            return;
        };
        let start: usize = lines[..target].iter().map(|l| l.chars().count() + 1).sum();
        let col = col.min(lines[target].chars().count());
        self.buffer.set_cursor(start + col);
    }

    pub fn handle(&mut self, event: &InputEvent) -> EditorAction {
        match event {
            InputEvent::TextInput(ch) => self.buffer.insert(*ch),
            InputEvent::Enter => self.buffer.insert('\n'),
            InputEvent::Backspace => self.buffer.backspace(),
            InputEvent::Delete => self.buffer.delete(),
            InputEvent::CursorLeft => self.buffer.move_left(),
            InputEvent::CursorRight => self.buffer.move_right(),
            InputEvent::Home => self.buffer.set_cursor(self.line_start()),
            InputEvent::End => self.buffer.set_cursor(self.line_end()),
            InputEvent::SaveBuffer => return EditorAction::Save(self.buffer.text().to_string()),
            InputEvent::CloseBuffer | InputEvent::Interrupt => return EditorAction::Close,
            InputEvent::HistoryPrev => self.move_vertical(true),
            InputEvent::HistoryNext => self.move_vertical(false),
            InputEvent::Tab => {},
        }
        EditorAction::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(e: &mut Editor, s: &str) {
        for ch in s.chars() {
            let ev = if ch == '\n' {
                InputEvent::Enter
            } else {
                InputEvent::TextInput(ch)
            };
            assert_eq!(e.handle(&ev), EditorAction::None);
        }
    }

    #[test]
    fn enter_inserts_newline() {
        let mut e = Editor::new();
        type_text(&mut e, "<alice> hi\n<bob> bye");
        assert_eq!(e.lines(), vec!["<alice> hi", "<bob> bye"]);
        assert_eq!(e.cursor_position(), (1, 9));
    }

    #[test]
    fn save_returns_buffer() {
        let mut e = Editor::new();
        type_text(&mut e, "line one\nline two");
        assert_eq!(
            e.handle(&InputEvent::SaveBuffer),
            EditorAction::Save("line one\nline two".into())
        );
    }

    #[test]
    fn close_and_interrupt_discard() {
        let mut e = Editor::new();
        type_text(&mut e, "draft");
        assert_eq!(e.handle(&InputEvent::CloseBuffer), EditorAction::Close);
        assert_eq!(e.handle(&InputEvent::Interrupt), EditorAction::Close);
    }

    #[test]
    fn home_and_end_stay_on_line() {
        let mut e = Editor::new();
        type_text(&mut e, "abc\ndefg");
        e.handle(&InputEvent::CursorLeft);
        e.handle(&InputEvent::Home);
        assert_eq!(e.cursor_position(), (1, 0));
        e.handle(&InputEvent::End);
        assert_eq!(e.cursor_position(), (1, 4));
        for _ in 0..5 {
            e.handle(&InputEvent::CursorLeft);
        }
        assert_eq!(e.cursor_position(), (0, 3));
        e.handle(&InputEvent::Home);
        assert_eq!(e.cursor_position(), (0, 0));
        e.handle(&InputEvent::End);
        assert_eq!(e.cursor_position(), (0, 3));
    }

    #[test]
    fn up_and_down_move_between_lines() {
        let mut e = Editor::new();
        type_text(&mut e, "first line\nab\nthird line");
        assert_eq!(e.cursor_position(), (2, 10));

        e.handle(&InputEvent::HistoryPrev);
        assert_eq!(e.cursor_position(), (1, 2));
        e.handle(&InputEvent::HistoryPrev);
        assert_eq!(e.cursor_position(), (0, 2));
        e.handle(&InputEvent::HistoryPrev);
        assert_eq!(e.cursor_position(), (0, 2));

        e.handle(&InputEvent::End);
        e.handle(&InputEvent::HistoryNext);
        assert_eq!(e.cursor_position(), (1, 2));
        e.handle(&InputEvent::HistoryNext);
        e.handle(&InputEvent::HistoryNext);
        assert_eq!(e.cursor_position(), (2, 2));

        type_text(&mut e, "X");
        assert_eq!(e.lines(), vec!["first line", "ab", "thXird line"]);
    }

    #[test]
    fn empty_editor_has_one_line() {
        assert_eq!(Editor::new().lines(), vec![""]);
    }
}
