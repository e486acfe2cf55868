//! Editable text buffer with a character-indexed cursor.

/// Text with a cursor. The cursor is a character index, never a byte index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    text: String,
    cursor: usize,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position as a character index.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Insert a character at the cursor position.
    pub fn insert(&mut self, ch: char) {
        let at = self.byte_at(self.cursor);
        self.text.insert(at, ch);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_at(self.cursor);
        self.text.remove(at);
    }

    /// Delete the character under the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_at(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Move the cursor to an absolute character index, clamped to the text.
    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.char_len());
    }

    /// Replace the whole text and put the cursor at its end.
    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.char_len();
    }

    /// Replace the characters in `start..end` and put the cursor right
    /// after the replacement.
    pub fn replace_range(&mut self, start: usize, end: usize, with: &str) {
        let (from, to) = (self.byte_at(start), self.byte_at(end.max(start)));
        self.text.replace_range(from..to, with);
        self.cursor = start + with.chars().count();
    }

    /// Take the text out, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Text before the cursor.
    pub fn before_cursor(&self) -> &str {
        &self.text[..self.byte_at(self.cursor)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(s: &str) -> LineBuffer {
        let mut b = LineBuffer::new();
        for ch in s.chars() {
            b.insert(ch);
        }
        b
    }

    #[test]
    fn insert_advances_cursor() {
        let b = typed("ls -l");
        assert_eq!(b.text(), "ls -l");
        assert_eq!(b.cursor(), 5);
    }

    #[test]
    fn insert_mid_line() {
        let mut b = typed("ct");
        b.move_left();
        b.insert('a');
        assert_eq!(b.text(), "cat");
        assert_eq!(b.cursor(), 2);
    }

    #[test]
    fn backspace_at_start_does_nothing() {
        let mut b = LineBuffer::new();
        b.backspace();
        assert!(b.is_empty());
        assert_eq!(b.cursor(), 0);
    }

    #[test]
    fn delete_under_cursor() {
        let mut b = typed("grepp");
        b.delete();
        assert_eq!(b.text(), "grepp");
        b.move_left();
        b.delete();
        assert_eq!(b.text(), "grep");
        assert_eq!(b.cursor(), 4);
    }

    #[test]
    fn cursor_is_clamped() {
        let mut b = typed("ab");
        b.move_right();
        assert_eq!(b.cursor(), 2);
        b.home();
        b.move_left();
        assert_eq!(b.cursor(), 0);
        b.set_cursor(99);
        assert_eq!(b.cursor(), 2);
    }

    #[test]
    fn unicode_editing() {
        let mut b = typed("h\u{00E9}llo");
        b.home();
        b.move_right();
        b.move_right();
        b.backspace();
        assert_eq!(b.text(), "hllo");
        assert_eq!(b.before_cursor(), "h");
    }

    #[test]
    fn replace_range_moves_cursor() {
        let mut b = typed("lo -n 5");
        b.set_cursor(2);
        b.replace_range(0, 2, "login");
        assert_eq!(b.text(), "login -n 5");
        assert_eq!(b.cursor(), 5);
    }

    #[test]
    fn take_empties() {
        let mut b = typed("fortune");
        assert_eq!(b.take(), "fortune");
        assert!(b.is_empty());
        assert_eq!(b.cursor(), 0);
    }
}
