//! Command history with Up/Down navigation.

use std::collections::VecDeque;

/// Bounded history of submitted steady-state lines.
///
/// Navigation keeps a draft slot: pressing Up saves the line being typed,
/// and walking Down past the newest entry restores it.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    max: usize,
    /// Index into `entries` while navigating, `None` when editing the draft.
    position: Option<usize>,
    draft: String,
}

impl History {
    pub fn new(max: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max.min(256)),
            max: max.max(1),
            position: None,
            draft: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Record a submitted line. Blank lines and repeats of the newest entry
    /// are skipped.
    pub fn push(&mut self, line: &str) {
        self.reset_navigation();
        let line = line.trim();
        if line.is_empty() || self.entries.back().is_some_and(|last| last == line) {
            return;
        }
        if self.entries.len() == self.max {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
    }

    /// Step back in time. `current` is the line being edited; it becomes
    /// the draft when navigation starts.
    pub fn prev(&mut self, current: &str) -> Option<&str> {
        let idx = match self.position {
            None if self.entries.is_empty() => return None,
            None => {
                self.draft = current.to_string();
                self.entries.len() - 1
            },
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.position = Some(idx);
        self.entries.get(idx).map(String::as_str)
    }

    /// Step forward in time. Returns the draft once past the newest entry.
    pub fn next(&mut self) -> Option<&str> {
        let i = self.position?;
        if i + 1 < self.entries.len() {
            self.position = Some(i + 1);
            self.entries.get(i + 1).map(String::as_str)
        } else {
            self.position = None;
            Some(self.draft.as_str())
        }
    }

    pub fn reset_navigation(&mut self) {
        self.position = None;
        self.draft.clear();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.reset_navigation();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}
