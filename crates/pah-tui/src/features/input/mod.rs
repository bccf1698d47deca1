//! Composer state: the single-line input buffer and its draft.

use unicode_segmentation::UnicodeSegmentation;

/// Text buffer with a grapheme-aware cursor.
#[derive(Debug, Default)]
pub struct InputState {
    text: String,
    /// Cursor position as a byte offset into `text`.
    cursor: usize,
    /// The buffer changed since the draft was last persisted.
    dirty: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draft(draft: Option<String>) -> Self {
        let text = draft.unwrap_or_default();
        let cursor = text.len();
        Self {
            text,
            cursor,
            dirty: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Cursor position in display columns.
    pub fn cursor_column(&self) -> usize {
        self.text[..self.cursor].graphemes(true).count()
    }

    pub fn insert(&mut self, ch: char) {
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.dirty = true;
    }

    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
        self.dirty = true;
    }

    pub fn backspace(&mut self) {
        let Some((start, _)) = self.text[..self.cursor].grapheme_indices(true).next_back() else {
            return;
        };
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        self.dirty = true;
    }

    pub fn delete(&mut self) {
        let Some(grapheme) = self.text[self.cursor..].graphemes(true).next() else {
            return;
        };
        let end = self.cursor + grapheme.len();
        self.text.replace_range(self.cursor..end, "");
        self.dirty = true;
    }

    pub fn move_left(&mut self) {
        if let Some((start, _)) = self.text[..self.cursor].grapheme_indices(true).next_back() {
            self.cursor = start;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(grapheme) = self.text[self.cursor..].graphemes(true).next() {
            self.cursor += grapheme.len();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    /// Takes the buffer for sending, leaving it empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        self.dirty = true;
        std::mem::take(&mut self.text)
    }

    /// Returns the text to persist, once per change.
    pub fn take_dirty(&mut self) -> Option<String> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_round_trip() {
        let mut input = InputState::new();
        for ch in "helo".chars() {
            input.insert(ch);
        }
        input.move_left();
        input.insert('l');
        assert_eq!(input.text(), "hello");
        input.move_end();
        input.backspace();
        assert_eq!(input.text(), "hell");
        assert_eq!(input.take(), "hell");
        assert!(input.is_empty());
    }

    #[test]
    fn cursor_moves_over_multibyte_graphemes() {
        let mut input = InputState::new();
        input.insert_str("a👍b");
        input.move_home();
        input.move_right();
        input.move_right();
        input.insert('x');
        assert_eq!(input.text(), "a👍xb");
        input.backspace();
        input.backspace();
        assert_eq!(input.text(), "ab");
    }

    #[test]
    fn dirty_flag_fires_once_per_change() {
        let mut input = InputState::with_draft(Some("saved".into()));
        assert_eq!(input.take_dirty(), None);
        input.insert('!');
        assert_eq!(input.take_dirty().as_deref(), Some("saved!"));
        assert_eq!(input.take_dirty(), None);
    }
}
