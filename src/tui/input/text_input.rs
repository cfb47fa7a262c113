//! Single-line search input.

use unicode_width::UnicodeWidthStr;

/// State for the search input field.
#[derive(Clone, Debug, Default)]
pub struct TextInput {
    content: String,
    /// Cursor position in characters, not bytes.
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a character at the cursor position.
    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    /// Deletes the character before the cursor. Returns `false` if there
    /// was nothing to delete.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.content.remove(at);
        true
    }

    /// Deletes the character under the cursor. Returns `false` at the end
    /// of the input.
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.char_count() {
            return false;
        }
        let at = self.byte_offset(self.cursor);
        self.content.remove(at);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Takes the content and resets the input.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Terminal columns between the start of the input and the cursor.
    pub fn cursor_width(&self) -> u16 {
        let before = &self.content[..self.byte_offset(self.cursor)];
        u16::try_from(before.width()).unwrap_or(u16::MAX)
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.content
            .char_indices()
            .nth(chars)
            .map_or(self.content.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> TextInput {
        let mut input = TextInput::new();
        text.chars().for_each(|c| input.insert(c));
        input
    }

    #[test]
    fn edits_at_the_cursor() {
        let mut input = typed("eurusd");
        input.move_left();
        input.move_left();
        input.insert('/');
        assert_eq!(input.as_str(), "eur/usd");

        assert!(input.backspace());
        assert!(input.delete());
        assert_eq!(input.as_str(), "eursd");
    }

    #[test]
    fn handles_multibyte_characters() {
        let mut input = typed("€5");
        input.move_home();
        input.move_right();
        assert_eq!(input.cursor_width(), 1);
        assert!(input.backspace());
        assert_eq!(input.as_str(), "5");
    }

    #[test]
    fn no_op_edits_report_false() {
        let mut input = TextInput::new();
        assert!(!input.backspace());
        assert!(!input.delete());
        assert!(input.is_empty());
    }

    #[test]
    fn take_resets() {
        let mut input = typed("gbp");
        assert_eq!(input.take(), "gbp");
        assert!(input.is_empty());
        assert_eq!(input.cursor_width(), 0);
    }
}
