//! Line-buffered input.
//!
//! Keystrokes are echoed locally and collected into a line; nothing reaches
//! the socket until Enter submits the whole line. The editor only produces
//! display text and submit events, it never talks to the connection.

use unicode_width::UnicodeWidthChar;

use crate::KeyInput;

/// Erase sequence for one rendered column.
const ERASE_COLUMN: &str = "\x08 \x08";

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Prompt drawn at the start of every line.
    pub prompt: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { prompt: "$ ".to_string() }
    }
}

/// Output of one keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutput {
    /// Write text to the display.
    Echo(String),
    /// A complete line was entered.
    Submit(String),
}

/// Line editor state.
///
/// Only ever appends or removes at the end of the line; there is no cursor
/// movement, so the cursor is always one past the last character.
#[derive(Debug, Clone, Default)]
pub struct LineEditor {
    buffer: String,
    config: EditorConfig,
}

impl LineEditor {
    /// Create an empty editor.
    pub fn new(config: EditorConfig) -> Self {
        Self { buffer: String::new(), config }
    }

    /// Current line.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Whether the current line is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The configured prompt.
    pub fn prompt(&self) -> &str {
        &self.config.prompt
    }

    /// Fresh prompt on a new line.
    pub fn prompt_redraw(&self) -> String {
        format!("\r\n{}", self.config.prompt)
    }

    /// Discard the current line without submitting it.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Process one keystroke.
    pub fn handle_key(&mut self, key: KeyInput) -> Vec<EditorOutput> {
        match key {
            KeyInput::Enter => self.handle_enter(),
            KeyInput::Backspace => self.handle_backspace(),
            KeyInput::Char(c) if !c.is_control() => {
                self.buffer.push(c);
                vec![EditorOutput::Echo(c.to_string())]
            },
            KeyInput::Char(_)
            | KeyInput::Delete
            | KeyInput::Tab
            | KeyInput::Esc
            | KeyInput::Left
            | KeyInput::Right
            | KeyInput::Up
            | KeyInput::Down
            | KeyInput::Home
            | KeyInput::End => vec![],
        }
    }

    fn handle_enter(&mut self) -> Vec<EditorOutput> {
        if self.buffer.is_empty() {
            return vec![EditorOutput::Echo(self.prompt_redraw())];
        }

        let line = std::mem::take(&mut self.buffer);
        vec![EditorOutput::Submit(line), EditorOutput::Echo(self.prompt_redraw())]
    }

    /// Erase the last character. The prompt itself is never erased.
    fn handle_backspace(&mut self) -> Vec<EditorOutput> {
        let Some(c) = self.buffer.pop() else {
            return vec![];
        };

        let columns = c.width().unwrap_or(0);
        if columns == 0 {
            return vec![];
        }
        vec![EditorOutput::Echo(ERASE_COLUMN.repeat(columns))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(editor: &mut LineEditor, text: &str) {
        for c in text.chars() {
            editor.handle_key(KeyInput::Char(c));
        }
    }

    #[test]
    fn printable_chars_echo_and_buffer() {
        let mut editor = LineEditor::default();
        assert_eq!(editor.handle_key(KeyInput::Char('l')), vec![EditorOutput::Echo("l".into())]);
        editor.handle_key(KeyInput::Char('s'));
        assert_eq!(editor.buffer(), "ls");
    }

    #[test]
    fn enter_on_empty_redraws_prompt_only() {
        let mut editor = LineEditor::new(EditorConfig::default());
        let out = editor.handle_key(KeyInput::Enter);
        assert_eq!(out, vec![EditorOutput::Echo("\r\n$ ".into())]);
        assert!(editor.is_empty());
    }

    #[test]
    fn enter_submits_and_clears() {
        let mut editor = LineEditor::new(EditorConfig::default());
        type_str(&mut editor, "ps aux");

        let out = editor.handle_key(KeyInput::Enter);
        assert_eq!(out, vec![
            EditorOutput::Submit("ps aux".into()),
            EditorOutput::Echo("\r\n$ ".into())
        ]);
        assert!(editor.is_empty());
    }

    #[test]
    fn backspace_on_empty_is_noop() {
        let mut editor = LineEditor::new(EditorConfig::default());
        assert!(editor.handle_key(KeyInput::Backspace).is_empty());
        assert!(editor.is_empty());
    }

    #[test]
    fn backspace_erases_one_column() {
        let mut editor = LineEditor::new(EditorConfig::default());
        type_str(&mut editor, "ab");

        assert_eq!(editor.handle_key(KeyInput::Backspace), vec![EditorOutput::Echo(
            "\x08 \x08".into()
        )]);
        assert_eq!(editor.buffer(), "a");
    }

    #[test]
    fn backspace_erases_wide_char_columns() {
        let mut editor = LineEditor::new(EditorConfig::default());
        type_str(&mut editor, "日");

        assert_eq!(editor.handle_key(KeyInput::Backspace), vec![EditorOutput::Echo(
            "\x08 \x08\x08 \x08".into()
        )]);
        assert!(editor.is_empty());
    }

    #[test]
    fn navigation_keys_ignored() {
        let mut editor = LineEditor::new(EditorConfig::default());
        type_str(&mut editor, "x");
        for key in [KeyInput::Left, KeyInput::Right, KeyInput::Tab, KeyInput::Home, KeyInput::End] {
            assert!(editor.handle_key(key).is_empty());
        }
        assert!(editor.handle_key(KeyInput::Char('\u{7}')).is_empty());
        assert_eq!(editor.buffer(), "x");
    }

    #[test]
    fn custom_prompt() {
        let mut editor = LineEditor::new(EditorConfig { prompt: "> ".into() });
        assert_eq!(editor.handle_key(KeyInput::Enter), vec![EditorOutput::Echo("\r\n> ".into())]);
    }
}
