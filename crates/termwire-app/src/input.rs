//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples application logic from terminal libraries (crossterm, termion,
/// etc.) enabling deterministic simulation testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key (erase last character).
    Backspace,
    /// Delete key.
    Delete,
    /// Tab key.
    Tab,
    /// Escape key.
    Esc,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Up arrow key. Never reaches the editor.
    Up,
    /// Down arrow key. Never reaches the editor.
    Down,
    /// Home key.
    Home,
    /// End key.
    End,
}

impl KeyInput {
    /// Keys swallowed by the bridge before the editor or the display sees
    /// them. There is no command history to navigate.
    pub fn is_suppressed(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}
