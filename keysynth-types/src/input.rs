/// Raw key codes as delivered by the polling layer.
///
/// Terminal backends convert their own key types into this one so the core
/// never depends on a particular input library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    F(u8),
}

impl KeyCode {
    /// Parse a key notation string.
    ///
    /// - `"q"` → `Char('q')`
    /// - `"Space"` → `Char(' ')`
    /// - `"Up"`, `"Enter"`, `"F1"` → named keys
    ///
    /// Returns `None` for unrecognised names.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(KeyCode::Char(c));
        }
        match s {
            "Space" => Some(KeyCode::Char(' ')),
            "Up" => Some(KeyCode::Up),
            "Down" => Some(KeyCode::Down),
            "Left" => Some(KeyCode::Left),
            "Right" => Some(KeyCode::Right),
            "Enter" => Some(KeyCode::Enter),
            "Escape" => Some(KeyCode::Escape),
            "Backspace" => Some(KeyCode::Backspace),
            "Tab" => Some(KeyCode::Tab),
            "Home" => Some(KeyCode::Home),
            "End" => Some(KeyCode::End),
            "PageUp" => Some(KeyCode::PageUp),
            "PageDown" => Some(KeyCode::PageDown),
            "Insert" => Some(KeyCode::Insert),
            "Delete" => Some(KeyCode::Delete),
            _ if s.starts_with('F') => s[1..].parse::<u8>().ok().map(KeyCode::F),
            _ => None,
        }
    }
}
