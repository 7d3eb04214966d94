// Keyboard handling. Keys become small Intent values; the app loop applies
// them under the state lock, so the input layer never touches app state.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Quit,
    /// Cycle the mode registered under this hotkey.
    Toggle(char),
    /// dx > 0 scrolls into history, dy > 0 scrolls down.
    Scroll { dx: i32, dy: i32 },
    ResetScroll,
}

pub fn intent_for(key: KeyEvent) -> Option<Intent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Intent::Quit);
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Intent::Quit),
        KeyCode::Char('0') => Some(Intent::ResetScroll),
        KeyCode::Left => Some(Intent::Scroll { dx: 1, dy: 0 }),
        KeyCode::Right => Some(Intent::Scroll { dx: -1, dy: 0 }),
        KeyCode::Up => Some(Intent::Scroll { dx: 0, dy: -1 }),
        KeyCode::Down => Some(Intent::Scroll { dx: 0, dy: 1 }),
        KeyCode::Char(c) => Some(Intent::Toggle(c)),
        _ => None,
    }
}
