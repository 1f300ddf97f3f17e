//! Key mapping from terminal events to pad buttons.

use crate::types::PadButtons;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Map a key to the pad button it drives.
pub fn button_for_key(code: KeyCode) -> Option<PadButtons> {
    match code {
        // Directions
        KeyCode::Left => Some(PadButtons::LEFT),
        KeyCode::Right => Some(PadButtons::RIGHT),
        KeyCode::Up => Some(PadButtons::UP),
        KeyCode::Down => Some(PadButtons::DOWN),

        // Buttons, bottom row first
        KeyCode::Char('z') | KeyCode::Char('Z') => Some(PadButtons::BUTTON1),
        KeyCode::Char('x') | KeyCode::Char('X') => Some(PadButtons::BUTTON2),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(PadButtons::BUTTON3),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(PadButtons::BUTTON4),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(PadButtons::BUTTON5),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(PadButtons::BUTTON6),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(PadButtons::BUTTON7),
        KeyCode::Char('w') | KeyCode::Char('W') => Some(PadButtons::BUTTON8),
        KeyCode::Char('e') | KeyCode::Char('E') => Some(PadButtons::BUTTON9),

        _ => None,
    }
}

/// Check if key should end the program.
///
/// `q` is a pad button, so only Esc and Ctrl+C quit.
pub fn should_quit(key: KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
            && key.modifiers.contains(KeyModifiers::CONTROL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_keys() {
        assert_eq!(button_for_key(KeyCode::Left), Some(PadButtons::LEFT));
        assert_eq!(button_for_key(KeyCode::Right), Some(PadButtons::RIGHT));
        assert_eq!(button_for_key(KeyCode::Up), Some(PadButtons::UP));
        assert_eq!(button_for_key(KeyCode::Down), Some(PadButtons::DOWN));
    }

    #[test]
    fn test_button_keys_ignore_case() {
        assert_eq!(button_for_key(KeyCode::Char('z')), Some(PadButtons::BUTTON1));
        assert_eq!(button_for_key(KeyCode::Char('Z')), Some(PadButtons::BUTTON1));
        assert_eq!(button_for_key(KeyCode::Char('X')), Some(PadButtons::BUTTON2));
        assert_eq!(button_for_key(KeyCode::Char('q')), Some(PadButtons::BUTTON7));
        assert_eq!(button_for_key(KeyCode::Char('E')), Some(PadButtons::BUTTON9));
    }

    #[test]
    fn test_unmapped_keys() {
        assert_eq!(button_for_key(KeyCode::Char(' ')), None);
        assert_eq!(button_for_key(KeyCode::Enter), None);
        assert_eq!(button_for_key(KeyCode::Char('h')), None);
    }

    #[test]
    fn test_quit_keys() {
        assert!(should_quit(KeyEvent::from(KeyCode::Esc)));
        assert!(should_quit(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!should_quit(KeyEvent::from(KeyCode::Char('c'))));
        assert!(!should_quit(KeyEvent::from(KeyCode::Char('q'))));
    }
}
