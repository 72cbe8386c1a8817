//! Key bindings: arrows and vim-style letters.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// One sector counter-clockwise.
    MoveLeft,
    /// One sector clockwise.
    MoveRight,
    /// One layer toward the hub.
    SoftDrop,
    Pause,
    ToggleDisplay,
    NewGame,
    Help,
    Restart,
    Confirm,
    Quit,
    None,
}

impl Action {
    /// Actions that may fire again while the key is held.
    pub fn repeats(self) -> bool {
        matches!(self, Self::MoveLeft | Self::MoveRight | Self::SoftDrop)
    }
}

/// Map key event to action. Ctrl+C always quits.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') | KeyCode::Char('P') => Action::Pause,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        KeyCode::Char('v') | KeyCode::Char('V') => Action::ToggleDisplay,
        KeyCode::Char('n') | KeyCode::Char('N') => Action::NewGame,
        KeyCode::Char('?') | KeyCode::F(1) => Action::Help,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::Restart,
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Action::Confirm,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_arrows_and_vim_keys_match() {
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::MoveLeft);
        assert_eq!(key_to_action(key(KeyCode::Char('h'))), Action::MoveLeft);
        assert_eq!(key_to_action(key(KeyCode::Right)), Action::MoveRight);
        assert_eq!(key_to_action(key(KeyCode::Char('l'))), Action::MoveRight);
        assert_eq!(key_to_action(key(KeyCode::Down)), Action::SoftDrop);
        assert_eq!(key_to_action(key(KeyCode::Char('j'))), Action::SoftDrop);
    }

    #[test]
    fn test_game_keys() {
        assert_eq!(key_to_action(key(KeyCode::Char('p'))), Action::Pause);
        assert_eq!(key_to_action(key(KeyCode::Char('v'))), Action::ToggleDisplay);
        assert_eq!(key_to_action(key(KeyCode::Char('n'))), Action::NewGame);
        assert_eq!(key_to_action(key(KeyCode::F(1))), Action::Help);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Up)), Action::None);
    }

    #[test]
    fn test_shifted_question_mark_opens_help() {
        let ev = KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT);
        assert_eq!(key_to_action(ev), Action::Help);
    }

    #[test]
    fn test_modifiers() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(ctrl_c), Action::Quit);
        let alt_h = KeyEvent::new(KeyCode::Char('h'), KeyModifiers::ALT);
        assert_eq!(key_to_action(alt_h), Action::None);
    }

    #[test]
    fn test_only_moves_repeat() {
        assert!(Action::MoveLeft.repeats());
        assert!(Action::SoftDrop.repeats());
        assert!(!Action::Pause.repeats());
        assert!(!Action::NewGame.repeats());
    }
}
