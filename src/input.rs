//! Key bindings (arrows/WASD-style and vim-style) and the per-frame input queue.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::VecDeque;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    RotateCw,
    RotateCcw,
    SoftDrop,
    HardDrop,
    Pause,
    /// End the current game (the "Stop" button).
    Stop,
    Quit,
    None,
}

impl Action {
    /// Actions that reach the piece, as opposed to menu/app control.
    pub fn is_gameplay(&self) -> bool {
        matches!(
            self,
            Self::MoveLeft
                | Self::MoveRight
                | Self::RotateCw
                | Self::RotateCcw
                | Self::SoftDrop
                | Self::HardDrop
        )
    }
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod && modifiers != KeyModifiers::CONTROL {
        return Action::None;
    }
    match code {
        KeyCode::Char('c') if modifiers == KeyModifiers::CONTROL => Action::Quit,
        KeyCode::Char('q') | KeyCode::Esc if no_mod => Action::Quit,
        KeyCode::Char('p') if no_mod => Action::Pause,
        KeyCode::Char('s') if no_mod => Action::Stop,
        KeyCode::Left | KeyCode::Char('h') if no_mod => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') if no_mod => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('d') | KeyCode::Char('k') if no_mod => Action::RotateCw,
        KeyCode::Char('a') | KeyCode::Char('u') if no_mod => Action::RotateCcw,
        KeyCode::Down | KeyCode::Char('j') if no_mod => Action::SoftDrop,
        KeyCode::Char(' ') | KeyCode::Enter if no_mod => Action::HardDrop,
        _ => Action::None,
    }
}

/// Key presses collected between frames, oldest first.
#[derive(Debug, Default)]
pub struct InputQueue {
    pending: VecDeque<Action>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        if action != Action::None {
            self.pending.push_back(action);
        }
    }

    /// Oldest pending action, if any.
    pub fn poll(&mut self) -> Option<Action> {
        self.pending.pop_front()
    }

    /// Drop whatever the frame did not consume.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
