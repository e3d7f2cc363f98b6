//! Terminal key chords mapped onto navigator signals.
//!
//! Hosts that read crossterm events feed them through [`KeyBindings::dispatch`];
//! drawing the screen stays with the host.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::Result;
use crate::runtime::{ExternalSignal, Navigator};

/// What a key press asks the host to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Signal(ExternalSignal),
    Quit,
}

/// Key chords mapped to actions. Only key presses are considered.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    back: Vec<(KeyCode, KeyModifiers)>,
    quit: Vec<(KeyCode, KeyModifiers)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            back: vec![
                (KeyCode::Esc, KeyModifiers::NONE),
                (KeyCode::Backspace, KeyModifiers::NONE),
                (KeyCode::Left, KeyModifiers::ALT),
            ],
            quit: vec![
                (KeyCode::Char('q'), KeyModifiers::NONE),
                (KeyCode::Char('c'), KeyModifiers::CONTROL),
            ],
        }
    }
}

impl KeyBindings {
    pub fn with_back(mut self, code: KeyCode, modifiers: KeyModifiers) -> Self {
        self.back.push((code, modifiers));
        self
    }

    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let chord = (key.code, key.modifiers);
        if self.quit.contains(&chord) {
            Some(KeyAction::Quit)
        } else if self.back.contains(&chord) {
            Some(KeyAction::Signal(ExternalSignal::BackRequested))
        } else {
            None
        }
    }

    /// Apply one terminal event to `navigator`; returns `false` once the user
    /// asked to quit.
    pub fn dispatch(&self, navigator: &mut Navigator, event: &Event) -> Result<bool> {
        let Event::Key(key) = event else {
            return Ok(true);
        };
        match self.resolve(key) {
            Some(KeyAction::Quit) => Ok(false),
            Some(KeyAction::Signal(signal)) => {
                navigator.handle_signal(signal)?;
                Ok(true)
            }
            None => Ok(true),
        }
    }
}
