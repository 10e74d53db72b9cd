//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action if one doesn't exist.
//! 2. Add a `KeyCode` match arm in [`handle_key_event`] that calls it.
//! 3. Update the help text in the status bar (`ui::draw_status_bar`).
//! 4. Update the key table in `README.md`.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit = true,
        KeyCode::Esc if app.show_problem => app.show_problem = false,
        KeyCode::Esc => app.quit = true,
        KeyCode::Char('p') | KeyCode::Enter => app.toggle_problem(),
        _ => {}
    }
}
