use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Paste(text) => {
            if app.input_mode == InputMode::Editing && !app.session.input_disabled() {
                app.insert_str(&text);
            }
        }
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.on_tick(Instant::now()),
    }
}

/// Enter alone sends. Shift+Enter inserts a newline; Alt+Enter does too, for
/// terminals that cannot report Shift on Enter.
pub fn is_send_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Enter && !key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT)
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => {
            if !app.session.input_disabled() {
                app.input_mode = InputMode::Editing;
            }
        }

        // Code blocks
        KeyCode::Char('n') => app.select_next_block(),
        KeyCode::Char('N') => app.select_prev_block(),
        KeyCode::Char('y') => app.copy_selected(Instant::now()),
        KeyCode::Char('p') => app.toggle_selected_preview(),
        KeyCode::Char('o') => app.open_selected_preview(),
        KeyCode::Esc => app.selected_block = None,

        KeyCode::Char('x') => {
            app.session.dismiss_error();
            app.status = None;
        }

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_by(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_by(-1),
        KeyCode::PageDown => app.scroll_by((app.chat_height / 2).max(1) as i32),
        KeyCode::PageUp => app.scroll_by(-((app.chat_height / 2).max(1) as i32)),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_by(-(app.scroll as i32)),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    // The input box is disabled while a reply is pending
    if app.session.input_disabled() {
        if key.code == KeyCode::Esc {
            app.input_mode = InputMode::Normal;
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter if is_send_key(&key) => app.submit(),
        KeyCode::Enter => app.insert_char('\n'),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.insert_char(c),
        _ => {}
    }
}
