use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};

use crate::io::log_io::{next_day, prev_day};
use crate::tui::app::{App, PromptKind};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    // Help overlay swallows everything but its own close keys
    if app.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Esc => app.notice = None,
        KeyCode::Tab => app.toggle_view(),

        // Movement
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::PageDown => app.move_cursor(10),
        KeyCode::PageUp => app.move_cursor(-10),
        KeyCode::Char('g') | KeyCode::Home => app.cursor_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.cursor_to_bottom(),

        // Log actions
        KeyCode::Char('s') => app.start(),
        KeyCode::Char('e') => app.end(),
        KeyCode::Char('n') => app.end_and_start(),
        KeyCode::Char('r') => app.resume(),
        KeyCode::Char('R') => app.recalculate(),
        KeyCode::Char('a') => app.begin_prompt(PromptKind::AddTask),
        KeyCode::Char('A') => app.begin_prompt(PromptKind::AddAndStart),
        KeyCode::Char('m') => app.begin_prompt(PromptKind::Memo),
        KeyCode::Char('f') => app.toggle_focus(),

        // Days
        KeyCode::Char('[') => app.switch_day(prev_day(app.date)),
        KeyCode::Char(']') => app.switch_day(next_day(app.date)),
        KeyCode::Char('t') => app.switch_day(Local::now().date_naive()),
        _ => {}
    }
}
