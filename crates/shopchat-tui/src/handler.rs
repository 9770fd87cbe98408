use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use shopchat_core::{ChatBackend, SUGGESTIONS};
use crate::app::{App, Focus};
use crate::tui::AppEvent;

pub fn handle_event<B: ChatBackend>(app: &mut App<B>, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
    }
    // Replies can land between ticks; pick them up as soon as we wake.
    app.poll_reply();
}

fn handle_key<B: ChatBackend>(app: &mut App<B>, key: KeyEvent) {
    // Global keys that work in any focus
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Tab => {
            app.focus = app.focus.next();
            return;
        }
        KeyCode::BackTab => {
            app.focus = app.focus.prev();
            return;
        }
        _ => {}
    }

    match app.focus {
        Focus::Input => handle_input_key(app, key),
        Focus::Suggestions => handle_suggestions_key(app, key),
        Focus::Log => handle_log_key(app, key),
    }
}

fn handle_input_key<B: ChatBackend>(app: &mut App<B>, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            if app.input.is_empty() {
                app.should_quit = true;
            } else {
                app.clear_input();
            }
        }
        // Alt/Shift+Enter breaks the line, plain Enter sends
        KeyCode::Enter if key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) => {
            app.insert_char('\n');
        }
        KeyCode::Enter => app.submit_input(),
        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::PageUp => app.scroll_log_up(app.half_page()),
        KeyCode::PageDown => app.scroll_log_down(app.half_page()),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

/// Digits 1..=N send the matching suggestion from any non-input focus.
fn suggestion_shortcut(key: &KeyEvent) -> Option<usize> {
    let KeyCode::Char(c) = key.code else {
        return None;
    };
    let n = c.to_digit(10)? as usize;
    (1..=SUGGESTIONS.len()).contains(&n).then(|| n - 1)
}

fn handle_suggestions_key<B: ChatBackend>(app: &mut App<B>, key: KeyEvent) {
    if let Some(idx) = suggestion_shortcut(&key) {
        app.send_suggestion(idx);
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Char('j') | KeyCode::Down => {
            app.suggestion_next();
        }
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('k') | KeyCode::Up => {
            app.suggestion_prev();
        }
        KeyCode::Enter | KeyCode::Char(' ') => app.send_suggestion(app.selected_suggestion),
        KeyCode::Char('i') => app.focus = Focus::Input,
        _ => {}
    }
}

fn handle_log_key<B: ChatBackend>(app: &mut App<B>, key: KeyEvent) {
    if let Some(idx) = suggestion_shortcut(&key) {
        app.send_suggestion(idx);
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_log_down(app.half_page());
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_log_up(app.half_page());
        }

        KeyCode::Char('j') | KeyCode::Down => app.scroll_log_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_log_up(1),
        KeyCode::PageDown => app.scroll_log_down(app.half_page()),
        KeyCode::PageUp => app.scroll_log_up(app.half_page()),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_log_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_log_bottom(),
        KeyCode::Char('i') => app.focus = Focus::Input,
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse<B: ChatBackend>(app: &mut App<B>, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if app.log_area.is_some_and(|r| point_in_rect(x, y, r)) {
                app.scroll_log_down(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if app.log_area.is_some_and(|r| point_in_rect(x, y, r)) {
                app.scroll_log_up(3);
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            let clicked = app
                .suggestion_areas
                .iter()
                .position(|r| point_in_rect(x, y, *r));
            if let Some(idx) = clicked {
                app.focus = Focus::Suggestions;
                app.send_suggestion(idx);
            }
        }
        _ => {}
    }
}
