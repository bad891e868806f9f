use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string edits
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Works everywhere, even mid-request
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.open {
        handle_open_key(app, key);
    } else {
        handle_closed_key(app, key);
    }
}

fn handle_closed_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('o') | KeyCode::Enter => app.toggle_open(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn handle_open_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.toggle_open(),

        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::PageUp => {
            for _ in 0..10 {
                app.scroll_up();
            }
        }
        KeyCode::PageDown => {
            for _ in 0..10 {
                app.scroll_down();
            }
        }

        // Everything below edits or submits the input, which is disabled
        // while a request is in flight
        _ if app.loading => {}

        KeyCode::Enter => submit(app),
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if app.input_cursor < app.input.chars().count() {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => app.input_cursor = app.input_cursor.saturating_sub(1),
        KeyCode::Right => {
            app.input_cursor = (app.input_cursor + 1).min(app.input.chars().count());
        }
        KeyCode::Home => app.input_cursor = 0,
        KeyCode::End => app.input_cursor = app.input.chars().count(),
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

/// Dispatch the user's turn onto a background task. `begin_submission`
/// already rejects empty input, so a `None` here means nothing was sent.
fn submit(app: &mut App) {
    if let Some(request) = app.begin_submission() {
        let client = app.client.clone();
        app.reply_task = Some(tokio::spawn(async move { client.send(&request).await }));
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let pos = Position::new(mouse.column, mouse.row);
            if app.open {
                // Clicking the header bar minimizes
                if app.header_area.is_some_and(|area| area.contains(pos)) {
                    app.toggle_open();
                }
            } else if app.badge_area.is_some_and(|area| area.contains(pos)) {
                app.toggle_open();
            }
        }
        MouseEventKind::ScrollUp => {
            if app.open {
                app.scroll_up();
            }
        }
        MouseEventKind::ScrollDown => {
            if app.open {
                app.scroll_down();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::AssistantClient;
    use ratatui::layout::Rect;
    use std::time::Duration;

    fn test_app() -> App {
        let client = AssistantClient::new("http://localhost:3005/chatbot", Duration::from_secs(5))
            .expect("client should build");
        App::new(client)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn char_to_byte_index_handles_multibyte_text() {
        let s = "héllo";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 99), s.len());
    }

    #[test]
    fn typing_edits_the_input_at_the_cursor() {
        let mut app = test_app();
        app.toggle_open();
        handle_key(&mut app, press(KeyCode::Char('h')));
        handle_key(&mut app, press(KeyCode::Char('i')));
        assert_eq!(app.input, "hi");

        handle_key(&mut app, press(KeyCode::Left));
        handle_key(&mut app, press(KeyCode::Char('a')));
        assert_eq!(app.input, "hai");

        handle_key(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.input, "hi");
    }

    #[test]
    fn enter_with_empty_input_sends_nothing() {
        let mut app = test_app();
        app.toggle_open();
        let before = app.messages.len();

        handle_key(&mut app, press(KeyCode::Enter));

        assert_eq!(app.messages.len(), before);
        assert!(app.reply_task.is_none());
        assert!(!app.loading);
    }

    #[test]
    fn input_keys_are_ignored_while_loading() {
        let mut app = test_app();
        app.toggle_open();
        app.loading = true;
        app.input = "pending question".to_string();
        let before = app.messages.len();

        handle_key(&mut app, press(KeyCode::Char('x')));
        handle_key(&mut app, press(KeyCode::Backspace));
        handle_key(&mut app, press(KeyCode::Enter));

        assert_eq!(app.input, "pending question");
        assert_eq!(app.messages.len(), before);
        assert!(app.reply_task.is_none());
    }

    #[test]
    fn escape_minimizes_even_while_loading() {
        let mut app = test_app();
        app.toggle_open();
        app.loading = true;

        handle_key(&mut app, press(KeyCode::Esc));
        assert!(!app.open);
    }

    #[test]
    fn o_opens_the_closed_widget() {
        let mut app = test_app();
        handle_key(&mut app, press(KeyCode::Char('o')));
        assert!(app.open);
        assert_eq!(app.messages.len(), 1);
    }

    #[test]
    fn clicking_the_badge_opens_the_widget() {
        let mut app = test_app();
        app.badge_area = Some(Rect::new(60, 20, 18, 1));

        handle_mouse(&mut app, click(65, 20));
        assert!(app.open);

        let mut missed = test_app();
        missed.badge_area = Some(Rect::new(60, 20, 18, 1));
        handle_mouse(&mut missed, click(5, 5));
        assert!(!missed.open);
    }

    #[test]
    fn clicking_the_header_minimizes_the_widget() {
        let mut app = test_app();
        app.toggle_open();
        app.header_area = Some(Rect::new(16, 2, 64, 1));

        handle_mouse(&mut app, click(30, 2));
        assert!(!app.open);
    }
}
