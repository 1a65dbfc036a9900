use crate::application::{App, AppMode};
use crate::infrastructure::{FileRepository, RangeSource, SystemClipboard};
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, source: &mut dyn RangeSource, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, source, key, modifiers),
            AppMode::Editing => Self::handle_editing_mode(app, key),
            AppMode::Choosing => Self::handle_choosing_mode(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
            AppMode::ExportCsv => Self::handle_filename_input_mode(app, key),
        }
    }

    fn handle_normal_mode(app: &mut App, source: &mut dyn RangeSource, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('s') => {
                    app.save(source);
                    return;
                }
                KeyCode::Char('r') => {
                    app.reload(source);
                    return;
                }
                KeyCode::Char('e') => {
                    app.start_csv_export();
                    return;
                }
                KeyCode::Char('c') => {
                    let result = SystemClipboard::copy(app.selected_value());
                    app.set_copy_result(result);
                    return;
                }
                KeyCode::Char('v') => {
                    match SystemClipboard::paste() {
                        Ok(text) => app.paste_into_selected(text),
                        Err(error) => app.status_message = Some(format!("Paste failed: {}", error)),
                    }
                    return;
                }
                _ => {}
            }
        }

        app.status_message = None;

        match key {
            KeyCode::Up | KeyCode::Char('k') => app.move_up(),
            KeyCode::Down | KeyCode::Char('j') => app.move_down(),
            KeyCode::Left | KeyCode::Char('h') => app.move_left(),
            KeyCode::Right | KeyCode::Char('l') => app.move_right(),
            KeyCode::PageUp => {
                for _ in 0..10 {
                    app.move_up();
                }
            }
            KeyCode::PageDown => {
                for _ in 0..10 {
                    app.move_down();
                }
            }
            KeyCode::Home => {
                app.selected_row = 0;
                app.ensure_cursor_visible();
            }
            KeyCode::End => {
                app.selected_row = app.inputs.height().saturating_sub(1);
                app.ensure_cursor_visible();
            }
            KeyCode::Enter | KeyCode::F(2) => {
                app.start_editing();
            }
            KeyCode::Backspace | KeyCode::Delete => {
                app.clear_selected_cell();
            }
            KeyCode::F(1) | KeyCode::Char('?') => {
                app.mode = AppMode::Help;
                app.help_scroll = 0;
            }
            KeyCode::Char('q') => {
                // Will be handled by main loop
            }
            _ => {}
        }
    }

    fn handle_editing_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.finish_editing(),
            KeyCode::Esc => app.cancel_editing(),
            _ => {
                let (buffer, cursor) = (&mut app.input, &mut app.cursor_position);
                Self::edit_line(buffer, cursor, key);
            }
        }
    }

    fn handle_choosing_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.finish_choice(),
            KeyCode::Esc => app.cancel_choice(),
            KeyCode::Up | KeyCode::Char('k') => app.previous_choice(),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => app.next_choice(),
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.mode = AppMode::Normal;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_filename_input_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                let filename = app.get_csv_export_filename();
                let result = FileRepository::export_table_csv(&app.inputs, &filename);
                app.set_csv_export_result(result);
            }
            KeyCode::Esc => app.cancel_filename_input(),
            _ => {
                let (buffer, cursor) = (&mut app.filename_input, &mut app.cursor_position);
                Self::edit_line(buffer, cursor, key);
            }
        }
    }

    /// Single-line editing shared by the cell editor and filename prompt.
    /// `cursor` counts characters, not bytes.
    fn edit_line(buffer: &mut String, cursor: &mut usize, key: KeyCode) {
        fn byte_at(s: &str, idx: usize) -> usize {
            s.char_indices().nth(idx).map(|(b, _)| b).unwrap_or(s.len())
        }
        let len = buffer.chars().count();

        match key {
            KeyCode::Backspace => {
                if *cursor > 0 {
                    let at = byte_at(buffer, *cursor - 1);
                    buffer.remove(at);
                    *cursor -= 1;
                }
            }
            KeyCode::Delete => {
                if *cursor < len {
                    let at = byte_at(buffer, *cursor);
                    buffer.remove(at);
                }
            }
            KeyCode::Left => *cursor = cursor.saturating_sub(1),
            KeyCode::Right => {
                if *cursor < len {
                    *cursor += 1;
                }
            }
            KeyCode::Home => *cursor = 0,
            KeyCode::End => *cursor = len,
            KeyCode::Char(c) => {
                let at = byte_at(buffer, *cursor);
                buffer.insert(at, c);
                *cursor += 1;
            }
            _ => {}
        }
    }
}
