use crate::application::{App, AppMode};
use crate::domain::{CellRef, Table};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table as TableWidget, Wrap},
    Frame,
};

/// Rows taken by everything except the data rows of the input grid.
pub const CHROME_ROWS: u16 = 8;

const MIN_COLUMN_WIDTH: usize = 3;
const MAX_COLUMN_WIDTH: usize = 30;

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_caption(f, app, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[2]);
    render_inputs(f, app, body[0]);
    render_results(f, app, body[1]);

    render_status_bar(f, app, chunks[3]);

    match app.mode {
        AppMode::Help => render_help_popup(f, app.help_scroll),
        AppMode::Choosing => render_choice_popup(f, app),
        _ => {}
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let cell = CellRef::new(
        app.layout.sheet_row_of(app.selected_row) - 1,
        app.layout.input_range.start.col + app.selected_col,
    );
    let modified = if app.dirty { " | modified" } else { "" };
    let header = Paragraph::new(format!(
        "sheetpanel - {} | Cell: {}{}",
        app.source_label,
        cell.a1(),
        modified
    ))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_caption(f: &mut Frame, app: &App, area: Rect) {
    let mut caption = format!(
        "{} = input | {} = results",
        app.layout.input_range, app.layout.result_range
    );
    if let Some(email) = &app.connected_as {
        caption.push_str(&format!(" | connected as {}", email));
    }
    f.render_widget(Paragraph::new(caption).style(Style::default().fg(Color::DarkGray)), area);
}

fn column_widths(table: &Table) -> Vec<usize> {
    (0..table.width())
        .map(|col| table.content_width(col).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH))
        .collect()
}

fn render_inputs(f: &mut Frame, app: &App, area: Rect) {
    let visible_rows = area.height.saturating_sub(3) as usize;
    let table = &app.inputs;

    let mut headers = vec![Cell::from("")];
    for (col, name) in table.columns.iter().enumerate() {
        let style = if col == app.selected_col {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else {
            Style::default().fg(Color::Yellow)
        };
        headers.push(Cell::from(name.as_str()).style(style));
    }
    let mut rows = vec![Row::new(headers).height(1)];

    let end = (app.scroll_row + visible_rows).min(table.height());
    for row in app.scroll_row..end {
        let row_number_style = if row == app.selected_row {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let mut cells = vec![Cell::from(app.layout.sheet_row_of(row).to_string()).style(row_number_style)];

        for col in 0..table.width() {
            let selected = row == app.selected_row && col == app.selected_col;
            let value = if selected && app.mode == AppMode::Editing {
                app.input.clone()
            } else {
                table.get(row, col).to_string()
            };
            let style = if selected {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else if app.layout.is_choice_column(col, table.width()) {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            cells.push(Cell::from(value).style(style));
        }
        rows.push(Row::new(cells).height(1));
    }

    let mut widths = vec![Constraint::Length(4)];
    widths.extend(column_widths(table).into_iter().map(|w| Constraint::Length(w as u16)));

    let title = format!("Input ({})", app.layout.input_range);
    let widget = TableWidget::new(rows, widths)
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);
    f.render_widget(widget, area);
}

fn render_results(f: &mut Frame, app: &App, area: Rect) {
    let title = format!("Results ({})", app.layout.result_range);
    let block = Block::default().borders(Borders::ALL).title(title);

    let table = match &app.results {
        Ok(table) => table,
        Err(error) => {
            let message = Paragraph::new(format!(
                "Could not read {}: {}\n\nCheck that the formulas and references in the sheet are correct.",
                app.layout.result_range, error
            ))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(block);
            f.render_widget(message, area);
            return;
        }
    };

    let header = Row::new(
        table
            .columns
            .iter()
            .map(|c| Cell::from(c.as_str()).style(Style::default().fg(Color::Yellow))),
    );
    let mut rows = vec![header];
    rows.extend(
        table
            .rows
            .iter()
            .map(|r| Row::new(r.iter().map(|v| Cell::from(v.as_str())))),
    );

    let widths: Vec<Constraint> = column_widths(table)
        .into_iter()
        .map(|w| Constraint::Length(w as u16))
        .collect();
    let widget = TableWidget::new(rows, widths).block(block).column_spacing(1);
    f.render_widget(widget, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let input_text = match app.mode {
        AppMode::Normal => {
            if let Some(ref status) = app.status_message {
                status.clone()
            } else {
                "Enter: edit | Ctrl+S: save to sheet | Ctrl+R: reload | Ctrl+E: export CSV | F1/?: help | q: quit"
                    .to_string()
            }
        }
        AppMode::Editing => format!("Editing: {} (Enter to save, Esc to cancel)", app.input),
        AppMode::Choosing => "↑↓: choose | Enter: apply | Esc: cancel".to_string(),
        AppMode::Help => "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(),
        AppMode::ExportCsv => format!("Export CSV as: {} (Enter to export, Esc to cancel)", app.filename_input),
    };

    let input = Paragraph::new(input_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Normal => Style::default(),
            AppMode::Editing => Style::default().fg(Color::Green),
            AppMode::Choosing => Style::default().fg(Color::Green),
            AppMode::Help => Style::default().fg(Color::Cyan),
            AppMode::ExportCsv => Style::default().fg(Color::Magenta),
        });
    f.render_widget(input, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_choice_popup(f: &mut Frame, app: &App) {
    let options = app.layout.choice_options();
    let longest = options.iter().map(|o| o.chars().count()).max().unwrap_or(0).max(10);
    let popup_area = centered(f.area(), longest as u16 + 6, options.len() as u16 + 2);

    let items: Vec<ListItem> = options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let label = if option.is_empty() { "(empty)".to_string() } else { option.clone() };
            let style = if i == app.choice_index {
                Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(label).style(style)
        })
        .collect();

    let title = app
        .inputs
        .columns
        .get(app.selected_col)
        .filter(|c| !c.is_empty())
        .cloned()
        .unwrap_or_else(|| "Choose".to_string());

    f.render_widget(Clear, popup_area);
    f.render_widget(List::new(items).block(Block::default().borders(Borders::ALL).title(title)), popup_area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(format!("sheetpanel Help (Line {}/{})", start_line + 1, help_lines.len()))
            .style(Style::default().fg(Color::Cyan)))
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

const HELP_TEXT: &str = r#"SHEETPANEL

The left grid mirrors the input range of the worksheet (header in the
first row). The right grid shows the results range, computed by the
spreadsheet's own formulas. Nothing is calculated locally.

=== EDITING ===
Enter/F2        Edit selected cell
                On the choice column, opens the list of options
Backspace/Del   Clear selected cell
Ctrl+C          Copy selected cell to the clipboard
Ctrl+V          Paste clipboard text into selected cell
Esc             Cancel editing

=== SYNCHRONIZATION ===
Ctrl+S          Save the input grid (with header) to the sheet,
                then reload inputs and results
Ctrl+R          Reload from the sheet, discarding local edits
Ctrl+E          Export the input grid to a CSV file

Values are written as if typed into the sheet, so text beginning
with = is stored as a formula.

=== NAVIGATION ===
Arrow keys      Move selection (hjkl also work)
PgUp/PgDn       Move ten rows
Home/End        First / last row
F1 or ?         Show this help
q               Quit

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/?/q      Close this help window"#;
