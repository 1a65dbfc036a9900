//! sheetpanel - Spreadsheet Data-Entry Panel
//!
//! A terminal panel over a fixed region of a Google Sheets worksheet:
//! edit the input range, save it back, and watch the results range that
//! the spreadsheet's own formulas compute. A local CSV file can stand in
//! for the spreadsheet when working offline.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sheetpanel::application::{App, AppMode};
use sheetpanel::infrastructure::{CsvWorkbook, PanelConfig, RangeSource, SheetSession, SheetsClient};
use sheetpanel::presentation::{render_ui, InputHandler, CHROME_ROWS};

#[derive(Parser, Debug)]
#[command(name = "sheetpanel", version, about = "Data-entry panel over a spreadsheet range")]
struct Cli {
    /// Configuration / secrets file (default: <config dir>/sheetpanel/secrets.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Work against a local CSV file instead of Google Sheets
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Worksheet name, overriding the configuration
    #[arg(short, long)]
    sheet: Option<String>,

    /// File receiving log output
    #[arg(long, default_value = "sheetpanel.log")]
    log_file: PathBuf,
}

fn init_logging(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_env("SHEETPANEL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Builds the range source: the CSV workbook when requested, otherwise an
/// authenticated worksheet session.
fn open_source(cli: &Cli, config: &PanelConfig) -> Result<Box<dyn RangeSource>, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.csv {
        return Ok(Box::new(CsvWorkbook::open(path)?));
    }

    let sheet_name = cli.sheet.as_deref().unwrap_or(&config.sheet_name);
    let client = SheetsClient::new(&config.api_base, config.access_token()?)?;
    let session = SheetSession::open(client, config.sheet_url()?, sheet_name)?;
    Ok(Box::new(session))
}

/// Entry point for the panel.
///
/// Loads configuration, opens the range source and runs the terminal UI.
/// Connection problems are reported before the terminal is taken over.
///
/// # Errors
///
/// Returns an error if configuration, connection or terminal setup fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let config = PanelConfig::load_or_default(cli.config.as_deref())?;
    let mut source = match open_source(&cli, &config) {
        Ok(source) => source,
        Err(err) => {
            error!(error = %err, "could not open range source");
            if let Some(email) = config.connected_as() {
                eprintln!("Service account: {}", email);
            }
            return Err(err);
        }
    };
    info!(source = %source.describe(), "starting panel");

    let mut app = App::new(config.layout.clone());
    app.source_label = source.describe();
    app.connected_as = config.connected_as().map(str::to_string);
    app.reload(source.as_mut());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, source.as_mut());

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    if app.dirty {
        println!("Quit with unsaved edits.");
    }

    Ok(())
}

/// Main application event loop.
///
/// Continues running until the user presses 'q' in normal mode.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, source: &mut dyn RangeSource) -> io::Result<()> {
    loop {
        let size = terminal.size()?;
        app.update_viewport_size(size.height.saturating_sub(CHROME_ROWS) as usize);
        terminal.draw(|f| render_ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') if app.mode == AppMode::Normal => return Ok(()),
                    _ => InputHandler::handle_key_event(app, source, key.code, key.modifiers),
                }
            }
        }
    }
}
