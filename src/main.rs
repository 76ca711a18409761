//! # flashdeck CLI Entry Point
//!
//! This is the main entry point for the flashdeck TUI application.
//!
//! ## Usage
//!
//! ```bash
//! # Load decks from the default data directory
//! flashdeck
//!
//! # Use a specific state file
//! flashdeck --state-file ./decks.json
//!
//! # Start from the sample deck without touching saved decks
//! flashdeck --fresh
//!
//! # Debug mode - print the loaded decks and exit
//! flashdeck --debug
//! ```
//!
//! Logs go to `flashdeck.log` in the data directory because the terminal
//! belongs to the UI. `RUST_LOG` sets the filter unless `--log-level` is
//! given.
//!
//! ## Key Bindings
//!
//! - `Tab` / `Shift+Tab` - Move focus
//! - `Enter` / `Space` - Activate the focused control
//! - `j` / `k` - Next / previous deck
//! - `h` / `l` - Previous / next card
//! - `f` - Flip the card
//! - `n` / `a` / `e` - New deck / new card / edit card
//! - `d` / `x` - Delete card / delete deck
//! - `/` - Search the current deck
//! - `s` - Study mode (`Left`/`Right`, `Space`, `Esc`)
//! - `?` - Help
//! - `q` - Quit

use flashdeck::deck::DeckStore;
use flashdeck::storage::StateStore;
use flashdeck::ui::{self, config::Config, theme::Theme, App, HitMap};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::fs::{self, File};
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How long to wait for input before running the debounce tick again.
const POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Trait for reading terminal events (allows dependency injection for testing)
trait EventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

/// Production event reader that uses crossterm's event polling + read
struct CrosstermEventReader;

impl EventReader for CrosstermEventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout).context("Failed to poll for events")? {
            Ok(Some(event::read().context("Failed to read terminal event")?))
        } else {
            Ok(None)
        }
    }
}

/// flashdeck - keyboard-driven flashcards in your terminal
#[derive(Parser, Debug)]
#[command(name = "flashdeck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Keyboard-driven flashcards in your terminal", long_about = None)]
struct Args {
    /// Where to load and save decks (overrides the config file)
    #[arg(short, long, value_name = "FILE", conflicts_with = "fresh")]
    state_file: Option<PathBuf>,

    /// Start from the sample deck; saved decks are neither read nor written
    #[arg(long)]
    fresh: bool,

    /// Print the loaded decks and exit
    #[arg(long)]
    debug: bool,

    /// Log filter (e.g. `debug`, `flashdeck=trace`); defaults to `RUST_LOG` or `info`
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up panic hook to ensure terminal is restored on panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Try to restore terminal state
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);

        // Call the original panic hook
        original_hook(panic_info);
    }));

    // Run the application and ensure cleanup happens
    let result = run_application(args).await;

    // Restore panic hook
    let _ = panic::take_hook();

    result
}

/// Pick the state file: none with `--fresh`, then the CLI flag, then the
/// config override, then the data directory.
fn state_store(args: &Args, config: &Config) -> Result<Option<StateStore>> {
    if args.fresh {
        return Ok(None);
    }
    match args.state_file.as_ref().or(config.state_file.as_ref()) {
        Some(path) => Ok(Some(StateStore::with_path(path.clone()))),
        None => StateStore::new().map(Some),
    }
}

fn log_filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("Invalid log level: {level}"))
        }
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

/// Install the log subscriber, writing to a file in the data directory.
fn init_logging(filter: EnvFilter) -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "flashdeck")
        .context("Failed to determine application data directory")?;
    let dir = dirs.data_dir();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;

    let path = dir.join("flashdeck.log");
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))?;

    Ok(path)
}

fn print_decks(store: &DeckStore, state: Option<&StateStore>) {
    println!("=== Decks ===");
    for deck in store.decks() {
        println!(
            "  [{}] {} ({} cards, current {})",
            deck.id,
            deck.name,
            deck.cards.len(),
            deck.current_index
        );
        for card in &deck.cards {
            println!("      {} | {}", card.front, card.back);
        }
    }
    match state {
        Some(state) => {
            println!("\nState file: {}", state.path().display());
            if let Some(saved_at) = state.last_saved() {
                println!("Last saved: {saved_at}");
            }
        }
        None => println!("\nState file: (none, --fresh)"),
    }
}

async fn run_application(args: Args) -> Result<()> {
    let config = Config::load();
    let filter = log_filter(args.log_level.as_deref())?;
    let state = state_store(&args, &config)?;

    let store = state
        .as_ref()
        .and_then(StateStore::load_state)
        .and_then(DeckStore::from_saved)
        .unwrap_or_default();

    // Debug mode: print decks and exit
    if args.debug {
        print_decks(&store, state.as_ref());
        return Ok(());
    }

    if let Err(e) = init_logging(filter) {
        eprintln!("Warning: logging disabled: {e:#}");
    }
    info!(
        decks = store.decks().len(),
        state_file = ?state.as_ref().map(StateStore::path),
        "starting flashdeck"
    );

    let theme = Theme::by_name(&config.theme).unwrap_or_else(|| {
        warn!(theme = %config.theme, "unknown theme, using default");
        Theme::default_theme()
    });

    let mut app = App::new(store)
        .context("Failed to build the application document")?
        .with_theme(theme)
        .with_search_debounce(config.search_debounce());
    if let Some(state) = state {
        app = app.with_persistence(state);
    }

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode for terminal")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Run the app and ensure cleanup happens even on error
    let mut event_reader = CrosstermEventReader;
    let run_result = run_app(&mut terminal, &mut app, &mut event_reader).await;

    // Restore terminal (always runs, even if run_app failed)
    let cleanup_result = cleanup_terminal(&mut terminal);

    // Return the first error that occurred, or Ok if both succeeded
    run_result?;
    cleanup_result?;

    info!("flashdeck exited");
    Ok(())
}

/// Clean up terminal state
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to restore terminal")?;

    terminal.show_cursor().context("Failed to show cursor")?;

    Ok(())
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_reader: &mut dyn EventReader,
) -> Result<()> {
    loop {
        app.tick(Instant::now())?;

        let mut hits = HitMap::default();
        terminal
            .draw(|f| {
                hits = ui::render(f, app);
            })
            .map_err(|e| anyhow::anyhow!("Failed to draw terminal UI: {e}"))?;

        let Some(event) = event_reader.read_event(POLL_TIMEOUT)? else {
            continue;
        };

        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                app.handle_key(key.into(), Instant::now())?;
            }
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                if let Some(target) = hits.node_at(mouse.column, mouse.row) {
                    app.tap(target)?;
                }
            }
            _ => {}
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
