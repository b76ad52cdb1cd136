//! Terminal front-end for the odds-board engine.
//!
//! One task owns the websocket feed, the main loop owns the engine and
//! the terminal: inbound messages are drained into the engine, due aging
//! transitions fire between draws, and the table re-renders every tick.

mod feed;
mod ui;

use std::io;
use std::time::Duration;

use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use oddsboard::{BoardEngine, OrderingPrefs, ViewContext};
use oddsboard::store::BoardSettings;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use feed::{spawn_board_feed, FeedConfig, FeedStatus};

const TICK_RATE: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (status_tx, status_rx) = watch::channel(FeedStatus::Disconnected);
    let (message_rx, feed_handle) = spawn_board_feed(FeedConfig::from_env(), status_tx);

    let engine = BoardEngine::new(
        ViewContext::default(),
        OrderingPrefs::default(),
        BoardSettings::default(),
    );

    let res = run_app(&mut terminal, engine, message_rx, status_rx).await;

    feed_handle.abort();
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

/// Logs go to stderr so they never corrupt the alternate screen; filter
/// via RUST_LOG.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut engine: BoardEngine,
    mut message_rx: mpsc::Receiver<oddsboard::Inbound>,
    status_rx: watch::Receiver<FeedStatus>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut scroll: u16 = 0;
    let mut last_update: Option<chrono::DateTime<Utc>> = None;

    loop {
        // Drain everything the feed delivered since the last draw.
        while let Ok(message) = message_rx.try_recv() {
            engine.handle(message, Utc::now()).await;
            last_update = Some(Utc::now());
        }
        engine.advance_aging(Utc::now());

        let status = *status_rx.borrow();
        terminal.draw(|f| ui::ui(f, engine.table(), status, last_update, scroll))?;

        // Wake early for the next aging boundary when it is sooner than
        // the regular tick.
        let timeout = engine
            .next_aging_deadline()
            .and_then(|deadline| (deadline - Utc::now()).to_std().ok())
            .map_or(TICK_RATE, |until| until.min(TICK_RATE));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Up => scroll = scroll.saturating_sub(1),
                    KeyCode::Down => scroll = scroll.saturating_add(1),
                    KeyCode::PageUp => scroll = scroll.saturating_sub(20),
                    KeyCode::PageDown => scroll = scroll.saturating_add(20),
                    _ => {}
                }
            }
        }
    }
}
