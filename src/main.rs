//! railpanel: live train status from on-board portals, in the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────┐ poll() ┌─────────────┐ PollMsg  ┌──────────┐  draw()  ┌──────────┐
//! │  source/  │ ◄───── │ selector.rs │ ───────► │  app.rs  │ ───────► │  ui.rs   │
//! │ ICE / RJ  │        │  (poll.rs   │ (channel)│ (state)  │          │ (render) │
//! └─────┬─────┘        │   thread)   │          └──────────┘          └──────────┘
//!       │ fetch()      └─────────────┘               ▲
//!       ▼                                            │ handle_key_event()
//! ┌───────────┐                                 ┌──────────┐
//! │ fetch.rs  │                                 │ input.rs │
//! └───────────┘                                 └──────────┘
//! ```
//!
//! * **`fetch`**: one JSON GET with headers and a timeout, no retries.
//! * **`source/`**: the `DataSource` trait plus the ICE portal and ÖBB
//!   railnet implementations.
//! * **`selector`**: the sticky-preferred-source state machine.
//! * **`poll`**: background thread running one tick at a time.
//! * **`app`** / **`ui`** / **`input`**: presenter state, rendering, keys.
//! * **`config`** / **`logging`**: command line and file logging.

mod app;
mod config;
mod fetch;
mod input;
mod logging;
mod poll;
mod selector;
mod source;
mod ui;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use app::App;
use config::Config;
use fetch::Fetcher;
use poll::PollMsg;
use selector::Selector;
use source::{IceSource, RailjetSource};

// ---------------------------------------------------------------------------
// Terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn build_selector(config: &Config) -> Result<Selector> {
    let fetcher = Fetcher::new(config.timeout()).context("building HTTP client")?;
    let ice = IceSource::new(
        fetcher.clone(),
        &config.ice_base_url,
        config.arrival,
        config.display_zone()?,
    );
    let railjet = RailjetSource::new(fetcher, config.railjet_url.clone());
    Ok(Selector::new(
        Box::new(ice),
        Box::new(railjet),
        config.failure_tolerance,
    ))
}

fn main() -> Result<()> {
    // -- parse arguments -----------------------------------------------------
    let config = Config::parse();

    // -- logging (file only, the terminal belongs to the UI) -----------------
    let _logging = logging::init_logging(&config.log_dir)
        .with_context(|| format!("initialising logging in {}", config.log_dir.display()))?;
    info!(?config, "starting");

    // -- configure sources and start background polling ----------------------
    let selector = build_selector(&config)?;
    let rx = poll::spawn(selector, config.interval());

    // -- presenter -----------------------------------------------------------
    if config.plain {
        run_plain(rx)
    } else {
        install_panic_hook();
        run_tui(rx)
    }
}

/// Print the panel line whenever it changes.
fn run_plain(mut rx: UnboundedReceiver<PollMsg>) -> Result<()> {
    let mut app = App::new();
    let mut printed = String::new();
    let mut stdout = io::stdout();

    while let Some(msg) = rx.blocking_recv() {
        app.handle(msg);
        let line = app.panel_text();
        if line != printed {
            writeln!(stdout, "{line}")?;
            stdout.flush()?;
            printed = line;
        }
    }
    Ok(())
}

fn run_tui(mut rx: UnboundedReceiver<PollMsg>) -> Result<()> {
    // -- terminal setup (Drop restores on exit) ------------------------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new();

    // -- main event loop -----------------------------------------------------
    // Each iteration: drain poller messages, render, then wait up to
    // `frame_rate` for a key.
    let frame_rate = Duration::from_millis(100);

    loop {
        while let Ok(msg) = rx.try_recv() {
            app.handle(msg);
        }

        guard.terminal.draw(|f| ui::draw(&app, f))?;

        if event::poll(frame_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
