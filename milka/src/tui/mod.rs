//! Terminal User Interface for Milka
//!
//! Five tabs (chats, statuses, channels, calls, contacts) with:
//! - Navigation with vim-style keybindings
//! - Instant chat search (/)
//! - A story viewer overlay that auto-advances through a status group
//! - Conversations with optimistic sends when signed in

mod app;
mod events;
mod runner;
pub mod state;
mod views;

pub use app::App;
pub use events::{Event, EventHandler};
pub use runner::{ApiResult, RequestDispatcher, TuiRunner, apply_result};
pub use state::{AppState, InteractionMode, PendingRequest, Tab, View};

use std::io::{self, Stdout};
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use eyre::Result;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::api::MessengerApi;

/// Terminal type alias
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Run the TUI until the user quits
pub async fn run(state: AppState, api: Option<Arc<dyn MessengerApi>>) -> Result<()> {
    let terminal = init()?;

    // Restores the terminal on early return and error
    struct TerminalGuard;
    impl Drop for TerminalGuard {
        fn drop(&mut self) {
            let _ = restore();
        }
    }
    let _guard = TerminalGuard;

    let mut runner = TuiRunner::new(terminal, state, api);
    runner.run().await
}
