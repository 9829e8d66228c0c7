use std::io::{self, Stdout};

use crossterm::{
    cursor::{Hide, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::warn;

/// Owns raw mode, the alternate screen and mouse capture; restores the
/// terminal and shows the cursor again when dropped, whatever the exit path.
pub struct TerminalGuard {
    mouse_capture: bool,
}

impl TerminalGuard {
    pub fn enter(mouse_capture: bool) -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = Self { mouse_capture };

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        if mouse_capture {
            execute!(stdout, EnableMouseCapture)?;
        }

        Ok(guard)
    }

    pub fn terminal(&self) -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
        Terminal::new(CrosstermBackend::new(io::stdout()))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        if self.mouse_capture {
            let _ = execute!(stdout, DisableMouseCapture);
        }
        if let Err(e) = execute!(stdout, LeaveAlternateScreen, Show) {
            warn!("could not leave alternate screen: {}", e);
        }
        if let Err(e) = disable_raw_mode() {
            warn!("could not disable raw mode: {}", e);
        }
    }
}
