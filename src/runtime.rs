use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};

use crate::error::{Error, Result};
use crate::trajectory::PointerTracker;
use crate::ui::screen::{Screen, Surface};

/// Unified event type consumed by the session loop
#[derive(Clone, Debug)]
pub enum StimulusEvent {
    Key(KeyEvent),
    /// pointer moved (or was pressed/dragged) over a terminal cell
    Pointer {
        column: u16,
        row: u16,
    },
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, pointer, resize)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> std::result::Result<StimulusEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<StimulusEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    Some(StimulusEvent::Key(key))
                }
                Ok(CtEvent::Mouse(mouse)) => match mouse.kind {
                    MouseEventKind::Moved
                    | MouseEventKind::Drag(_)
                    | MouseEventKind::Down(_)
                    | MouseEventKind::Up(_) => Some(StimulusEvent::Pointer {
                        column: mouse.column,
                        row: mouse.row,
                    }),
                    _ => None,
                },
                Ok(CtEvent::Resize(_, _)) => Some(StimulusEvent::Resize),
                Ok(_) => None,
                Err(_) => break,
            };

            if let Some(evt) = evt {
                if tx.send(evt).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> std::result::Result<StimulusEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<StimulusEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<StimulusEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> std::result::Result<StimulusEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Pulls events off an `EventSource`, bounded either by a deadline or by the tick interval
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Next event arriving before `deadline`, or None once the deadline passes.
    /// A closed source sleeps out the remaining time.
    pub fn step_until(&self, deadline: Instant) -> Option<StimulusEvent> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return None;
        }

        match self.event_source.recv_timeout(remaining) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(deadline.saturating_duration_since(Instant::now()));
                None
            }
        }
    }

    /// Blocks until an event arrives; Tick while idle, None once the source is closed
    pub fn next_event(&self) -> Option<StimulusEvent> {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) => Some(StimulusEvent::Tick),
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Escape and Ctrl+C end the session from any wait
pub fn is_abort_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
}

/// Presentation surface and input devices, owned by one session
pub struct Devices<E: EventSource, T: Ticker, S: Surface> {
    runner: Runner<E, T>,
    surface: S,
    pointer: PointerTracker,
    current: Screen,
}

impl<E: EventSource, T: Ticker, S: Surface> Devices<E, T, S> {
    pub fn new(runner: Runner<E, T>, surface: S) -> Self {
        Self {
            runner,
            surface,
            pointer: PointerTracker::default(),
            current: Screen::Blank,
        }
    }

    pub fn present(&mut self, screen: &Screen) -> Result<()> {
        self.surface.present(screen)?;
        if &self.current != screen {
            self.current = screen.clone();
        }
        Ok(())
    }

    /// Present `screen` and keep it up for `duration`
    pub fn hold(&mut self, screen: &Screen, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        self.present(screen)?;
        self.pump_until(deadline)
    }

    /// Absorb input until `deadline`. Keys other than abort are discarded.
    pub fn pump_until(&mut self, deadline: Instant) -> Result<()> {
        while let Some(event) = self.runner.step_until(deadline) {
            self.absorb(event)?;
        }
        Ok(())
    }

    /// Block until a non-abort key is pressed, with no timeout
    pub fn wait_for_key(&mut self) -> Result<KeyEvent> {
        loop {
            let event = self.runner.next_event().ok_or(Error::InputClosed)?;
            if let Some(key) = self.absorb(event)? {
                return Ok(key);
            }
        }
    }

    pub fn pointer_position(&self) -> (f64, f64) {
        self.pointer.position(self.surface.size())
    }

    pub fn recenter_pointer(&mut self) {
        self.pointer.recenter();
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn absorb(&mut self, event: StimulusEvent) -> Result<Option<KeyEvent>> {
        match event {
            StimulusEvent::Key(key) if is_abort_key(&key) => Err(Error::UserAbort),
            StimulusEvent::Key(key) => Ok(Some(key)),
            StimulusEvent::Pointer { column, row } => {
                self.pointer.move_to(column, row);
                Ok(None)
            }
            StimulusEvent::Resize => {
                let current = self.current.clone();
                self.surface.present(&current)?;
                Ok(None)
            }
            StimulusEvent::Tick => Ok(None),
        }
    }
}
