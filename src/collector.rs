use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use tracing::debug;

use crate::error::Result;
use crate::runtime::{Devices, EventSource, Ticker};
use crate::session::{ResponseMode, SessionConfig, UserResponse};
use crate::trajectory::MouseSample;
use crate::ui::screen::{Screen, Surface};

/// Raw result of one response window
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Keypress {
        user_response: UserResponse,
        /// seconds since the window opened
        reaction_time: f64,
    },
    Trajectory(Vec<MouseSample>),
}

/// Fixed response key set
pub fn classify_key(key: &KeyEvent) -> Option<UserResponse> {
    match key.code {
        KeyCode::Char('1') => Some(UserResponse::Similar),
        KeyCode::Char('2') => Some(UserResponse::Unrelated),
        KeyCode::Char('3') => Some(UserResponse::Gibberish),
        _ => None,
    }
}

/// Waits, without timeout, for a classification key
#[derive(Debug, Clone, Copy, Default)]
pub struct KeypressCollector {
    /// end the wait on any other key with `Unknown` instead of ignoring it
    pub accept_unmapped: bool,
}

impl KeypressCollector {
    pub fn collect<E, T, S>(&self, devices: &mut Devices<E, T, S>) -> Result<Response>
    where
        E: EventSource,
        T: Ticker,
        S: Surface,
    {
        let opened = Instant::now();
        loop {
            let key = devices.wait_for_key()?;
            let user_response = match classify_key(&key) {
                Some(response) => response,
                None if self.accept_unmapped => UserResponse::Unknown,
                None => {
                    debug!("ignoring unmapped key {:?}", key.code);
                    continue;
                }
            };

            return Ok(Response::Keypress {
                user_response,
                reaction_time: opened.elapsed().as_secs_f64(),
            });
        }
    }
}

/// Samples the pointer every `interval` for exactly `window`
#[derive(Debug, Clone, Copy)]
pub struct MouseCollector {
    pub window: Duration,
    pub interval: Duration,
}

impl MouseCollector {
    /// The stimulus is redrawn before every sample. Exit is decided by the
    /// monotonic clock, never by the sample count.
    pub fn collect<E, T, S>(
        &self,
        devices: &mut Devices<E, T, S>,
        stimulus: &Screen,
    ) -> Result<Response>
    where
        E: EventSource,
        T: Ticker,
        S: Surface,
    {
        devices.recenter_pointer();

        let opened = Instant::now();
        let deadline = opened + self.window;
        let mut samples = Vec::with_capacity(self.expected_samples());

        loop {
            let elapsed = opened.elapsed();
            if elapsed >= self.window {
                break;
            }

            devices.present(stimulus)?;
            let (x, y) = devices.pointer_position();
            samples.push(MouseSample::new(elapsed.as_secs_f64(), x, y));

            devices.pump_until((Instant::now() + self.interval).min(deadline))?;
        }

        debug!("collected {} pointer samples", samples.len());
        Ok(Response::Trajectory(samples))
    }

    fn expected_samples(&self) -> usize {
        if self.interval.is_zero() {
            return 0;
        }
        (self.window.as_secs_f64() / self.interval.as_secs_f64()).ceil() as usize
    }
}

/// The two mutually exclusive collection strategies
#[derive(Debug, Clone, Copy)]
pub enum Collector {
    Keypress(KeypressCollector),
    Mouse(MouseCollector),
}

impl Collector {
    pub fn for_session(config: &SessionConfig) -> Self {
        match config.mode {
            ResponseMode::Keys => Collector::Keypress(KeypressCollector {
                accept_unmapped: config.accept_unmapped_keys,
            }),
            ResponseMode::Mouse => Collector::Mouse(MouseCollector {
                window: config.timing.response_window,
                interval: config.timing.sample_interval,
            }),
        }
    }

    /// Collect one response while `stimulus` is on screen
    pub fn collect<E, T, S>(
        &self,
        devices: &mut Devices<E, T, S>,
        stimulus: &Screen,
    ) -> Result<Response>
    where
        E: EventSource,
        T: Ticker,
        S: Surface,
    {
        match self {
            Collector::Keypress(c) => c.collect(devices),
            Collector::Mouse(c) => c.collect(devices, stimulus),
        }
    }
}
