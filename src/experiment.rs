use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::collector::Collector;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::runtime::{Devices, EventSource, Ticker};
use crate::sampler::{InsufficientWords, SessionPlan};
use crate::sequencer::Sequencer;
use crate::session::{ResponseMode, SessionConfig, SessionOutcome, SessionResults};
use crate::ui::screen::{Screen, Surface};

const KEYS_INSTRUCTIONS: &str = "In this experiment, you will see pairs of words.\n\n\
For each pair, decide if the second word is:\n\n\
1: Similar to the first word\n\
2: Unrelated to the first word\n\
3: Not a real word (Gibberish)\n\n\
Press any key to begin.";

const MOUSE_INSTRUCTIONS: &str = "In this experiment, you will see pairs of words.\n\n\
1) You will see the first word in yellow.\n\
2) Then, after a brief pause, you will see the second word in green.\n\n\
While the second word is shown, move the mouse:\n\
  Move RIGHT if you think the words are similar.\n\
  Move LEFT if you think they're unrelated.\n\
(We aren't checking correctness, just recording your mouse movement.)\n\n\
Press any key to begin.";

pub fn instructions(mode: ResponseMode) -> &'static str {
    match mode {
        ResponseMode::Keys => KEYS_INSTRUCTIONS,
        ResponseMode::Mouse => MOUSE_INSTRUCTIONS,
    }
}

/// Everything one session needs, passed in explicitly: the dataset, the
/// random source and the devices.
pub struct Experiment<'d, R, E, T, S>
where
    R: Rng,
    E: EventSource,
    T: Ticker,
    S: Surface,
{
    dataset: &'d Dataset,
    config: SessionConfig,
    rng: R,
    devices: Devices<E, T, S>,
    farewell: Duration,
}

impl<'d, R, E, T, S> Experiment<'d, R, E, T, S>
where
    R: Rng,
    E: EventSource,
    T: Ticker,
    S: Surface,
{
    pub fn new(dataset: &'d Dataset, config: SessionConfig, rng: R, devices: Devices<E, T, S>) -> Self {
        Self {
            dataset,
            config,
            rng,
            devices,
            farewell: Duration::ZERO,
        }
    }

    /// How long the completion screen stays up
    pub fn farewell(mut self, duration: Duration) -> Self {
        self.farewell = duration;
        self
    }

    /// Instructions, then every planned trial. Escape ends the session early
    /// with the trials completed so far; any other failure is returned.
    pub fn run(&mut self) -> Result<SessionOutcome> {
        let mut results = SessionResults::new(self.config.mode);
        let mut shortfall = None;

        match self.run_trials(&mut results, &mut shortfall) {
            Ok(()) => {
                info!("session complete: {} trials", results.len());
                let farewell = Screen::Message("Session complete. Thank you!".into());
                // escape here only skips the completion screen
                match self.devices.hold(&farewell, self.farewell) {
                    Ok(()) | Err(Error::UserAbort) => {}
                    Err(e) => return Err(e),
                }
                Ok(SessionOutcome {
                    results,
                    aborted: false,
                    shortfall,
                })
            }
            Err(Error::UserAbort) => {
                warn!(
                    "session aborted by operator after {} trials",
                    results.len()
                );
                Ok(SessionOutcome {
                    results,
                    aborted: true,
                    shortfall,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn devices(&self) -> &Devices<E, T, S> {
        &self.devices
    }

    fn run_trials(
        &mut self,
        results: &mut SessionResults,
        shortfall: &mut Option<InsufficientWords>,
    ) -> Result<()> {
        let timing = self.config.timing;

        self.devices
            .present(&Screen::Instructions(instructions(self.config.mode).to_string()))?;
        self.devices.wait_for_key()?;
        self.devices.hold(&Screen::Blank, timing.pre_trial)?;

        let plan = SessionPlan::draw(self.dataset, self.config.max_trials, &mut self.rng);
        *shortfall = plan.shortfall();
        info!(
            "session plan: {} trials ({} mode)",
            plan.len(),
            self.config.mode
        );

        let collector = Collector::for_session(&self.config);
        let mut sequencer = Sequencer::new(timing);
        for word in plan.words() {
            let record = sequencer.run_word(
                self.dataset,
                word,
                &mut self.rng,
                &mut self.devices,
                &collector,
            )?;
            results.push(record);
        }

        Ok(())
    }
}
