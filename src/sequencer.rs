use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::collector::{Collector, Response};
use crate::dataset::{Category, Dataset};
use crate::error::{DatasetError, Result};
use crate::runtime::{Devices, EventSource, Ticker};
use crate::session::{KeypressTrial, MouseTrial, Timing, TrialRecord, TrialStimulus};
use crate::ui::screen::{Screen, Surface};

/// Trial timeline. Every transition is time-driven except the one out of
/// `Collecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    Idle,
    ShowingFirst,
    Isi,
    ShowingSecond,
    Collecting,
    Done,
}

/// Pick a category uniformly, then a second word uniformly from that
/// category's candidates. None if `initial_word` is not in the dataset.
pub fn choose_stimulus<R: Rng + ?Sized>(
    dataset: &Dataset,
    initial_word: &str,
    rng: &mut R,
) -> Option<TrialStimulus> {
    let entry = dataset.get(initial_word)?;
    let category = *Category::ALL.choose(rng)?;
    let second_word = entry.candidates(category).choose(rng)?;

    Some(TrialStimulus {
        initial_word: initial_word.to_string(),
        second_word: second_word.clone(),
        category,
    })
}

/// Drives one trial at a time through the fixed timeline
#[derive(Debug)]
pub struct Sequencer {
    timing: Timing,
    phase: TrialPhase,
    history: Vec<TrialPhase>,
}

impl Sequencer {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            phase: TrialPhase::Idle,
            history: Vec::new(),
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    /// Phases entered by the most recent trial, in order
    pub fn history(&self) -> &[TrialPhase] {
        &self.history
    }

    /// Resolve the stimulus for `initial_word` and run it
    pub fn run_word<R, E, T, S>(
        &mut self,
        dataset: &Dataset,
        initial_word: &str,
        rng: &mut R,
        devices: &mut Devices<E, T, S>,
        collector: &Collector,
    ) -> Result<TrialRecord>
    where
        R: Rng + ?Sized,
        E: EventSource,
        T: Ticker,
        S: Surface,
    {
        let stimulus = choose_stimulus(dataset, initial_word, rng).ok_or_else(|| {
            DatasetError::UnknownWord {
                word: initial_word.to_string(),
            }
        })?;
        self.run_trial(&stimulus, devices, collector)
    }

    pub fn run_trial<E, T, S>(
        &mut self,
        stimulus: &TrialStimulus,
        devices: &mut Devices<E, T, S>,
        collector: &Collector,
    ) -> Result<TrialRecord>
    where
        E: EventSource,
        T: Ticker,
        S: Surface,
    {
        self.history.clear();
        self.enter(TrialPhase::Idle);
        devices.hold(&Screen::Blank, self.timing.pre_trial)?;

        self.enter(TrialPhase::ShowingFirst);
        devices.hold(
            &Screen::FirstWord {
                word: stimulus.initial_word.clone(),
                opacity: 1.0,
            },
            self.timing.first_word,
        )?;
        for opacity in self.timing.fade_levels() {
            devices.hold(
                &Screen::FirstWord {
                    word: stimulus.initial_word.clone(),
                    opacity,
                },
                self.timing.fade_step,
            )?;
        }

        self.enter(TrialPhase::Isi);
        devices.hold(&Screen::Blank, self.timing.isi)?;

        self.enter(TrialPhase::ShowingSecond);
        let second = Screen::SecondWord {
            word: stimulus.second_word.clone(),
            opacity: 1.0,
        };
        devices.present(&second)?;

        self.enter(TrialPhase::Collecting);
        let response = collector.collect(devices, &second)?;

        if self.timing.fade_out_second {
            for opacity in self.timing.fade_levels() {
                devices.hold(
                    &Screen::SecondWord {
                        word: stimulus.second_word.clone(),
                        opacity,
                    },
                    self.timing.fade_step,
                )?;
            }
        }
        devices.hold(&Screen::Blank, self.timing.post_trial)?;

        self.enter(TrialPhase::Done);
        Ok(record(stimulus, response))
    }

    fn enter(&mut self, phase: TrialPhase) {
        debug!("trial phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.history.push(phase);
    }
}

fn record(stimulus: &TrialStimulus, response: Response) -> TrialRecord {
    match response {
        Response::Keypress {
            user_response,
            reaction_time,
        } => TrialRecord::Keypress(KeypressTrial {
            initial_word: stimulus.initial_word.clone(),
            second_word: stimulus.second_word.clone(),
            category: stimulus.category,
            user_response,
            reaction_time,
        }),
        Response::Trajectory(samples) => TrialRecord::Mouse(MouseTrial {
            initial_word: stimulus.initial_word.clone(),
            second_word: stimulus.second_word.clone(),
            category: stimulus.category,
            samples,
        }),
    }
}
