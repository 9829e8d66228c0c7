use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dataset::Category;
use crate::sampler::InsufficientWords;
use crate::trajectory::MouseSample;

/// How responses are collected. Exactly one mode per session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResponseMode {
    /// classify each pair with the 1/2/3 keys
    #[default]
    Keys,
    /// record the pointer trajectory for a fixed window
    Mouse,
}

/// Fixed trial timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    /// blank pause before each trial (and after the instructions)
    pub pre_trial: Duration,
    pub first_word: Duration,
    /// number of opacity levels from 1.0 down to 0.0; 0 disables fading
    pub fade_steps: u32,
    pub fade_step: Duration,
    pub isi: Duration,
    /// pointer sampling window (mouse mode)
    pub response_window: Duration,
    pub sample_interval: Duration,
    /// fade the second word out after the response
    pub fade_out_second: bool,
    /// blank pause after each trial
    pub post_trial: Duration,
}

impl Timing {
    pub fn keys() -> Self {
        Self {
            pre_trial: Duration::from_secs(1),
            first_word: Duration::from_secs(2),
            fade_steps: 21,
            fade_step: Duration::from_millis(16),
            isi: Duration::from_millis(300),
            response_window: Duration::ZERO,
            sample_interval: Duration::from_millis(10),
            fade_out_second: true,
            post_trial: Duration::from_millis(500),
        }
    }

    pub fn mouse() -> Self {
        Self {
            pre_trial: Duration::ZERO,
            first_word: Duration::from_secs(1),
            fade_steps: 0,
            fade_step: Duration::ZERO,
            isi: Duration::from_millis(500),
            response_window: Duration::from_millis(2500),
            sample_interval: Duration::from_millis(10),
            fade_out_second: false,
            post_trial: Duration::ZERO,
        }
    }

    pub fn for_mode(mode: ResponseMode) -> Self {
        match mode {
            ResponseMode::Keys => Self::keys(),
            ResponseMode::Mouse => Self::mouse(),
        }
    }

    /// Opacity levels of a linear fade-out, first 1.0, last 0.0
    pub fn fade_levels(&self) -> impl Iterator<Item = f64> {
        let steps = self.fade_steps;
        (0..steps).map(move |i| {
            if steps <= 1 {
                0.0
            } else {
                1.0 - i as f64 / (steps - 1) as f64
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub mode: ResponseMode,
    pub max_trials: usize,
    pub timing: Timing,
    /// let keys outside 1/2/3 end the wait with an `unknown` response
    pub accept_unmapped_keys: bool,
}

impl SessionConfig {
    pub fn new(mode: ResponseMode, max_trials: usize) -> Self {
        Self {
            mode,
            max_trials,
            timing: Timing::for_mode(mode),
            accept_unmapped_keys: false,
        }
    }
}

/// Participant's classification of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserResponse {
    Similar,
    Unrelated,
    Gibberish,
    Unknown,
}

impl UserResponse {
    pub fn matches(&self, category: Category) -> bool {
        matches!(
            (self, category),
            (UserResponse::Similar, Category::Similar)
                | (UserResponse::Unrelated, Category::Unrelated)
                | (UserResponse::Gibberish, Category::Gibberish)
        )
    }
}

/// Words shown in one trial
#[derive(Debug, Clone, PartialEq)]
pub struct TrialStimulus {
    pub initial_word: String,
    pub second_word: String,
    pub category: Category,
}

/// Completed keypress trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypressTrial {
    pub initial_word: String,
    pub second_word: String,
    #[serde(rename = "system_category")]
    pub category: Category,
    pub user_response: UserResponse,
    /// seconds from second-word onset to the key press
    pub reaction_time: f64,
}

impl KeypressTrial {
    pub fn is_correct(&self) -> bool {
        self.user_response.matches(self.category)
    }
}

/// Completed mouse-tracking trial. Serialized with parallel
/// `mouse_positions` / `mouse_times` arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "MouseRecord", try_from = "MouseRecord")]
pub struct MouseTrial {
    pub initial_word: String,
    pub second_word: String,
    pub category: Category,
    pub samples: Vec<MouseSample>,
}

#[derive(Serialize, Deserialize)]
struct MouseRecord {
    initial_word: String,
    second_word: String,
    system_category: Category,
    mouse_positions: Vec<(f64, f64)>,
    mouse_times: Vec<f64>,
}

impl From<MouseTrial> for MouseRecord {
    fn from(trial: MouseTrial) -> Self {
        let (mouse_times, mouse_positions) = trial
            .samples
            .iter()
            .map(|s| (s.t, (s.x, s.y)))
            .unzip();
        Self {
            initial_word: trial.initial_word,
            second_word: trial.second_word,
            system_category: trial.category,
            mouse_positions,
            mouse_times,
        }
    }
}

impl TryFrom<MouseRecord> for MouseTrial {
    type Error = String;

    fn try_from(record: MouseRecord) -> Result<Self, Self::Error> {
        if record.mouse_positions.len() != record.mouse_times.len() {
            return Err(format!(
                "trial {:?}: {} positions but {} times",
                record.initial_word,
                record.mouse_positions.len(),
                record.mouse_times.len()
            ));
        }

        let samples = record
            .mouse_times
            .into_iter()
            .zip(record.mouse_positions)
            .map(|(t, (x, y))| MouseSample::new(t, x, y))
            .collect();

        Ok(Self {
            initial_word: record.initial_word,
            second_word: record.second_word,
            category: record.system_category,
            samples,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrialRecord {
    Keypress(KeypressTrial),
    Mouse(MouseTrial),
}

impl TrialRecord {
    pub fn stimulus_words(&self) -> (&str, &str, Category) {
        match self {
            TrialRecord::Keypress(t) => (&t.initial_word, &t.second_word, t.category),
            TrialRecord::Mouse(t) => (&t.initial_word, &t.second_word, t.category),
        }
    }
}

/// Append-only trial log of one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResults {
    mode: ResponseMode,
    trials: Vec<TrialRecord>,
}

impl SessionResults {
    pub fn new(mode: ResponseMode) -> Self {
        Self {
            mode,
            trials: Vec::new(),
        }
    }

    pub fn push(&mut self, record: TrialRecord) {
        self.trials.push(record);
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    pub fn trials(&self) -> &[TrialRecord] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn keypress_trials(&self) -> impl Iterator<Item = &KeypressTrial> {
        self.trials.iter().filter_map(|t| match t {
            TrialRecord::Keypress(k) => Some(k),
            TrialRecord::Mouse(_) => None,
        })
    }

    pub fn mouse_trials(&self) -> impl Iterator<Item = &MouseTrial> {
        self.trials.iter().filter_map(|t| match t {
            TrialRecord::Mouse(m) => Some(m),
            TrialRecord::Keypress(_) => None,
        })
    }
}

/// What a session hands to the recorder
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub results: SessionResults,
    /// operator pressed escape; trials completed before it are kept
    pub aborted: bool,
    /// the dataset held fewer words than the requested trial count
    pub shortfall: Option<InsufficientWords>,
}
