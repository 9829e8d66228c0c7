use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::PersistenceError;
use crate::session::{KeypressTrial, MouseTrial, ResponseMode, SessionResults};

pub const KEYPRESS_RESULTS_FILE: &str = "word_verification_results.csv";
pub const MOUSE_SUMMARY_FILE: &str = "trial_metadata.csv";
pub const MOUSE_DATA_FILE: &str = "mouse_data.json";

const KEYPRESS_HEADER: [&str; 5] = [
    "initial_word",
    "second_word",
    "system_category",
    "user_response",
    "reaction_time",
];
const SUMMARY_HEADER: [&str; 6] = [
    "initial_word",
    "second_word",
    "system_category",
    "user_response",
    "correct",
    "reaction_time",
];
const PLACEHOLDER: &str = "N/A";

/// Writes a finished session to the output directory. No retries.
#[derive(Debug, Clone)]
pub struct Recorder {
    output_dir: PathBuf,
    score_responses: bool,
}

impl Recorder {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            score_responses: false,
        }
    }

    /// Append a `correct` column (0/1) to keypress results
    pub fn score_responses(mut self, on: bool) -> Self {
        self.score_responses = on;
        self
    }

    /// Returns the paths written, in write order.
    pub fn save(&self, results: &SessionResults) -> Result<Vec<PathBuf>, PersistenceError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| PersistenceError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let written = match results.mode() {
            ResponseMode::Keys => {
                let path = self.output_dir.join(KEYPRESS_RESULTS_FILE);
                let trials: Vec<&KeypressTrial> = results.keypress_trials().collect();
                write_keypress_results(create(&path)?, &trials, self.score_responses)
                    .map_err(|source| csv_error(&path, source))?;
                vec![path]
            }
            ResponseMode::Mouse => {
                let trials: Vec<&MouseTrial> = results.mouse_trials().collect();

                let data_path = self.output_dir.join(MOUSE_DATA_FILE);
                write_mouse_data(create(&data_path)?, &trials).map_err(|source| {
                    PersistenceError::Json {
                        path: data_path.clone(),
                        source,
                    }
                })?;

                let summary_path = self.output_dir.join(MOUSE_SUMMARY_FILE);
                write_mouse_summary(create(&summary_path)?, &trials)
                    .map_err(|source| csv_error(&summary_path, source))?;

                vec![data_path, summary_path]
            }
        };

        for path in &written {
            info!("Results saved to {}", path.display());
        }
        Ok(written)
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, PersistenceError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn csv_error(path: &Path, source: csv::Error) -> PersistenceError {
    PersistenceError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// One row per keypress trial; the header is written even for an empty session.
pub fn write_keypress_results<W: Write>(
    writer: W,
    trials: &[&KeypressTrial],
    score: bool,
) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    if score {
        let mut header = KEYPRESS_HEADER.to_vec();
        header.push("correct");
        wtr.write_record(&header)?;
    } else {
        wtr.write_record(KEYPRESS_HEADER)?;
    }

    for trial in trials {
        if score {
            let correct = if trial.is_correct() { "1" } else { "0" };
            wtr.serialize((
                &trial.initial_word,
                &trial.second_word,
                trial.category,
                trial.user_response,
                trial.reaction_time,
                correct,
            ))?;
        } else {
            wtr.serialize(trial)?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Flat per-trial summary of a mouse session; response fields are placeholders.
pub fn write_mouse_summary<W: Write>(writer: W, trials: &[&MouseTrial]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(SUMMARY_HEADER)?;

    for trial in trials {
        wtr.serialize((
            &trial.initial_word,
            &trial.second_word,
            trial.category,
            PLACEHOLDER,
            PLACEHOLDER,
            PLACEHOLDER,
        ))?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_mouse_data<W: Write>(
    mut writer: W,
    trials: &[&MouseTrial],
) -> Result<(), serde_json::Error> {
    serde_json::to_writer(&mut writer, trials)?;
    writer.flush().map_err(serde_json::Error::io)
}

pub fn read_mouse_data<R: Read>(reader: R) -> Result<Vec<MouseTrial>, serde_json::Error> {
    serde_json::from_reader(reader)
}
