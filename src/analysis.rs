//! Post-hoc analysis of persisted session files. Runs in its own invocation,
//! never during a session.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use itertools::Itertools;

use crate::dataset::Category;
use crate::error::AnalysisError;
use crate::recorder::read_mouse_data;
use crate::session::MouseTrial;

/// Subplot grid is at most this many columns wide
pub const MAX_GRID_COLUMNS: usize = 3;

/// Correct/total tally for one category, as found in the results file
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAccuracy {
    pub category: String,
    pub correct: u32,
    pub total: u32,
}

impl CategoryAccuracy {
    /// Percentage correct, 0 when there are no trials
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64 * 100.0
        }
    }
}

/// Tally `correct` per `system_category`, categories in first-seen order.
/// Both columns are taken verbatim; `correct` must be "0" or "1".
pub fn tally_accuracy<R: Read>(reader: R) -> Result<Vec<CategoryAccuracy>, AnalysisError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(AnalysisError::MissingColumn { column: name })
    };
    let category_idx = column("system_category")?;
    let correct_idx = column("correct")?;

    let mut tallies: Vec<CategoryAccuracy> = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 2;

        let category = record.get(category_idx).unwrap_or_default();
        let hit = match record.get(correct_idx).unwrap_or_default() {
            "1" => 1,
            "0" => 0,
            other => {
                return Err(AnalysisError::InvalidCorrect {
                    row,
                    value: other.to_string(),
                })
            }
        };

        match tallies.iter_mut().find(|t| t.category == category) {
            Some(tally) => {
                tally.correct += hit;
                tally.total += 1;
            }
            None => tallies.push(CategoryAccuracy {
                category: category.to_string(),
                correct: hit,
                total: 1,
            }),
        }
    }

    Ok(tallies)
}

pub fn load_accuracy<P: AsRef<Path>>(path: P) -> Result<Vec<CategoryAccuracy>, AnalysisError> {
    let path = path.as_ref();
    let tallies = tally_accuracy(open_input(path)?)?;
    if tallies.is_empty() {
        return Err(AnalysisError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(tallies)
}

pub fn load_trajectories<P: AsRef<Path>>(path: P) -> Result<Vec<MouseTrial>, AnalysisError> {
    let path = path.as_ref();
    let mut text = String::new();
    open_input(path)?.read_to_string(&mut text)?;

    let empty = || AnalysisError::Empty {
        path: path.to_path_buf(),
    };
    if text.trim().is_empty() {
        return Err(empty());
    }

    let trials = read_mouse_data(text.as_bytes())?;
    if trials.is_empty() {
        return Err(empty());
    }
    Ok(trials)
}

fn open_input(path: &Path) -> Result<File, AnalysisError> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => AnalysisError::InputMissing {
            path: path.to_path_buf(),
        },
        _ => AnalysisError::Io(e),
    })
}

/// `(rows, columns)` of the per-trial subplot grid
pub fn grid_shape(trials: usize) -> (usize, usize) {
    if trials == 0 {
        return (0, 0);
    }
    let cols = trials.min(MAX_GRID_COLUMNS);
    (trials.div_ceil(cols), cols)
}

/// Pointer path as (x, y) points
pub fn xy_path(trial: &MouseTrial) -> Vec<(f64, f64)> {
    trial.samples.iter().map(|s| (s.x, s.y)).collect()
}

/// Vertical pointer position against sample index
pub fn y_by_sample_index(trial: &MouseTrial) -> Vec<(f64, f64)> {
    trial
        .samples
        .iter()
        .enumerate()
        .map(|(i, s)| (i as f64, s.y))
        .collect()
}

/// One legend entry per category, in first-seen order
pub fn legend_categories(trials: &[MouseTrial]) -> Vec<Category> {
    trials.iter().map(|t| t.category).unique().collect()
}
