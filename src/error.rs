use std::path::PathBuf;

use crate::dataset::Category;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level failures of a running session
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("could not save results: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("session aborted by operator")]
    UserAbort,

    #[error("input device closed before a response arrived")]
    InputClosed,

    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed or unreadable word dataset. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing required column `{column}`")]
    MissingColumn { column: &'static str },

    #[error("row {row}: initial word is blank")]
    BlankWord { row: usize },

    #[error("`{word}`: the {category} list is empty")]
    EmptyCategory { word: String, category: Category },

    #[error("dataset contains no words")]
    NoWords,

    #[error("`{word}` is not in the dataset")]
    UnknownWord { word: String },

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
}

/// Results could not be written
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("cannot create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("cannot encode {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of the offline analyzers. These never crash the analyzer; the
/// binary reports them and exits without plotting.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Error: {} not found. Make sure it exists.", path.display())]
    InputMissing { path: PathBuf },

    #[error("No data found in {}. Nothing to plot.", path.display())]
    Empty { path: PathBuf },

    #[error("missing required column `{column}`")]
    MissingColumn { column: &'static str },

    #[error("row {row}: `correct` must be 0 or 1, found {value:?}")]
    InvalidCorrect { row: usize, value: String },

    #[error("cannot read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed mouse data: {0}")]
    Json(#[from] serde_json::Error),
}
