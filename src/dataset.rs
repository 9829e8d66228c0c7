use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DatasetError;

const INITIAL_WORD: &str = "initial_word";

/// System-assigned relationship between the first and second word of a trial
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Similar,
    Unrelated,
    Gibberish,
}

impl Category {
    /// Every category, in dataset column order
    pub const ALL: [Category; 3] = [Category::Similar, Category::Unrelated, Category::Gibberish];

    pub fn column(&self) -> &'static str {
        match self {
            Category::Similar => "similar",
            Category::Unrelated => "unrelated",
            Category::Gibberish => "gibberish",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.column() == s)
            .ok_or_else(|| format!("unknown category {s:?}"))
    }
}

/// Candidate second words for one initial word, one non-empty list per category
#[derive(Debug, Clone, PartialEq)]
pub struct WordEntry {
    candidates: [Vec<String>; 3],
}

impl WordEntry {
    pub fn new(
        word: &str,
        similar: Vec<String>,
        unrelated: Vec<String>,
        gibberish: Vec<String>,
    ) -> Result<Self, DatasetError> {
        let entry = Self {
            candidates: [similar, unrelated, gibberish],
        };

        if let Some(category) = Category::ALL
            .into_iter()
            .find(|c| entry.candidates(*c).is_empty())
        {
            return Err(DatasetError::EmptyCategory {
                word: word.to_string(),
                category,
            });
        }

        Ok(entry)
    }

    pub fn candidates(&self, category: Category) -> &[String] {
        let idx = match category {
            Category::Similar => 0,
            Category::Unrelated => 1,
            Category::Gibberish => 2,
        };
        &self.candidates[idx]
    }
}

/// Read-only lookup from initial word to its candidates, built once per session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    entries: BTreeMap<String, WordEntry>,
}

impl Dataset {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Parse `initial_word,similar,unrelated,gibberish` rows where each
    /// category cell holds a comma-joined word list.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(DatasetError::MissingColumn { column: name })
        };
        let word_idx = column(INITIAL_WORD)?;
        let category_idx = [
            column(Category::Similar.column())?,
            column(Category::Unrelated.column())?,
            column(Category::Gibberish.column())?,
        ];

        let mut entries = BTreeMap::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            // header is line 1
            let row = i + 2;

            let word = record.get(word_idx).unwrap_or_default().trim();
            if word.is_empty() {
                return Err(DatasetError::BlankWord { row });
            }

            let [similar, unrelated, gibberish] =
                category_idx.map(|idx| split_candidates(record.get(idx).unwrap_or_default()));
            let entry = WordEntry::new(word, similar, unrelated, gibberish)?;

            if entries.insert(word.to_string(), entry).is_some() {
                debug!("row {} replaces earlier entry for {:?}", row, word);
            }
        }

        if entries.is_empty() {
            return Err(DatasetError::NoWords);
        }

        Ok(Self { entries })
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, WordEntry)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, word: &str) -> Option<&WordEntry> {
        self.entries.get(word)
    }

    /// Initial words in a stable (sorted) order
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Blank tokens (e.g. from a trailing comma) are dropped.
fn split_candidates(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}
