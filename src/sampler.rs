use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::dataset::Dataset;

/// Fewer distinct words than requested trials. Non-fatal: the session runs
/// with the reduced count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientWords {
    pub available: usize,
    pub requested: usize,
}

impl fmt::Display for InsufficientWords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Warning: Only {} words available for {} trials",
            self.available, self.requested
        )
    }
}

/// Ordered initial words for one session, drawn without replacement
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    words: Vec<String>,
    requested: usize,
}

impl SessionPlan {
    /// Draw `min(requested, |words|)` distinct initial words uniformly at random.
    pub fn draw<R: Rng + ?Sized>(dataset: &Dataset, requested: usize, rng: &mut R) -> Self {
        let mut pool: Vec<String> = dataset.words().map(str::to_string).collect();
        let plan = if pool.len() < requested {
            let shortfall = InsufficientWords {
                available: pool.len(),
                requested,
            };
            warn!("{}", shortfall);
            pool.len()
        } else {
            requested
        };

        let (chosen, _) = pool.partial_shuffle(rng, plan);

        Self {
            words: chosen.to_vec(),
            requested,
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn shortfall(&self) -> Option<InsufficientWords> {
        (self.words.len() < self.requested).then_some(InsufficientWords {
            available: self.words.len(),
            requested: self.requested,
        })
    }
}
