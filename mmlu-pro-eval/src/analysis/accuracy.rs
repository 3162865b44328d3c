//! Per-category accuracy accounting
//!
//! Counts are floats because the summary file stores them that way
//! (`{"corr": 2.0, "wrong": 1.0, "acc": 0.666...}`).

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tasks::ResultRecord;

/// Name of the grand-total entry in a summary
pub const TOTAL_KEY: &str = "total";

/// Correct / wrong counts for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyCounts {
    pub corr: f64,
    pub wrong: f64,
}

impl AccuracyCounts {
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.corr += 1.0;
        } else {
            self.wrong += 1.0;
        }
    }

    pub fn total(&self) -> f64 {
        self.corr + self.wrong
    }

    /// `corr / (corr + wrong)`, or 0.0 when nothing was counted
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0.0 {
            0.0
        } else {
            self.corr / total
        }
    }
}

/// One row of the persisted summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyEntry {
    pub corr: f64,
    pub wrong: f64,
    pub acc: f64,
}

impl From<AccuracyCounts> for AccuracyEntry {
    fn from(counts: AccuracyCounts) -> Self {
        Self {
            corr: counts.corr,
            wrong: counts.wrong,
            acc: counts.accuracy(),
        }
    }
}

/// Category name to counts, in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryAccuracy {
    counts: IndexMap<String, AccuracyCounts>,
}

impl CategoryAccuracy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every record; a missing prediction is wrong
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let mut accuracy = Self::new();
        for record in records {
            accuracy.record(record.category(), record.is_correct());
        }
        accuracy
    }

    /// Count every record, drawing a uniform random guess for missing predictions
    ///
    /// Reproduces how legacy result files were scored on reload: an absent
    /// prediction is replaced by a random option index compared against
    /// `answer_index`. A record with no options counts as wrong.
    pub fn from_records_with_guess<R: Rng + ?Sized>(records: &[ResultRecord], rng: &mut R) -> Self {
        let mut accuracy = Self::new();
        for record in records {
            let correct = if record.has_prediction() {
                record.is_correct()
            } else {
                let options = record.question.options.len();
                options > 0 && rng.gen_range(0..options) == record.question.answer_index
            };
            accuracy.record(record.category(), correct);
        }
        accuracy
    }

    pub fn record(&mut self, category: &str, correct: bool) {
        self.counts
            .entry(category.to_string())
            .or_default()
            .record(correct);
    }

    /// Add counts to a category, creating it if needed
    pub fn merge_category(&mut self, category: &str, counts: &AccuracyCounts) {
        let entry = self.counts.entry(category.to_string()).or_default();
        entry.corr += counts.corr;
        entry.wrong += counts.wrong;
    }

    pub fn get(&self, category: &str) -> Option<&AccuracyCounts> {
        self.counts.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&String, &AccuracyCounts)> {
        self.counts.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum over every category except a literal `total` entry
    pub fn total(&self) -> AccuracyCounts {
        self.counts
            .iter()
            .filter(|(name, _)| name.as_str() != TOTAL_KEY)
            .fold(AccuracyCounts::default(), |acc, (_, c)| AccuracyCounts {
                corr: acc.corr + c.corr,
                wrong: acc.wrong + c.wrong,
            })
    }

    /// Per-category rows followed by the `total` row
    pub fn summary(&self) -> IndexMap<String, AccuracyEntry> {
        let mut summary: IndexMap<String, AccuracyEntry> = self
            .counts
            .iter()
            .filter(|(name, _)| name.as_str() != TOTAL_KEY)
            .map(|(name, counts)| (name.clone(), AccuracyEntry::from(*counts)))
            .collect();
        summary.insert(TOTAL_KEY.to_string(), self.total().into());
        summary
    }
}
