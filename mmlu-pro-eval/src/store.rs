//! Per-category result files
//!
//! Each evaluated subject owns two files in the output directory:
//! `<subject>_result.json` (a JSON array of [`ResultRecord`]s) and
//! `<subject>_summary.json` (category name to `{corr, wrong, acc}` plus
//! `total`). Both are rewritten in full on every save.

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analysis::CategoryAccuracy;
use crate::tasks::{Question, ResultRecord};

/// Error type for result persistence
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result-file path for a subject
pub fn result_path(output_dir: impl AsRef<Path>, subject: &str) -> PathBuf {
    output_dir.as_ref().join(format!("{}_result.json", subject))
}

/// Summary-file path for a subject
pub fn summary_path(output_dir: impl AsRef<Path>, subject: &str) -> PathBuf {
    output_dir.as_ref().join(format!("{}_summary.json", subject))
}

/// Records read back from a result file
#[derive(Debug, Clone, Default)]
pub struct LoadedResults {
    pub records: Vec<ResultRecord>,
    /// Accuracy as scored on reload, with random guesses for missing predictions
    pub accuracy: CategoryAccuracy,
}

/// Reads and writes result files
///
/// Owns the seeded generator used to score missing predictions on reload,
/// so two stores built with the same seed score the same file identically.
pub struct ResultStore {
    rng: StdRng,
    read_retry_delay: Duration,
}

impl ResultStore {
    /// Create a store with an explicit generator
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            read_retry_delay: Duration::from_secs(2),
        }
    }

    /// Create a store whose generator is seeded from `seed`
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Set the delay between attempts to read an unreadable file
    pub fn with_read_retry_delay(mut self, delay: Duration) -> Self {
        self.read_retry_delay = delay;
        self
    }

    /// Load prior results, or nothing if the file does not exist
    ///
    /// A file that exists but cannot be read or parsed is retried after a
    /// fixed delay until it becomes readable or disappears.
    pub async fn load(&mut self, path: impl AsRef<Path>) -> LoadedResults {
        let path = path.as_ref();
        loop {
            match read_records(path) {
                Ok(Some(records)) => {
                    let accuracy = CategoryAccuracy::from_records_with_guess(&records, &mut self.rng);
                    tracing::debug!("Loaded {} existing results from {}", records.len(), path.display());
                    return LoadedResults { records, accuracy };
                }
                Ok(None) => return LoadedResults::default(),
                Err(e) => {
                    tracing::warn!(
                        "Error {}, sleep {} seconds",
                        e,
                        self.read_retry_delay.as_secs_f64()
                    );
                    tokio::time::sleep(self.read_retry_delay).await;
                }
            }
        }
    }

    /// Write records as one JSON array, keeping the first record per question id
    ///
    /// Returns the number of records written.
    pub fn save(records: &[ResultRecord], path: impl AsRef<Path>) -> Result<usize, StoreError> {
        let path = path.as_ref();
        let mut seen = std::collections::HashSet::new();
        let unique: Vec<&ResultRecord> = records
            .iter()
            .filter(|r| seen.insert(r.question_id()))
            .collect();

        let json = serde_json::to_string(&unique).map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(unique.len())
    }

    /// Write per-category accuracy plus the grand total
    pub fn save_summary(accuracy: &CategoryAccuracy, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = serde_json::to_string(&accuracy.summary()).map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

fn read_records(path: &Path) -> Result<Option<Vec<ResultRecord>>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let records = serde_json::from_str(&content).map_err(|source| StoreError::Json {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(records))
}

/// Questions with no existing record sharing both id and question text
pub fn select_new(questions: &[Question], existing: &[ResultRecord]) -> Vec<Question> {
    questions
        .iter()
        .filter(|q| !existing.iter().any(|r| r.question.same_item(q)))
        .cloned()
        .collect()
}

/// Union of existing and new records keyed by question id
///
/// New records replace existing ones in place; records flagged
/// `already_existed` are ignored.
pub fn merge_results(existing: Vec<ResultRecord>, new: Vec<ResultRecord>) -> Vec<ResultRecord> {
    let mut by_id: IndexMap<i64, ResultRecord> = IndexMap::new();
    for record in existing {
        by_id.insert(record.question_id(), record);
    }
    for record in new.into_iter().filter(|r| !r.already_existed) {
        by_id.insert(record.question_id(), record);
    }
    by_id.into_values().collect()
}
