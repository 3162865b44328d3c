//! Per-category evaluation: load, select, dispatch, merge, persist

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::analysis::{AccuracyCounts, CategoryAccuracy};
use crate::store::{merge_results, result_path, select_new, summary_path, ResultStore, StoreError};
use crate::tasks::{Dataset, Question};

use super::dispatcher::Dispatcher;
use super::progress::ProgressTracker;

/// Stages a category passes through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    LoadExisting,
    SelectNew,
    DispatchBatches,
    Merge,
    Persist,
    Done,
}

/// What happened to one category
#[derive(Debug, Clone)]
pub struct CategoryOutcome {
    pub category: String,
    /// Questions sent to the endpoint this run
    pub dispatched: usize,
    /// Questions skipped because a result already existed
    pub skipped: usize,
    /// Records in the result file after persisting
    pub stored: usize,
    /// Accuracy over the merged record set
    pub accuracy: CategoryAccuracy,
    pub elapsed: Duration,
}

impl CategoryOutcome {
    /// Counts for the category itself, if any record exists
    pub fn counts(&self) -> Option<&AccuracyCounts> {
        self.accuracy.get(&self.category)
    }
}

/// Drives evaluation of whole categories
pub struct Orchestrator {
    dispatcher: Dispatcher,
    store: ResultStore,
    output_dir: PathBuf,
    batch_size: usize,
}

impl Orchestrator {
    /// Create an orchestrator; a zero batch size is raised to one
    pub fn new(
        dispatcher: Dispatcher,
        store: ResultStore,
        output_dir: impl Into<PathBuf>,
        batch_size: usize,
    ) -> Self {
        Self {
            dispatcher,
            store,
            output_dir: output_dir.into(),
            batch_size: batch_size.max(1),
        }
    }

    /// Evaluate the selected subjects in order
    ///
    /// An empty `subjects` list means every test category. Subjects with no
    /// test questions are skipped with a warning.
    pub async fn evaluate(
        &mut self,
        test: &Dataset,
        validation: &Dataset,
        subjects: &[String],
    ) -> Result<Vec<CategoryOutcome>, StoreError> {
        let subjects: Vec<String> = if subjects.is_empty() {
            test.keys().cloned().collect()
        } else {
            subjects.to_vec()
        };
        tracing::info!("Assigned subjects: {:?}", subjects);

        let mut outcomes = Vec::with_capacity(subjects.len());
        for subject in &subjects {
            let Some(questions) = test.get(subject) else {
                tracing::warn!("No test questions for subject '{}', skipping", subject);
                continue;
            };
            let examples = match validation.get(subject) {
                Some(examples) => examples.as_slice(),
                None => {
                    tracing::warn!("No validation examples for '{}', prompting zero-shot", subject);
                    &[]
                }
            };
            outcomes.push(self.evaluate_category(subject, questions, examples).await?);
        }
        Ok(outcomes)
    }

    /// Evaluate one category and persist its result and summary files
    pub async fn evaluate_category(
        &mut self,
        subject: &str,
        questions: &[Question],
        cot_examples: &[Question],
    ) -> Result<CategoryOutcome, StoreError> {
        let start = Instant::now();
        let result_file = result_path(&self.output_dir, subject);
        let summary_file = summary_path(&self.output_dir, subject);
        log_phase(subject, Phase::Init);
        tracing::info!("Evaluating subject: {}", subject);

        log_phase(subject, Phase::LoadExisting);
        let existing = self.store.load(&result_file).await;
        if let Some(prior) = existing.accuracy.get(subject) {
            tracing::info!(
                "Resuming {} with {} existing results (reload accuracy {:.2}%)",
                subject,
                existing.records.len(),
                prior.accuracy() * 100.0
            );
        }

        log_phase(subject, Phase::SelectNew);
        let pending = select_new(questions, &existing.records);
        let skipped = questions.len() - pending.len();
        tracing::info!("Total new questions to process: {}", pending.len());
        tracing::info!("Skipping {} already processed questions", skipped);

        log_phase(subject, Phase::DispatchBatches);
        let dispatched = pending.len();
        let fresh = self.dispatch_batches(pending, cot_examples).await;

        log_phase(subject, Phase::Merge);
        let merged = merge_results(existing.records, fresh);
        let accuracy = CategoryAccuracy::from_records(&merged);

        log_phase(subject, Phase::Persist);
        let stored = ResultStore::save(&merged, &result_file)?;
        ResultStore::save_summary(&accuracy, &summary_file)?;

        let elapsed = start.elapsed();
        tracing::info!("Completed {} in {:.2} seconds", subject, elapsed.as_secs_f64());
        tracing::info!("Processed {} new questions", dispatched);
        if let Some(counts) = accuracy.get(subject) {
            tracing::info!("Accuracy: {:.2}%", counts.accuracy() * 100.0);
        }
        log_phase(subject, Phase::Done);

        Ok(CategoryOutcome {
            category: subject.to_string(),
            dispatched,
            skipped,
            stored,
            accuracy,
            elapsed,
        })
    }

    async fn dispatch_batches(
        &self,
        pending: Vec<Question>,
        cot_examples: &[Question],
    ) -> Vec<crate::tasks::ResultRecord> {
        let progress = Arc::new(ProgressTracker::new(pending.len()));
        let examples: Arc<[Question]> = Arc::from(cot_examples.to_vec());
        let batch_count = pending.len().div_ceil(self.batch_size);
        let mut records = Vec::with_capacity(pending.len());

        for (idx, batch) in pending.chunks(self.batch_size).enumerate() {
            tracing::info!("Processing batch {}/{}", idx + 1, batch_count);
            let batch_records = self
                .dispatcher
                .evaluate_batch(batch.to_vec(), examples.clone(), progress.clone())
                .await;
            records.extend(batch_records);
        }

        records
    }
}

fn log_phase(subject: &str, phase: Phase) {
    tracing::debug!("{}: {:?}", subject, phase);
}
