//! Bounded-concurrency request dispatch

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::analysis::{extract_answer_with_tier, normalize_output, ExtractionTier};
use crate::config::{Config, SamplingConfig};
use crate::providers::{CompletionRequest, CompletionResponse, LLMProvider, ProviderError};
use crate::tasks::{build_prompt, Question, ResultRecord};

use super::progress::ProgressTracker;

/// Configuration for the dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Maximum in-flight requests across every batch and category
    pub max_concurrent: usize,
    /// Deadline for a single request in milliseconds
    pub timeout_ms: u64,
    pub sampling: SamplingConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            timeout_ms: 300_000,
            sampling: SamplingConfig::default(),
        }
    }
}

impl From<&Config> for DispatcherConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrent: config.run.max_concurrent,
            timeout_ms: config.run.timeout_ms,
            sampling: config.sampling.clone(),
        }
    }
}

/// Error type for a single dispatch
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Concurrency limiter closed")]
    Closed,
}

/// Sends one request per question, never more than `max_concurrent` at once
///
/// Clones share the same semaphore, so the limit holds across spawned tasks.
#[derive(Clone)]
pub struct Dispatcher {
    config: DispatcherConfig,
    provider: Arc<dyn LLMProvider + Send + Sync>,
    semaphore: Arc<Semaphore>,
}

impl Dispatcher {
    /// Create a new dispatcher; a zero limit is raised to one
    pub fn new(provider: Arc<dyn LLMProvider + Send + Sync>, config: DispatcherConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            config,
            provider,
            semaphore,
        }
    }

    /// Send one prompt once the limiter admits it
    ///
    /// The deadline starts after a permit is acquired, so waiting for a slot
    /// never counts against a request.
    pub async fn dispatch(&self, prompt: &str) -> Result<CompletionResponse, DispatchError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| DispatchError::Closed)?;

        let request = CompletionRequest::from_prompt(prompt, &self.config.sampling);
        let timeout = Duration::from_millis(self.config.timeout_ms);

        match tokio::time::timeout(timeout, self.provider.complete(&request)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ProviderError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }
            .into()),
        }
    }

    /// Evaluate one question: build the prompt, dispatch, extract the answer
    ///
    /// Failures become a record with no prediction and the error text.
    pub async fn evaluate_question(
        &self,
        question: Question,
        cot_examples: &[Question],
        progress: &ProgressTracker,
    ) -> ResultRecord {
        let prompt = build_prompt(&question, cot_examples);
        let start = Instant::now();

        match self.dispatch(&prompt).await {
            Ok(response) => {
                progress.complete(question.question_id, start.elapsed());
                let output = normalize_output(&response.content);
                let pred = match extract_answer_with_tier(&output) {
                    Some((letter, ExtractionTier::AnswerIs)) => Some(letter),
                    Some((letter, tier)) => {
                        tracing::debug!(
                            "Answer for q_id {} taken from fallback {:?}",
                            question.question_id,
                            tier
                        );
                        Some(letter)
                    }
                    None => {
                        tracing::debug!("No answer found for q_id {}", question.question_id);
                        None
                    }
                };
                ResultRecord::answered(question, pred, output)
            }
            Err(e) => {
                progress.fail(question.question_id, &e);
                ResultRecord::failed(question, e.to_string())
            }
        }
    }

    /// Evaluate a batch concurrently, returning records in batch order
    pub async fn evaluate_batch(
        &self,
        questions: Vec<Question>,
        cot_examples: Arc<[Question]>,
        progress: Arc<ProgressTracker>,
    ) -> Vec<ResultRecord> {
        let mut handles = Vec::with_capacity(questions.len());

        for question in questions {
            let dispatcher = self.clone();
            let examples = cot_examples.clone();
            let progress = progress.clone();
            let fallback = question.clone();

            let handle = tokio::spawn(async move {
                dispatcher
                    .evaluate_question(question, &examples, &progress)
                    .await
            });

            handles.push((fallback, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (question, handle) in handles {
            match handle.await {
                Ok(record) => results.push(record),
                Err(e) => {
                    tracing::error!("Task for q_id {} panicked: {}", question.question_id, e);
                    results.push(ResultRecord::failed(question, format!("task panicked: {}", e)));
                }
            }
        }

        results
    }
}
