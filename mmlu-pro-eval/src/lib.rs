//! MMLU-Pro evaluation driver for OpenAI-compatible chat endpoints
//!
//! Sends chain-of-thought prompts for every MMLU-Pro question to a local
//! chat-completion server, extracts the chosen letter from the reply, and
//! keeps per-category result and summary files that survive restarts.
//!
//! # Features
//!
//! - Three-tier answer extraction (`The answer is (X)`, `Answer: X`, last letter)
//! - Bounded request concurrency shared across batches and categories
//! - Resumable runs: questions already in a result file are never re-sent
//! - Per-category accuracy summaries with a grand total
//!
//! # Example
//!
//! ```no_run
//! use mmlu_pro_eval::{
//!     config::Config,
//!     providers::create_provider,
//!     runner::{Dispatcher, DispatcherConfig, Orchestrator},
//!     store::ResultStore,
//!     tasks::load_split,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default();
//!     let provider = create_provider(&config, "qwen3")?;
//!
//!     let dispatcher = Dispatcher::new(provider, DispatcherConfig::from(&config));
//!     let store = ResultStore::seeded(config.run.seed);
//!     let mut orchestrator =
//!         Orchestrator::new(dispatcher, store, &config.run.output_dir, config.run.batch_size);
//!
//!     let test = load_split(&config.run.data_dir, "test")?;
//!     let validation = load_split(&config.run.data_dir, "validation")?;
//!     let outcomes = orchestrator.evaluate(&test, &validation, &[]).await?;
//!     println!("evaluated {} categories", outcomes.len());
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod providers;
pub mod reporting;
pub mod runner;
pub mod store;
pub mod tasks;

pub use config::Config;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{extract_answer, AccuracyCounts, CategoryAccuracy};
    pub use crate::config::Config;
    pub use crate::providers::{
        create_provider, CompletionRequest, CompletionResponse, LLMProvider, LocalApiClient,
        ProviderError,
    };
    pub use crate::runner::{CategoryOutcome, Dispatcher, DispatcherConfig, Orchestrator, ProgressTracker};
    pub use crate::store::{merge_results, select_new, ResultStore, StoreError};
    pub use crate::tasks::{Dataset, Question, ResultRecord};
}
