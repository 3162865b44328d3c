//! Evaluation engine

pub mod dispatcher;
pub mod orchestrator;
pub mod progress;

pub use dispatcher::{DispatchError, Dispatcher, DispatcherConfig};
pub use orchestrator::{CategoryOutcome, Orchestrator, Phase};
pub use progress::ProgressTracker;
