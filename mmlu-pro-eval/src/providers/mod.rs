//! Chat-completion provider implementations

pub mod local;
pub mod traits;

pub use local::LocalApiClient;
pub use traits::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError, ProviderResult,
};

use crate::config::Config;
use std::sync::Arc;

/// Create the provider for a run against the configured endpoint
pub fn create_provider(
    config: &Config,
    model: &str,
) -> ProviderResult<Arc<dyn LLMProvider + Send + Sync>> {
    let client = LocalApiClient::from_config(config, model)?;
    tracing::info!("Using endpoint {} with model {}", client.url(), model);
    Ok(Arc::new(client))
}
