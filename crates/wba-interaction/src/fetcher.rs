//! Suggestion fetcher trait.
//!
//! The model provider is an opaque external service: given prompt text it
//! returns generated text or an error. Single request/response, no
//! streaming.

use async_trait::async_trait;
use wba_core::error::Result;

/// An abstract source of AI-generated writing suggestions.
#[async_trait]
pub trait SuggestionFetcher: Send + Sync {
    /// Sends prompt text to the provider and returns the generated text.
    ///
    /// Fails with `WbaError::External` on provider or transport errors;
    /// callers are expected to degrade gracefully rather than block the
    /// user.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
