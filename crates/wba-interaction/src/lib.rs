//! Provider-facing glue: the suggestion fetcher trait and its HTTP client
//! implementation for OpenAI-compatible completion APIs.

pub mod completion_client;
pub mod fetcher;

pub use completion_client::CompletionClient;
pub use fetcher::SuggestionFetcher;
