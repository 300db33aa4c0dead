//! AI suggestion service for the structured questions.
//!
//! Fetches a writing suggestion for one question at a time and writes the
//! result into the field store's suggestion cache through the synchronizer,
//! so suggestion text counts as a field edit and rides the next autosave.
//! Failures degrade gracefully: the question keeps a fixed fallback message
//! and the user can still type manually.

use crate::synchronizer::Synchronizer;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use wba_core::error::Result;
use wba_core::process::QuestionKey;
use wba_interaction::SuggestionFetcher;

/// Fixed user-visible message when a suggestion could not be generated.
pub const SUGGESTION_UNAVAILABLE: &str =
    "We couldn't generate a suggestion right now. You can write your own answer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchState {
    Loading,
    Ready,
    Failed,
}

/// Per-question suggestion orchestration.
pub struct SuggestionService {
    fetcher: Arc<dyn SuggestionFetcher>,
    synchronizer: Synchronizer,
    states: Mutex<HashMap<QuestionKey, FetchState>>,
}

impl SuggestionService {
    pub fn new(fetcher: Arc<dyn SuggestionFetcher>, synchronizer: Synchronizer) -> Self {
        Self {
            fetcher,
            synchronizer,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// True while a fetch for this question is in flight.
    pub async fn is_loading(&self, key: QuestionKey) -> bool {
        matches!(
            self.states.lock().await.get(&key),
            Some(FetchState::Loading)
        )
    }

    /// The fallback message if the last fetch for this question failed.
    pub async fn failure_message(&self, key: QuestionKey) -> Option<&'static str> {
        match self.states.lock().await.get(&key) {
            Some(FetchState::Failed) => Some(SUGGESTION_UNAVAILABLE),
            _ => None,
        }
    }

    /// Fetches a suggestion for one question and caches it in the field
    /// store. Returns the suggestion text.
    ///
    /// A second request for a question already loading is rejected; other
    /// questions are unaffected. Errors never block form progression.
    pub async fn suggest(&self, key: QuestionKey) -> Result<String> {
        {
            let mut states = self.states.lock().await;
            if matches!(states.get(&key), Some(FetchState::Loading)) {
                return Err(wba_core::WbaError::validation(
                    "a suggestion for this question is already being generated",
                ));
            }
            states.insert(key, FetchState::Loading);
        }

        let prompt = self.build_prompt(key).await;
        let result = self.fetcher.complete(&prompt).await;

        match result {
            Ok(text) => {
                // Writing through the synchronizer marks the process
                // modified, so the suggestion is captured by the next
                // autosave cycle.
                self.synchronizer
                    .edit(|fields| fields.set_suggestion(key, text.clone()))
                    .await?;
                self.states.lock().await.insert(key, FetchState::Ready);
                Ok(text)
            }
            Err(e) => {
                self.states.lock().await.insert(key, FetchState::Failed);
                tracing::warn!(question = %key, error = %e, "suggestion fetch failed");
                Err(e)
            }
        }
    }

    /// Builds the prompt for one question from the current field contents.
    async fn build_prompt(&self, key: QuestionKey) -> String {
        let (thoughts, answer) = self
            .synchronizer
            .with_fields(|fields| {
                (
                    fields.initial_thoughts().to_string(),
                    fields.answer(key).to_string(),
                )
            })
            .await;

        let mut prompt = format!(
            "You are helping a product manager work through the Working Backwards \
             method.\n\nQuestion: {}\n",
            question_text(key)
        );
        if !thoughts.trim().is_empty() {
            prompt.push_str(&format!("\nTheir initial thoughts:\n{thoughts}\n"));
        }
        if !answer.trim().is_empty() {
            prompt.push_str(&format!("\nTheir draft answer so far:\n{answer}\n"));
        }
        prompt.push_str("\nSuggest a concise, concrete answer in two or three sentences.");
        prompt
    }
}

fn question_text(key: QuestionKey) -> &'static str {
    match key {
        QuestionKey::Customer => "Who is the customer?",
        QuestionKey::Problem => "What is the customer's problem or opportunity?",
        QuestionKey::Solution => "What is the most important customer benefit?",
        QuestionKey::Experience => "What does the customer experience look like?",
        QuestionKey::Measurement => "How will you measure success?",
    }
}
