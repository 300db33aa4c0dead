//! HTTP boundary for the AI suggestion glue.
//!
//! A small axum router: `POST /api/suggestion` forwards free text to the
//! configured completion provider and reshapes the response; anything else
//! on that route gets a method-not-allowed from the router. A missing
//! provider credential is reported as a server-configuration error per
//! request rather than refusing to start.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wba_core::WbaError;
use wba_interaction::SuggestionFetcher;

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no provider credential is configured.
    pub fetcher: Option<Arc<dyn SuggestionFetcher>>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/suggestion", post(suggestion))
        .with_state(state)
}

async fn health() -> Json<&'static str> {
    Json("OK")
}

#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub text: String,
}

/// Structured error object: a message plus a classification string.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub kind: String,
}

impl ErrorBody {
    fn from_error(err: &WbaError) -> Self {
        Self {
            message: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}

type ErrorReply = (StatusCode, Json<ErrorBody>);

async fn suggestion(
    State(state): State<AppState>,
    Json(request): Json<SuggestionRequest>,
) -> Result<Json<SuggestionResponse>, ErrorReply> {
    let prompt = request.text.trim();
    if prompt.is_empty() {
        let err = WbaError::validation("request text must not be empty");
        return Err((StatusCode::BAD_REQUEST, Json(ErrorBody::from_error(&err))));
    }

    let Some(fetcher) = &state.fetcher else {
        let err = WbaError::configuration("no AI provider credential is configured");
        tracing::error!("suggestion request rejected: provider credential missing");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::from_error(&err)),
        ));
    };

    match fetcher.complete(prompt).await {
        Ok(text) => Ok(Json(SuggestionResponse { text })),
        Err(err) => {
            tracing::warn!(error = %err, "suggestion request failed");
            Err((status_for(&err), Json(ErrorBody::from_error(&err))))
        }
    }
}

fn status_for(err: &WbaError) -> StatusCode {
    match err {
        WbaError::Validation(_) => StatusCode::BAD_REQUEST,
        WbaError::Unauthorized => StatusCode::UNAUTHORIZED,
        WbaError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        WbaError::NotFound { .. } => StatusCode::NOT_FOUND,
        WbaError::External(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
