use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::agents::{Persona, MODE_KEY, USER_INPUT_KEY};
use crate::api::errors::ApiError;
use crate::api::state::AppState;

pub const NO_MESSAGE: &str = "No message provided";
pub const NO_MESSAGE_QUERY: &str = "No message provided. Use ?message=...";

/// Request body for running the crew
///
/// The text may arrive as `user_input` or `message`; when both are sent the
/// first non-blank one wins. `mode` optionally picks a persona preset.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub user_input: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

impl ChatRequest {
    /// Splits the request into its text and mode
    fn into_parts(self) -> (Option<String>, Option<String>) {
        let text = match self.user_input {
            Some(text) if !text.trim().is_empty() => Some(text),
            other => self.message.filter(|m| !m.trim().is_empty()).or(other),
        };
        (text, self.mode)
    }
}

/// Query parameters for `GET /chat`
#[derive(Debug, Default, Deserialize)]
pub struct ChatQuery {
    pub message: Option<String>,
    pub mode: Option<String>,
}

/// Response from a successful crew run
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub status: String,
    pub response: String,
}

/// Run the crew on free text from a JSON body
///
/// POST /run
/// POST /api/chat
///
/// The body is parsed as JSON whatever its content type. A missing or
/// malformed body is treated the same as a missing field.
pub async fn chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = match serde_json::from_slice::<ChatRequest>(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable chat body");
            ChatRequest::default()
        }
    };

    let (text, mode) = request.into_parts();
    run_pipeline(&state, text, mode, NO_MESSAGE).await
}

/// Run the crew on free text from the query string
///
/// GET /chat?message=<text>&mode=<persona>
pub async fn chat_query(
    State(state): State<AppState>,
    query: Option<Query<ChatQuery>>,
) -> Result<Json<ChatResponse>, ApiError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    run_pipeline(&state, query.message, query.mode, NO_MESSAGE_QUERY).await
}

/// Validates the input and invokes the pipeline exactly once
///
/// This is the only place pipeline errors are caught. The error is logged in
/// full and the caller gets the generic failure envelope.
async fn run_pipeline(
    state: &AppState,
    text: Option<String>,
    mode: Option<String>,
    missing_message: &str,
) -> Result<Json<ChatResponse>, ApiError> {
    let text = match text {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            tracing::warn!("Rejected request without input");
            return Err(ApiError::bad_request(missing_message));
        }
    };

    let persona = match mode.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(mode) => Some(mode.parse::<Persona>().map_err(|e| {
            tracing::warn!(mode = %mode, "Rejected request with unknown mode");
            ApiError::bad_request(e.to_string())
        })?),
        None => None,
    };

    tracing::info!(chars = text.chars().count(), mode = ?persona, "Invoking crew");

    let mut inputs = HashMap::from([(USER_INPUT_KEY.to_string(), text)]);
    if let Some(persona) = persona {
        inputs.insert(MODE_KEY.to_string(), persona.to_string());
    }

    let result = state.pipeline.invoke(&inputs).await.map_err(|e| {
        tracing::error!(error = %e, "Crew execution failed");
        ApiError::pipeline_failure()
    })?;

    Ok(Json(ChatResponse {
        status: "success".to_string(),
        response: result,
    }))
}
