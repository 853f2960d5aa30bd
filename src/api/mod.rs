// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter over the Pipeline port

pub mod errors;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};

use handlers::{chat, health};
pub use state::AppState;

/// Builds the application routes over the given state
///
/// Middleware layers are added by the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Liveness
        .route("/", get(health::health_check))
        .route("/health", get(health::health_check))
        // Crew
        .route("/run", post(chat::chat))
        .route("/api/chat", post(chat::chat))
        .route("/chat", get(chat::chat_query))
        .with_state(state)
}
