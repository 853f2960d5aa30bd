use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use singularity_api::agents::{Crew, TaskWorker};
use singularity_api::api::{self, AppState};
use singularity_api::config::Config;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Server terminated");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BoxError> {
    let config = Config::from_env()?;

    // Build the crew once; handlers only ever see it through AppState
    let provider = config.llm.build_provider()?;
    let worker = TaskWorker::new(provider, config.llm.model.clone())
        .with_temperature(config.llm.temperature)
        .with_max_tokens(config.llm.max_tokens);
    let crew = Crew::new(config.crew_definition()?, worker)?;

    tracing::info!(
        crew = crew.name(),
        agents = crew.agents().len(),
        tasks = crew.tasks().len(),
        inputs = ?crew.input_names(),
        provider = ?config.llm.provider,
        model = %config.llm.model,
        "Crew ready"
    );

    let state = AppState::new(Arc::new(crew), "singularity-api");

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
