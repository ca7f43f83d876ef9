//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        anthropic_llm::AnthropicMessagesAdapter, embeddings::OpenAiEmbeddingAdapter,
        openai_llm::OpenAiCompletionAdapter, tts::OpenAiTtsAdapter,
    },
    config::Config,
    error::ApiError,
    web::{create_router, state::AppState},
};
use course_assistant_core::{AssistantServices, ProviderPorts};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded: {:?}", config);
    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; generation will fail until it is provided");
    }

    // --- 2. Initialize Service Adapters ---
    let http = reqwest::Client::builder()
        .build()
        .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;

    let ports = ProviderPorts {
        openai: Arc::new(OpenAiCompletionAdapter::new(http.clone())),
        anthropic: Arc::new(AnthropicMessagesAdapter::new(http.clone())),
        embeddings: Arc::new(OpenAiEmbeddingAdapter::new(http.clone())),
        speech: Arc::new(OpenAiTtsAdapter::new(http)),
    };

    // --- 3. Build the Shared AppState ---
    let services = Arc::new(AssistantServices::new(
        ports,
        config.api_keys(),
        config.assistant_config(),
    ));
    let app_state = Arc::new(AppState::new(config.clone(), services));

    // --- 4. Create the Web Router ---
    let app = create_router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
