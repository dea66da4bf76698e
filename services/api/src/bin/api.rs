//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{db::DbAdapter, edge_prompts::EdgePromptAdapter, prompt_llm::OpenAiPromptAdapter},
    config::{Config, PromptSourceConfig},
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use alumni_quest_core::ports::PromptGenerationService;
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Prompt Generator ---
    let prompt_generator: Arc<dyn PromptGenerationService> = match &config.prompt_source {
        PromptSourceConfig::EdgeFunction { backend_url, anon_key } => {
            info!("Generating prompts through the backend edge function at {}", backend_url);
            Arc::new(EdgePromptAdapter::new(
                reqwest::Client::new(),
                backend_url.clone(),
                anon_key.clone(),
            ))
        }
        PromptSourceConfig::OpenAi { api_key, model } => {
            info!("Generating prompts with {}", model);
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
            Arc::new(OpenAiPromptAdapter::new(openai_client, model.clone()))
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(db_adapter, prompt_generator, config.clone()));
    if app_state.proof_signer.is_none() {
        info!("PROOF_SECRET not set; proofs will not be signed.");
    }

    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::InvalidCorsOrigin {
            origin: config.cors_origin.clone(),
            reason: e.to_string(),
        })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let app = Router::new()
        .merge(web::router(app_state))
        .layer(cors)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
