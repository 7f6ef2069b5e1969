//! Runaway API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use runaway_api::config::AppConfig;
use runaway_api::error::AppError;
use runaway_api::routes;
use runaway_api::state::AppState;
use runaway_api::sweeper::spawn_expiry_sweeper;
use runaway_content::file_catalog::FileWagonCatalog;
use runaway_core::clock::SystemClock;
use runaway_core::collaborator::SpeechSynthesizer;
use runaway_llm::elevenlabs::{DEFAULT_ELEVEN_LABS_BASE_URL, ElevenLabsClient, SilentSpeech};
use runaway_llm::mistral::{MistralClient, MistralConfig};
use runaway_llm::resilient::{Resilient, RetryConfig};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Runaway API server");

    let config = AppConfig::from_env()?;
    tracing::info!(config = ?config, "loaded configuration");

    // Collaborators.
    let retry = RetryConfig::with_max_retries(config.llm_max_retries);
    let mistral = Resilient::new(
        MistralClient::new(MistralConfig {
            api_key: config.mistral_api_key.clone(),
            base_url: config.mistral_base_url.clone(),
            dialogue_model: config.dialogue_model.clone(),
            scoring_model: config.scoring_model.clone(),
        }),
        retry.clone(),
    );
    let mistral = Arc::new(mistral);
    let speech: Arc<dyn SpeechSynthesizer> = if let Some(key) = &config.eleven_labs_api_key {
        Arc::new(Resilient::new(
            ElevenLabsClient::new(key, DEFAULT_ELEVEN_LABS_BASE_URL, &config.eleven_labs_voice_id),
            retry,
        ))
    } else {
        tracing::warn!("ELEVEN_LABS_API_KEY not set, replies will have no audio");
        Arc::new(SilentSpeech)
    };

    // Build application state.
    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(FileWagonCatalog::new(config.data_dir.clone())),
        mistral.clone(),
        mistral.clone(),
        mistral,
        speech,
    );

    let _sweeper = spawn_expiry_sweeper(
        Arc::clone(&app_state.sessions),
        config.sweep_interval,
        config.session_max_age,
    );

    // Build router.
    // TODO: Replace CorsLayer::permissive() with the game client's origin once it is deployed.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/sessions", routes::session::router())
        .nest("/api/v1/wagons", routes::wagons::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
