//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{FileStore, ThreadRandom},
    config::Config,
    error::ApiError,
    web::{router, ApiDoc, AppState},
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use referral_rewards_core::{catalog, SessionStore};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
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

    catalog::validate(catalog::all())
        .map_err(|e| ApiError::Internal(format!("Reward catalog is malformed: {}", e)))?;

    // --- 2. Open the Session Store ---
    info!(
        "Using session store at {}",
        config.session_store_path.display()
    );
    let backend = Arc::new(FileStore::new(config.session_store_path.clone()));
    let sessions = SessionStore::new(backend, Arc::new(ThreadRandom));
    match sessions.load().await {
        Ok(restored) => info!(
            "Session restored: {}",
            if restored.is_authenticated() { "logged in" } else { "anonymous" }
        ),
        Err(e) => error!("Could not read the stored session, starting logged out: {}", e),
    }

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(sessions, config.clone()));

    let allowed_origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    let app = Router::new()
        .merge(router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

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
