pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::generator::{AnthropicGenerator, FlashcardGenerator};
use crate::services::retry::RetryPolicy;
use crate::services::sessions::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub generator: Arc<dyn FlashcardGenerator>,
    pub retry: RetryPolicy,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(db: Database, generator: Arc<dyn FlashcardGenerator>, retry: RetryPolicy) -> Self {
        Self::with_sessions(db, generator, retry, SessionStore::new())
    }

    pub fn with_sessions(
        db: Database,
        generator: Arc<dyn FlashcardGenerator>,
        retry: RetryPolicy,
        sessions: SessionStore,
    ) -> Self {
        Self {
            db: Arc::new(db),
            generator,
            retry,
            sessions: Arc::new(sessions),
        }
    }
}

/// Build the application router with every route and layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Generation
        .route("/api/generate", post(routes::generate::generate))
        // Decks
        .route("/api/decks", get(routes::decks::list).post(routes::decks::create))
        .route(
            "/api/decks/:deck_id",
            get(routes::decks::get).delete(routes::decks::delete),
        )
        .route("/api/decks/:deck_id/stats", get(routes::decks::stats))
        // Flashcards
        .route(
            "/api/decks/:deck_id/flashcards",
            post(routes::flashcards::create),
        )
        .route(
            "/api/flashcards/:card_id",
            patch(routes::flashcards::update).delete(routes::flashcards::delete),
        )
        // Study
        .route("/api/decks/:deck_id/study", post(routes::study::open))
        .route(
            "/api/decks/:deck_id/study/results",
            post(routes::study::submit_results),
        )
        .route(
            "/api/decks/:deck_id/study/:session_id",
            get(routes::study::view).delete(routes::study::close),
        )
        .route(
            "/api/decks/:deck_id/study/:session_id/grade",
            post(routes::study::grade),
        )
        .route(
            "/api/decks/:deck_id/study/:session_id/summary",
            post(routes::study::summary),
        )
        // Stats
        .route("/api/stats", get(routes::stats::overall))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    if config.anthropic.api_key.is_empty() {
        tracing::warn!("ANTHROPIC_API_KEY is not set; flashcard generation will fail");
    }

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    tracing::info!(model = %config.anthropic.model, max_retries = config.max_retries, "Using Anthropic generator");
    let generator = Arc::new(AnthropicGenerator::new(config.anthropic.clone()));

    let state = AppState::with_sessions(
        db,
        generator,
        config.retry_policy(),
        SessionStore::with_ttl(config.session_ttl),
    );
    let app = router(state);

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
