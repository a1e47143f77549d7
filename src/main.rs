//! CSR Event Management Backend
//!
//! REST backend for CSR events, tasks, volunteers and impact metrics, with an AI proxy to a hosted
//! completion API. Records live in the managed backend or, for local runs, in SQLite.

mod ai;
mod api;
mod auth;
mod config;
mod db;
mod errors;
mod impact;
mod matching;
mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ai::CompletionClient;
use config::Config;
use db::{AnyStore, Store};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AnyStore>,
    pub ai: Arc<CompletionClient>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(config.log_json.then(|| fmt::layer().json()))
        .with((!config.log_json).then(|| fmt::layer()))
        .init();

    tracing::info!("Starting CSR backend");
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (CSR_API_PSK). Authentication is disabled!");
    }
    if config.completion.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set. Generation requests will be rejected upstream");
    }

    // Initialize the data store
    let store = Arc::new(db::open_store(&config.store).await?);
    tracing::info!("Using {} store", store.name());

    let ai = Arc::new(CompletionClient::new(&config.completion)?);
    tracing::info!("Completion model: {}", ai.model());

    // Create application state
    let state = AppState {
        store,
        ai,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // AI
        .route("/ai/generate-idea", post(api::generate_idea))
        .route("/ai/generate-summary", post(api::generate_summary))
        // Events
        .route("/events", get(api::list_events).post(api::create_event))
        .route(
            "/events/{id}",
            get(api::get_event)
                .put(api::update_event)
                .delete(api::delete_event),
        )
        .route("/events/{id}/tasks", get(api::list_event_tasks))
        .route("/events/{id}/impact", get(api::get_event_impact))
        // Tasks
        .route("/tasks", get(api::list_tasks).post(api::create_task))
        .route(
            "/tasks/{id}",
            get(api::get_task)
                .put(api::update_task)
                .delete(api::delete_task),
        )
        .route("/tasks/{id}/reminder", put(api::set_task_reminder))
        // Volunteers
        .route(
            "/volunteers",
            get(api::list_volunteers).post(api::create_volunteer),
        )
        .route("/volunteers/match", post(api::match_volunteers))
        .route(
            "/volunteers/{id}",
            get(api::get_volunteer).delete(api::delete_volunteer),
        )
        // Impact
        .route(
            "/impact",
            get(api::list_impact_metrics).post(api::create_impact_metric),
        )
        .route("/impact/summary", get(api::impact_summary))
        .route("/impact/{id}", delete(api::delete_impact_metric))
        // Dashboard
        .route("/dashboard", get(api::get_dashboard))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Liveness and health checks (no auth required)
    let health_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness endpoint.
async fn root() -> &'static str {
    "CSRSprint API is running"
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
