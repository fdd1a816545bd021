mod completion;
mod config;
mod courier_client;
mod errors;
mod handlers;
mod models;
mod quote;
mod reconcile;
mod selector;
mod slot_cache;
mod workflow;

use axum::{
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::courier_client::CourierApiClient;
use crate::workflow::SequenceLedger;

/// Main entry point for the application.
///
/// Initializes logging, configuration, the slot cache, and the courier API
/// client, then starts the Axum server with rate limiting, a request body
/// limit, CORS, and request tracing.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_dispatch_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Slot-availability cache: short TTL so availability stays honest while
    // absorbing keystroke-level re-reconciles.
    let slot_cache = Cache::builder()
        .time_to_live(Duration::from_secs(config.slot_cache_ttl_secs))
        .max_capacity(10_000)
        .build();
    tracing::info!(
        "Slot availability cache initialized ({}s TTL)",
        config.slot_cache_ttl_secs
    );

    // Upstream courier API client
    let courier = CourierApiClient::new(config.courier_base_url.clone(), config.courier_token.clone())
        .map_err(|e| anyhow::anyhow!("Failed to initialize courier client: {}", e))?;
    tracing::info!("Courier API client initialized: {}", config.courier_base_url);

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        config: config.clone(),
        courier,
        slot_cache,
        sequences: SequenceLedger::default(),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        .route("/api/v1/drafts/reconcile", post(handlers::reconcile_draft))
        .route("/api/v1/drafts/quote", post(handlers::quote_draft))
        .route("/api/v1/drafts/submit", post(handlers::submit_draft))
        .layer(
            ServiceBuilder::new()
                // Request size limit: drafts are small, 1MB is generous
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
