use crate::config::Config;
use crate::courier_client::CourierApiClient;
use crate::errors::AppError;
use crate::workflow::{
    self, QuoteRequest, QuoteResponse, ReconcileRequest, ReconcileResponse, SequenceLedger,
    SubmitRequest, SubmitResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use moka::future::Cache;
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the upstream courier platform API.
    pub courier: CourierApiClient,
    /// Checksum-validated slot-availability cache.
    /// Key: availability fingerprint, Value: sealed JSON entry.
    pub slot_cache: Cache<String, String>,
    /// Per-draft request sequence bookkeeping for stale-response discard.
    pub sequences: SequenceLedger,
}

/// Health check endpoint.
///
/// Returns the service status and version; bypasses rate limiting.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-dispatch-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/v1/drafts/reconcile
///
/// Runs the timeframe reconciler for a draft: decides whether to keep,
/// refetch, or clear the candidate list, applies the preferred-service
/// default, and reports the fastest-available affordance.
pub async fn reconcile_draft(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReconcileRequest>,
) -> Result<Json<ReconcileResponse>, AppError> {
    tracing::info!(
        "POST /drafts/reconcile - key: {}, seq: {}, date: {}",
        request.draft_key,
        request.seq,
        request.date
    );

    if request.draft_key.trim().is_empty() {
        return Err(AppError::BadRequest("draft_key cannot be empty".to_string()));
    }

    let response = workflow::reconcile(&state, request).await?;
    Ok(Json(response))
}

/// POST /api/v1/drafts/quote
///
/// Runs the quote engine: absolute quote for new orders, delta quote for
/// changed edits, cleared display otherwise.
pub async fn quote_draft(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    tracing::info!(
        "POST /drafts/quote - key: {}, seq: {}",
        request.draft_key,
        request.seq
    );

    if request.draft_key.trim().is_empty() {
        return Err(AppError::BadRequest("draft_key cannot be empty".to_string()));
    }

    let response = workflow::run_quote(&state, request).await?;
    Ok(Json(response))
}

/// POST /api/v1/drafts/submit
///
/// Creates or updates the order upstream and returns the tracking location.
pub async fn submit_draft(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    tracing::info!(
        "POST /drafts/submit - order_id: {:?}, status: {:?}",
        request.order_id,
        request.draft.status
    );

    let response = workflow::submit(&state, request).await?;
    Ok(Json(response))
}
