//! HTTP server for monday.com webhooks.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::error::Error as StdError;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::MondayClient;
use crate::config::Config;
use crate::sync::{sync_parent_to_subitems, sync_subitem_from_parent, SyncOutcome};
use crate::webhooks::{classify, Inbound};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configuration.
    pub config: Config,
    /// monday.com API client.
    pub client: MondayClient,
}

impl AppState {
    /// Build state from configuration.
    pub fn from_config(config: Config) -> Result<Self, crate::ApiError> {
        let client = MondayClient::from_config(&config)?;
        Ok(Self { config, client })
    }
}

/// Build the HTTP router for the sync service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // monday.com is configured with either URL
        .route("/", post(webhook_handler))
        .route("/webhook", post(webhook_handler))
        // Smoke test and health check
        .route("/test", get(test_endpoint))
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "monday-sync",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Report whether the service is up and has an API key.
async fn test_endpoint(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Application is running",
        "environment": {
            "monday_api_key_configured": state.config.api_key_configured(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        }
    }))
}

/// Handle incoming monday.com webhooks.
///
/// This handler:
/// 1. Echoes the registration challenge
/// 2. Routes sync events to the parent or subitem path
/// 3. Reports every failure in the body with a 200, so monday.com does not
///    retry the delivery. Only malformed JSON gets a 400.
pub async fn webhook_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let span = info_span!("webhook", delivery_id = %Uuid::new_v4());
    handle_delivery(&state, &body).instrument(span).await
}

async fn handle_delivery(
    state: &AppState,
    body: &[u8],
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let payload: Value = serde_json::from_slice(body).map_err(|e| {
        error!(error = %e, "Failed to parse webhook payload");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": format!("Invalid JSON payload: {e}") })),
        )
    })?;

    let inbound = match classify(&payload) {
        Ok(inbound) => inbound,
        Err(e) => {
            error!(error = %e, "Webhook event has unexpected shape");
            return Ok(error_response(&e));
        }
    };

    let result = match inbound {
        Inbound::Challenge => {
            info!("Received challenge request");
            return Ok(Json(payload));
        }
        Inbound::ParentUpdated(update) => {
            info!(
                event_type = %update.event_type,
                item_id = ?update.item_id,
                column_id = ?update.column_id,
                item_name = ?update.item_name,
                "Processing parent event"
            );
            sync_parent_to_subitems(&state.client, &update).await
        }
        Inbound::SubitemCreated(link) => {
            info!(event_type = %link.event_type, "Processing subitem event, syncing with parent");
            sync_subitem_from_parent(&state.client, &link, state.config.fallback_date).await
        }
        Inbound::Ignored { event_type } => {
            let event_type = event_type.unwrap_or_default();
            if event_type.to_lowercase().contains("subitem") {
                info!(event_type = %event_type, "Detected subitem event, nothing to sync");
            } else {
                info!(event_type = %event_type, "Unhandled event type");
            }
            return Ok(Json(json!({
                "status": "success",
                "outcome": { "result": "ignored" }
            })));
        }
    };

    match result {
        Ok(outcome) => {
            log_outcome(&outcome);
            Ok(Json(json!({ "status": "success", "outcome": outcome })))
        }
        Err(e) => {
            if e.is_upstream() {
                warn!(error = %e, "Sync rejected by monday.com");
            } else {
                error!(error = %e, chain = ?error_chain(&e), "Sync failed");
            }
            Ok(error_response(&e))
        }
    }
}

fn log_outcome(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Synced { updated, failed } if failed.is_empty() => {
            info!(updated, "Date sync complete");
        }
        SyncOutcome::Synced { updated, failed } => {
            warn!(updated, failed = failed.len(), "Date sync finished with failures");
        }
        SyncOutcome::Skipped { reason } => {
            info!(reason = %reason, "Nothing to sync");
        }
    }
}

/// Error body returned with a 200.
fn error_response(err: &(dyn StdError + 'static)) -> Json<Value> {
    Json(json!({
        "status": "error",
        "error": err.to_string(),
        "traceback": error_chain(err).join("\n"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// The error followed by each of its sources.
fn error_chain(err: &(dyn StdError + 'static)) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}
