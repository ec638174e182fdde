//! Inbound webhook server.
//!
//! The only route is `POST /webhook?token=<secret>`. Per-attendee failures
//! never fail the inbound call; the webhook reports failure only for a bad
//! shared secret or an inability to persist the raw event.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::audit::{AuditLog, RawEventLog};
use crate::payload::WebhookPayload;
use crate::pipedrive::CrmService;
use crate::pipeline;

#[derive(Clone)]
pub struct AppState {
    pub crm: Arc<dyn CrmService>,
    pub audit: Arc<AuditLog>,
    pub raw_log: Arc<RawEventLog>,
    pub webhook_token: String,
    pub excluded_domain: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct WebhookQuery {
    token: Option<String>,
}

async fn webhook_handler(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    body: String,
) -> (StatusCode, &'static str) {
    if query.token.as_deref() != Some(state.webhook_token.as_str()) {
        warn!("webhook called with missing or invalid token");
        return (StatusCode::FORBIDDEN, "Forbidden");
    }

    let raw: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => Value::Null,
    };
    let empty = match &raw {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        warn!("webhook called with an empty payload");
        return (StatusCode::BAD_REQUEST, "Empty payload received");
    }

    let title = raw.get("title").and_then(Value::as_str).unwrap_or("N/A");
    info!(title, "webhook received");

    // Persisting the raw event is the precondition for everything else.
    if let Err(err) = state.raw_log.append(&raw).await {
        error!(?err, "could not write to raw meeting log");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    }

    let payload: WebhookPayload = serde_json::from_value(raw).unwrap_or_default();
    let event = match payload.meeting_event() {
        Some(event) if !event.attendees.is_empty() => event,
        Some(_) => {
            info!("attendee list empty after parsing; nothing to process");
            return (
                StatusCode::OK,
                "Webhook received, but no attendee emails to process.",
            );
        }
        None => {
            info!("no attendee email field in payload; nothing to process");
            return (
                StatusCode::OK,
                "Webhook received, but no attendee emails to process.",
            );
        }
    };

    let summary = pipeline::process_event(
        state.crm.as_ref(),
        &state.audit,
        &state.excluded_domain,
        &event,
    )
    .await;
    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        "webhook processing complete"
    );
    (StatusCode::OK, "Webhook received and processed successfully!")
}
