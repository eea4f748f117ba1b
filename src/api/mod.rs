// HTTP routes: health checks, metrics, and the messaging webhook.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::line::{self, signature, MessageSink, WebhookPayload};
use crate::metrics;
use crate::responder::Responder;

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub responder: Responder,
    pub sink: Arc<dyn MessageSink>,
    pub channel_secret: Arc<str>,
}

impl AppState {
    pub fn new(
        responder: Responder,
        sink: Arc<dyn MessageSink>,
        channel_secret: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            responder,
            sink,
            channel_secret: channel_secret.into(),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_text))
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .route("/callback", post(callback))
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_text() -> &'static str {
    "Health Check OK"
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let inventory = state.responder.inventory();
    Json(json!({
        "status": "ok",
        "service": "tsume-shogi-bot",
        "pending_answers": inventory.pending_answers(),
        "stock": inventory.stock_report(),
    }))
}

async fn get_metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics::gather_metrics(),
    )
}

fn reject(status: StatusCode, msg: &'static str) -> axum::response::Response {
    metrics::WEBHOOK_REQUESTS_TOTAL
        .with_label_values(&[status.as_str()])
        .inc();
    (status, msg).into_response()
}

async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    let header = headers
        .get(signature::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = signature::verify(&state.channel_secret, &body, header) {
        tracing::error!(
            "Invalid signature ({e}). Please check your channel access token/channel secret."
        );
        return reject(StatusCode::BAD_REQUEST, "Invalid signature");
    }

    tracing::debug!("Request body -> {}", String::from_utf8_lossy(&body));
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Malformed webhook body: {e}");
            return reject(StatusCode::BAD_REQUEST, "Malformed body");
        }
    };

    for event in payload.text_events() {
        let messages = state.responder.respond(&event.text);
        if let Err(e) = line::deliver(state.sink.as_ref(), &event, &messages).await {
            metrics::DELIVERIES_FAILED_TOTAL.inc();
            tracing::error!("Failed to deliver reply: {e}");
        }
    }

    metrics::WEBHOOK_REQUESTS_TOTAL
        .with_label_values(&[StatusCode::OK.as_str()])
        .inc();
    (StatusCode::OK, "OK").into_response()
}
