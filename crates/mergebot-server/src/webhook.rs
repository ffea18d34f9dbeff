//! Webhook endpoint.
//!
//! Verifies delivery signatures, filters event types, and dispatches push
//! events into the processor on their own task so GitHub gets its response
//! immediately. Task outcomes are observable through logs only; by the
//! time an event fails, the delivery has long been acknowledged.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use mergebot_core::{ClientResolver, PushEvent, ReleaseProcessor};
use tracing::{error, info, warn};

use crate::signature;

/// Shared webhook state: the configured secret and the event processor.
#[derive(Debug)]
pub struct AppState<R> {
    secret: Option<Vec<u8>>,
    processor: Arc<ReleaseProcessor<R>>,
}

// Manual impl: `R` itself need not be Clone behind the Arc.
impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            secret: self.secret.clone(),
            processor: Arc::clone(&self.processor),
        }
    }
}

impl<R> AppState<R> {
    /// Build webhook state. `secret` of `None` disables signature
    /// verification.
    pub fn new(secret: Option<String>, processor: ReleaseProcessor<R>) -> Self {
        Self {
            secret: secret.map(String::into_bytes),
            processor: Arc::new(processor),
        }
    }
}

/// `POST /` — receive a webhook delivery.
///
/// Push events are acknowledged with 200 as soon as they parse; processing
/// happens on a spawned task. Recognized-but-irrelevant event types get
/// 200 with no action; an unparseable push payload gets 500.
pub async fn handle<R: ClientResolver + 'static>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = &state.secret {
        let sig = headers
            .get("X-Hub-Signature-256")
            .and_then(|v| v.to_str().ok());
        match sig {
            Some(sig) if signature::verify(secret, &body, sig) => {}
            _ => {
                warn!("webhook signature verification failed");
                return StatusCode::UNAUTHORIZED;
            }
        }
    }

    let event_type = headers
        .get("X-GitHub-Event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    match event_type {
        "push" => match serde_json::from_slice::<PushEvent>(&body) {
            Ok(event) => {
                info!(
                    repo = %event.repository.name,
                    git_ref = %event.git_ref,
                    "received push event"
                );
                dispatch(Arc::clone(&state.processor), event);
                StatusCode::OK
            }
            Err(e) => {
                error!(error = %e, "received malformed push event");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        "ping" => StatusCode::OK,
        other => {
            info!(event = other, "received unregistered GitHub event");
            StatusCode::OK
        }
    }
}

/// Process the event on its own task so the HTTP response is not coupled
/// to reconciliation and PR creation.
fn dispatch<R: ClientResolver + 'static>(processor: Arc<ReleaseProcessor<R>>, event: PushEvent) {
    tokio::spawn(async move {
        let repo = event.repository.name.clone();
        match processor.process(&event).await {
            Ok(outcome) => info!(repo = %repo, outcome = ?outcome, "processed push event"),
            Err(e) => error!(
                repo = %repo,
                installation_id = ?event.installation_id(),
                error = %e,
                "failed to process push event"
            ),
        }
    });
}

/// `GET /healthz` — liveness probe.
pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "mergebot",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
