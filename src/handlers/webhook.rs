use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::services::dispatcher;
use crate::AppState;

/// Ingest one webhook notification.
///
/// Always acknowledges with 200 before any sink write runs: the upstream
/// platform retries on non-success responses, and a retry storm against a
/// flaky sink is worse than a dropped row. The dispatch is spawned as a
/// detached task whose only failure channel is the log.
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    body: Bytes,
) -> Json<Value> {
    let payload = parse_payload(&body);
    info!(provider, "received webhook notification");

    tokio::spawn(async move {
        dispatcher::dispatch(state.sink.as_ref(), &payload).await;
    });

    Json(json!({ "ok": true }))
}

/// Malformed or absent bodies are treated as the empty payload rather than
/// rejected; the notification still flows through classification.
fn parse_payload(body: &Bytes) -> Value {
    match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            if !body.is_empty() {
                warn!(error = %e, "unparseable webhook body, treating as empty payload");
            }
            Value::Object(serde_json::Map::new())
        }
    }
}
