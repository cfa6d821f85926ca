//! API routes.
//!
//! Request handling stops at validation and response shaping: a handler
//! resolves the named host to its record, forwards the record plus any
//! per-request overrides to the core, and renders the outcome as JSON.
//! The core never sees a host *name* and never formats user-facing text.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use wakr_common::config::HostRecord;
use wakr_core::probe::ProbeTarget;
use wakr_core::wake::{self, WakeError};

use crate::server::AppState;

type AppStateArc = Arc<AppState>;

type ApiError = (StatusCode, Json<Value>);

pub fn api_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/status", get(status))
        .route("/wake", get(wake_host))
        .route("/hosts", get(list_hosts))
        .route("/logs", post(ingest_log))
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    name: Option<String>,
    timeout_ms: Option<u64>,
}

async fn status(
    State(state): State<AppStateArc>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Value>, ApiError> {
    let host = lookup(&state, query.name.as_deref())?;

    let timeout = query
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(state.defaults.probe_timeout);
    let target = ProbeTarget::new(host.ip)
        .with_interface(host.interface.clone())
        .with_timeout(timeout);

    debug!("checking status of '{}' ({})", host.name, host.ip);
    let online = state.probe.probe(&target).await;

    Ok(Json(json!({ "name": host.name, "online": online })))
}

#[derive(Debug, Deserialize)]
struct WakeQuery {
    name: Option<String>,
    retries: Option<u32>,
    delay_ms: Option<u64>,
    timeout_ms: Option<u64>,
}

async fn wake_host(
    State(state): State<AppStateArc>,
    Query(query): Query<WakeQuery>,
) -> Result<Json<Value>, ApiError> {
    let host = lookup(&state, query.name.as_deref())?.clone();

    let mut opts = state.defaults;
    if let Some(retries) = query.retries {
        opts.retries = retries;
    }
    if let Some(ms) = query.delay_ms {
        opts.delay = Duration::from_millis(ms);
    }
    if let Some(ms) = query.timeout_ms {
        opts.probe_timeout = Duration::from_millis(ms);
    }

    info!("starting wake sequence for '{}'", host.name);
    match wake::wake(&host, state.sender.as_ref(), state.probe.as_ref(), opts).await {
        Ok(()) => Ok(Json(json!({
            "message": format!("{} is awake and ready for remote access.", host.name)
        }))),
        Err(e @ WakeError::SendFailed { .. }) => {
            error!("wake of '{}' failed: {e}", host.name);
            Err((StatusCode::BAD_GATEWAY, error_body(&e.to_string())))
        }
        Err(e @ WakeError::Timeout { .. }) => {
            warn!("wake of '{}' timed out: {e}", host.name);
            Err((StatusCode::GATEWAY_TIMEOUT, error_body(&e.to_string())))
        }
    }
}

async fn list_hosts(State(state): State<AppStateArc>) -> Json<Vec<String>> {
    Json(state.registry.names())
}

/// Log-shipping endpoint for the polling UI: client-side events come in as
/// `{"level", "message", "data"?}` and are re-emitted through the server's
/// own subscriber.
async fn ingest_log(Json(body): Json<Value>) -> Result<StatusCode, ApiError> {
    let Some(entry) = body.as_object() else {
        return Err((StatusCode::BAD_REQUEST, error_body("invalid JSON payload")));
    };

    let level = entry.get("level").and_then(Value::as_str);
    let message = entry.get("message").and_then(Value::as_str);
    let (Some(level), Some(message)) = (level, message) else {
        return Err((
            StatusCode::BAD_REQUEST,
            error_body("missing 'level' or 'message' in log request"),
        ));
    };

    let data = entry.get("data").cloned().unwrap_or(Value::Null);
    match level {
        "error" => error!(target: "wakr::client", %data, "{message}"),
        "warn" => warn!(target: "wakr::client", %data, "{message}"),
        "debug" => debug!(target: "wakr::client", %data, "{message}"),
        _ => info!(target: "wakr::client", %data, "{message}"),
    }

    Ok(StatusCode::OK)
}

fn lookup<'a>(state: &'a AppState, name: Option<&str>) -> Result<&'a HostRecord, ApiError> {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return Err((
            StatusCode::BAD_REQUEST,
            error_body("missing 'name' query parameter"),
        ));
    };

    state.registry.get(name).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            error_body(&format!("unknown host: {name}")),
        )
    })
}

fn error_body(message: &str) -> Json<Value> {
    Json(json!({ "error": message }))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
