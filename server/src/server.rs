//! HTTP server wiring.
//!
//! Builds the router from the configured host registry and probe strategy
//! and serves it. Everything request-scoped lives in [`routes`]; this module
//! only assembles shared state and the listener.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use wakr_common::config::HostRegistry;
use wakr_core::probe::{LivenessProbe, ProbeStrategy};
use wakr_core::wake::{MagicPacketSender, UdpBroadcastSender, WakeOptions};

use crate::routes;

/// Environment variable overriding the listen port.
pub const PORT_ENV: &str = "WAKR_PORT";

pub const DEFAULT_PORT: u16 = 8080;

/// State shared across handlers. Built once at startup; read-only afterwards.
pub struct AppState {
    pub registry: HostRegistry,
    pub probe: Box<dyn LivenessProbe>,
    pub sender: Box<dyn MagicPacketSender>,
    /// Wake/probe parameters used when a request does not override them.
    pub defaults: WakeOptions,
}

impl AppState {
    pub fn new(registry: HostRegistry, strategy: ProbeStrategy, probe_port: u16) -> Self {
        Self {
            registry,
            probe: strategy.build(probe_port),
            sender: Box::new(UdpBroadcastSender::default()),
            defaults: WakeOptions::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: WakeOptions) -> Self {
        self.defaults = defaults;
        self
    }
}

/// Assembles the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        // The polling UI is served from another origin.
        .layer(CorsLayer::permissive())
}

/// Binds the listener and serves until the process is stopped.
pub async fn run(state: AppState, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding http listener on {addr}"))?;
    info!("listening on http://{addr}");

    axum::serve(listener, app(state)).await?;
    Ok(())
}

/// Listen port from [`PORT_ENV`], falling back to [`DEFAULT_PORT`].
pub fn port_from_env() -> u16 {
    std::env::var(PORT_ENV)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}
