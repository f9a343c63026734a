//! Minimal HTTP surface: `/healthz` liveness and a plain status endpoint,
//! following `wkmp-ap::server`'s shape. The three control RPCs (§4.10) are
//! not wired to HTTP here; wiring an actual transport for them is out of
//! scope per the spec's Non-goals.

use crate::director::Director;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

pub async fn run(bind_addr: &str, director: Arc<Director>) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(director);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(bind_addr, "director HTTP surface listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn status(State(director): State<Arc<Director>>) -> Json<serde_json::Value> {
    let mounts = director.registry().active_mounts().await;
    Json(json!({
        "service": "wkmp-pd",
        "version": env!("CARGO_PKG_VERSION"),
        "active_mounts": mounts.len(),
    }))
}
