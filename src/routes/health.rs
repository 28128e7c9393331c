// src/routes/health.rs
//! API health check endpoint for the maintenance dashboard.
//!
//! This module defines the `/health` route used by container orchestrators
//! and CI pipelines to verify that the service is running and able to respond
//! to HTTP requests. It follows the Explicit Module Boundary Pattern (EMBP):
//! - Internal to this file: endpoint handler(s) and related types
//! - Exports to the gateway (`mod.rs`): a subrouter containing the `/health` route

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
///
/// Returns a static JSON object indicating the API is reachable. It does not
/// touch the session store.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it can merge cleanly with the
/// gateway router regardless of the state type.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
