use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use serde_json::json;
use uuid::Uuid;

use crate::{DashboardError, Config, SessionStore};

mod actions;
mod dashboard;
mod export;
mod health;
mod sessions;

// ---

pub fn router(sessions: SessionStore, config: Config) -> Router {
    // ---
    Router::new()
        .merge(sessions::router())
        .merge(dashboard::router())
        .merge(actions::router())
        .merge(export::router())
        .merge(health::router())
        .with_state((sessions, config))
}

// ---

/// JSON error body shared by all routes.
fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn session_not_found(id: &Uuid) -> Response {
    // ---
    tracing::warn!("Unknown session {}", id);
    error_response(StatusCode::NOT_FOUND, format!("Unknown session: {id}"))
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        // ---
        let status = match self {
            DashboardError::UnknownMachine(_) | DashboardError::UnknownTicket(_) => StatusCode::NOT_FOUND,
            DashboardError::NoActiveAlert(_)
            | DashboardError::NoPredictedFailure(_)
            | DashboardError::NotApprovable { .. } => StatusCode::CONFLICT,
        };
        tracing::info!("Rejected: {}", self);
        error_response(status, self.to_string())
    }
}
