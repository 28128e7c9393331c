//! CSV downloads for the maintenance-ticket log and the summary report.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::session_not_found;
use crate::export::{summary_csv, tickets_csv};
use crate::{Config, SessionStore, Snapshot};

// ---

pub fn router() -> Router<(SessionStore, Config)> {
    // ---
    Router::new()
        .route("/sessions/{id}/export/tickets.csv", get(tickets))
        .route("/sessions/{id}/export/summary.csv", get(summary))
}

fn csv_response(filename: &str, body: String) -> Response {
    // ---
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

async fn tickets(
    Path(id): Path<Uuid>,
    State((sessions, _)): State<(SessionStore, Config)>,
) -> Response {
    // ---
    info!("GET /sessions/{}/export/tickets.csv", id);
    match sessions.with_session(&id, |session| tickets_csv(&session.state.tickets)) {
        Some(body) => csv_response("maintenance_tickets.csv", body),
        None => session_not_found(&id),
    }
}

async fn summary(
    Path(id): Path<Uuid>,
    State((sessions, config)): State<(SessionStore, Config)>,
) -> Response {
    // ---
    info!("GET /sessions/{}/export/summary.csv", id);
    let body = sessions.with_session(&id, |session| {
        let snapshot = Snapshot::simulate(&config, &session.state, &mut session.rng, Utc::now());
        summary_csv(&snapshot.summary())
    });
    match body {
        Some(body) => csv_response("summary_report.csv", body),
        None => session_not_found(&id),
    }
}
