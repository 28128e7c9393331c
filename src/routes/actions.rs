//! `POST /sessions/{id}/actions`: apply one button press.
//!
//! The action is evaluated against a fresh render of the session, so
//! per-alert actions see the alerts the user is looking at. The mutation is
//! visible on the next dashboard request.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::session_not_found;
use crate::{Action, Config, DashboardError, Outcome, SessionStore, Snapshot};

// ---

pub fn router() -> Router<(SessionStore, Config)> {
    // ---
    Router::new().route("/sessions/{id}/actions", post(handler))
}

#[derive(Serialize)]
struct ActionResponse {
    changed: bool,
    message: String,
    outcome: Outcome,
}

async fn handler(
    Path(id): Path<Uuid>,
    State((sessions, config)): State<(SessionStore, Config)>,
    Json(action): Json<Action>,
) -> Response {
    // ---
    info!("POST /sessions/{}/actions - {}", id, action.name());

    let result = sessions.with_session(&id, |session| {
        let snapshot = Snapshot::simulate(&config, &session.state, &mut session.rng, Utc::now());
        let machines = config.machines();
        let ctx = snapshot.action_context(&machines);
        let (next, outcome) = session.state.apply(&action, &ctx)?;
        session.state = next;
        Ok::<_, DashboardError>(outcome)
    });

    match result {
        None => session_not_found(&id),
        Some(Err(e)) => e.into_response(),
        Some(Ok(outcome)) => {
            let message = outcome.message();
            info!("{}", message);
            let body = ActionResponse {
                changed: outcome.changed(),
                message,
                outcome,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
    }
}
