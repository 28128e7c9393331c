use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::session_not_found;
use crate::{Config, Dashboard, Role, SessionStore, Snapshot};

// ---

pub fn router() -> Router<(SessionStore, Config)> {
    // ---
    Router::new().route("/sessions/{id}/dashboard", get(handler))
}

/// Query parameters selecting what the dashboard shows
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Persona viewing the dashboard (default Operator)
    role: Option<Role>,
    /// Machine whose full series is included
    machine: Option<String>,
}

/// One render pass: re-simulate, derive, and return the dashboard.
async fn handler(
    Path(id): Path<Uuid>,
    Query(params): Query<DashboardQuery>,
    State((sessions, config)): State<(SessionStore, Config)>,
) -> Response {
    // ---
    debug!("GET /sessions/{}/dashboard - {:?}", id, params);

    let now = Utc::now();
    let role = params.role.unwrap_or_default();
    let rendered = sessions.with_session(&id, |session| {
        let snapshot = Snapshot::simulate(&config, &session.state, &mut session.rng, now);
        Dashboard::build(
            &config,
            &snapshot,
            &session.state,
            role,
            params.machine.as_deref(),
        )
    });

    match rendered {
        None => session_not_found(&id),
        Some(Err(e)) => e.into_response(),
        Some(Ok(dashboard)) => {
            debug!(
                "Rendered {} machines, {} alerts for {}",
                dashboard.machines.len(),
                dashboard.alerts.len(),
                role
            );
            (StatusCode::OK, Json(dashboard)).into_response()
        }
    }
}
