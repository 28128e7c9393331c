//! Session lifecycle: `POST /sessions` starts one, `DELETE /sessions/{id}`
//! ends it. A new session has no flags set and the seed tickets loaded.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::session_not_found;
use crate::{Config, SessionStore};

// ---

pub fn router() -> Router<(SessionStore, Config)> {
    // ---
    Router::new()
        .route("/sessions", post(create))
        .route("/sessions/{id}", delete(remove))
}

#[derive(Serialize)]
struct SessionCreated {
    session_id: Uuid,
}

async fn create(State((sessions, _)): State<(SessionStore, Config)>) -> impl IntoResponse {
    // ---
    info!("POST /sessions");
    let session_id = sessions.create();
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

async fn remove(
    Path(id): Path<Uuid>,
    State((sessions, _)): State<(SessionStore, Config)>,
) -> Response {
    // ---
    info!("DELETE /sessions/{}", id);
    if sessions.remove(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        session_not_found(&id)
    }
}
