//! REST + SSE endpoints driving wizard sessions from the browser.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post, put},
};
use futures::Stream;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::registry::SessionRegistry;
use crate::error::{Error, SessionError};
use crate::wizard::{FieldValue, SubmitOutcome};

/// Build the wizard router.
pub fn wizard_routes(registry: Arc<SessionRegistry>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/flows", get(list_flows))
        .route("/api/flows/{flow}/sessions", post(open_session))
        .route("/api/sessions/{id}", get(get_snapshot).delete(close_session))
        .route("/api/sessions/{id}/info", get(get_info))
        .route("/api/sessions/{id}/section", get(render_section))
        .route("/api/sessions/{id}/fields/{key}", put(set_field))
        .route("/api/sessions/{id}/fields/{key}/toggle", post(toggle_item))
        .route("/api/sessions/{id}/next", post(next_section))
        .route("/api/sessions/{id}/previous", post(previous_section))
        .route("/api/sessions/{id}/jump/{index}", post(jump_to))
        .route("/api/sessions/{id}/submit", post(submit))
        .route("/api/sessions/{id}/events", get(events))
        .with_state(registry)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Session(_) => StatusCode::NOT_FOUND,
            Error::Wizard(_) => StatusCode::BAD_REQUEST,
            Error::Gateway(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, Error>;

#[derive(Debug, Deserialize)]
struct SetFieldRequest {
    value: FieldValue,
}

#[derive(Debug, Deserialize)]
struct ToggleRequest {
    item: String,
}

// ── Health & flows ──────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "intake-wizard"
    }))
}

async fn list_flows(State(registry): State<Arc<SessionRegistry>>) -> impl IntoResponse {
    Json(registry.flows())
}

// ── Sessions ────────────────────────────────────────────────────────────

async fn open_session(
    State(registry): State<Arc<SessionRegistry>>,
    Path(flow): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (id, controller) = registry.open(&flow).await?;
    let snapshot = controller.snapshot().await;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "session_id": id, "snapshot": snapshot })),
    ))
}

async fn get_snapshot(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let controller = registry.get(id).await?;
    Ok(Json(controller.snapshot().await))
}

async fn get_info(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(registry.info(id).await?))
}

async fn render_section(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let controller = registry.get(id).await?;
    Ok(Json(controller.render_active().await))
}

async fn close_session(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if registry.close(id).await {
        info!(session = %id, "Session abandoned");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(SessionError::NotFound { id }.into())
    }
}

// ── Edits ───────────────────────────────────────────────────────────────

async fn set_field(
    State(registry): State<Arc<SessionRegistry>>,
    Path((id, key)): Path<(Uuid, String)>,
    Json(req): Json<SetFieldRequest>,
) -> ApiResult<impl IntoResponse> {
    let controller = registry.get(id).await?;
    let outcome = controller.set_field(&key, req.value).await?;
    Ok(Json(json!({
        "outcome": outcome,
        "snapshot": controller.snapshot().await,
    })))
}

async fn toggle_item(
    State(registry): State<Arc<SessionRegistry>>,
    Path((id, key)): Path<(Uuid, String)>,
    Json(req): Json<ToggleRequest>,
) -> ApiResult<impl IntoResponse> {
    let controller = registry.get(id).await?;
    let outcome = controller.toggle_item(&key, &req.item).await?;
    Ok(Json(json!({
        "outcome": outcome,
        "snapshot": controller.snapshot().await,
    })))
}

// ── Navigation ──────────────────────────────────────────────────────────

async fn next_section(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let controller = registry.get(id).await?;
    let outcome = controller.go_to_next().await;
    Ok(Json(json!({
        "outcome": outcome,
        "snapshot": controller.snapshot().await,
    })))
}

async fn previous_section(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let controller = registry.get(id).await?;
    let outcome = controller.go_to_previous().await;
    Ok(Json(json!({
        "outcome": outcome,
        "snapshot": controller.snapshot().await,
    })))
}

async fn jump_to(
    State(registry): State<Arc<SessionRegistry>>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> ApiResult<impl IntoResponse> {
    let controller = registry.get(id).await?;
    let outcome = controller.jump_to(index).await?;
    Ok(Json(json!({
        "outcome": outcome,
        "snapshot": controller.snapshot().await,
    })))
}

// ── Submission ──────────────────────────────────────────────────────────

async fn submit(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let controller = registry.get(id).await?;
    let outcome = controller.submit().await;
    let snapshot = controller.snapshot().await;

    // A submitted session has nothing left to do
    if matches!(outcome, SubmitOutcome::Submitted { .. }) {
        registry.close(id).await;
    }

    Ok(Json(json!({
        "outcome": outcome,
        "snapshot": snapshot,
    })))
}

// ── Events ──────────────────────────────────────────────────────────────

async fn events(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let rx = registry.subscribe(id).await?;
    debug!(session = %id, "Event stream opened");

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(notice) => match Event::default().event("notice").json_data(&notice) {
                    Ok(event) => return Some((Ok::<_, Infallible>(event), rx)),
                    Err(e) => warn!(error = %e, "Failed to encode notice"),
                },
                Err(RecvError::Lagged(n)) => {
                    warn!(missed = n, "Event stream lagged behind notices");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
