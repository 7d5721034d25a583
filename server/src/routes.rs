use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use docket_proto::{ActionResult, CreateEvent, DeleteEvent, EditEvent, EventId, EventRecord, FailureCode, FieldErrors};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{actions, state::ServerState};

/// Body of `PUT /events/{id}`. The id comes from the path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventChanges {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
}

pub async fn health() -> &'static str { "ok" }

pub async fn list_events(State(state): State<ServerState>) -> Result<Json<Vec<EventRecord>>, StatusCode> {
    match state.actions().list().await {
        Ok(records) => Ok(Json(records)),
        Err(e) => {
            error!("list failed: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn create_event(State(state): State<ServerState>, body: Result<Json<CreateEvent>, JsonRejection>) -> Response {
    let input = match body {
        Ok(Json(input)) => input,
        Err(rejection) => return unreadable::<EventRecord>(rejection),
    };
    let result = state.actions().create(input).await;
    respond(if result.is_success() { StatusCode::CREATED } else { status_for(&result) }, result)
}

pub async fn edit_event(State(state): State<ServerState>, Path(id): Path<String>, body: Result<Json<EventChanges>, JsonRejection>) -> Response {
    let Ok(id) = EventId::parse(&id) else { return respond(StatusCode::NOT_FOUND, ActionResult::<EventRecord>::not_found(actions::NOT_FOUND)) };
    let changes = match body {
        Ok(Json(changes)) => changes,
        Err(rejection) => return unreadable::<EventRecord>(rejection),
    };
    let result = state.actions().edit(EditEvent::new(id, changes.title, changes.body, changes.event_date)).await;
    respond(status_for(&result), result)
}

pub async fn delete_event(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    let Ok(id) = EventId::parse(&id) else { return respond(StatusCode::NOT_FOUND, ActionResult::<()>::not_found(actions::NOT_FOUND)) };
    let result = state.actions().delete(DeleteEvent::new(id)).await;
    respond(status_for(&result), result)
}

fn status_for<T>(result: &ActionResult<T>) -> StatusCode {
    match result {
        ActionResult::Success { .. } => StatusCode::OK,
        ActionResult::Failure { code: Some(FailureCode::NotFound), .. } => StatusCode::NOT_FOUND,
        ActionResult::Failure { code: Some(FailureCode::Internal), .. } => StatusCode::INTERNAL_SERVER_ERROR,
        ActionResult::Failure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn respond<T: Serialize>(status: StatusCode, result: ActionResult<T>) -> Response { (status, Json(result)).into_response() }

fn unreadable<T: Serialize>(rejection: JsonRejection) -> Response {
    warn!("rejected request body: {rejection}");
    let errors = FieldErrors::new().with_record(rejection.body_text());
    respond(StatusCode::UNPROCESSABLE_ENTITY, ActionResult::<T>::invalid(actions::INVALID, errors))
}
