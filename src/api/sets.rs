// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{decode_valid, exercises::require_exercise};
use crate::{
    auth::{Owned, StoreError},
    error::{ApiError, HandlerError},
    models::{LogRequest, LogResponse, SetDetail, SetRequest, SetResponse},
    state::AppState,
    store::{InMemoryStore, Set},
};

impl From<Set> for SetResponse {
    fn from(set: Set) -> Self {
        Self {
            id: set.id,
            session_id: set.session_id,
            exercise_id: set.exercise_id,
            set_order: set.set_order,
            rest_time: set.rest_time,
        }
    }
}

pub(crate) async fn set_detail(store: &InMemoryStore, set: Set) -> SetDetail {
    let logs = store
        .logs_for_set(set.id)
        .await
        .into_iter()
        .map(LogResponse::from)
        .collect();
    SetDetail {
        set: set.into(),
        logs,
    }
}

/// Add a set to a session.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionID}/sets",
    params(("sessionID" = Uuid, Path, description = "Session id")),
    request_body = SetRequest,
    tag = "Sets",
    security(("bearer" = [])),
    responses(
        (status = 201, body = SetResponse),
        (status = 400, description = "Invalid payload or field problems"),
        (status = 403, description = "Caller does not own the session"),
        (status = 404, description = "Session or exercise not found"),
    )
)]
pub async fn create_set(
    State(state): State<AppState>,
    Owned(session_id): Owned<Uuid>,
    payload: Result<Json<SetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SetResponse>), HandlerError> {
    let input = decode_valid(payload)?;
    require_exercise(&state.store, input.exercise_id).await?;

    let set = state
        .store
        .create_set(session_id, input)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::not_found("session ID not found"),
            other => other.into(),
        })?;

    tracing::info!(session_id = %session_id, set_id = set.id, "set created");
    Ok((StatusCode::CREATED, Json(set.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/sets/{setID}",
    params(("setID" = i64, Path, description = "Set id")),
    tag = "Sets",
    security(("bearer" = [])),
    responses(
        (status = 200, body = SetDetail),
        (status = 400, description = "Malformed set id"),
        (status = 403, description = "Caller does not own the set"),
        (status = 404, description = "Set not found"),
    )
)]
pub async fn get_set(
    State(state): State<AppState>,
    Owned(set_id): Owned<i64>,
) -> Result<Json<SetDetail>, ApiError> {
    let set = state.store.set(set_id).await?;
    Ok(Json(set_detail(&state.store, set).await))
}

/// Replace a set. Its logs follow a change of exercise.
#[utoipa::path(
    put,
    path = "/api/v1/sets/{setID}",
    params(("setID" = i64, Path, description = "Set id")),
    request_body = SetRequest,
    tag = "Sets",
    security(("bearer" = [])),
    responses(
        (status = 204),
        (status = 400, description = "Invalid payload or field problems"),
        (status = 403, description = "Caller does not own the set"),
        (status = 404, description = "Set or exercise not found"),
    )
)]
pub async fn update_set(
    State(state): State<AppState>,
    Owned(set_id): Owned<i64>,
    payload: Result<Json<SetRequest>, JsonRejection>,
) -> Result<StatusCode, HandlerError> {
    let input = decode_valid(payload)?;
    require_exercise(&state.store, input.exercise_id).await?;

    state.store.update_set(set_id, input).await?;
    tracing::info!(set_id, "set updated");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/v1/sets/{setID}",
    params(("setID" = i64, Path, description = "Set id")),
    tag = "Sets",
    security(("bearer" = [])),
    responses(
        (status = 204),
        (status = 403, description = "Caller does not own the set"),
        (status = 404, description = "Set not found"),
    )
)]
pub async fn delete_set(
    State(state): State<AppState>,
    Owned(set_id): Owned<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_set(set_id).await?;
    tracing::info!(set_id, "set deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Record a log under a set.
#[utoipa::path(
    post,
    path = "/api/v1/sets/{setID}/logs",
    params(("setID" = i64, Path, description = "Set id")),
    request_body = LogRequest,
    tag = "Logs",
    security(("bearer" = [])),
    responses(
        (status = 201, body = LogResponse),
        (status = 400, description = "Invalid payload or field problems"),
        (status = 403, description = "Caller does not own the set"),
        (status = 404, description = "Set or exercise not found"),
    )
)]
pub async fn create_log(
    State(state): State<AppState>,
    Owned(set_id): Owned<i64>,
    payload: Result<Json<LogRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LogResponse>), HandlerError> {
    let input = decode_valid(payload)?;
    require_exercise(&state.store, input.exercise_id).await?;

    let log = state
        .store
        .create_log(set_id, input)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::not_found("set ID not found"),
            other => other.into(),
        })?;

    tracing::info!(set_id, log_id = log.id, "log created");
    Ok((StatusCode::CREATED, Json(log.into())))
}
