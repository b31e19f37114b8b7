// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Exercise catalogue. Reads are open to any authenticated user, writes to
//! admins.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use super::decode_valid;
use crate::{
    auth::StoreError,
    error::{ApiError, HandlerError},
    models::{CreateExerciseRequest, ExerciseResponse, ExercisesResponse},
    state::AppState,
    store::{Exercise, InMemoryStore},
};

impl From<Exercise> for ExerciseResponse {
    fn from(exercise: Exercise) -> Self {
        Self {
            id: exercise.id,
            name: exercise.name,
            description: exercise.description,
        }
    }
}

/// Fails with 404 when the catalogue has no such exercise.
pub(crate) async fn require_exercise(
    store: &InMemoryStore,
    exercise_id: i32,
) -> Result<Exercise, ApiError> {
    store.exercise(exercise_id).await.map_err(|e| match e {
        StoreError::NotFound => {
            tracing::warn!(exercise_id, "exercise not found");
            ApiError::not_found("exercise ID not found")
        }
        other => other.into(),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/exercises",
    tag = "Exercises",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ExercisesResponse),
        (status = 401, description = "Missing or invalid credentials"),
    )
)]
pub async fn list_exercises(State(state): State<AppState>) -> Json<ExercisesResponse> {
    let exercises = state.store.exercises().await;
    Json(ExercisesResponse {
        exercises: exercises.into_iter().map(ExerciseResponse::from).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/exercises/{id}",
    params(("id" = i32, Path, description = "Exercise id")),
    tag = "Exercises",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ExerciseResponse),
        (status = 400, description = "Malformed exercise id"),
        (status = 404, description = "Exercise not found"),
    )
)]
pub async fn get_exercise(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExerciseResponse>, ApiError> {
    let exercise_id: i32 = id
        .parse()
        .map_err(|_| ApiError::bad_request("invalid exercise id format"))?;
    let exercise = state.store.exercise(exercise_id).await.map_err(|e| match e {
        StoreError::NotFound => ApiError::not_found("exercise id not found"),
        other => other.into(),
    })?;
    Ok(Json(exercise.into()))
}

/// Add an exercise to the catalogue. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/exercises",
    request_body = CreateExerciseRequest,
    tag = "Exercises",
    security(("bearer" = [])),
    responses(
        (status = 201, body = ExerciseResponse),
        (status = 400, description = "Invalid payload or field problems"),
        (status = 403, description = "Admin access required"),
    )
)]
pub async fn create_exercise(
    State(state): State<AppState>,
    payload: Result<Json<CreateExerciseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ExerciseResponse>), HandlerError> {
    let input = decode_valid(payload)?;
    let exercise = state.store.create_exercise(input).await;
    tracing::info!(exercise_id = exercise.id, "exercise created");
    Ok((StatusCode::CREATED, Json(exercise.into())))
}
