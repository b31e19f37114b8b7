// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use super::decode_valid;
use crate::{
    auth::{Owned, StoreError},
    error::{ApiError, HandlerError},
    models::{LogRequest, LogResponse},
    state::AppState,
    store::Log,
};

impl From<Log> for LogResponse {
    fn from(log: Log) -> Self {
        Self {
            id: log.id,
            set_id: log.set_id,
            exercise_id: log.exercise_id,
            weight: log.weight,
            reps: log.reps,
            order: log.logs_order,
        }
    }
}

fn log_not_found(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::not_found("log not found"),
        other => other.into(),
    }
}

/// Update weight, reps and order of a log.
#[utoipa::path(
    put,
    path = "/api/v1/logs/{logID}",
    params(("logID" = i64, Path, description = "Log id")),
    request_body = LogRequest,
    tag = "Logs",
    security(("bearer" = [])),
    responses(
        (status = 200, body = LogResponse),
        (status = 400, description = "Invalid payload or field problems"),
        (status = 403, description = "Caller does not own the log"),
        (status = 404, description = "Log not found"),
    )
)]
pub async fn update_log(
    State(state): State<AppState>,
    Owned(log_id): Owned<i64>,
    payload: Result<Json<LogRequest>, JsonRejection>,
) -> Result<Json<LogResponse>, HandlerError> {
    let input = decode_valid(payload)?;
    let log = state
        .store
        .update_log(log_id, input)
        .await
        .map_err(log_not_found)?;
    Ok(Json(log.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/logs/{logID}",
    params(("logID" = i64, Path, description = "Log id")),
    tag = "Logs",
    security(("bearer" = [])),
    responses(
        (status = 204),
        (status = 403, description = "Caller does not own the log"),
        (status = 404, description = "Log not found"),
    )
)]
pub async fn delete_log(
    State(state): State<AppState>,
    Owned(log_id): Owned<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_log(log_id)
        .await
        .map_err(log_not_found)?;
    tracing::info!(log_id, "log deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{NewLog, NewSession, NewSet},
        test_utils::TestContext,
    };
    use chrono::{DateTime, NaiveDate};

    async fn seeded_log(ctx: &TestContext) -> i64 {
        let (user_id, _, _) = ctx.login_user("usertest", false).await;
        let session = ctx
            .store
            .create_session(
                user_id,
                NewSession {
                    name: "legs".into(),
                    date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
                    start_timestamp: DateTime::from_timestamp(0, 0).unwrap(),
                    duration_minutes: 45,
                },
            )
            .await
            .unwrap();
        let set = ctx
            .store
            .create_set(
                session.id,
                NewSet {
                    exercise_id: 1,
                    set_order: 0,
                    rest_time: 60,
                },
            )
            .await
            .unwrap();
        ctx.store
            .create_log(
                set.id,
                NewLog {
                    exercise_id: 1,
                    weight: 50.0,
                    reps: 10,
                    order: 0,
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn update_keeps_exercise_of_parent_set() {
        let ctx = TestContext::new().await;
        let log_id = seeded_log(&ctx).await;

        let Json(updated) = update_log(
            State(ctx.state()),
            Owned(log_id),
            Ok(Json(LogRequest {
                exercise_id: 7,
                weight: -3.0,
                reps: 12,
                order: 2,
            })),
        )
        .await
        .unwrap();

        assert_eq!(updated.exercise_id, 1);
        assert_eq!(updated.weight, 0.0);
        assert_eq!(updated.reps, 12);
        assert_eq!(updated.order, 2);
    }

    #[tokio::test]
    async fn delete_then_missing() {
        let ctx = TestContext::new().await;
        let log_id = seeded_log(&ctx).await;

        let status = delete_log(State(ctx.state()), Owned(log_id)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = delete_log(State(ctx.state()), Owned(log_id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "log not found");
    }
}
