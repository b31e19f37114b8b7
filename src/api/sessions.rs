// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{decode_valid, sets::set_detail};
use crate::{
    auth::{Auth, Owned, StoreError},
    error::{ApiError, HandlerError},
    models::{SessionDetail, SessionRequest, SessionResponse, SessionsResponse, DATE_LAYOUT},
    state::AppState,
    store::{InMemoryStore, Session},
};

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            name: session.name,
            date: session.date.format(DATE_LAYOUT).to_string(),
            start_timestamp: session.start_timestamp.timestamp(),
            duration_minutes: session.duration_minutes,
        }
    }
}

pub(crate) async fn session_detail(store: &InMemoryStore, session: Session) -> SessionDetail {
    let mut sets = Vec::new();
    for set in store.sets_for_session(session.id).await {
        sets.push(set_detail(store, set).await);
    }
    SessionDetail {
        session: session.into(),
        sets,
    }
}

fn session_not_found(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::not_found("session not found"),
        other => other.into(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    request_body = SessionRequest,
    tag = "Sessions",
    security(("bearer" = [])),
    responses(
        (status = 201, body = SessionResponse),
        (status = 400, description = "Invalid payload or field problems"),
        (status = 401, description = "Missing or invalid credentials"),
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    Auth(identity): Auth,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), HandlerError> {
    let input = decode_valid(payload)?;
    let session = state
        .store
        .create_session(identity.user_id(), input)
        .await?;

    tracing::info!(user_id = %identity.user_id(), session_id = %session.id, "session created");
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// The caller's sessions, newest first, with sets and logs.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "Sessions",
    security(("bearer" = [])),
    responses(
        (status = 200, body = SessionsResponse),
        (status = 401, description = "Missing or invalid credentials"),
    )
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    Auth(identity): Auth,
) -> Json<SessionsResponse> {
    let sessions = state.store.sessions_for_user(identity.user_id()).await;
    let total = sessions.len();

    let mut details = Vec::with_capacity(total);
    for session in sessions {
        details.push(session_detail(&state.store, session).await);
    }
    Json(SessionsResponse {
        sessions: details,
        total,
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{sessionID}",
    params(("sessionID" = Uuid, Path, description = "Session id")),
    tag = "Sessions",
    security(("bearer" = [])),
    responses(
        (status = 200, body = SessionDetail),
        (status = 400, description = "Malformed session id"),
        (status = 403, description = "Caller does not own the session"),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Owned(session_id): Owned<Uuid>,
) -> Result<Json<SessionDetail>, ApiError> {
    let session = state
        .store
        .session(session_id)
        .await
        .map_err(session_not_found)?;
    Ok(Json(session_detail(&state.store, session).await))
}

#[utoipa::path(
    put,
    path = "/api/v1/sessions/{sessionID}",
    params(("sessionID" = Uuid, Path, description = "Session id")),
    request_body = SessionRequest,
    tag = "Sessions",
    security(("bearer" = [])),
    responses(
        (status = 200, body = SessionResponse),
        (status = 400, description = "Invalid payload or field problems"),
        (status = 403, description = "Caller does not own the session"),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn update_session(
    State(state): State<AppState>,
    Owned(session_id): Owned<Uuid>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, HandlerError> {
    let input = decode_valid(payload)?;
    let session = state
        .store
        .update_session(session_id, input)
        .await
        .map_err(session_not_found)?;
    Ok(Json(session.into()))
}

/// Delete a session together with its sets and logs.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{sessionID}",
    params(("sessionID" = Uuid, Path, description = "Session id")),
    tag = "Sessions",
    security(("bearer" = [])),
    responses(
        (status = 204),
        (status = 403, description = "Caller does not own the session"),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Owned(session_id): Owned<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_session(session_id)
        .await
        .map_err(session_not_found)?;
    tracing::info!(session_id = %session_id, "session deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::NewSession, test_utils::TestContext};
    use chrono::{DateTime, NaiveDate};

    fn request(name: &str) -> SessionRequest {
        SessionRequest {
            name: name.into(),
            date: "2025-03-14".into(),
            start_timestamp: 1_741_942_800,
            duration_minutes: 60,
        }
    }

    #[tokio::test]
    async fn create_and_list_sessions() {
        let ctx = TestContext::new().await;
        let (user_id, _, _) = ctx.login_user("usertest", false).await;
        let state = ctx.state();

        // handlers only see identities minted by the gate
        let identity = crate::auth::Identity::new(user_id);
        let (status, Json(created)) = create_session(
            State(state.clone()),
            Auth(identity),
            Ok(Json(request("legs"))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.name, "legs");
        assert_eq!(created.date, "2025-03-14");
        assert_eq!(created.start_timestamp, 1_741_942_800);

        let Json(listing) = list_sessions(State(state), Auth(identity)).await;
        assert_eq!(listing.total, 1);
        assert_eq!(listing.sessions[0].session, created);
        assert!(listing.sessions[0].sets.is_empty());
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let ctx = TestContext::new().await;
        let (user_id, _, _) = ctx.login_user("usertest", false).await;
        let session = ctx
            .store
            .create_session(
                user_id,
                NewSession {
                    name: "legs".into(),
                    date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
                    start_timestamp: DateTime::from_timestamp(0, 0).unwrap(),
                    duration_minutes: 10,
                },
            )
            .await
            .unwrap();

        let Json(updated) = update_session(
            State(ctx.state()),
            Owned(session.id),
            Ok(Json(request("push"))),
        )
        .await
        .unwrap();
        assert_eq!(updated.id, session.id);
        assert_eq!(updated.name, "push");
        assert_eq!(updated.duration_minutes, 60);
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let ctx = TestContext::new().await;
        let err = get_session(State(ctx.state()), Owned(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "session not found");

        let err = delete_session(State(ctx.state()), Owned(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
