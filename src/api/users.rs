// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints: signup, login and profile reads.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use super::decode_valid;
use crate::{
    auth::{hash_password, verify_password, Auth, RefreshTokenStore, StoreError},
    error::{ApiError, HandlerError},
    models::{
        CreateUserRequest, LoginRequest, LoginResponse, UserResponse, UsersResponse, DATE_LAYOUT,
    },
    state::AppState,
    store::{User, UserDraft},
};

const BAD_LOGIN: &str = "incorrect username/password";

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            country: user.country,
            created_at: user.created_at.format(DATE_LAYOUT).to_string(),
            birthday: user.birthday.map(|b| b.format(DATE_LAYOUT).to_string()),
        }
    }
}

/// Argon2 is CPU bound; keep it off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(ApiError::internal)
}

/// Register a new user.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    tag = "Users",
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid payload or field problems"),
        (status = 409, description = "Username is already in use"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), HandlerError> {
    let new_user = decode_valid(payload)?;

    let password = new_user.password;
    let hashed_password = blocking(move || hash_password(&password))
        .await?
        .map_err(ApiError::internal)?;

    let user = state
        .store
        .create_user(UserDraft {
            username: new_user.username,
            hashed_password,
            birthday: new_user.birthday,
            country: new_user.country,
            is_admin: None,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::conflict("username is already in use"),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchange credentials for an access token and a refresh token.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    tag = "Users",
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Invalid payload or field problems"),
        (status = 401, description = "Incorrect username/password"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, HandlerError> {
    let credentials = decode_valid(payload)?;

    let user = match state.store.user_by_username(&credentials.username).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            tracing::warn!(username = %credentials.username, "login failed: unknown user");
            return Err(ApiError::unauthorized(BAD_LOGIN).into());
        }
        Err(e) => return Err(e.into()),
    };

    let password = credentials.password;
    let stored_hash = user.hashed_password.clone();
    let matches = blocking(move || verify_password(&password, &stored_hash))
        .await?
        .map_err(ApiError::internal)?;
    if !matches {
        tracing::warn!(user_id = %user.id, "login failed: wrong password");
        return Err(ApiError::unauthorized(BAD_LOGIN).into());
    }

    let issuer = state.issuer();
    let token = issuer.issue_access_token(user.id).map_err(ApiError::internal)?;
    let (refresh_token, expires_at) = issuer
        .issue_refresh_token(Utc::now())
        .map_err(ApiError::internal)?;
    state
        .store
        .create(&refresh_token, user.id, expires_at)
        .await?;

    tracing::info!(user_id = %user.id, "login successful");
    Ok(Json(LoginResponse {
        username: user.username,
        user_id: user.id,
        token,
        refresh_token,
    }))
}

/// Read one user's public profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Auth(_identity): Auth,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = Uuid::parse_str(&id).map_err(|_| ApiError::not_found("user not found"))?;
    let user = state.store.user(user_id).await.map_err(|e| match e {
        StoreError::NotFound => ApiError::not_found("user not found"),
        other => other.into(),
    })?;
    Ok(Json(user.into()))
}

/// List every user. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All users", body = UsersResponse),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Admin access required"),
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Json<UsersResponse> {
    let users = state.store.users().await;
    Json(UsersResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
    })
}
