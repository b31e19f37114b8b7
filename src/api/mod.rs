// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::{
    auth::{admin_only, authenticate, verify_ownership, ACCESS_TOKEN_HEADER},
    error::{ApiError, HandlerError},
    models::{
        CreateExerciseRequest, CreateUserRequest, ExerciseResponse, ExercisesResponse,
        LoginRequest, LoginResponse, LogRequest, LogResponse, SessionDetail, SessionRequest,
        SessionResponse, SessionsResponse, SetDetail, SetRequest, SetResponse, UserResponse,
        UsersResponse, Validate,
    },
    state::AppState,
};

pub mod exercises;
pub mod health;
pub mod logs;
pub mod sessions;
pub mod sets;
pub mod users;

/// Unwrap a JSON body and run its field checks.
pub(crate) fn decode_valid<T: Validate>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T::Valid, HandlerError> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::debug!(%rejection, "request body rejected");
        ApiError::bad_request("invalid payload")
    })?;
    Ok(body.validate()?)
}

pub fn router(state: AppState) -> Router {
    let gates = state.gates.clone();

    let session_owner = {
        let store = state.store.clone();
        gates.ownership::<Uuid, _, _>("sessionID", move |id| {
            let store = store.clone();
            async move { store.session_owner(id).await }
        })
    };
    let set_owner = {
        let store = state.store.clone();
        gates.ownership::<i64, _, _>("setID", move |id| {
            let store = store.clone();
            async move { store.set_owner(id).await }
        })
    };
    let log_owner = {
        let store = state.store.clone();
        gates.ownership::<i64, _, _>("logID", move |id| {
            let store = store.clone();
            async move { store.log_owner(id).await }
        })
    };

    let public_routes = Router::new()
        .route("/login", post(users::login))
        .route("/users", post(users::create_user));

    let member_routes = Router::new()
        .route("/users/{id}", get(users::get_user))
        .route(
            "/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route("/exercises", get(exercises::list_exercises))
        .route("/exercises/{id}", get(exercises::get_exercise));

    let admin_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/exercises", post(exercises::create_exercise))
        .route_layer(from_fn_with_state(gates.clone(), admin_only));

    let session_routes = Router::new()
        .route(
            "/sessions/{sessionID}",
            get(sessions::get_session)
                .put(sessions::update_session)
                .delete(sessions::delete_session),
        )
        .route("/sessions/{sessionID}/sets", post(sets::create_set))
        .route_layer(from_fn_with_state(session_owner, verify_ownership::<Uuid>));

    let set_routes = Router::new()
        .route(
            "/sets/{setID}",
            get(sets::get_set)
                .put(sets::update_set)
                .delete(sets::delete_set),
        )
        .route("/sets/{setID}/logs", post(sets::create_log))
        .route_layer(from_fn_with_state(set_owner, verify_ownership::<i64>));

    let log_routes = Router::new()
        .route(
            "/logs/{logID}",
            put(logs::update_log).delete(logs::delete_log),
        )
        .route_layer(from_fn_with_state(log_owner, verify_ownership::<i64>));

    // authenticate is layered last so it wraps every inner gate
    let protected_routes = Router::new()
        .merge(member_routes)
        .merge(admin_routes)
        .merge(session_routes)
        .merge(set_routes)
        .merge(log_routes)
        .route_layer(from_fn_with_state(gates, authenticate));

    let v1_routes = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state);

    Router::new()
        .nest("/api/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    ACCESS_TOKEN_HEADER,
                    "Access token as `Bearer <jwt>`. Pair with `x-refresh-token: Token <refresh>` \
                     to be reissued an access token once it expires.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        users::create_user,
        users::login,
        users::get_user,
        users::list_users,
        sessions::create_session,
        sessions::list_sessions,
        sessions::get_session,
        sessions::update_session,
        sessions::delete_session,
        sets::create_set,
        sets::get_set,
        sets::update_set,
        sets::delete_set,
        sets::create_log,
        logs::update_log,
        logs::delete_log,
        exercises::list_exercises,
        exercises::get_exercise,
        exercises::create_exercise,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            CreateUserRequest,
            UserResponse,
            UsersResponse,
            LoginRequest,
            LoginResponse,
            SessionRequest,
            SessionResponse,
            SessionDetail,
            SessionsResponse,
            SetRequest,
            SetResponse,
            SetDetail,
            LogRequest,
            LogResponse,
            CreateExerciseRequest,
            ExerciseResponse,
            ExercisesResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Signup, login and profiles"),
        (name = "Sessions", description = "Workout sessions"),
        (name = "Sets", description = "Sets within a session"),
        (name = "Logs", description = "Logged repetitions within a set"),
        (name = "Exercises", description = "Exercise catalogue"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
