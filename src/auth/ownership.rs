// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-route ownership checks.
//!
//! An [`OwnershipGate`] reads one path parameter, parses it into the
//! resource's id type, asks a resolver for the owning user and compares it
//! to the authenticated caller. On success the parsed id is stored in the
//! [`RequestContext`] so handlers can take it through
//! [`Owned`](super::Owned) without parsing the path again.

use std::{collections::HashMap, fmt::Display, future::Future, sync::Arc, time::Duration};

use axum::{
    extract::{rejection::PathRejection, Path, Request, State},
    middleware::Next,
    response::Response,
};
use futures_util::{future::BoxFuture, FutureExt};
use uuid::Uuid;

use super::{
    claims::{RequestContext, ResourceId},
    error::AuthError,
    middleware::{bounded, reject},
    store::{StoreError, StoreResult},
};

/// Id types a resource can be addressed by.
pub trait OwnedId:
    Copy + Display + Into<ResourceId> + TryFrom<ResourceId> + Send + Sync + 'static
{
    fn parse_path(raw: &str) -> Option<Self>;
}

impl OwnedId for i64 {
    fn parse_path(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl OwnedId for Uuid {
    fn parse_path(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok()
    }
}

type OwnerResolver<Id> = Arc<dyn Fn(Id) -> BoxFuture<'static, StoreResult<Uuid>> + Send + Sync>;

/// Ownership check bound to one path parameter and one owner lookup.
pub struct OwnershipGate<Id> {
    param: &'static str,
    resolver: OwnerResolver<Id>,
    timeout: Duration,
}

impl<Id> Clone for OwnershipGate<Id> {
    fn clone(&self) -> Self {
        Self {
            param: self.param,
            resolver: self.resolver.clone(),
            timeout: self.timeout,
        }
    }
}

impl<Id: OwnedId> OwnershipGate<Id> {
    pub fn new<F, Fut>(param: &'static str, timeout: Duration, resolver: F) -> Self
    where
        F: Fn(Id) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StoreResult<Uuid>> + Send + 'static,
    {
        Self {
            param,
            resolver: Arc::new(move |id| resolver(id).boxed()),
            timeout,
        }
    }

    pub fn param(&self) -> &'static str {
        self.param
    }

    /// Parse `raw` and check that `user_id` owns the resource it names.
    pub async fn authorize(&self, user_id: Uuid, raw: &str) -> Result<Id, AuthError> {
        let id = Id::parse_path(raw)
            .ok_or_else(|| AuthError::InvalidPathParam(self.param.to_string()))?;

        let owner = match bounded(self.timeout, "owner lookup", (self.resolver)(id)).await? {
            Ok(owner) => owner,
            Err(StoreError::NotFound) => return Err(AuthError::ResourceNotFound),
            Err(e) => {
                return Err(AuthError::internal(format!(
                    "owner lookup for {} {id}: {e}",
                    self.param
                )))
            }
        };

        if owner != user_id {
            tracing::debug!(param = self.param, %id, %user_id, %owner, "ownership mismatch");
            return Err(AuthError::NotOwner);
        }
        Ok(id)
    }
}

/// Ownership middleware function. Must run after
/// [`authenticate`](super::authenticate), as a `route_layer` so the path is
/// already matched.
pub async fn verify_ownership<Id: OwnedId>(
    State(gate): State<OwnershipGate<Id>>,
    params: Result<Path<HashMap<String, String>>, PathRejection>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(mut context) = request.extensions().get::<RequestContext>().cloned() else {
        return reject(
            "ownership",
            AuthError::internal("ownership gate reached without an authenticated identity"),
        );
    };

    let raw = match params {
        Ok(Path(mut params)) => match params.remove(gate.param) {
            Some(raw) => raw,
            None => {
                return reject(
                    "ownership",
                    AuthError::internal(format!("route has no `{}` path parameter", gate.param)),
                )
            }
        },
        Err(rejection) => {
            tracing::debug!(param = gate.param, %rejection, "path extraction failed");
            return reject("ownership", AuthError::InvalidPathParam(gate.param.to_string()));
        }
    };

    match gate.authorize(context.user_id(), &raw).await {
        Ok(id) => {
            context.resource_id = Some(id.into());
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => reject("ownership", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{authenticate, AuthGates, Owned},
        test_utils::{body_json, TestContext},
    };
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    async fn echo_set(Owned(id): Owned<i64>) -> String {
        id.to_string()
    }

    async fn echo_session(Owned(id): Owned<Uuid>) -> String {
        id.to_string()
    }

    fn set_app(gates: &AuthGates, owner: Uuid, calls: Arc<AtomicUsize>) -> Router {
        let gate = gates.ownership("setID", move |id: i64| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                match id {
                    1 => Ok(owner),
                    2 => Ok(Uuid::new_v4()),
                    3 => Err(StoreError::Internal("connection reset".into())),
                    _ => Err(StoreError::NotFound),
                }
            }
        });

        Router::new()
            .route("/sets/{setID}", get(echo_set))
            .route_layer(from_fn_with_state(gate, verify_ownership::<i64>))
            .route_layer(from_fn_with_state(gates.clone(), authenticate))
    }

    fn get_with(uri: &str, access: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri(uri)
            .header("Auth", format!("Bearer {access}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn owner_reaches_handler_with_parsed_id() {
        let ctx = TestContext::new().await;
        let (user_id, access, _) = ctx.login_user("usertest", false).await;
        let calls = Arc::new(AtomicUsize::new(0));

        let response = set_app(&ctx.gates, user_id, calls.clone())
            .oneshot(get_with("/sets/1", &access))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, "1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn other_owner_is_forbidden() {
        let ctx = TestContext::new().await;
        let (user_id, access, _) = ctx.login_user("usertest", false).await;

        let response = set_app(&ctx.gates, user_id, Arc::default())
            .oneshot(get_with("/sets/2", &access))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "user is not owner"})
        );
    }

    #[tokio::test]
    async fn missing_resource_is_not_found() {
        let ctx = TestContext::new().await;
        let (user_id, access, _) = ctx.login_user("usertest", false).await;

        let response = set_app(&ctx.gates, user_id, Arc::default())
            .oneshot(get_with("/sets/99", &access))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "not found");
    }

    #[tokio::test]
    async fn resolver_failure_is_internal_error() {
        let ctx = TestContext::new().await;
        let (user_id, access, _) = ctx.login_user("usertest", false).await;

        let response = set_app(&ctx.gates, user_id, Arc::default())
            .oneshot(get_with("/sets/3", &access))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "something went wrong");
    }

    #[tokio::test]
    async fn unparsable_id_is_bad_request_without_lookup() {
        let ctx = TestContext::new().await;
        let (user_id, access, _) = ctx.login_user("usertest", false).await;
        let calls = Arc::new(AtomicUsize::new(0));

        for uri in ["/sets/abc", "/sets/1.5", "/sets/99999999999999999999"] {
            let response = set_app(&ctx.gates, user_id, calls.clone())
                .oneshot(get_with(uri, &access))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["error"], "invalid setID format");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unauthenticated_request_never_reaches_resolver() {
        let ctx = TestContext::new().await;
        let calls = Arc::new(AtomicUsize::new(0));

        let response = set_app(&ctx.gates, Uuid::new_v4(), calls.clone())
            .oneshot(
                HttpRequest::builder()
                    .uri("/sets/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn uuid_ids_are_supported() {
        let ctx = TestContext::new().await;
        let (user_id, access, _) = ctx.login_user("usertest", false).await;
        let session_id = Uuid::new_v4();

        let gate = ctx.gates.ownership("sessionID", move |id: Uuid| async move {
            if id == session_id {
                Ok(user_id)
            } else {
                Err(StoreError::NotFound)
            }
        });
        let app = Router::new()
            .route("/sessions/{sessionID}", get(echo_session))
            .route_layer(from_fn_with_state(gate, verify_ownership::<Uuid>))
            .route_layer(from_fn_with_state(ctx.gates.clone(), authenticate));

        let response = app
            .clone()
            .oneshot(get_with(&format!("/sessions/{session_id}"), &access))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, session_id.to_string());

        let response = app
            .oneshot(get_with("/sessions/42", &access))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid sessionID format");
    }

    #[tokio::test]
    async fn slow_resolver_is_internal_error() {
        let ctx = TestContext::new().await;
        let (user_id, access, _) = ctx.login_user("usertest", false).await;

        let gate = OwnershipGate::new(
            "setID",
            Duration::from_millis(10),
            move |_id: i64| async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(user_id)
            },
        );
        let app = Router::new()
            .route("/sets/{setID}", get(echo_set))
            .route_layer(from_fn_with_state(gate, verify_ownership::<i64>))
            .route_layer(from_fn_with_state(ctx.gates.clone(), authenticate));

        let response = app.oneshot(get_with("/sets/1", &access)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn path_parsing() {
        assert_eq!(i64::parse_path("42"), Some(42));
        assert_eq!(i64::parse_path("-1"), Some(-1));
        assert_eq!(i64::parse_path("4x"), None);
        assert_eq!(Uuid::parse_path("nope"), None);
        let id = Uuid::new_v4();
        assert_eq!(Uuid::parse_path(&id.to_string()), Some(id));
    }
}
