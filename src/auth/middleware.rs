// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and admin middleware for Axum.
//!
//! ## Credential carriers
//!
//! - `Auth: Bearer <access token>`
//! - `X-Refresh-Token: Token <refresh token>`
//!
//! ## Decision
//!
//! 1. A verifiable access token wins. The store is never touched.
//! 2. Otherwise a refresh token is looked up. If it is live, a fresh access
//!    token is minted and returned in the `Auth` response header. The refresh
//!    token itself stays as it is.
//! 3. Otherwise the request is rejected.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let gates = AuthGates::new(store.clone(), store.clone(), config);
//!
//! let app = Router::new()
//!     .route("/users", get(list_users))
//!     .route_layer(from_fn_with_state(gates.clone(), admin_only))
//!     .route_layer(from_fn_with_state(gates.clone(), authenticate));
//! ```
//!
//! Layers added later run first, so `authenticate` is always the last
//! `route_layer` call.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use uuid::Uuid;

use super::{
    claims::{Identity, RequestContext},
    error::{AuthError, FailureKind},
    ownership::{OwnedId, OwnershipGate},
    store::{RefreshTokenStore, StoreError, StoreResult, UserDirectory},
    token::TokenIssuer,
};
use crate::config::AuthConfig;

/// Request and response header carrying the access token.
pub const ACCESS_TOKEN_HEADER: &str = "auth";
/// Request header carrying the refresh token.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

const ACCESS_TOKEN_SCHEME: &str = "Bearer";
const REFRESH_TOKEN_SCHEME: &str = "Token";

/// Shared state behind the auth middleware.
#[derive(Clone)]
pub struct AuthGates {
    issuer: TokenIssuer,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    users: Arc<dyn UserDirectory>,
    config: Arc<AuthConfig>,
}

impl AuthGates {
    pub fn new(
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        users: Arc<dyn UserDirectory>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            issuer: TokenIssuer::new(config.clone()),
            refresh_tokens,
            users,
            config,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Build an ownership gate for one route.
    ///
    /// `param` names the path parameter holding the resource id and
    /// `resolver` maps that id to the owning user.
    pub fn ownership<Id, F, Fut>(&self, param: &'static str, resolver: F) -> OwnershipGate<Id>
    where
        Id: OwnedId,
        F: Fn(Id) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StoreResult<Uuid>> + Send + 'static,
    {
        OwnershipGate::new(param, self.config.store_timeout, resolver)
    }

    /// Resolve the caller from the credential headers.
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<Authenticated, AuthError> {
        let access = Carrier::read(headers, ACCESS_TOKEN_HEADER, ACCESS_TOKEN_SCHEME);
        let refresh = Carrier::read(headers, REFRESH_TOKEN_HEADER, REFRESH_TOKEN_SCHEME);

        if let Carrier::Present(token) = access {
            match self.issuer.verify(token) {
                Ok(user_id) => {
                    return Ok(Authenticated {
                        identity: Identity::new(user_id),
                        reissued_token: None,
                    })
                }
                Err(e) => tracing::debug!(reason = %e, "access token rejected"),
            }
        }

        match (access, refresh) {
            (_, Carrier::Present(token)) => self.refresh(token).await,
            (Carrier::Absent, Carrier::Absent) => Err(AuthError::NoCredentials),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn refresh(&self, token: &str) -> Result<Authenticated, AuthError> {
        let lookup = self.refresh_tokens.lookup(token);
        let record = match bounded(self.config.store_timeout, "refresh token lookup", lookup).await? {
            Ok(record) => record,
            Err(StoreError::NotFound) => {
                tracing::debug!("refresh token not found");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(AuthError::internal(format!("refresh token lookup: {e}"))),
        };

        if !record.is_valid_at(Utc::now()) {
            tracing::debug!(
                user_id = %record.user_id,
                expired_at = %record.expires_at,
                "refresh token expired"
            );
            return Err(AuthError::InvalidCredentials);
        }

        let access = self
            .issuer
            .issue_access_token(record.user_id)
            .map_err(|e| AuthError::internal(format!("access token mint: {e}")))?;

        Ok(Authenticated {
            identity: Identity::new(record.user_id),
            reissued_token: Some(access),
        })
    }

    /// Succeeds only for users whose admin flag is set.
    pub async fn require_admin(&self, user_id: Uuid) -> Result<(), AuthError> {
        let lookup = self.users.find_user(user_id);
        let user = match bounded(self.config.store_timeout, "admin user lookup", lookup).await? {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(AuthError::UnknownUser),
            Err(e) => return Err(AuthError::internal(format!("admin user lookup: {e}"))),
        };

        if !user.is_admin() {
            return Err(AuthError::AdminRequired);
        }
        Ok(())
    }
}

/// Result of a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub identity: Identity,
    /// Access token minted on the refresh path, returned to the client.
    pub reissued_token: Option<String>,
}

/// State of one credential header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Carrier<'a> {
    Absent,
    Malformed,
    Present(&'a str),
}

impl<'a> Carrier<'a> {
    /// Expects exactly `<scheme> <value>`.
    fn read(headers: &'a HeaderMap, name: &str, scheme: &str) -> Self {
        let Some(raw) = headers.get(name) else {
            return Carrier::Absent;
        };
        let Ok(raw) = raw.to_str() else {
            return Carrier::Malformed;
        };

        let mut fields = raw.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some(found), Some(value), None) if found == scheme => Carrier::Present(value),
            _ => Carrier::Malformed,
        }
    }
}

/// Run a store call under the configured bound.
pub(crate) async fn bounded<T, F>(
    timeout: Duration,
    what: &'static str,
    call: F,
) -> Result<StoreResult<T>, AuthError>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| AuthError::internal(format!("{what} timed out after {timeout:?}")))
}

pub(crate) fn reject(gate: &'static str, err: AuthError) -> Response {
    match err.kind() {
        // logged when rendered
        FailureKind::Internal => {}
        FailureKind::Forbidden => tracing::warn!(gate, reason = %err, "request rejected"),
        kind => tracing::debug!(gate, ?kind, reason = %err, "request rejected"),
    }
    err.into_response()
}

/// Authentication middleware function.
pub async fn authenticate(
    State(gates): State<AuthGates>,
    mut request: Request,
    next: Next,
) -> Response {
    let authenticated = match gates.resolve(request.headers()).await {
        Ok(authenticated) => authenticated,
        Err(e) => return reject("authenticate", e),
    };

    let reissued = match authenticated.reissued_token.as_deref().map(bearer_value).transpose() {
        Ok(value) => value,
        Err(e) => return reject("authenticate", e),
    };

    request
        .extensions_mut()
        .insert(RequestContext::authenticated(authenticated.identity));

    let mut response = next.run(request).await;
    if let Some(value) = reissued {
        response.headers_mut().insert(ACCESS_TOKEN_HEADER, value);
    }
    response
}

fn bearer_value(token: &str) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(&format!("{ACCESS_TOKEN_SCHEME} {token}"))
        .map_err(|e| AuthError::internal(format!("access token header: {e}")))
}

/// Admin-only middleware function. Must run after [`authenticate`].
pub async fn admin_only(State(gates): State<AuthGates>, request: Request, next: Next) -> Response {
    let Some(user_id) = request
        .extensions()
        .get::<RequestContext>()
        .map(RequestContext::user_id)
    else {
        return reject(
            "admin_only",
            AuthError::internal("admin gate reached without an authenticated identity"),
        );
    };

    match gates.require_admin(user_id).await {
        Ok(()) => next.run(request).await,
        Err(e) => reject("admin_only", e),
    }
}
