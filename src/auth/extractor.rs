// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for gated handlers.
//!
//! Use the `Auth` extractor in handlers behind [`authenticate`](super::authenticate):
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity.user_id() is the caller
//! }
//! ```
//!
//! Handlers behind an ownership gate take the verified id with `Owned`:
//!
//! ```rust,ignore
//! async fn get_set(Owned(set_id): Owned<i64>) -> impl IntoResponse { /* ... */ }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{
    claims::{Identity, RequestContext},
    error::AuthError,
    ownership::OwnedId,
};

/// Extractor for the authenticated caller.
///
/// Reads the [`RequestContext`] left by the authentication middleware. A
/// handler mounted without that middleware fails with a 500 rather than
/// running unauthenticated.
pub struct Auth(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .map(|context| Auth(context.identity))
            .ok_or_else(|| AuthError::internal("handler reached without an authenticated identity"))
    }
}

/// Extractor for a resource id the caller was verified to own.
pub struct Owned<Id>(pub Id);

impl<S, Id> FromRequestParts<S> for Owned<Id>
where
    S: Send + Sync,
    Id: OwnedId,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(RequestContext::resource::<Id>)
            .map(Owned)
            .ok_or_else(|| AuthError::internal("handler reached without a verified resource id"))
    }
}
