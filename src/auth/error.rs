// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gate rejections.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::error::ErrorBody;

/// Coarse classification of a rejection, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Credential or path parameter absent or unparsable
    Malformed,
    /// Bad signature, wrong secret, expired, unknown refresh token
    InvalidOrExpired,
    /// Resource absent
    NotFound,
    /// Role or ownership mismatch
    Forbidden,
    /// Persistence or infrastructure failure
    Internal,
}

/// Terminal outcome of a gate that refused the request.
///
/// Every variant renders as `{"error": "<message>"}`. Credential failures
/// share one message so a caller cannot tell why a token was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Neither credential header was sent
    #[error("no credentials presented")]
    NoCredentials,
    /// A credential was sent but could not be used
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The authenticated user has no backing record
    #[error("could not retrieve user")]
    UnknownUser,
    #[error("admin access required")]
    AdminRequired,
    #[error("user is not owner")]
    NotOwner,
    /// Path parameter could not be parsed into the expected id type
    #[error("invalid {0} format")]
    InvalidPathParam(String),
    #[error("not found")]
    ResourceNotFound,
    /// Detail is logged, never sent to the client
    #[error("something went wrong")]
    Internal(String),
}

impl AuthError {
    pub fn internal(detail: impl Into<String>) -> Self {
        AuthError::Internal(detail.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            AuthError::NoCredentials | AuthError::InvalidPathParam(_) => FailureKind::Malformed,
            AuthError::InvalidCredentials | AuthError::UnknownUser => {
                FailureKind::InvalidOrExpired
            }
            AuthError::ResourceNotFound => FailureKind::NotFound,
            AuthError::AdminRequired | AuthError::NotOwner => FailureKind::Forbidden,
            AuthError::Internal(_) => FailureKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NoCredentials | AuthError::InvalidCredentials | AuthError::UnknownUser => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::AdminRequired | AuthError::NotOwner => StatusCode::FORBIDDEN,
            AuthError::InvalidPathParam(_) => StatusCode::BAD_REQUEST,
            AuthError::ResourceNotFound => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self {
            tracing::error!(error = %detail, "auth gate failed internally");
        }
        let status = self.status_code();
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
