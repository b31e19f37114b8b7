// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Token issuance and the request gates guarding the GoGym API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with username and password
//! 2. Server returns a short-lived access token (HS256 JWT) and a long-lived
//!    opaque refresh token, persisted with its expiry
//! 3. Client sends `Auth: Bearer <access token>` and
//!    `X-Refresh-Token: Token <refresh token>`
//! 4. Gates, in order:
//!    - [`authenticate`]: binds the caller identity, minting a new access
//!      token from the refresh token when the access token is unusable
//!    - [`admin_only`]: requires the caller's admin flag
//!    - [`verify_ownership`]: requires the caller to own the addressed resource
//!
//! ## Security
//!
//! - All non-public endpoints require authentication
//! - Access tokens are checked without any store round trip
//! - Credential failures share one message
//! - Every store call made by a gate is bounded by `STORE_TIMEOUT_MS`

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod ownership;
pub mod password;
pub mod store;
pub mod token;

pub use claims::{AccessClaims, Identity, RequestContext, ResourceId, TOKEN_ISSUER};
pub use error::{AuthError, FailureKind};
pub use extractor::{Auth, Owned};
pub use middleware::{
    admin_only, authenticate, AuthGates, Authenticated, ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER,
};
pub use ownership::{verify_ownership, OwnedId, OwnershipGate};
pub use password::{hash_password, verify_password, PasswordError};
pub use store::{
    RefreshTokenRecord, RefreshTokenStore, StoreError, StoreResult, UserDirectory, UserRecord,
};
pub use token::{mint_access_token, mint_refresh_token, verify_access_token, TokenError, TokenIssuer};
