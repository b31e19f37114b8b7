// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistence contracts consumed by the auth gates.
//!
//! The gates never talk to a concrete database. They depend on these two
//! traits, which the storage layer implements.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by store collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The requested row does not exist.
    #[error("record not found")]
    NotFound,
    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Any other persistence failure.
    #[error("store failure: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A persisted refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    /// Usable while `now` is strictly before the expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// The slice of a user row the admin gate needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    /// Nullable column; only `Some(true)` grants admin access.
    pub is_admin: Option<bool>,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.is_admin == Some(true)
    }
}

/// Storage for long-lived opaque refresh tokens.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Find a token. Missing tokens are reported as [`StoreError::NotFound`].
    async fn lookup(&self, token: &str) -> StoreResult<RefreshTokenRecord>;

    /// Persist a freshly minted token.
    async fn create(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;
}

/// User lookup by id.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> StoreResult<UserRecord>;
}
