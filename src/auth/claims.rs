// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access token claims and the per-request authentication context.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed `iss` claim on every access token.
pub const TOKEN_ISSUER: &str = "gogym";

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Not before timestamp
    pub nbf: i64,
    /// Issuer
    pub iss: String,
    /// Token ID, unique per mint
    pub jti: String,
}

impl AccessClaims {
    /// Claims valid over `[issued_at, issued_at + ttl]`.
    ///
    /// `None` when the expiry falls outside the representable time range.
    pub fn new(
        subject: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Option<Self> {
        let expires_at = issued_at.checked_add_signed(ttl)?;
        let iat = issued_at.timestamp();
        Some(Self {
            sub: subject.into(),
            iat,
            exp: expires_at.timestamp(),
            nbf: iat,
            iss: TOKEN_ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        })
    }
}

/// The authenticated user bound to a request.
///
/// Only the authentication gate creates one, so any handler holding an
/// `Identity` is running behind that gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    user_id: Uuid,
}

impl Identity {
    pub(crate) fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

/// A resource id parsed from the path by the ownership gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Integer(i64),
    Uuid(Uuid),
}

impl From<i64> for ResourceId {
    fn from(id: i64) -> Self {
        ResourceId::Integer(id)
    }
}

impl From<Uuid> for ResourceId {
    fn from(id: Uuid) -> Self {
        ResourceId::Uuid(id)
    }
}

impl TryFrom<ResourceId> for i64 {
    type Error = ResourceId;

    fn try_from(id: ResourceId) -> Result<Self, Self::Error> {
        match id {
            ResourceId::Integer(value) => Ok(value),
            other => Err(other),
        }
    }
}

impl TryFrom<ResourceId> for Uuid {
    type Error = ResourceId;

    fn try_from(id: ResourceId) -> Result<Self, Self::Error> {
        match id {
            ResourceId::Uuid(value) => Ok(value),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceId::Integer(id) => write!(f, "{id}"),
            ResourceId::Uuid(id) => write!(f, "{id}"),
        }
    }
}

/// Request-scoped auth state, stored in the request extensions.
///
/// The authentication gate inserts it with the caller's identity; the
/// ownership gate fills in `resource_id` once the caller is verified as owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub identity: Identity,
    pub resource_id: Option<ResourceId>,
}

impl RequestContext {
    pub(crate) fn authenticated(identity: Identity) -> Self {
        Self {
            identity,
            resource_id: None,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.identity.user_id()
    }

    /// The verified resource id, if it has the requested representation.
    pub fn resource<T>(&self) -> Option<T>
    where
        T: TryFrom<ResourceId>,
    {
        self.resource_id.and_then(|id| T::try_from(id).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_cover_the_ttl_window() {
        let now = Utc::now();
        let claims = AccessClaims::new("user_123", now, Duration::seconds(60)).unwrap();
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.nbf, now.timestamp());
        assert_eq!(claims.exp, now.timestamp() + 60);
        assert_eq!(claims.iss, TOKEN_ISSUER);
    }

    #[test]
    fn claims_get_distinct_token_ids() {
        let now = Utc::now();
        let a = AccessClaims::new("user_123", now, Duration::seconds(60)).unwrap();
        let b = AccessClaims::new("user_123", now, Duration::seconds(60)).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn unrepresentable_expiry_yields_no_claims() {
        let ttl = Duration::try_seconds(9_000_000_000_000_000).unwrap();
        assert!(AccessClaims::new("user_123", Utc::now(), ttl).is_none());
    }

    #[test]
    fn context_resource_respects_representation() {
        let mut ctx = RequestContext::authenticated(Identity::new(Uuid::new_v4()));
        assert_eq!(ctx.resource::<i64>(), None);

        ctx.resource_id = Some(ResourceId::Integer(42));
        assert_eq!(ctx.resource::<i64>(), Some(42));
        assert_eq!(ctx.resource::<Uuid>(), None);

        let id = Uuid::new_v4();
        ctx.resource_id = Some(id.into());
        assert_eq!(ctx.resource::<Uuid>(), Some(id));
    }
}
