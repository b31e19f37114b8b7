// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access and refresh token minting.
//!
//! Access tokens are HS256 JWTs, verified statelessly on every request.
//! Refresh tokens are 32 random bytes, hex encoded, and only mean something
//! once persisted through a [`RefreshTokenStore`](super::RefreshTokenStore).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use uuid::Uuid;

use super::claims::{AccessClaims, TOKEN_ISSUER};
use crate::config::AuthConfig;

/// Size of a refresh token before hex encoding.
pub const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("subject cannot be empty")]
    EmptySubject,
    #[error("token secret cannot be empty")]
    EmptySecret,
    #[error("token lifetime must be positive")]
    NonPositiveTtl,
    #[error("token lifetime is out of range")]
    TtlOutOfRange,
    #[error("could not sign the token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    /// Malformed, badly signed, expired or not yet valid. Deliberately one variant.
    #[error("invalid token")]
    Invalid,
    #[error("system RNG failure")]
    Entropy,
}

/// Mint a signed access token for `subject`, valid from now for `ttl`.
pub fn mint_access_token(subject: &str, secret: &str, ttl: Duration) -> Result<String, TokenError> {
    if subject.is_empty() {
        return Err(TokenError::EmptySubject);
    }
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }
    if ttl <= Duration::zero() {
        return Err(TokenError::NonPositiveTtl);
    }

    let claims =
        AccessClaims::new(subject, Utc::now(), ttl).ok_or(TokenError::TtlOutOfRange)?;
    sign_claims(&claims, secret)
}

pub(crate) fn sign_claims(claims: &AccessClaims, secret: &str) -> Result<String, TokenError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::new(Algorithm::HS256), claims, &key)?)
}

/// Verify an access token and return its subject.
pub fn verify_access_token(token: &str, secret: &str) -> Result<String, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_nbf = true;
    validation.validate_aud = false;
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.set_required_spec_claims(&["exp", "nbf", "iat", "iss", "sub"]);

    let key = DecodingKey::from_secret(secret.as_bytes());
    let data = decode::<AccessClaims>(token, &key, &validation).map_err(|e| {
        tracing::trace!(reason = ?e.kind(), "access token rejected");
        TokenError::Invalid
    })?;

    Ok(data.claims.sub)
}

/// Draw a new opaque refresh token from the system CSPRNG.
pub fn mint_refresh_token() -> Result<String, TokenError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rng.fill(&mut bytes).map_err(|e| {
        tracing::error!(error = ?e, "System RNG failure - cannot generate refresh token");
        TokenError::Entropy
    })?;
    Ok(hex::encode(bytes))
}

/// Token operations bound to the process auth configuration.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: Arc<AuthConfig>,
}

impl TokenIssuer {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    pub fn issue_access_token(&self, user_id: Uuid) -> Result<String, TokenError> {
        mint_access_token(
            &user_id.to_string(),
            &self.config.jwt_secret,
            self.config.access_token_ttl,
        )
    }

    /// A new refresh token and the absolute expiry to persist it with.
    pub fn issue_refresh_token(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let expires_at = now
            .checked_add_signed(self.config.refresh_token_ttl)
            .ok_or(TokenError::TtlOutOfRange)?;
        Ok((mint_refresh_token()?, expires_at))
    }

    /// Verify an access token whose subject must be a user id.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let subject = verify_access_token(token, &self.config.jwt_secret)?;
        Uuid::parse_str(&subject).map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SECRET: &str = "somerandomsecret";

    #[test]
    fn verify_returns_minted_subject() {
        for subject in ["user_123", "5f0c3a8e-8d8b-4b8a-9a55-0f2b7d2f6f10", "x"] {
            for ttl in [1, 60, 86_400] {
                let token = mint_access_token(subject, SECRET, Duration::seconds(ttl)).unwrap();
                assert_eq!(verify_access_token(&token, SECRET).unwrap(), subject);
            }
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = mint_access_token("user_123", SECRET, Duration::minutes(1)).unwrap();
        for other in ["somerandomsecreT", "another", "somerandomsecret "] {
            assert!(matches!(
                verify_access_token(&token, other),
                Err(TokenError::Invalid)
            ));
        }
    }

    #[test]
    fn mint_rejects_bad_inputs() {
        assert!(matches!(
            mint_access_token("", SECRET, Duration::minutes(1)),
            Err(TokenError::EmptySubject)
        ));
        assert!(matches!(
            mint_access_token("user_123", "", Duration::minutes(1)),
            Err(TokenError::EmptySecret)
        ));
        assert!(matches!(
            mint_access_token("user_123", SECRET, Duration::zero()),
            Err(TokenError::NonPositiveTtl)
        ));
        assert!(matches!(
            mint_access_token("user_123", SECRET, Duration::seconds(-5)),
            Err(TokenError::NonPositiveTtl)
        ));
    }

    #[test]
    fn huge_ttl_is_an_error_not_a_panic() {
        let ttl = Duration::try_seconds(9_000_000_000_000_000).unwrap();
        assert!(matches!(
            mint_access_token("user_123", SECRET, ttl),
            Err(TokenError::TtlOutOfRange)
        ));

        let issuer = TokenIssuer::new(Arc::new(AuthConfig::new(SECRET, ttl, ttl)));
        assert!(matches!(
            issuer.issue_access_token(Uuid::new_v4()),
            Err(TokenError::TtlOutOfRange)
        ));
        assert!(matches!(
            issuer.issue_refresh_token(Utc::now()),
            Err(TokenError::TtlOutOfRange)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = Utc::now() - Duration::minutes(10);
        let claims = AccessClaims::new("user_123", issued, Duration::minutes(1)).unwrap();
        let token = sign_claims(&claims, SECRET).unwrap();
        assert!(matches!(
            verify_access_token(&token, SECRET),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn not_yet_valid_token_is_rejected() {
        let issued = Utc::now() + Duration::minutes(10);
        let claims = AccessClaims::new("user_123", issued, Duration::minutes(1)).unwrap();
        let token = sign_claims(&claims, SECRET).unwrap();
        assert!(matches!(
            verify_access_token(&token, SECRET),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let mut claims =
            AccessClaims::new("user_123", Utc::now(), Duration::minutes(1)).unwrap();
        claims.iss = "someone-else".into();
        let token = sign_claims(&claims, SECRET).unwrap();
        assert!(verify_access_token(&token, SECRET).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        for token in ["", "jwt", "a.b.c", "Bearer"] {
            assert!(matches!(
                verify_access_token(token, SECRET),
                Err(TokenError::Invalid)
            ));
        }
    }

    #[test]
    fn refresh_tokens_are_hex_and_unique() {
        let tokens: HashSet<String> = (0..1000).map(|_| mint_refresh_token().unwrap()).collect();
        assert_eq!(tokens.len(), 1000);
        for token in &tokens {
            assert_eq!(token.len(), REFRESH_TOKEN_BYTES * 2);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn issuer_round_trips_user_ids() {
        let config = Arc::new(AuthConfig::new(
            SECRET,
            Duration::minutes(1),
            Duration::hours(1),
        ));
        let issuer = TokenIssuer::new(config);
        let user_id = Uuid::new_v4();

        let token = issuer.issue_access_token(user_id).unwrap();
        assert_eq!(issuer.verify(&token).unwrap(), user_id);

        let now = Utc::now();
        let (refresh, expires_at) = issuer.issue_refresh_token(now).unwrap();
        assert_eq!(refresh.len(), 64);
        assert_eq!(expires_at, now + Duration::hours(1));
    }

    #[test]
    fn issuer_rejects_non_uuid_subject() {
        let config = Arc::new(AuthConfig::new(
            SECRET,
            Duration::minutes(1),
            Duration::hours(1),
        ));
        let token = mint_access_token("not-a-uuid", SECRET, Duration::minutes(1)).unwrap();
        assert!(matches!(
            TokenIssuer::new(config).verify(&token),
            Err(TokenError::Invalid)
        ));
    }
}
