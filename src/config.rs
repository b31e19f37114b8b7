// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! immutable configuration values built from them. Configuration is loaded
//! from the environment once at startup and injected into the components
//! that need it.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | HMAC secret used to sign access tokens | Required |
//! | `JWT_DURATION` | Access token lifetime in seconds | Required |
//! | `REFRESH_TOKEN_DURATION` | Refresh token lifetime in seconds | Required |
//! | `STORE_TIMEOUT_MS` | Upper bound for a single store call made by an auth gate | `5000` |
//! | `ADMIN_USERNAME` | Admin account seeded at startup if absent | Optional |
//! | `ADMIN_PASSWORD` | Password for the seeded admin | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use chrono::{Duration as TimeDelta, Utc};
use thiserror::Error;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_DURATION_ENV: &str = "JWT_DURATION";
pub const REFRESH_TOKEN_DURATION_ENV: &str = "REFRESH_TOKEN_DURATION";
pub const STORE_TIMEOUT_ENV: &str = "STORE_TIMEOUT_MS";
pub const ADMIN_USERNAME_ENV: &str = "ADMIN_USERNAME";
pub const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Configuration errors raised while reading the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {name} is not a valid {expected}: {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Settings consumed by the token issuer and the auth gates.
///
/// Built once at startup and shared read-only behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for access tokens.
    pub jwt_secret: String,
    /// Access token lifetime.
    pub access_token_ttl: TimeDelta,
    /// Refresh token lifetime.
    pub refresh_token_ttl: TimeDelta,
    /// Bound applied to each store call a gate makes.
    pub store_timeout: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: impl Into<String>,
        access_token_ttl: TimeDelta,
        refresh_token_ttl: TimeDelta,
    ) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_token_ttl,
            refresh_token_ttl,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

/// Credentials for the admin account created at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
    pub admin: Option<AdminSeed>,
    pub json_logs: bool,
}

impl ServerConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let jwt_secret = required(JWT_SECRET_ENV)?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Missing(JWT_SECRET_ENV));
        }
        let access_ttl = parse_seconds(JWT_DURATION_ENV, &required(JWT_DURATION_ENV)?)?;
        let refresh_ttl = parse_seconds(
            REFRESH_TOKEN_DURATION_ENV,
            &required(REFRESH_TOKEN_DURATION_ENV)?,
        )?;

        let store_timeout_ms = match lookup(STORE_TIMEOUT_ENV) {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: STORE_TIMEOUT_ENV,
                expected: "number of milliseconds",
                value: raw,
            })?,
            None => DEFAULT_STORE_TIMEOUT_MS,
        };

        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                expected: "port",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let admin = match (lookup(ADMIN_USERNAME_ENV), lookup(ADMIN_PASSWORD_ENV)) {
            (Some(username), Some(password)) => Some(AdminSeed { username, password }),
            _ => None,
        };

        let auth = AuthConfig::new(jwt_secret, access_ttl, refresh_ttl)
            .with_store_timeout(Duration::from_millis(store_timeout_ms));

        Ok(Self {
            host: lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            auth,
            admin,
            json_logs: lookup(LOG_FORMAT_ENV)
                .map(|format| format.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

/// A positive lifetime whose expiry, counted from now, stays representable.
fn parse_seconds(name: &'static str, raw: &str) -> Result<TimeDelta, ConfigError> {
    let ttl = raw
        .parse::<i64>()
        .ok()
        .filter(|secs| *secs > 0)
        .and_then(TimeDelta::try_seconds)
        .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some());
    match ttl {
        Some(ttl) => Ok(ttl),
        None => Err(ConfigError::Invalid {
            name,
            expected: "positive number of seconds",
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> HashMap<String, String> {
        env(&[
            (JWT_SECRET_ENV, "somerandomsecret"),
            (JWT_DURATION_ENV, "60"),
            (REFRESH_TOKEN_DURATION_ENV, "3600"),
        ])
    }

    #[test]
    fn loads_required_values_and_defaults() {
        let vars = base();
        let config = ServerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.auth.jwt_secret, "somerandomsecret");
        assert_eq!(config.auth.access_token_ttl, TimeDelta::seconds(60));
        assert_eq!(config.auth.refresh_token_ttl, TimeDelta::seconds(3600));
        assert_eq!(
            config.auth.store_timeout,
            Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS)
        );
        assert!(config.admin.is_none());
        assert!(!config.json_logs);
    }

    #[test]
    fn missing_secret_is_reported() {
        let mut vars = base();
        vars.remove(JWT_SECRET_ENV);
        let err = ServerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert_eq!(err, ConfigError::Missing(JWT_SECRET_ENV));
    }

    #[test]
    fn non_numeric_duration_is_rejected() {
        let mut vars = base();
        vars.insert(JWT_DURATION_ENV.to_string(), "a minute".to_string());
        let err = ServerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: JWT_DURATION_ENV,
                ..
            }
        ));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut vars = base();
        vars.insert(REFRESH_TOKEN_DURATION_ENV.to_string(), "0".to_string());
        assert!(ServerConfig::from_lookup(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn unrepresentable_duration_is_rejected() {
        let mut vars = base();
        vars.insert(JWT_DURATION_ENV.to_string(), "9000000000000000".to_string());
        let err = ServerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: JWT_DURATION_ENV,
                ..
            }
        ));

        // a century still fits
        vars.insert(JWT_DURATION_ENV.to_string(), "3155760000".to_string());
        assert!(ServerConfig::from_lookup(|k| vars.get(k).cloned()).is_ok());
    }

    #[test]
    fn admin_seed_requires_both_values() {
        let mut vars = base();
        vars.insert(ADMIN_USERNAME_ENV.to_string(), "admin".to_string());
        let config = ServerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert!(config.admin.is_none());

        vars.insert(ADMIN_PASSWORD_ENV.to_string(), "adminpass".to_string());
        let config = ServerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        let admin = config.admin.unwrap();
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.password, "adminpass");
    }

    #[test]
    fn json_log_format_is_case_insensitive() {
        let mut vars = base();
        vars.insert(LOG_FORMAT_ENV.to_string(), "JSON".to_string());
        let config = ServerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert!(config.json_logs);
    }
}
