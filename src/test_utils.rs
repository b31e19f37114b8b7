// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for in-crate tests.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Duration as TimeDelta, Utc};
use uuid::Uuid;

use crate::{
    auth::{AuthGates, RefreshTokenRecord, RefreshTokenStore, StoreResult},
    config::AuthConfig,
    state::AppState,
    store::{InMemoryStore, UserDraft},
};

pub const TEST_SECRET: &str = "somerandomsecret";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_SECRET, TimeDelta::minutes(15), TimeDelta::days(7))
}

/// Refresh store whose every call outlives any sane timeout.
struct StalledRefreshStore {
    delay: Duration,
}

#[async_trait]
impl RefreshTokenStore for StalledRefreshStore {
    async fn lookup(&self, _token: &str) -> StoreResult<RefreshTokenRecord> {
        tokio::time::sleep(self.delay).await;
        Err(crate::auth::StoreError::NotFound)
    }

    async fn create(
        &self,
        _token: &str,
        _user_id: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub gates: AuthGates,
    pub config: Arc<AuthConfig>,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let config = Arc::new(test_auth_config());
        let gates = AuthGates::new(store.clone(), store.clone(), config.clone());
        Self {
            store,
            gates,
            config,
        }
    }

    /// Gates bounded by `store_timeout` over a refresh store that never
    /// answers in time.
    pub async fn with_slow_refresh_store(store_timeout: Duration) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let config = Arc::new(test_auth_config().with_store_timeout(store_timeout));
        let stalled = Arc::new(StalledRefreshStore {
            delay: store_timeout * 50,
        });
        let gates = AuthGates::new(stalled, store.clone(), config.clone());
        Self {
            store,
            gates,
            config,
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.store.clone(), self.config.clone())
    }

    /// Insert a user and log it in. Returns `(user_id, access, refresh)`.
    pub async fn login_user(&self, username: &str, is_admin: bool) -> (Uuid, String, String) {
        let user = self
            .store
            .create_user(UserDraft {
                username: username.into(),
                hashed_password: "not-a-real-hash".into(),
                birthday: None,
                country: None,
                is_admin: Some(is_admin),
            })
            .await
            .unwrap();

        let issuer = self.gates.issuer();
        let access = issuer.issue_access_token(user.id).unwrap();
        let (refresh, expires_at) = issuer.issue_refresh_token(Utc::now()).unwrap();
        self.store
            .create(&refresh, user.id, expires_at)
            .await
            .unwrap();

        (user.id, access, refresh)
    }
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
