// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{
    auth::{hash_password, AuthGates, StoreError, TokenIssuer},
    config::{AdminSeed, AuthConfig},
    error::ApiError,
    store::{InMemoryStore, UserDraft},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<InMemoryStore>,
    pub gates: AuthGates,
    pub config: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(store: Arc<InMemoryStore>, config: Arc<AuthConfig>) -> Self {
        let gates = AuthGates::new(store.clone(), store.clone(), config.clone());
        Self {
            store,
            gates,
            config,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        self.gates.issuer()
    }

    /// Create the configured admin account unless the username is taken.
    pub async fn seed_admin(&self, seed: &AdminSeed) -> Result<(), ApiError> {
        let hashed_password = hash_password(&seed.password).map_err(ApiError::internal)?;
        let draft = UserDraft {
            username: seed.username.clone(),
            hashed_password,
            birthday: None,
            country: None,
            is_admin: Some(true),
        };

        match self.store.create_user(draft).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "seeded admin user");
                Ok(())
            }
            Err(StoreError::Conflict(_)) => {
                tracing::info!(username = %seed.username, "admin user already present");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
