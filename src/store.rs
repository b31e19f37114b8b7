// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store.
//!
//! Holds every table behind one `RwLock` and implements the persistence
//! contracts of the auth module ([`RefreshTokenStore`], [`UserDirectory`])
//! next to the resource queries used by handlers and ownership resolvers.
//!
//! Relations follow the usual foreign keys: a set belongs to a session, a log
//! to a set, and deleting a parent removes its children.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{RefreshTokenRecord, RefreshTokenStore, StoreError, StoreResult, UserDirectory, UserRecord},
    models::{NewExercise, NewLog, NewSession, NewSet},
};

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub hashed_password: String,
    pub birthday: Option<NaiveDate>,
    pub country: Option<String>,
    pub is_admin: Option<bool>,
    pub created_at: DateTime<Utc>,
}

/// A user row before insertion.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub username: String,
    pub hashed_password: String,
    pub birthday: Option<NaiveDate>,
    pub country: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub start_timestamp: DateTime<Utc>,
    pub duration_minutes: i16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Set {
    pub id: i64,
    pub session_id: Uuid,
    pub exercise_id: i32,
    pub set_order: i32,
    pub rest_time: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Log {
    pub id: i64,
    pub set_id: i64,
    pub exercise_id: i32,
    pub weight: f64,
    pub reps: i32,
    pub logs_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: i32,
    pub name: String,
    pub description: String,
}

// =============================================================================
// Store
// =============================================================================

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
    sessions: HashMap<Uuid, Session>,
    sets: BTreeMap<i64, Set>,
    logs: BTreeMap<i64, Log>,
    exercises: BTreeMap<i32, Exercise>,
    next_set_id: i64,
    next_log_id: i64,
    next_exercise_id: i32,
}

impl Tables {
    fn session_owner(&self, session_id: Uuid) -> StoreResult<Uuid> {
        self.sessions
            .get(&session_id)
            .map(|session| session.user_id)
            .ok_or(StoreError::NotFound)
    }

    fn set_owner(&self, set_id: i64) -> StoreResult<Uuid> {
        let set = self.sets.get(&set_id).ok_or(StoreError::NotFound)?;
        self.session_owner(set.session_id)
    }

    fn remove_set(&mut self, set_id: i64) -> Option<Set> {
        let set = self.sets.remove(&set_id)?;
        self.logs.retain(|_, log| log.set_id != set_id);
        Some(set)
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    /// Insert a user. Usernames are unique.
    pub async fn create_user(&self, draft: UserDraft) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == draft.username) {
            return Err(StoreError::Conflict("username is already in use".into()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: draft.username,
            hashed_password: draft.hashed_password,
            birthday: draft.birthday,
            country: draft.country,
            is_admin: draft.is_admin,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn user(&self, user_id: Uuid) -> StoreResult<User> {
        self.tables
            .read()
            .await
            .users
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    pub async fn user_by_username(&self, username: &str) -> StoreResult<User> {
        self.tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// All users, oldest first.
    pub async fn users(&self) -> Vec<User> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.username.cmp(&b.username))
        });
        users
    }

    // -------------------------------------------------------------------------
    // Sessions
    // -------------------------------------------------------------------------

    pub async fn create_session(&self, user_id: Uuid, input: NewSession) -> StoreResult<Session> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }

        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            name: input.name,
            date: input.date,
            start_timestamp: input.start_timestamp,
            duration_minutes: input.duration_minutes,
        };
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    pub async fn session(&self, session_id: Uuid) -> StoreResult<Session> {
        self.tables
            .read()
            .await
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// Sessions owned by `user_id`, most recent date first.
    pub async fn sessions_for_user(&self, user_id: Uuid) -> Vec<Session> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.start_timestamp.cmp(&a.start_timestamp))
        });
        sessions
    }

    pub async fn update_session(&self, session_id: Uuid, input: NewSession) -> StoreResult<Session> {
        let mut tables = self.tables.write().await;
        let session = tables
            .sessions
            .get_mut(&session_id)
            .ok_or(StoreError::NotFound)?;

        session.name = input.name;
        session.date = input.date;
        session.start_timestamp = input.start_timestamp;
        session.duration_minutes = input.duration_minutes;
        Ok(session.clone())
    }

    /// Delete a session with its sets and their logs.
    pub async fn delete_session(&self, session_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .sessions
            .remove(&session_id)
            .ok_or(StoreError::NotFound)?;

        let set_ids: Vec<i64> = tables
            .sets
            .values()
            .filter(|set| set.session_id == session_id)
            .map(|set| set.id)
            .collect();
        for set_id in set_ids {
            tables.remove_set(set_id);
        }
        Ok(())
    }

    pub async fn session_owner(&self, session_id: Uuid) -> StoreResult<Uuid> {
        self.tables.read().await.session_owner(session_id)
    }

    // -------------------------------------------------------------------------
    // Sets
    // -------------------------------------------------------------------------

    pub async fn create_set(&self, session_id: Uuid, input: NewSet) -> StoreResult<Set> {
        let mut tables = self.tables.write().await;
        if !tables.sessions.contains_key(&session_id) {
            return Err(StoreError::NotFound);
        }

        tables.next_set_id += 1;
        let set = Set {
            id: tables.next_set_id,
            session_id,
            exercise_id: input.exercise_id,
            set_order: input.set_order,
            rest_time: input.rest_time,
        };
        tables.sets.insert(set.id, set.clone());
        Ok(set)
    }

    pub async fn set(&self, set_id: i64) -> StoreResult<Set> {
        self.tables
            .read()
            .await
            .sets
            .get(&set_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// Sets of one session in `set_order`.
    pub async fn sets_for_session(&self, session_id: Uuid) -> Vec<Set> {
        let tables = self.tables.read().await;
        let mut sets: Vec<Set> = tables
            .sets
            .values()
            .filter(|set| set.session_id == session_id)
            .cloned()
            .collect();
        sets.sort_by_key(|set| (set.set_order, set.id));
        sets
    }

    /// Update a set. A changed exercise is propagated to the set's logs.
    pub async fn update_set(&self, set_id: i64, input: NewSet) -> StoreResult<Set> {
        let mut tables = self.tables.write().await;
        let set = tables.sets.get_mut(&set_id).ok_or(StoreError::NotFound)?;
        let exercise_changed = set.exercise_id != input.exercise_id;

        set.exercise_id = input.exercise_id;
        set.set_order = input.set_order;
        set.rest_time = input.rest_time;
        let updated = set.clone();

        if exercise_changed {
            for log in tables.logs.values_mut().filter(|log| log.set_id == set_id) {
                log.exercise_id = input.exercise_id;
            }
        }
        Ok(updated)
    }

    pub async fn delete_set(&self, set_id: i64) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .remove_set(set_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    pub async fn set_owner(&self, set_id: i64) -> StoreResult<Uuid> {
        self.tables.read().await.set_owner(set_id)
    }

    // -------------------------------------------------------------------------
    // Logs
    // -------------------------------------------------------------------------

    pub async fn create_log(&self, set_id: i64, input: NewLog) -> StoreResult<Log> {
        let mut tables = self.tables.write().await;
        if !tables.sets.contains_key(&set_id) {
            return Err(StoreError::NotFound);
        }

        tables.next_log_id += 1;
        let log = Log {
            id: tables.next_log_id,
            set_id,
            exercise_id: input.exercise_id,
            weight: input.weight,
            reps: input.reps,
            logs_order: input.order,
        };
        tables.logs.insert(log.id, log.clone());
        Ok(log)
    }

    /// Logs of one set in `logs_order`.
    pub async fn logs_for_set(&self, set_id: i64) -> Vec<Log> {
        let tables = self.tables.read().await;
        let mut logs: Vec<Log> = tables
            .logs
            .values()
            .filter(|log| log.set_id == set_id)
            .cloned()
            .collect();
        logs.sort_by_key(|log| (log.logs_order, log.id));
        logs
    }

    /// Update weight, reps and order. The exercise follows the parent set.
    pub async fn update_log(&self, log_id: i64, input: NewLog) -> StoreResult<Log> {
        let mut tables = self.tables.write().await;
        let log = tables.logs.get_mut(&log_id).ok_or(StoreError::NotFound)?;
        log.weight = input.weight;
        log.reps = input.reps;
        log.logs_order = input.order;
        Ok(log.clone())
    }

    pub async fn delete_log(&self, log_id: i64) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .logs
            .remove(&log_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    pub async fn log_owner(&self, log_id: i64) -> StoreResult<Uuid> {
        let tables = self.tables.read().await;
        let log = tables.logs.get(&log_id).ok_or(StoreError::NotFound)?;
        tables.set_owner(log.set_id)
    }

    // -------------------------------------------------------------------------
    // Exercises
    // -------------------------------------------------------------------------

    pub async fn create_exercise(&self, input: NewExercise) -> Exercise {
        let mut tables = self.tables.write().await;
        tables.next_exercise_id += 1;
        let exercise = Exercise {
            id: tables.next_exercise_id,
            name: input.name,
            description: input.description,
        };
        tables.exercises.insert(exercise.id, exercise.clone());
        exercise
    }

    pub async fn exercise(&self, exercise_id: i32) -> StoreResult<Exercise> {
        self.tables
            .read()
            .await
            .exercises
            .get(&exercise_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// Whole catalogue, by id.
    pub async fn exercises(&self) -> Vec<Exercise> {
        self.tables
            .read()
            .await
            .exercises
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryStore {
    async fn lookup(&self, token: &str) -> StoreResult<RefreshTokenRecord> {
        self.tables
            .read()
            .await
            .refresh_tokens
            .get(token)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }
        if tables.refresh_tokens.contains_key(token) {
            return Err(StoreError::Conflict("refresh token already exists".into()));
        }

        let now = Utc::now();
        tables.refresh_tokens.retain(|_, record| record.is_valid_at(now));

        tables.refresh_tokens.insert(
            token.to_string(),
            RefreshTokenRecord {
                token: token.to_string(),
                user_id,
                expires_at,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_user(&self, user_id: Uuid) -> StoreResult<UserRecord> {
        let user = self.user(user_id).await?;
        Ok(UserRecord {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        })
    }
}
