// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GoGym - Workout Tracking Service
//!
//! REST backend for users, workout sessions, sets, logs and an exercise
//! catalogue. Every protected route runs behind an auth pipeline that accepts
//! a short-lived access JWT or a long-lived opaque refresh token, and then
//! checks admin rights or resource ownership where the route asks for it.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `auth` - Token issuing, authentication, admin and ownership gates
//! - `config` - Environment configuration
//! - `store` - In-memory persistence

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_utils;
