// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. Request and response types derive `ToSchema` for OpenAPI
//! documentation.
//!
//! Requests are validated through [`Validate`], which turns a raw request
//! into the checked input the store accepts, or into a field → problem map.
//!
//! ## Model Categories
//!
//! - **Users**: signup, login and profile reads
//! - **Sessions**: workout sessions, each owning sets
//! - **Sets**: one exercise block inside a session, owning logs
//! - **Logs**: a single recorded effort (weight × reps)
//! - **Exercises**: the shared exercise catalogue

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ValidationProblems;

// =============================================================================
// Limits
// =============================================================================

pub const MIN_USERNAME_LENGTH: usize = 4;
pub const MAX_USERNAME_LENGTH: usize = 16;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 256;
pub const MIN_COUNTRY_LENGTH: usize = 4;
pub const MAX_COUNTRY_LENGTH: usize = 100;
pub const MIN_SESSION_NAME_LENGTH: usize = 1;
pub const MAX_SESSION_NAME_LENGTH: usize = 100;
pub const MAX_REST_TIME_SECONDS: i32 = 3600;
pub const MAX_EXERCISE_NAME_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Calendar dates on the wire, ISO 8601.
pub const DATE_LAYOUT: &str = "%Y-%m-%d";
/// Default session name when none is given.
pub const DATE_TIME_LAYOUT: &str = "%Y-%m-%d-%H%M%S";

/// Earliest accepted birthday.
pub fn min_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1905, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Latest accepted birthday.
pub fn max_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2012, 1, 1).unwrap_or(NaiveDate::MAX)
}

/// Conversion of a raw request into checked input.
pub trait Validate {
    type Valid;

    fn validate(self) -> Result<Self::Valid, ValidationProblems>;
}

fn check_length(value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(format!(
            "length must be between {min} and {max} characters long"
        ));
    }
    Ok(())
}

fn check_date(
    value: &str,
    min: Option<NaiveDate>,
    max: Option<NaiveDate>,
) -> Result<NaiveDate, String> {
    let date = NaiveDate::parse_from_str(value, DATE_LAYOUT)
        .map_err(|_| format!("expected a {DATE_LAYOUT} date"))?;
    if let Some(min) = min.filter(|min| date < *min) {
        return Err(format!("must be after {}", min.format(DATE_LAYOUT)));
    }
    if let Some(max) = max.filter(|max| date > *max) {
        return Err(format!("must be before {}", max.format(DATE_LAYOUT)));
    }
    Ok(date)
}

// =============================================================================
// User Models
// =============================================================================

/// Request to register a new user.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    /// Optional, `YYYY-MM-DD`.
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Checked signup input. The password is still in clear text here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub birthday: Option<NaiveDate>,
    pub country: Option<String>,
}

impl Validate for CreateUserRequest {
    type Valid = NewUser;

    fn validate(self) -> Result<NewUser, ValidationProblems> {
        let mut problems = ValidationProblems::new();

        if let Err(e) = check_length(&self.username, MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH) {
            problems.add("username", format!("invalid username: {e}"));
        }
        if let Err(e) = check_length(&self.password, MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH) {
            problems.add("password", format!("invalid password: {e}"));
        }

        let birthday = match self.birthday.as_deref().filter(|b| !b.is_empty()) {
            Some(raw) => match check_date(raw, Some(min_birth_date()), Some(max_birth_date())) {
                Ok(date) => Some(date),
                Err(e) => {
                    problems.add("birthday", format!("invalid birthday: {e}"));
                    None
                }
            },
            None => None,
        };

        let country = self.country.filter(|c| !c.is_empty());
        if let Some(country) = &country {
            if let Err(e) = check_length(country, MIN_COUNTRY_LENGTH, MAX_COUNTRY_LENGTH) {
                problems.add("country", format!("invalid country: {e}"));
            }
        }

        problems.into_result()?;
        Ok(NewUser {
            username: self.username,
            password: self.password,
            birthday,
            country,
        })
    }
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Signup date, `YYYY-MM-DD`.
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
}

/// Login credentials.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    type Valid = LoginRequest;

    /// Only emptiness is checked; anything else is answered by the
    /// credential comparison itself.
    fn validate(self) -> Result<LoginRequest, ValidationProblems> {
        let mut problems = ValidationProblems::new();
        if self.username.is_empty() {
            problems.add("username", "invalid username");
        }
        if self.password.is_empty() {
            problems.add("password", "invalid password");
        }
        problems.into_result()?;
        Ok(self)
    }
}

/// Tokens handed out on login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub username: String,
    pub user_id: Uuid,
    /// Short-lived access token, sent back as `Auth: Bearer <token>`.
    pub token: String,
    /// Long-lived token, sent back as `X-Refresh-Token: Token <token>`.
    pub refresh_token: String,
}

// =============================================================================
// Session Models
// =============================================================================

/// Create or replace a workout session.
///
/// Missing `name` and `date` default to the current time and day.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct SessionRequest {
    pub name: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// Unix seconds, UTC.
    pub start_timestamp: i64,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub name: String,
    pub date: NaiveDate,
    pub start_timestamp: DateTime<Utc>,
    pub duration_minutes: i16,
}

impl SessionRequest {
    fn validate_at(self, now: DateTime<Utc>) -> Result<NewSession, ValidationProblems> {
        let mut problems = ValidationProblems::new();

        let name = if self.name.is_empty() {
            now.format(DATE_TIME_LAYOUT).to_string()
        } else {
            self.name
        };
        if let Err(e) = check_length(&name, MIN_SESSION_NAME_LENGTH, MAX_SESSION_NAME_LENGTH) {
            problems.add("name", format!("invalid name: {e}"));
        }

        let date = if self.date.is_empty() {
            Some(now.date_naive())
        } else {
            match check_date(&self.date, None, None) {
                Ok(date) => Some(date),
                Err(e) => {
                    problems.add("date", format!("invalid date: {e}"));
                    None
                }
            }
        };

        let start_timestamp = if self.start_timestamp < 0 {
            problems.add(
                "start_timestamp",
                "invalid start_timestamp: start_timestamp must be greater than UNIX epoch",
            );
            None
        } else {
            match DateTime::from_timestamp(self.start_timestamp, 0) {
                Some(ts) => Some(ts),
                None => {
                    problems.add("start_timestamp", "invalid start_timestamp: out of range");
                    None
                }
            }
        };

        let duration_minutes = match i16::try_from(self.duration_minutes) {
            Ok(minutes) if minutes >= 0 => Some(minutes),
            _ => {
                problems.add(
                    "duration_minutes",
                    format!(
                        "invalid duration_minutes: duration_minutes must be between 0 and {} minutes",
                        i16::MAX
                    ),
                );
                None
            }
        };

        match (date, start_timestamp, duration_minutes) {
            (Some(date), Some(start_timestamp), Some(duration_minutes)) if problems.is_empty() => {
                Ok(NewSession {
                    name,
                    date,
                    start_timestamp,
                    duration_minutes,
                })
            }
            _ => Err(problems),
        }
    }
}

impl Validate for SessionRequest {
    type Valid = NewSession;

    fn validate(self) -> Result<NewSession, ValidationProblems> {
        self.validate_at(Utc::now())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SessionResponse {
    pub id: Uuid,
    pub name: String,
    pub date: String,
    pub start_timestamp: i64,
    pub duration_minutes: i16,
}

/// A session with its sets and their logs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub sets: Vec<SetDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionDetail>,
    /// Number of sessions owned by the caller.
    pub total: usize,
}

// =============================================================================
// Set Models
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct SetRequest {
    pub exercise_id: i32,
    pub set_order: i32,
    /// Seconds. Negative values are stored as 0.
    pub rest_time: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSet {
    pub exercise_id: i32,
    pub set_order: i32,
    pub rest_time: i32,
}

impl Validate for SetRequest {
    type Valid = NewSet;

    fn validate(self) -> Result<NewSet, ValidationProblems> {
        let mut problems = ValidationProblems::new();
        if self.set_order < 0 {
            problems.add("order", "invalid order: set order must be positive");
        }
        if self.rest_time > MAX_REST_TIME_SECONDS {
            problems.add(
                "rest_time",
                format!(
                    "invalid rest_time: rest time in seconds must be less than {MAX_REST_TIME_SECONDS} seconds"
                ),
            );
        }
        problems.into_result()?;

        Ok(NewSet {
            exercise_id: self.exercise_id,
            set_order: self.set_order,
            rest_time: self.rest_time.max(0),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SetResponse {
    pub id: i64,
    pub session_id: Uuid,
    pub exercise_id: i32,
    pub set_order: i32,
    pub rest_time: i32,
}

/// A set with its logs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SetDetail {
    #[serde(flatten)]
    pub set: SetResponse,
    pub logs: Vec<LogResponse>,
}

// =============================================================================
// Log Models
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LogRequest {
    pub exercise_id: i32,
    /// Negative values are stored as 0.
    pub weight: f64,
    pub reps: i32,
    pub order: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewLog {
    pub exercise_id: i32,
    pub weight: f64,
    pub reps: i32,
    pub order: i32,
}

impl Validate for LogRequest {
    type Valid = NewLog;

    fn validate(self) -> Result<NewLog, ValidationProblems> {
        let mut problems = ValidationProblems::new();
        if self.order < 0 {
            problems.add("order", "invalid order: log order must be positive");
        }
        if self.reps <= 0 {
            problems.add("reps", "invalid reps: reps must be positive");
        }
        if !self.weight.is_finite() {
            problems.add("weight", "invalid weight: weight must be a finite number");
        }
        problems.into_result()?;

        Ok(NewLog {
            exercise_id: self.exercise_id,
            weight: self.weight.max(0.0),
            reps: self.reps,
            order: self.order,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct LogResponse {
    pub id: i64,
    pub set_id: i64,
    pub exercise_id: i32,
    pub weight: f64,
    pub reps: i32,
    pub order: i32,
}

// =============================================================================
// Exercise Models
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateExerciseRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExercise {
    pub name: String,
    pub description: String,
}

impl Validate for CreateExerciseRequest {
    type Valid = NewExercise;

    fn validate(self) -> Result<NewExercise, ValidationProblems> {
        let mut problems = ValidationProblems::new();
        if let Err(e) = check_length(&self.name, 1, MAX_EXERCISE_NAME_LENGTH) {
            problems.add("name", format!("invalid name: {e}"));
        }
        if let Err(e) = check_length(&self.description, 0, MAX_DESCRIPTION_LENGTH) {
            problems.add("description", format!("invalid description: {e}"));
        }
        problems.into_result()?;

        Ok(NewExercise {
            name: self.name,
            description: self.description,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ExerciseResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExercisesResponse {
    pub exercises: Vec<ExerciseResponse>,
}
