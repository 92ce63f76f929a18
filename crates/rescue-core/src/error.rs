// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for rescue-core.
//!
//! Provides a unified error type that maps to HTTP status codes and stable
//! machine-readable error codes.

use crate::model::VolunteerRole;
use crate::store::StoreError;

/// Result type using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur during request processing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// Input validation failed.
    #[error("Validation error for '{field}': {message}")]
    ValidationError {
        /// The field that failed validation.
        field: String,
        /// The validation error message.
        message: String,
    },

    /// The request carried no resolvable caller identity.
    #[error("Unauthorized: invalid or missing authentication")]
    Unauthenticated,

    /// The caller lacks the group required for the operation.
    #[error("Forbidden: caller is not a member of '{required_group}'")]
    Forbidden {
        /// The group the caller needed to hold.
        required_group: String,
    },

    /// Event was not found in the record store.
    #[error("Event '{event_id}' does not exist")]
    EventNotFound {
        /// The event ID that was not found.
        event_id: String,
    },

    /// No sign-up exists for the given event and volunteer.
    #[error("Sign-up not found for event '{event_id}' and volunteer '{volunteer_id}'")]
    SignUpNotFound {
        /// The event ID.
        event_id: String,
        /// The volunteer ID.
        volunteer_id: String,
    },

    /// The event is not accepting sign-ups.
    #[error("Sign-ups for event '{event_id}' are currently closed")]
    SignUpsClosed {
        /// The event ID.
        event_id: String,
    },

    /// The event's scheduled time has already passed.
    #[error("Cannot sign up for event '{event_id}': it has already occurred")]
    EventAlreadyStarted {
        /// The event ID.
        event_id: String,
    },

    /// The volunteer already holds a sign-up for the event.
    #[error("Volunteer '{volunteer_id}' has already signed up for event '{event_id}'")]
    AlreadySignedUp {
        /// The event ID.
        event_id: String,
        /// The volunteer ID.
        volunteer_id: String,
    },

    /// Sign-up pre-check found a role with no spots left.
    #[error("No available spots for {role} volunteers in event '{event_id}'")]
    RoleFull {
        /// The event ID.
        event_id: String,
        /// The role that is full.
        role: VolunteerRole,
    },

    /// Approving would push the role's approved count past its capacity.
    #[error("Cannot approve volunteer: no available spots for {role} volunteers in event '{event_id}'")]
    CapacityExceeded {
        /// The event ID.
        event_id: String,
        /// The role whose capacity is exhausted.
        role: VolunteerRole,
    },

    /// The sign-up or event changed between read and write.
    #[error(
        "Sign-up for volunteer '{volunteer_id}' in event '{event_id}' was modified concurrently; retry with a fresh read"
    )]
    ConcurrentModification {
        /// The event ID.
        event_id: String,
        /// The volunteer ID.
        volunteer_id: String,
    },

    /// Database operation failed.
    #[error("Database error during '{operation}': {details}")]
    DatabaseError {
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },
}

impl CoreError {
    /// Shorthand for a [`CoreError::ValidationError`].
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get the error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => "VALIDATION_ERROR",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::EventNotFound { .. } => "EVENT_NOT_FOUND",
            Self::SignUpNotFound { .. } => "SIGNUP_NOT_FOUND",
            Self::SignUpsClosed { .. } => "SIGNUPS_CLOSED",
            Self::EventAlreadyStarted { .. } => "EVENT_ALREADY_STARTED",
            Self::AlreadySignedUp { .. } => "ALREADY_SIGNED_UP",
            Self::RoleFull { .. } => "ROLE_FULL",
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::DatabaseError { .. } => "DATABASE_ERROR",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ValidationError { .. }
            | Self::SignUpsClosed { .. }
            | Self::EventAlreadyStarted { .. }
            | Self::RoleFull { .. }
            | Self::CapacityExceeded { .. } => 400,
            Self::Unauthenticated => 401,
            Self::Forbidden { .. } => 403,
            Self::EventNotFound { .. } | Self::SignUpNotFound { .. } => 404,
            Self::AlreadySignedUp { .. } | Self::ConcurrentModification { .. } => 409,
            Self::DatabaseError { .. } => 500,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database { operation, details } => {
                CoreError::DatabaseError { operation, details }
            }
            // Handlers translate condition failures themselves; reaching this arm
            // means a write was issued without a matching translation.
            StoreError::ConditionFailed { index, reason } => CoreError::DatabaseError {
                operation: "transact_write".to_string(),
                details: format!("condition failed on operation {}: {}", index, reason),
            },
        }
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::DatabaseError {
            operation: "query".to_string(),
            details: err.to_string(),
        }
    }
}
