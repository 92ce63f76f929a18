// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Record store interface and backend implementations.
//!
//! The store holds two collections: events keyed by `event_id` and volunteer
//! sign-ups keyed by `(event_id, volunteer_id)`. Mutations are conditional:
//! a single-item put that requires the key to be absent, and an all-or-nothing
//! [`RecordStore::transact_write`] whose every operation carries a precondition
//! evaluated by the database at write time.

pub mod postgres;
pub mod sqlite;

pub use self::postgres::PostgresStore;
pub use self::sqlite::SqliteStore;

use std::fmt;

use async_trait::async_trait;

use crate::model::{EventRecord, SignUpRecord, SignUpStatus, VolunteerRole};

/// Why an operation's precondition did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionFailure {
    /// A record already exists under the key.
    AlreadyExists,
    /// The record is missing, or its status differs from the expected one.
    StatusMismatch,
    /// Incrementing would exceed the role's capacity.
    CapacityExceeded,
    /// Decrementing would take the counter below zero.
    CounterUnderflow,
    /// The event the counter belongs to is missing.
    EventMissing,
}

impl fmt::Display for ConditionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AlreadyExists => "record already exists",
            Self::StatusMismatch => "status does not match expected value",
            Self::CapacityExceeded => "counter would exceed capacity",
            Self::CounterUnderflow => "counter would drop below zero",
            Self::EventMissing => "event does not exist",
        };
        f.write_str(text)
    }
}

/// Store-level errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The precondition of operation `index` failed; nothing was written.
    #[error("condition failed on operation {index}: {reason}")]
    ConditionFailed {
        /// Position of the failing operation in the submitted batch.
        index: usize,
        /// What did not hold.
        reason: ConditionFailure,
    },

    /// Transport or driver failure.
    #[error("database error during '{operation}': {details}")]
    Database {
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },
}

impl StoreError {
    pub(crate) fn database(operation: &str, err: impl fmt::Display) -> Self {
        Self::Database {
            operation: operation.to_string(),
            details: err.to_string(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::database("query", err)
    }
}

/// Fields written by a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpChanges {
    /// New status.
    pub status: SignUpStatus,
    /// New assigned role.
    pub assigned_role: VolunteerRole,
    /// Reviewing manager.
    pub reviewed_by: String,
    /// Review time, seconds since epoch.
    pub reviewed_at: i64,
}

/// One conditional operation inside [`RecordStore::transact_write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert a sign-up; requires the key to be absent.
    PutSignUp {
        /// Record to insert.
        record: SignUpRecord,
    },
    /// Update a sign-up; requires its stored status and assigned role to equal
    /// `expected_status` and `expected_role`.
    UpdateSignUp {
        /// Event id (partition key).
        event_id: String,
        /// Volunteer id (sort key).
        volunteer_id: String,
        /// Status that must still be stored.
        expected_status: SignUpStatus,
        /// Assigned role that must still be stored (`None` for unreviewed).
        expected_role: Option<VolunteerRole>,
        /// Fields to set.
        changes: SignUpChanges,
    },
    /// Atomically add `delta` to the role's approved count.
    ///
    /// Requires `0 <= count + delta <= capacity` on the stored row.
    AdjustCounter {
        /// Event id.
        event_id: String,
        /// Role whose counter moves.
        role: VolunteerRole,
        /// Signed change.
        delta: i32,
    },
}

/// Record store used by the handlers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch an event by id.
    async fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>, StoreError>;

    /// Insert or replace an event.
    ///
    /// Event creation is owned outside this service; this exists for seeding.
    async fn put_event(&self, event: &EventRecord) -> Result<(), StoreError>;

    /// Fetch a sign-up by its composite key.
    async fn get_signup(
        &self,
        event_id: &str,
        volunteer_id: &str,
    ) -> Result<Option<SignUpRecord>, StoreError>;

    /// Insert a sign-up only if no record exists under its key.
    ///
    /// Fails with [`ConditionFailure::AlreadyExists`] otherwise.
    async fn put_signup_if_absent(&self, record: &SignUpRecord) -> Result<(), StoreError>;

    /// All sign-ups sharing the event's partition key, ordered by volunteer id.
    async fn query_signups(&self, event_id: &str) -> Result<Vec<SignUpRecord>, StoreError>;

    /// Apply all operations atomically, or none of them.
    ///
    /// Operations run in order; the first one whose precondition fails aborts
    /// the batch with [`StoreError::ConditionFailed`] carrying its index.
    async fn transact_write(&self, ops: &[WriteOp]) -> Result<(), StoreError>;

    /// Cheap connectivity probe.
    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Row shape shared by both SQL backends.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct EventRow {
    pub event_id: String,
    pub manager_id: String,
    pub event_date: chrono::DateTime<chrono::Utc>,
    pub venue_id: String,
    pub available_spots_exec: i32,
    pub available_spots_standard: i32,
    pub sign_up_open: bool,
    pub approved_exec_count: i32,
    pub approved_standard_count: i32,
}

impl From<EventRow> for EventRecord {
    fn from(row: EventRow) -> Self {
        EventRecord {
            event_id: row.event_id,
            manager_id: row.manager_id,
            event_date: row.event_date,
            venue_id: row.venue_id,
            available_spots_exec: row.available_spots_exec,
            available_spots_standard: row.available_spots_standard,
            sign_up_open: row.sign_up_open,
            approved_exec_count: row.approved_exec_count,
            approved_standard_count: row.approved_standard_count,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SignUpRow {
    pub event_id: String,
    pub volunteer_id: String,
    pub signup_epoch: i64,
    pub status: String,
    pub assigned_role: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<i64>,
}

impl TryFrom<SignUpRow> for SignUpRecord {
    type Error = StoreError;

    fn try_from(row: SignUpRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<SignUpStatus>()
            .map_err(|e| StoreError::database("decode_signup", e))?;
        let assigned_role = row
            .assigned_role
            .as_deref()
            .map(str::parse::<VolunteerRole>)
            .transpose()
            .map_err(|e| StoreError::database("decode_signup", e))?;

        Ok(SignUpRecord {
            event_id: row.event_id,
            volunteer_id: row.volunteer_id,
            signup_epoch: row.signup_epoch,
            status,
            assigned_role,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
        })
    }
}

/// Classify a zero-row counter update after the fact.
///
/// `current` is the row re-read inside the same transaction, `None` if the
/// event is gone.
pub(crate) fn classify_counter_failure(
    current: Option<(i32, i32)>,
    delta: i32,
) -> ConditionFailure {
    match current {
        None => ConditionFailure::EventMissing,
        Some((count, capacity)) if delta > 0 && count + delta > capacity => {
            ConditionFailure::CapacityExceeded
        }
        Some(_) if delta < 0 => ConditionFailure::CounterUnderflow,
        Some(_) => ConditionFailure::CapacityExceeded,
    }
}
