// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Event and volunteer sign-up records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle status of a volunteer sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignUpStatus {
    /// Awaiting a manager decision.
    Pending,
    /// Holding a spot in the assigned role.
    Approved,
    /// Declined by a manager.
    Rejected,
}

impl SignUpStatus {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SignUpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignUpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown sign-up status '{}'", other)),
        }
    }
}

/// Role a volunteer is assigned to at an event. Each role has its own capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolunteerRole {
    /// Executive volunteer.
    Exec,
    /// Standard volunteer.
    Standard,
}

impl VolunteerRole {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exec => "exec",
            Self::Standard => "standard",
        }
    }

    /// Name of the event column holding this role's approved count.
    pub fn count_column(&self) -> &'static str {
        match self {
            Self::Exec => "approved_exec_count",
            Self::Standard => "approved_standard_count",
        }
    }

    /// Name of the event column holding this role's capacity.
    pub fn capacity_column(&self) -> &'static str {
        match self {
            Self::Exec => "available_spots_exec",
            Self::Standard => "available_spots_standard",
        }
    }
}

impl fmt::Display for VolunteerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolunteerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exec" => Ok(Self::Exec),
            "standard" => Ok(Self::Standard),
            other => Err(format!("unknown volunteer role '{}'", other)),
        }
    }
}

/// Manager decision on a sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    /// Grant the volunteer a spot.
    Approve,
    /// Decline (or revoke) the volunteer.
    Reject,
}

impl ReviewAction {
    /// Wire string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl FromStr for ReviewAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(format!("Action must be 'approve' or 'reject', got '{}'", other)),
        }
    }
}

/// A scheduled event with per-role volunteer capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Unique event identifier.
    pub event_id: String,
    /// Manager who created the event.
    pub manager_id: String,
    /// When the event takes place.
    pub event_date: DateTime<Utc>,
    /// Venue reference.
    pub venue_id: String,
    /// Capacity for exec volunteers.
    pub available_spots_exec: i32,
    /// Capacity for standard volunteers.
    pub available_spots_standard: i32,
    /// Whether volunteers may currently sign up.
    pub sign_up_open: bool,
    /// Approved exec volunteers.
    pub approved_exec_count: i32,
    /// Approved standard volunteers.
    pub approved_standard_count: i32,
}

impl EventRecord {
    /// Capacity configured for `role`.
    pub fn capacity(&self, role: VolunteerRole) -> i32 {
        match role {
            VolunteerRole::Exec => self.available_spots_exec,
            VolunteerRole::Standard => self.available_spots_standard,
        }
    }

    /// Approved volunteers currently holding a `role` spot.
    pub fn approved_count(&self, role: VolunteerRole) -> i32 {
        match role {
            VolunteerRole::Exec => self.approved_exec_count,
            VolunteerRole::Standard => self.approved_standard_count,
        }
    }

    /// True when no more `role` approvals fit.
    pub fn is_role_full(&self, role: VolunteerRole) -> bool {
        self.approved_count(role) >= self.capacity(role)
    }

    /// True once the scheduled time is before `now`.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.event_date < now
    }
}

/// A volunteer's request to attend an event, keyed by `(event_id, volunteer_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRecord {
    /// Event the volunteer signed up for (partition key).
    pub event_id: String,
    /// Volunteer caller id (sort key).
    pub volunteer_id: String,
    /// Creation time, seconds since epoch.
    pub signup_epoch: i64,
    /// Current lifecycle status.
    pub status: SignUpStatus,
    /// Role from the latest review; `None` while pending.
    pub assigned_role: Option<VolunteerRole>,
    /// Manager who made the latest review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    /// Time of the latest review, seconds since epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<i64>,
}

impl SignUpRecord {
    /// New pending sign-up created at `signup_epoch`.
    pub fn pending(
        event_id: impl Into<String>,
        volunteer_id: impl Into<String>,
        signup_epoch: i64,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            volunteer_id: volunteer_id.into(),
            signup_epoch,
            status: SignUpStatus::Pending,
            assigned_role: None,
            reviewed_by: None,
            reviewed_at: None,
        }
    }

    /// Role whose spot this sign-up currently occupies, if any.
    pub fn held_role(&self) -> Option<VolunteerRole> {
        match self.status {
            SignUpStatus::Approved => self.assigned_role,
            SignUpStatus::Pending | SignUpStatus::Rejected => None,
        }
    }
}

/// Seconds since the Unix epoch for `at`.
pub fn epoch_seconds(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

/// Require `raw` to be present and a well-formed UUID.
///
/// The id is returned as given; the store compares ids as opaque strings.
pub fn require_event_id(field: &str, raw: Option<&str>) -> Result<String, CoreError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::validation(field, "Event ID is required"))?;

    uuid::Uuid::parse_str(raw)
        .map_err(|_| CoreError::validation(field, "Event ID must be a valid UUID"))?;

    Ok(raw.to_string())
}
