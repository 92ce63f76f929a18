// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Volunteer sign-up handler.
//!
//! Creates a pending sign-up for the calling volunteer. Duplicate prevention is
//! enforced by the store's conditional insert; the earlier existence read only
//! produces a friendlier rejection in the common case.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{CoreError, Result};
use crate::identity::{Identity, require_caller};
use crate::model::{SignUpRecord, SignUpStatus, VolunteerRole, epoch_seconds, require_event_id};
use crate::state::HandlerState;
use crate::store::{ConditionFailure, StoreError};

/// Body of `POST /volunteer-signups`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSignUpRequest {
    /// Event to sign up for.
    pub event_id: Option<String>,
}

/// Data returned for a new sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpCreated {
    /// Event id.
    pub event_id: String,
    /// Caller id of the volunteer.
    pub volunteer_id: String,
    /// Always `pending`.
    pub status: SignUpStatus,
    /// Creation time, seconds since epoch.
    pub signup_epoch: i64,
}

/// Handle a volunteer's request to attend an event.
///
/// Checks, in order: event id, event existence, sign-ups open, event not yet
/// started, no existing sign-up, and (when enabled) that no offered role is
/// already full. Writes exactly one pending record or nothing.
#[instrument(skip(state, caller, request))]
pub async fn handle_create_signup(
    state: &HandlerState,
    caller: Option<&Identity>,
    request: CreateSignUpRequest,
) -> Result<SignUpCreated> {
    let caller = require_caller(caller)?;
    let event_id = require_event_id("eventId", request.event_id.as_deref())?;
    let volunteer_id = caller.caller_id.as_str();

    debug!(event_id = %event_id, volunteer_id = %volunteer_id, "Sign-up requested");

    let event = state
        .store
        .get_event(&event_id)
        .await?
        .ok_or_else(|| CoreError::EventNotFound {
            event_id: event_id.clone(),
        })?;

    if !event.sign_up_open {
        return Err(CoreError::SignUpsClosed { event_id });
    }

    let now = Utc::now();
    if event.has_started(now) {
        return Err(CoreError::EventAlreadyStarted { event_id });
    }

    if state
        .store
        .get_signup(&event_id, volunteer_id)
        .await?
        .is_some()
    {
        return Err(CoreError::AlreadySignedUp {
            event_id,
            volunteer_id: volunteer_id.to_string(),
        });
    }

    if state.settings.signup_capacity_precheck {
        for role in [VolunteerRole::Exec, VolunteerRole::Standard] {
            if event.capacity(role) > 0 && event.is_role_full(role) {
                warn!(
                    event_id = %event_id,
                    role = %role,
                    approved = event.approved_count(role),
                    capacity = event.capacity(role),
                    "Sign-up rejected, role is full"
                );
                return Err(CoreError::RoleFull { event_id, role });
            }
        }
    }

    let record = SignUpRecord::pending(&event_id, volunteer_id, epoch_seconds(now));

    match state.store.put_signup_if_absent(&record).await {
        Ok(()) => {}
        Err(StoreError::ConditionFailed {
            reason: ConditionFailure::AlreadyExists,
            ..
        }) => {
            warn!(event_id = %event_id, volunteer_id = %volunteer_id, "Concurrent duplicate sign-up");
            return Err(CoreError::AlreadySignedUp {
                event_id,
                volunteer_id: volunteer_id.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    }

    info!(event_id = %event_id, volunteer_id = %volunteer_id, "Volunteer signed up");

    Ok(SignUpCreated {
        event_id: record.event_id,
        volunteer_id: record.volunteer_id,
        status: record.status,
        signup_epoch: record.signup_epoch,
    })
}
