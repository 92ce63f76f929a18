// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Manager roster of an event's volunteers.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{CoreError, Result};
use crate::identity::{Identity, require_caller};
use crate::model::{SignUpRecord, SignUpStatus, require_event_id};
use crate::state::HandlerState;

/// Query string of `GET /events/{event_id}/volunteers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListVolunteersQuery {
    /// Only return sign-ups in this status.
    pub status: Option<String>,
}

/// Roster data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerRoster {
    /// Event id.
    pub event_id: String,
    /// Number of sign-ups returned.
    pub count: usize,
    /// Sign-ups ordered by volunteer id.
    pub volunteers: Vec<SignUpRecord>,
}

/// List the sign-ups for an event.
///
/// Manager-only. The event itself is not looked up, so an unknown event yields
/// an empty roster.
#[instrument(skip(state, caller, query))]
pub async fn handle_list_volunteers(
    state: &HandlerState,
    caller: Option<&Identity>,
    event_id: &str,
    query: ListVolunteersQuery,
) -> Result<VolunteerRoster> {
    let caller = require_caller(caller)?;
    caller.require_group(&state.settings.manager_group)?;
    let event_id = require_event_id("eventId", Some(event_id))?;

    let status_filter = query
        .status
        .as_deref()
        .map(str::parse::<SignUpStatus>)
        .transpose()
        .map_err(|e| CoreError::validation("status", e))?;

    let mut volunteers = state.store.query_signups(&event_id).await?;
    if let Some(status) = status_filter {
        volunteers.retain(|signup| signup.status == status);
    }

    debug!(
        event_id = %event_id,
        count = volunteers.len(),
        status = ?status_filter,
        "Roster listed"
    );

    Ok(VolunteerRoster {
        event_id,
        count: volunteers.len(),
        volunteers,
    })
}
