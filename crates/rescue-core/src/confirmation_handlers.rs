// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Manager review of volunteer sign-ups.
//!
//! A review is planned against a point-in-time read and then applied as a
//! single [`RecordStore::transact_write`](crate::store::RecordStore::transact_write):
//!
//! 1. `UpdateSignUp`, conditioned on the status and assigned role that were read.
//! 2. One `AdjustCounter` per counter effect, each bounded by the store to
//!    `0 <= count <= capacity`.
//!
//! The early capacity check only short-circuits the obvious case. Correctness
//! under concurrent approvals comes from the counter condition.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{CoreError, Result};
use crate::identity::{Identity, require_caller};
use crate::lifecycle::{ReviewPlan, plan_review};
use crate::model::{ReviewAction, SignUpStatus, VolunteerRole, epoch_seconds, require_event_id};
use crate::state::HandlerState;
use crate::store::{ConditionFailure, SignUpChanges, StoreError, WriteOp};

/// Body of `POST /volunteer-signups/confirm`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmVolunteerRequest {
    /// Event id.
    pub event_id: Option<String>,
    /// Volunteer whose sign-up is reviewed.
    pub volunteer_id: Option<String>,
    /// `exec` or `standard`.
    pub assigned_role: Option<String>,
    /// `approve` or `reject`.
    pub action: Option<String>,
}

/// Data returned for a completed review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerReviewed {
    /// Event id.
    pub event_id: String,
    /// Volunteer id.
    pub volunteer_id: String,
    /// Status after the review.
    pub status: SignUpStatus,
    /// Role recorded on the sign-up.
    pub assigned_role: VolunteerRole,
    /// Status before the review.
    pub previous_status: SignUpStatus,
    /// Reviewing manager.
    pub reviewed_by: String,
    /// Review time, seconds since epoch.
    pub reviewed_at: i64,
    /// Net change applied to the event's approved counters.
    pub count_adjustment: i32,
}

/// Validated review request.
#[derive(Debug)]
struct Review {
    event_id: String,
    volunteer_id: String,
    role: VolunteerRole,
    action: ReviewAction,
}

impl TryFrom<ConfirmVolunteerRequest> for Review {
    type Error = CoreError;

    fn try_from(request: ConfirmVolunteerRequest) -> Result<Self> {
        let event_id = require_event_id("eventId", request.event_id.as_deref())?;

        let volunteer_id = request
            .volunteer_id
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CoreError::validation("volunteerId", "Volunteer ID is required"))?;

        let role = request
            .assigned_role
            .ok_or_else(|| CoreError::validation("assignedRole", "Assigned role is required"))?
            .parse::<VolunteerRole>()
            .map_err(|e| CoreError::validation("assignedRole", e))?;

        let action = request
            .action
            .ok_or_else(|| CoreError::validation("action", "Action is required"))?
            .parse::<ReviewAction>()
            .map_err(|e| CoreError::validation("action", e))?;

        Ok(Self {
            event_id,
            volunteer_id,
            role,
            action,
        })
    }
}

/// Handle a manager's approve/reject decision on a sign-up.
///
/// The caller must belong to the manager group; that is checked before any
/// store access. On success both the sign-up and the affected counters have
/// been updated together; on any failure nothing has changed.
#[instrument(skip(state, caller, request))]
pub async fn handle_confirm_volunteer(
    state: &HandlerState,
    caller: Option<&Identity>,
    request: ConfirmVolunteerRequest,
) -> Result<VolunteerReviewed> {
    let caller = require_caller(caller)?;
    caller.require_group(&state.settings.manager_group)?;
    let review = Review::try_from(request)?;

    debug!(
        event_id = %review.event_id,
        volunteer_id = %review.volunteer_id,
        action = review.action.as_str(),
        role = %review.role,
        "Review requested"
    );

    let event = state
        .store
        .get_event(&review.event_id)
        .await?
        .ok_or_else(|| CoreError::EventNotFound {
            event_id: review.event_id.clone(),
        })?;

    let signup = state
        .store
        .get_signup(&review.event_id, &review.volunteer_id)
        .await?
        .ok_or_else(|| CoreError::SignUpNotFound {
            event_id: review.event_id.clone(),
            volunteer_id: review.volunteer_id.clone(),
        })?;

    let plan = plan_review(&signup, review.action, review.role);

    if let Err(role) = plan.check_capacity(&event) {
        warn!(
            event_id = %review.event_id,
            role = %role,
            approved = event.approved_count(role),
            capacity = event.capacity(role),
            "Approval rejected, role is at capacity"
        );
        return Err(CoreError::CapacityExceeded {
            event_id: review.event_id,
            role,
        });
    }

    let reviewed_at = epoch_seconds(Utc::now());
    let ops = build_ops(&review, &plan, &caller.caller_id, reviewed_at);

    if let Err(e) = state.store.transact_write(&ops).await {
        return Err(translate_write_failure(e, &review, &plan));
    }

    info!(
        event_id = %review.event_id,
        volunteer_id = %review.volunteer_id,
        previous_status = %plan.expected_status,
        status = %plan.next_status,
        role = %plan.assigned_role,
        count_adjustment = plan.count_adjustment(),
        reviewed_by = %caller.caller_id,
        "Sign-up reviewed"
    );

    Ok(VolunteerReviewed {
        count_adjustment: plan.count_adjustment(),
        event_id: review.event_id,
        volunteer_id: review.volunteer_id,
        status: plan.next_status,
        assigned_role: plan.assigned_role,
        previous_status: plan.expected_status,
        reviewed_by: caller.caller_id.clone(),
        reviewed_at,
    })
}

/// Sign-up update first, then counter effects in plan order.
fn build_ops(review: &Review, plan: &ReviewPlan, reviewer: &str, reviewed_at: i64) -> Vec<WriteOp> {
    let mut ops = Vec::with_capacity(1 + plan.effects.len());
    ops.push(WriteOp::UpdateSignUp {
        event_id: review.event_id.clone(),
        volunteer_id: review.volunteer_id.clone(),
        expected_status: plan.expected_status,
        expected_role: plan.expected_role,
        changes: SignUpChanges {
            status: plan.next_status,
            assigned_role: plan.assigned_role,
            reviewed_by: reviewer.to_string(),
            reviewed_at,
        },
    });
    ops.extend(plan.effects.iter().map(|effect| WriteOp::AdjustCounter {
        event_id: review.event_id.clone(),
        role: effect.role(),
        delta: effect.delta(),
    }));
    ops
}

fn translate_write_failure(err: StoreError, review: &Review, plan: &ReviewPlan) -> CoreError {
    let (index, reason) = match err {
        StoreError::ConditionFailed { index, reason } => (index, reason),
        other => return other.into(),
    };

    let concurrent = || CoreError::ConcurrentModification {
        event_id: review.event_id.clone(),
        volunteer_id: review.volunteer_id.clone(),
    };

    warn!(
        event_id = %review.event_id,
        volunteer_id = %review.volunteer_id,
        index,
        reason = %reason,
        "Review write rejected by store"
    );

    // Index 0 is the sign-up update; counter effects follow in plan order.
    let Some(effect) = index.checked_sub(1).and_then(|i| plan.effects.get(i)) else {
        return concurrent();
    };

    match reason {
        ConditionFailure::CapacityExceeded => CoreError::CapacityExceeded {
            event_id: review.event_id.clone(),
            role: effect.role(),
        },
        ConditionFailure::EventMissing => CoreError::EventNotFound {
            event_id: review.event_id.clone(),
        },
        ConditionFailure::CounterUnderflow
        | ConditionFailure::StatusMismatch
        | ConditionFailure::AlreadyExists => concurrent(),
    }
}
