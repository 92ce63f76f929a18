// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Sign-up review state machine.
//!
//! ```text
//!                 approve (+1)
//!   ┌─────────┐ ───────────────► ┌──────────┐
//!   │ PENDING │                  │ APPROVED │ ◄─┐ approve (0, or role move)
//!   └────┬────┘                  └────┬─────┘ ──┘
//!        │ reject (0)        reject   │  ▲
//!        ▼                    (−1)    ▼  │ approve (+1)
//!   ┌──────────┐ ◄────────────────────┘  │
//!   │ REJECTED │ ────────────────────────┘
//!   └──────────┘ ◄─┐ reject (0)
//!             └────┘
//! ```
//!
//! Every `(status, action)` pair has exactly one row in [`TRANSITIONS`]. The
//! counter delta in that row applies to a single role; [`plan_review`] turns it
//! into concrete [`CounterEffect`]s, including the role move for an approved
//! volunteer re-approved under a different role.

use serde::Serialize;

use crate::model::{EventRecord, ReviewAction, SignUpRecord, SignUpStatus, VolunteerRole};

/// `(current status, action) → (next status, counter delta)`.
pub const TRANSITIONS: [(SignUpStatus, ReviewAction, SignUpStatus, i32); 6] = [
    (SignUpStatus::Pending, ReviewAction::Approve, SignUpStatus::Approved, 1),
    (SignUpStatus::Pending, ReviewAction::Reject, SignUpStatus::Rejected, 0),
    (SignUpStatus::Approved, ReviewAction::Approve, SignUpStatus::Approved, 0),
    (SignUpStatus::Approved, ReviewAction::Reject, SignUpStatus::Rejected, -1),
    (SignUpStatus::Rejected, ReviewAction::Approve, SignUpStatus::Approved, 1),
    (SignUpStatus::Rejected, ReviewAction::Reject, SignUpStatus::Rejected, 0),
];

/// Look up the transition for `(current, action)`.
pub fn transition(current: SignUpStatus, action: ReviewAction) -> (SignUpStatus, i32) {
    TRANSITIONS
        .iter()
        .find(|(from, act, _, _)| *from == current && *act == action)
        .map(|(_, _, next, delta)| (*next, *delta))
        // The table is total over both enums.
        .unwrap_or((current, 0))
}

/// A single change to an event's approved-count counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "role")]
pub enum CounterEffect {
    /// Take one spot in the role (guarded by capacity).
    Acquire(VolunteerRole),
    /// Give back one spot in the role (guarded by zero).
    Release(VolunteerRole),
}

impl CounterEffect {
    /// Role the effect applies to.
    pub fn role(&self) -> VolunteerRole {
        match self {
            Self::Acquire(role) | Self::Release(role) => *role,
        }
    }

    /// Signed change to the role's counter.
    pub fn delta(&self) -> i32 {
        match self {
            Self::Acquire(_) => 1,
            Self::Release(_) => -1,
        }
    }
}

/// Outcome of planning a review against a loaded sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPlan {
    /// Status observed when the plan was made; the write is conditioned on it.
    pub expected_status: SignUpStatus,
    /// Assigned role observed when the plan was made; also part of the write condition.
    pub expected_role: Option<VolunteerRole>,
    /// Status to write.
    pub next_status: SignUpStatus,
    /// Role to record on the sign-up.
    pub assigned_role: VolunteerRole,
    /// Counter changes, applied in order within the same transaction.
    pub effects: Vec<CounterEffect>,
}

impl ReviewPlan {
    /// Net change across all roles.
    pub fn count_adjustment(&self) -> i32 {
        self.effects.iter().map(CounterEffect::delta).sum()
    }

    /// Net change to one role's counter.
    pub fn adjustment_for(&self, role: VolunteerRole) -> i32 {
        self.effects
            .iter()
            .filter(|effect| effect.role() == role)
            .map(CounterEffect::delta)
            .sum()
    }

    /// Point-in-time capacity check against a loaded event.
    ///
    /// Returns the first role that has no spot left. This is advisory; the
    /// store re-checks capacity when the increment is applied.
    pub fn check_capacity(&self, event: &EventRecord) -> Result<(), VolunteerRole> {
        for effect in &self.effects {
            if let CounterEffect::Acquire(role) = effect
                && event.is_role_full(*role)
            {
                return Err(*role);
            }
        }
        Ok(())
    }
}

/// Plan the review of `signup` with `action`, recording `target_role`.
pub fn plan_review(
    signup: &SignUpRecord,
    action: ReviewAction,
    target_role: VolunteerRole,
) -> ReviewPlan {
    let (next_status, delta) = transition(signup.status, action);

    let effects = match delta {
        1 => vec![CounterEffect::Acquire(target_role)],
        // Release the role actually held, which may differ from the one in the request.
        -1 => vec![CounterEffect::Release(
            signup.assigned_role.unwrap_or(target_role),
        )],
        _ => match signup.held_role() {
            Some(held) if action == ReviewAction::Approve && held != target_role => {
                vec![
                    CounterEffect::Release(held),
                    CounterEffect::Acquire(target_role),
                ]
            }
            _ => Vec::new(),
        },
    };

    ReviewPlan {
        expected_status: signup.status,
        expected_role: signup.assigned_role,
        next_status,
        assigned_role: target_role,
        effects,
    }
}
