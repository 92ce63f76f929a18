// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Caller identity resolution.
//!
//! Authentication happens upstream (API gateway / identity provider). This
//! module only reads what the gateway attached to the request and trusts it.

use std::collections::BTreeSet;

use axum::http::HeaderMap;

use crate::error::CoreError;

/// Authenticated caller as reported by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable caller id (the identity provider's subject).
    pub caller_id: String,
    /// Group memberships.
    pub groups: BTreeSet<String>,
}

impl Identity {
    /// Build an identity from a caller id and group names.
    pub fn new<I, S>(caller_id: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            caller_id: caller_id.into(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    /// True if the caller belongs to `group`.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// Fail with [`CoreError::Forbidden`] unless the caller belongs to `group`.
    pub fn require_group(&self, group: &str) -> Result<(), CoreError> {
        if self.in_group(group) {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                required_group: group.to_string(),
            })
        }
    }
}

/// Fail with [`CoreError::Unauthenticated`] when no identity was resolved.
pub fn require_caller(identity: Option<&Identity>) -> Result<&Identity, CoreError> {
    identity.ok_or(CoreError::Unauthenticated)
}

/// Resolves request headers to a caller identity.
pub trait IdentityProvider: Send + Sync {
    /// `None` when the request carries no usable identity.
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// Reads the caller id and a comma-separated group list from headers set by a
/// trusted gateway.
#[derive(Debug, Clone)]
pub struct HeaderIdentityProvider {
    caller_id_header: String,
    groups_header: String,
}

impl HeaderIdentityProvider {
    /// Header names are matched case-insensitively.
    pub fn new(caller_id_header: impl Into<String>, groups_header: impl Into<String>) -> Self {
        Self {
            caller_id_header: caller_id_header.into().to_ascii_lowercase(),
            groups_header: groups_header.into().to_ascii_lowercase(),
        }
    }
}

impl Default for HeaderIdentityProvider {
    fn default() -> Self {
        Self::new("x-caller-id", "x-caller-groups")
    }
}

impl IdentityProvider for HeaderIdentityProvider {
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        let caller_id = headers
            .get(self.caller_id_header.as_str())?
            .to_str()
            .ok()?
            .trim();
        if caller_id.is_empty() {
            return None;
        }

        let groups = headers
            .get(self.groups_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Identity {
            caller_id: caller_id.to_string(),
            groups,
        })
    }
}
