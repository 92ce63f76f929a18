// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Health check handler.

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::state::HandlerState;

/// Server health snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// True when the record store answered the probe.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Milliseconds since the handler state was created.
    pub uptime_ms: i64,
}

/// Handle health check request.
///
/// Never fails; an unreachable store is reported as `healthy: false`.
#[instrument(skip(state))]
pub async fn handle_health_check(state: &HandlerState) -> HealthStatus {
    debug!("Health check requested");

    let healthy = match state.store.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            warn!(error = %e, "Record store health check failed");
            false
        }
    };

    HealthStatus {
        healthy,
        version: state.version.clone(),
        uptime_ms: state.uptime_ms(),
    }
}
