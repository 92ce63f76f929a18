// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared handler state.

use std::sync::Arc;

use crate::config::HandlerSettings;
use crate::identity::{HeaderIdentityProvider, IdentityProvider};
use crate::store::RecordStore;

/// Shared state for all request handlers.
///
/// Immutable after construction; every request reads it through an `Arc`.
pub struct HandlerState {
    /// Record store implementation.
    pub store: Arc<dyn RecordStore>,
    /// Resolves request headers to a caller.
    pub identity: Arc<dyn IdentityProvider>,
    /// Handler behavior settings.
    pub settings: HandlerSettings,
    /// When the server started (for uptime calculation).
    pub start_time: std::time::Instant,
    /// Server version string.
    pub version: String,
}

impl HandlerState {
    /// State with the default header identity provider and settings.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_parts(
            store,
            Arc::new(HeaderIdentityProvider::default()),
            HandlerSettings::default(),
        )
    }

    /// State from explicit collaborators.
    pub fn with_parts(
        store: Arc<dyn RecordStore>,
        identity: Arc<dyn IdentityProvider>,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            store,
            identity,
            settings,
            start_time: std::time::Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Get the server uptime in milliseconds.
    pub fn uptime_ms(&self) -> i64 {
        self.start_time.elapsed().as_millis() as i64
    }
}
