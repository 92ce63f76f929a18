// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fixtures shared by the handler unit tests.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::identity::Identity;
use crate::model::EventRecord;
use crate::state::HandlerState;
use crate::store::{RecordStore, SqliteStore};

pub(crate) const EVENT_ID: &str = "5f0c7a52-8d7e-4b8e-9a39-3f6a0c1d2e4b";

/// Handler state over a fresh in-memory SQLite store.
pub(crate) async fn test_state() -> (Arc<SqliteStore>, HandlerState) {
    let store = Arc::new(
        SqliteStore::in_memory()
            .await
            .expect("Failed to create in-memory store"),
    );
    let state = HandlerState::new(store.clone());
    (store, state)
}

/// Open event three days out with the given capacities and no approvals.
pub(crate) fn open_event(exec: i32, standard: i32) -> EventRecord {
    EventRecord {
        event_id: EVENT_ID.to_string(),
        manager_id: "manager-1".to_string(),
        event_date: Utc::now() + Duration::days(3),
        venue_id: "venue-1".to_string(),
        available_spots_exec: exec,
        available_spots_standard: standard,
        sign_up_open: true,
        approved_exec_count: 0,
        approved_standard_count: 0,
    }
}

pub(crate) async fn seed(store: &SqliteStore, event: &EventRecord) {
    store.put_event(event).await.expect("Failed to seed event");
}

pub(crate) fn volunteer(id: &str) -> Identity {
    Identity::new(id, ["Volunteers"])
}

pub(crate) fn manager() -> Identity {
    Identity::new("manager-1", ["Managers"])
}
