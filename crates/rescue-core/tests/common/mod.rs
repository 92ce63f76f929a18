// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for rescue-core integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use rescue_core::identity::Identity;
use rescue_core::model::{EventRecord, SignUpRecord, SignUpStatus, VolunteerRole};
use rescue_core::state::HandlerState;
use rescue_core::store::{PostgresStore, RecordStore, SqliteStore, StoreError, WriteOp};

/// Store and handler state for one test.
pub struct TestContext {
    pub store: Arc<dyn RecordStore>,
    pub state: HandlerState,
}

impl TestContext {
    /// Fresh in-memory SQLite store.
    pub async fn sqlite() -> Self {
        let store = Arc::new(
            SqliteStore::in_memory()
                .await
                .expect("Failed to create in-memory store"),
        );
        Self::with_store(store)
    }

    /// PostgreSQL store from `TEST_DATABASE_URL`, migrated.
    pub async fn postgres() -> Option<Self> {
        let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
        let store = PostgresStore::connect(&database_url, 10).await.ok()?;
        Some(Self::with_store(Arc::new(store)))
    }

    pub fn with_store(store: Arc<dyn RecordStore>) -> Self {
        let state = HandlerState::new(store.clone());
        Self { store, state }
    }

    /// Seed an open event with the given capacities; returns its id.
    pub async fn seed_event(&self, exec: i32, standard: i32) -> String {
        let event = open_event(exec, standard);
        self.store
            .put_event(&event)
            .await
            .expect("Failed to seed event");
        event.event_id
    }

    pub async fn event(&self, event_id: &str) -> EventRecord {
        self.store
            .get_event(event_id)
            .await
            .expect("Failed to load event")
            .expect("event should exist")
    }

    pub async fn signup(&self, event_id: &str, volunteer_id: &str) -> Option<SignUpRecord> {
        self.store
            .get_signup(event_id, volunteer_id)
            .await
            .expect("Failed to load sign-up")
    }
}

/// Open event three days out under a fresh UUID.
pub fn open_event(exec: i32, standard: i32) -> EventRecord {
    EventRecord {
        event_id: Uuid::new_v4().to_string(),
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

pub fn volunteer(id: &str) -> Identity {
    Identity::new(id, ["Volunteers"])
}

pub fn manager() -> Identity {
    Identity::new("manager-1", ["Managers", "Volunteers"])
}

/// Serves a frozen event snapshot for reads and forwards everything else.
///
/// Models a reader whose point-in-time view is stale by the time it writes.
pub struct StaleEventStore {
    pub inner: Arc<dyn RecordStore>,
    pub snapshot: EventRecord,
}

#[async_trait]
impl RecordStore for StaleEventStore {
    async fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>, StoreError> {
        if event_id == self.snapshot.event_id {
            return Ok(Some(self.snapshot.clone()));
        }
        self.inner.get_event(event_id).await
    }

    async fn put_event(&self, event: &EventRecord) -> Result<(), StoreError> {
        self.inner.put_event(event).await
    }

    async fn get_signup(
        &self,
        event_id: &str,
        volunteer_id: &str,
    ) -> Result<Option<SignUpRecord>, StoreError> {
        self.inner.get_signup(event_id, volunteer_id).await
    }

    async fn put_signup_if_absent(&self, record: &SignUpRecord) -> Result<(), StoreError> {
        self.inner.put_signup_if_absent(record).await
    }

    async fn query_signups(&self, event_id: &str) -> Result<Vec<SignUpRecord>, StoreError> {
        self.inner.query_signups(event_id).await
    }

    async fn transact_write(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        self.inner.transact_write(ops).await
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.inner.health_check().await
    }
}

/// Serves a frozen sign-up snapshot for reads and forwards everything else.
pub struct StaleSignUpStore {
    pub inner: Arc<dyn RecordStore>,
    pub snapshot: SignUpRecord,
}

#[async_trait]
impl RecordStore for StaleSignUpStore {
    async fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>, StoreError> {
        self.inner.get_event(event_id).await
    }

    async fn put_event(&self, event: &EventRecord) -> Result<(), StoreError> {
        self.inner.put_event(event).await
    }

    async fn get_signup(
        &self,
        event_id: &str,
        volunteer_id: &str,
    ) -> Result<Option<SignUpRecord>, StoreError> {
        if event_id == self.snapshot.event_id && volunteer_id == self.snapshot.volunteer_id {
            return Ok(Some(self.snapshot.clone()));
        }
        self.inner.get_signup(event_id, volunteer_id).await
    }

    async fn put_signup_if_absent(&self, record: &SignUpRecord) -> Result<(), StoreError> {
        self.inner.put_signup_if_absent(record).await
    }

    async fn query_signups(&self, event_id: &str) -> Result<Vec<SignUpRecord>, StoreError> {
        self.inner.query_signups(event_id).await
    }

    async fn transact_write(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        self.inner.transact_write(ops).await
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.inner.health_check().await
    }
}

/// Assert both approved counters equal the approved sign-ups holding each role.
pub async fn assert_counters_match_records(store: &dyn RecordStore, event_id: &str) {
    let event = store
        .get_event(event_id)
        .await
        .expect("Failed to load event")
        .expect("event should exist");
    let signups = store
        .query_signups(event_id)
        .await
        .expect("Failed to query sign-ups");
    let held = |role: VolunteerRole| {
        signups
            .iter()
            .filter(|s| s.status == SignUpStatus::Approved && s.assigned_role == Some(role))
            .count() as i32
    };
    assert_eq!(event.approved_exec_count, held(VolunteerRole::Exec), "exec counter");
    assert_eq!(
        event.approved_standard_count,
        held(VolunteerRole::Standard),
        "standard counter"
    );
}

/// Counts every call that reaches the store.
pub struct CountingStore {
    pub inner: Arc<dyn RecordStore>,
    pub calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>, StoreError> {
        self.hit();
        self.inner.get_event(event_id).await
    }

    async fn put_event(&self, event: &EventRecord) -> Result<(), StoreError> {
        self.hit();
        self.inner.put_event(event).await
    }

    async fn get_signup(
        &self,
        event_id: &str,
        volunteer_id: &str,
    ) -> Result<Option<SignUpRecord>, StoreError> {
        self.hit();
        self.inner.get_signup(event_id, volunteer_id).await
    }

    async fn put_signup_if_absent(&self, record: &SignUpRecord) -> Result<(), StoreError> {
        self.hit();
        self.inner.put_signup_if_absent(record).await
    }

    async fn query_signups(&self, event_id: &str) -> Result<Vec<SignUpRecord>, StoreError> {
        self.hit();
        self.inner.query_signups(event_id).await
    }

    async fn transact_write(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        self.hit();
        self.inner.transact_write(ops).await
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.hit();
        self.inner.health_check().await
    }
}
