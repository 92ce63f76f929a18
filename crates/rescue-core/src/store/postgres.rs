// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL-backed record store.
//!
//! Conditional updates run under READ COMMITTED. A competing writer holding the
//! same event row blocks the counter update until it commits, after which the
//! WHERE clause is re-evaluated against the new row version, so the capacity
//! bound holds for concurrent approvals.

use sqlx::PgPool;
use sqlx::postgres::{PgConnection, PgPoolOptions};
use tracing::debug;

use crate::model::{EventRecord, SignUpRecord};

use super::{
    ConditionFailure, EventRow, RecordStore, SignUpRow, StoreError, WriteOp,
    classify_counter_failure,
};

/// PostgreSQL-backed record store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new Postgres-backed store from an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `url` and run migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StoreError::database("connect", e))?;

        crate::migrations::POSTGRES
            .run(&pool)
            .await
            .map_err(|e| StoreError::database("migrate", format!("Failed to run migrations: {}", e)))?;

        Ok(Self { pool })
    }

    /// Underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn apply_op(conn: &mut PgConnection, index: usize, op: &WriteOp) -> Result<(), StoreError> {
    match op {
        WriteOp::PutSignUp { record } => {
            let result = sqlx::query(
                r#"
                INSERT INTO volunteer_signups
                    (event_id, volunteer_id, signup_epoch, status, assigned_role, reviewed_by, reviewed_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (event_id, volunteer_id) DO NOTHING
                "#,
            )
            .bind(&record.event_id)
            .bind(&record.volunteer_id)
            .bind(record.signup_epoch)
            .bind(record.status.as_str())
            .bind(record.assigned_role.map(|r| r.as_str()))
            .bind(&record.reviewed_by)
            .bind(record.reviewed_at)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::ConditionFailed {
                    index,
                    reason: ConditionFailure::AlreadyExists,
                });
            }
        }
        WriteOp::UpdateSignUp {
            event_id,
            volunteer_id,
            expected_status,
            expected_role,
            changes,
        } => {
            let result = sqlx::query(
                r#"
                UPDATE volunteer_signups
                SET status = $1, assigned_role = $2, reviewed_by = $3, reviewed_at = $4
                WHERE event_id = $5 AND volunteer_id = $6 AND status = $7
                  AND assigned_role IS NOT DISTINCT FROM $8
                "#,
            )
            .bind(changes.status.as_str())
            .bind(changes.assigned_role.as_str())
            .bind(&changes.reviewed_by)
            .bind(changes.reviewed_at)
            .bind(event_id)
            .bind(volunteer_id)
            .bind(expected_status.as_str())
            .bind(expected_role.map(|r| r.as_str()))
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::ConditionFailed {
                    index,
                    reason: ConditionFailure::StatusMismatch,
                });
            }
        }
        WriteOp::AdjustCounter {
            event_id,
            role,
            delta,
        } => {
            let count = role.count_column();
            let capacity = role.capacity_column();
            let sql = format!(
                "UPDATE events SET {count} = {count} + $1 \
                 WHERE event_id = $2 AND {count} + $1 >= 0 AND {count} + $1 <= {capacity}"
            );
            let result = sqlx::query(&sql)
                .bind(*delta)
                .bind(event_id)
                .execute(&mut *conn)
                .await?;

            if result.rows_affected() == 0 {
                let current: Option<(i32, i32)> = sqlx::query_as(&format!(
                    "SELECT {count}, {capacity} FROM events WHERE event_id = $1"
                ))
                .bind(event_id)
                .fetch_optional(&mut *conn)
                .await?;

                return Err(StoreError::ConditionFailed {
                    index,
                    reason: classify_counter_failure(current, *delta),
                });
            }
        }
    }

    Ok(())
}

#[async_trait::async_trait]
impl RecordStore for PostgresStore {
    async fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT event_id, manager_id, event_date, venue_id,
                   available_spots_exec, available_spots_standard, sign_up_open,
                   approved_exec_count, approved_standard_count
            FROM events
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EventRecord::from))
    }

    async fn put_event(&self, event: &EventRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO events
                (event_id, manager_id, event_date, venue_id,
                 available_spots_exec, available_spots_standard, sign_up_open,
                 approved_exec_count, approved_standard_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (event_id) DO UPDATE SET
                manager_id = EXCLUDED.manager_id,
                event_date = EXCLUDED.event_date,
                venue_id = EXCLUDED.venue_id,
                available_spots_exec = EXCLUDED.available_spots_exec,
                available_spots_standard = EXCLUDED.available_spots_standard,
                sign_up_open = EXCLUDED.sign_up_open,
                approved_exec_count = EXCLUDED.approved_exec_count,
                approved_standard_count = EXCLUDED.approved_standard_count
            "#,
        )
        .bind(&event.event_id)
        .bind(&event.manager_id)
        .bind(event.event_date)
        .bind(&event.venue_id)
        .bind(event.available_spots_exec)
        .bind(event.available_spots_standard)
        .bind(event.sign_up_open)
        .bind(event.approved_exec_count)
        .bind(event.approved_standard_count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_signup(
        &self,
        event_id: &str,
        volunteer_id: &str,
    ) -> Result<Option<SignUpRecord>, StoreError> {
        let row = sqlx::query_as::<_, SignUpRow>(
            r#"
            SELECT event_id, volunteer_id, signup_epoch, status,
                   assigned_role, reviewed_by, reviewed_at
            FROM volunteer_signups
            WHERE event_id = $1 AND volunteer_id = $2
            "#,
        )
        .bind(event_id)
        .bind(volunteer_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SignUpRecord::try_from).transpose()
    }

    async fn put_signup_if_absent(&self, record: &SignUpRecord) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        apply_op(
            &mut *conn,
            0,
            &WriteOp::PutSignUp {
                record: record.clone(),
            },
        )
        .await
    }

    async fn query_signups(&self, event_id: &str) -> Result<Vec<SignUpRecord>, StoreError> {
        let rows = sqlx::query_as::<_, SignUpRow>(
            r#"
            SELECT event_id, volunteer_id, signup_epoch, status,
                   assigned_role, reviewed_by, reviewed_at
            FROM volunteer_signups
            WHERE event_id = $1
            ORDER BY volunteer_id
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SignUpRecord::try_from).collect()
    }

    async fn transact_write(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for (index, op) in ops.iter().enumerate() {
            if let Err(e) = apply_op(&mut *tx, index, op).await {
                debug!(index, error = %e, "Transaction aborted");
                tx.rollback().await?;
                return Err(e);
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let row: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        Ok(row.0 == 1)
    }
}
