// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rescue Core - Volunteer Sign-up Service
//!
//! Volunteers ask to attend rescue events; managers approve or reject them
//! against fixed per-role capacity. Approved counts never exceed capacity,
//! including under concurrent approvals.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  API gateway / identity      │  injects x-caller-id, x-caller-groups
//! └──────────────┬───────────────┘
//!                ▼
//! ┌──────────────────────────────┐
//! │  rescue-core (HTTP, axum)    │
//! │  signup / confirm / roster   │
//! └──────────────┬───────────────┘
//!                ▼
//! ┌──────────────────────────────┐
//! │  RecordStore                 │  PostgreSQL or SQLite
//! │  events, volunteer_signups   │
//! └──────────────────────────────┘
//! ```
//!
//! # HTTP API
//!
//! | Route | Caller | Description |
//! |-------|--------|-------------|
//! | `POST /volunteer-signups` | any volunteer | Create a pending sign-up |
//! | `POST /volunteer-signups/confirm` | manager | Approve or reject a sign-up |
//! | `GET /events/{event_id}/volunteers` | manager | List sign-ups, optional `?status=` |
//! | `GET /health` | anyone | Store connectivity, version, uptime |
//!
//! Responses use `{ "success": true, "message"?, "data" }` on success and
//! `{ "success": false, "error", "errorCode" }` on failure.
//!
//! # Sign-up Status State Machine
//!
//! See [`lifecycle`]. Approving takes a spot in the assigned role, rejecting
//! an approved volunteer gives it back, and everything else leaves the
//! counters alone.
//!
//! # Configuration
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `RESCUE_DATABASE_URL` | Yes | - | `postgres://` or `sqlite:` URL |
//! | `RESCUE_HTTP_PORT` | No | `8080` | HTTP listen port |
//! | `RESCUE_DB_MAX_CONNECTIONS` | No | `10` | Pool size |
//! | `RESCUE_MANAGER_GROUP` | No | `Managers` | Group allowed to review and list |
//! | `RESCUE_CALLER_ID_HEADER` | No | `x-caller-id` | Caller id header |
//! | `RESCUE_CALLER_GROUPS_HEADER` | No | `x-caller-groups` | Caller groups header |
//! | `RESCUE_SIGNUP_CAPACITY_PRECHECK` | No | `true` | Refuse sign-ups when a role is full |
//! | `RESCUE_LOG_FORMAT` | No | `text` | `text` or `json` |
//!
//! The sign-up capacity precheck ignores roles with zero capacity, so an event
//! offering only one role still accepts sign-ups.

#![deny(missing_docs)]

/// Service configuration loaded from environment variables.
pub mod config;

/// Error types with HTTP status and error code mapping.
pub mod error;

/// Caller identity resolution and group checks.
pub mod identity;

/// Sign-up review state machine.
pub mod lifecycle;

/// Embedded database migrations.
pub mod migrations;

/// Event and sign-up records.
pub mod model;

/// Embeddable runtime (builder, start, graceful shutdown).
pub mod runtime;

/// HTTP router and server loop.
pub mod server;

/// Shared handler state.
pub mod state;

/// Record store trait and PostgreSQL/SQLite backends.
pub mod store;

/// Sign-up creation handler.
pub mod signup_handlers;

/// Manager review handler.
pub mod confirmation_handlers;

/// Roster listing handler.
pub mod roster_handlers;

/// Health check handler.
pub mod management_handlers;

#[cfg(test)]
mod testing;
