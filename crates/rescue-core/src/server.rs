// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP server for rescue-core.
//!
//! Routes JSON requests to the sign-up, confirmation, roster and health
//! handlers and renders their results in the response envelope.

pub mod http_server;

pub use http_server::{HttpServerState, router, run_http_server};
