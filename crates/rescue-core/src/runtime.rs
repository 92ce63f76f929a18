// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Embeddable runtime for rescue-core.
//!
//! [`ServiceRuntime`] runs the HTTP server inside an existing tokio
//! application instead of as a standalone binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rescue_core::runtime::ServiceRuntime;
//! use rescue_core::store::PostgresStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(PostgresStore::connect("postgres://...", 10).await?);
//!
//!     let runtime = ServiceRuntime::builder()
//!         .store(store)
//!         .bind_addr("0.0.0.0:8080".parse()?)
//!         .build()?
//!         .start()
//!         .await?;
//!
//!     // ... run your application ...
//!
//!     runtime.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::HandlerSettings;
use crate::identity::{HeaderIdentityProvider, IdentityProvider};
use crate::server::{HttpServerState, run_http_server};
use crate::state::HandlerState;
use crate::store::RecordStore;

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);

/// Builder for creating a [`ServiceRuntime`].
pub struct ServiceRuntimeBuilder {
    store: Option<Arc<dyn RecordStore>>,
    identity: Option<Arc<dyn IdentityProvider>>,
    settings: HandlerSettings,
    bind_addr: SocketAddr,
}

impl std::fmt::Debug for ServiceRuntimeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRuntimeBuilder")
            .field("store", &self.store.as_ref().map(|_| "..."))
            .field("identity", &self.identity.as_ref().map(|_| "..."))
            .field("settings", &self.settings)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl Default for ServiceRuntimeBuilder {
    fn default() -> Self {
        Self {
            store: None,
            identity: None,
            settings: HandlerSettings::default(),
            bind_addr: DEFAULT_BIND_ADDR,
        }
    }
}

impl ServiceRuntimeBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record store (required).
    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the identity provider.
    ///
    /// Default: [`HeaderIdentityProvider::default`]
    pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Set handler behavior.
    pub fn settings(mut self, settings: HandlerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the bind address for the HTTP server.
    ///
    /// Default: `0.0.0.0:8080`
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Build the runtime configuration.
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<ServiceRuntimeConfig> {
        let store = self
            .store
            .ok_or_else(|| anyhow::anyhow!("store is required"))?;

        Ok(ServiceRuntimeConfig {
            store,
            identity: self
                .identity
                .unwrap_or_else(|| Arc::new(HeaderIdentityProvider::default())),
            settings: self.settings,
            bind_addr: self.bind_addr,
        })
    }
}

/// Configuration for a [`ServiceRuntime`].
pub struct ServiceRuntimeConfig {
    store: Arc<dyn RecordStore>,
    identity: Arc<dyn IdentityProvider>,
    settings: HandlerSettings,
    bind_addr: SocketAddr,
}

impl std::fmt::Debug for ServiceRuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRuntimeConfig")
            .field("store", &"...")
            .field("settings", &self.settings)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl ServiceRuntimeConfig {
    /// Bind the listener and spawn the HTTP server task.
    pub async fn start(self) -> Result<ServiceRuntime> {
        let state = Arc::new(HandlerState::with_parts(
            self.store,
            self.identity,
            self.settings,
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let listener = TcpListener::bind(self.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        let server_handle = tokio::spawn(run_http_server(listener, state.clone(), shutdown_rx));

        info!(addr = %local_addr, "ServiceRuntime started");

        Ok(ServiceRuntime {
            server_handle,
            shutdown_tx,
            state,
            local_addr,
        })
    }
}

/// A running rescue-core HTTP server embedded in an application.
///
/// Call [`shutdown`](Self::shutdown) for graceful termination.
pub struct ServiceRuntime {
    server_handle: JoinHandle<Result<()>>,
    shutdown_tx: watch::Sender<bool>,
    state: Arc<HttpServerState>,
    local_addr: SocketAddr,
}

impl ServiceRuntime {
    /// Create a new builder for configuring the runtime.
    pub fn builder() -> ServiceRuntimeBuilder {
        ServiceRuntimeBuilder::new()
    }

    /// Address the server actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get a reference to the shared handler state.
    pub fn state(&self) -> &Arc<HttpServerState> {
        &self.state
    }

    /// Get a reference to the record store.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.state.store
    }

    /// Gracefully shut down the runtime.
    ///
    /// Stops accepting connections, lets in-flight requests finish and waits
    /// for the server task.
    pub async fn shutdown(self) -> Result<()> {
        info!("ServiceRuntime shutting down...");

        let _ = self.shutdown_tx.send(true);

        match self.server_handle.await {
            Ok(Ok(())) => {
                info!("ServiceRuntime shutdown complete");
                Ok(())
            }
            Ok(Err(e)) => {
                error!("ServiceRuntime server error during shutdown: {}", e);
                Err(e)
            }
            Err(e) => {
                error!("ServiceRuntime server task panicked: {}", e);
                Err(anyhow::anyhow!("server task panicked: {}", e))
            }
        }
    }

    /// Check if the runtime is still running.
    pub fn is_running(&self) -> bool {
        !self.server_handle.is_finished()
    }
}
