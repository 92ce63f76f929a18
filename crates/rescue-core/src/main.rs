// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rescue Core - Volunteer Sign-up Service

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rescue_core::config::{Config, LogFormat};
use rescue_core::identity::HeaderIdentityProvider;
use rescue_core::runtime::ServiceRuntime;
use rescue_core::store::{PostgresStore, RecordStore, SqliteStore};

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("rescue_core=info".parse()?);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from crate directory or parent directories)
    dotenvy::dotenv().ok();

    let log_format = match std::env::var("RESCUE_LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Text,
    };
    init_tracing(log_format)?;

    info!("Starting Rescue Core");

    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        http_addr = %config.http_addr,
        manager_group = %config.handlers.manager_group,
        capacity_precheck = config.handlers.signup_capacity_precheck,
        "Configuration loaded"
    );

    info!("Connecting to database and running migrations...");
    let store: Arc<dyn RecordStore> = if config.is_sqlite() {
        Arc::new(SqliteStore::connect(&config.database_url, config.db_max_connections).await?)
    } else {
        Arc::new(PostgresStore::connect(&config.database_url, config.db_max_connections).await?)
    };

    if !store.health_check().await? {
        anyhow::bail!("database health check failed");
    }
    info!("Database connection established");

    let runtime = ServiceRuntime::builder()
        .store(store)
        .identity(Arc::new(HeaderIdentityProvider::new(
            config.caller_id_header.clone(),
            config.caller_groups_header.clone(),
        )))
        .settings(config.handlers.clone())
        .bind_addr(config.http_addr)
        .build()?
        .start()
        .await?;

    info!(addr = %runtime.local_addr(), "Rescue Core initialized successfully");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    runtime.shutdown().await?;
    info!("Shutdown complete");

    Ok(())
}
