//! # ledbridged — LED bridge daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`ledbridge.toml`, environment overrides)
//! - Install the `tracing` subscriber
//! - Open the serial link to the microcontroller
//! - Build the output registry and the synchronizer that owns the link
//! - Optionally open the `SQLite` store and start the reconciler poll loop
//! - Build the axum router and serve until Ctrl-C, then close the link
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ledbridge_adapter_http_axum::state::AppState;
use ledbridge_adapter_serial::SerialDeviceLink;
use ledbridge_adapter_storage_sqlite_sqlx::{Config as DatabaseConfig, SqliteDesiredStateSource};
use ledbridge_app::services::reconciler::Reconciler;
use ledbridge_app::services::synchronizer::Synchronizer;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).context("invalid logging filter")?,
        )
        .init();

    let registry = config.registry()?;
    tracing::info!(outputs = registry.len(), "output catalogue loaded");

    // Serial link
    let mut link = SerialDeviceLink::new(config.serial.clone());
    if let Err(err) = link.connect().await {
        if config.serial.required {
            return Err(err).context("the LED controller is required but could not be opened");
        }
        tracing::warn!(
            port = %config.serial.port,
            error = %err,
            "LED controller unavailable, commands will fail until the device is reopened"
        );
    }

    let synchronizer = Arc::new(Synchronizer::new(registry, link));

    // Poll loop
    let mut database = None;
    let mut reconciler = None;
    if config.database.enabled {
        let db = DatabaseConfig {
            database_url: config.database.url.clone(),
        }
        .build()
        .await
        .context("failed to open the desired-state database")?;
        let source = SqliteDesiredStateSource::new(db.pool().clone());

        tracing::warn!(
            "polling is enabled: changes made through the HTTP API are overwritten by the store on the next pass"
        );
        reconciler = Some(
            Reconciler::new(source, Arc::clone(&synchronizer), config.poll_interval()).start(),
        );
        database = Some(db);
    }

    // HTTP
    let state = AppState::from_arc(Arc::clone(&synchronizer));
    let app = ledbridge_adapter_http_axum::router::build(state, config.request_timeout());

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "ledbridged listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Some(handle) = reconciler {
        handle.abort();
    }
    synchronizer.shutdown().await;
    if let Some(db) = database {
        db.close().await;
    }
    tracing::info!("ledbridged stopped");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(err) => {
            tracing::error!(error = %err, "cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
