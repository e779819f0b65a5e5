//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! so integration tests can build the same router.

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use pixform_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())?;

    tracing::info!("Configuration loaded and validated successfully");

    prepare_upload_dir(&config).await?;

    let state = Arc::new(AppState::new(config.clone()));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Create the upload directory if it does not exist yet
pub async fn prepare_upload_dir(config: &Config) -> Result<()> {
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.upload_dir.display()
            )
        })?;
    tracing::info!(upload_dir = %config.upload_dir.display(), "Upload directory ready");
    Ok(())
}
