// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MedGen AI API Server
//!
//! Serves the AI tool flows and per-user health data for the MedGen web app.

use medgen_api::{
    config::{Config, StorageBackend},
    db::Database,
    services::{KmsService, RealtimeBridge},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.storage_backend,
        "Starting MedGen API"
    );

    let realtime = RealtimeBridge::new();
    let db = match config.storage_backend {
        StorageBackend::Firestore => {
            Database::connect_firestore(&config.gcp_project_id, realtime).await?
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Database::in_memory(realtime)
        }
    };

    let kms = init_kms(&config).await?;

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, kms)?);

    // Build router
    let app = medgen_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Connect to Cloud KMS, or fall back to the local mock when no key is configured.
async fn init_kms(config: &Config) -> Result<KmsService, Box<dyn std::error::Error>> {
    match &config.kms_key_name {
        Some(key_name) => {
            let kms = KmsService::new(&config.gcp_project_id, &config.gcp_region, key_name).await?;
            tracing::info!(key = %key_name, "KMS service initialized");
            Ok(kms)
        }
        #[cfg(debug_assertions)]
        None => {
            tracing::warn!("KMS_KEY_NAME not set, using mock encryption");
            Ok(KmsService::new_mock())
        }
        #[cfg(not(debug_assertions))]
        None => Err("KMS_KEY_NAME is required in release builds".into()),
    }
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medgen_api=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
