// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! MedGen AI: backend for a suite of AI-assisted medical tools
//!
//! This crate provides the HTTP API behind the chat assistant, symptom
//! diagnosis, image analysis, synthetic dataset and drug-candidate tools,
//! plus per-user health records, reports and provider API keys.

pub mod config;
pub mod db;
pub mod error;
pub mod generators;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use error::AppError;
use services::{ActivityLogger, Assistant, CompletionGateway, IdentityProvider, KmsService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub kms: KmsService,
    pub identity: IdentityProvider,
    pub assistant: Assistant,
}

impl AppState {
    /// Wire services over `db` and `kms`. Must run inside a Tokio runtime
    /// because the activity-log worker is spawned here.
    pub fn new(config: Config, db: Database, kms: KmsService) -> Result<Self, AppError> {
        let gateway = CompletionGateway::new(&config, db.clone(), kms.clone())?;
        let activity_log = ActivityLogger::spawn(db.clone());
        Ok(Self::with_parts(config, db, kms, gateway, activity_log))
    }

    /// Like [`new`](Self::new) with a caller-supplied activity logger.
    pub fn with_activity_logger(
        config: Config,
        db: Database,
        kms: KmsService,
        activity_log: ActivityLogger,
    ) -> Result<Self, AppError> {
        let gateway = CompletionGateway::new(&config, db.clone(), kms.clone())?;
        Ok(Self::with_parts(config, db, kms, gateway, activity_log))
    }

    fn with_parts(
        config: Config,
        db: Database,
        kms: KmsService,
        gateway: CompletionGateway,
        activity_log: ActivityLogger,
    ) -> Self {
        let identity = IdentityProvider::new(db.clone(), config.jwt_signing_key.clone());
        let assistant = Assistant::new(gateway, activity_log, config.completion_timeout);
        Self {
            config,
            db,
            kms,
            identity,
            assistant,
        }
    }
}
