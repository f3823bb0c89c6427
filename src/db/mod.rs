// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data access layer.
//!
//! `Database` exposes one typed function per entity and operation (see the
//! submodules). Those functions validate input, call the generic document
//! primitives below, publish realtime changes on success, and turn store
//! failures into logged `DataAccessError`s.

pub mod activities;
pub mod api_keys;
pub mod firestore;
pub mod memory;
pub mod profile;
pub mod reports;

use crate::error::{AppError, DataAccessError};
use crate::services::realtime::{ChangeEvent, ChangePayload, RealtimeBridge};
use memory::MemoryStore;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CREDENTIALS: &str = "credentials";
    pub const ACTIVITIES: &str = "activities";
    pub const MEDICAL_HISTORY: &str = "medical_history";
    pub const HEALTH_STATS: &str = "health_stats";
    pub const REPORTS: &str = "reports";
    pub const API_KEYS: &str = "api_keys";
}

/// Tables clients may subscribe to.
pub const REALTIME_TABLES: [&str; 6] = [
    collections::USERS,
    collections::ACTIVITIES,
    collections::MEDICAL_HISTORY,
    collections::HEALTH_STATS,
    collections::REPORTS,
    collections::API_KEYS,
];

/// Low-level store failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database not connected (offline mode)")]
    Offline,

    #[error("{0}")]
    Backend(String),

    #[error("Document already exists: {0}")]
    Conflict(String),

    #[error("Document encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Str(String),
    Bool(bool),
}

/// Equality filters, an optional descending sort and a limit.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<(&'static str, FilterValue)>,
    pub order_desc: Option<&'static str>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &'static str, value: impl Into<String>) -> Self {
        self.filters.push((field, FilterValue::Str(value.into())));
        self
    }

    pub fn eq_bool(mut self, field: &'static str, value: bool) -> Self {
        self.filters.push((field, FilterValue::Bool(value)));
        self
    }

    pub fn order_desc(mut self, field: &'static str) -> Self {
        self.order_desc = Some(field);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn limit_opt(self, limit: Option<u32>) -> Self {
        match limit {
            Some(n) => self.limit(n),
            None => self,
        }
    }
}

#[derive(Clone)]
enum Backend {
    Firestore(::firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
    Offline,
}

/// Database handle. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
    realtime: RealtimeBridge,
}

impl Database {
    /// Connect to Firestore (or the emulator when `FIRESTORE_EMULATOR_HOST` is set).
    pub async fn connect_firestore(
        project_id: &str,
        realtime: RealtimeBridge,
    ) -> Result<Self, AppError> {
        let client = firestore::connect(project_id).await?;
        Ok(Self {
            backend: Backend::Firestore(client),
            realtime,
        })
    }

    /// Process-local store.
    pub fn in_memory(realtime: RealtimeBridge) -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
            realtime,
        }
    }

    /// Create a mock database for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
            realtime: RealtimeBridge::new(),
        }
    }

    pub fn realtime(&self) -> &RealtimeBridge {
        &self.realtime
    }

    // ─── Document Primitives ─────────────────────────────────────

    pub(crate) async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(db) => firestore::get(db, collection, id).await,
            Backend::Memory(store) => store.get(collection, id),
            Backend::Offline => Err(StoreError::Offline),
        }
    }

    pub(crate) async fn put<T>(&self, collection: &str, id: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match &self.backend {
            Backend::Firestore(db) => firestore::put(db, collection, id, value).await,
            Backend::Memory(store) => store.put(collection, id, value),
            Backend::Offline => Err(StoreError::Offline),
        }
    }

    /// Write a new document; fails with [`StoreError::Conflict`] if `id` is taken.
    pub(crate) async fn create<T>(&self, collection: &str, id: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match &self.backend {
            Backend::Firestore(db) => firestore::create(db, collection, id, value).await,
            Backend::Memory(store) => store.create(collection, id, value),
            Backend::Offline => Err(StoreError::Offline),
        }
    }

    pub(crate) async fn remove(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        match &self.backend {
            Backend::Firestore(db) => firestore::delete(db, collection, id).await,
            Backend::Memory(store) => store.delete(collection, id),
            Backend::Offline => Err(StoreError::Offline),
        }
    }

    pub(crate) async fn query<T>(&self, collection: &str, query: Query) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(db) => firestore::query(db, collection, query).await,
            Backend::Memory(store) => store.query(collection, &query),
            Backend::Offline => Err(StoreError::Offline),
        }
    }

    /// Publish a row change owned by `user_id`.
    pub(crate) fn publish<T: Serialize>(
        &self,
        table: &str,
        event: ChangeEvent,
        user_id: &str,
        new: Option<&T>,
        old: Option<&T>,
    ) {
        let encode = |row: Option<&T>| {
            row.and_then(|r| serde_json::to_value(r).ok())
                .unwrap_or(serde_json::Value::Null)
        };
        self.realtime
            .publish(ChangePayload::new(table, event, user_id, encode(new), encode(old)));
    }
}

/// Log a failed store call and wrap it for the caller.
pub(crate) fn data_error(operation: &'static str, entity: &'static str, err: StoreError) -> AppError {
    tracing::error!(operation, entity, error = %err, "Data access failed");
    DataAccessError::new(operation, entity, err).into()
}

/// New document ID.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
