// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore backend for the document primitives.

use super::{FilterValue, Query, StoreError};
use crate::error::AppError;
use firestore::errors::FirestoreError;
use firestore::{FirestoreDb, FirestoreQueryDirection};
use serde::{de::DeserializeOwned, Serialize};

/// Create a new Firestore client.
///
/// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
pub async fn connect(project_id: &str) -> Result<FirestoreDb, AppError> {
    // If the emulator environment variable is set, use unauthenticated connection
    // to avoid local credential warnings and leakage.
    if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
        return connect_emulator(project_id).await;
    }

    let client = FirestoreDb::new(project_id).await.map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Failed to connect to Firestore: {}", e))
    })?;

    tracing::info!(project = project_id, "Connected to Firestore");
    Ok(client)
}

/// Create a Firestore client for the emulator with unauthenticated access.
async fn connect_emulator(project_id: &str) -> Result<FirestoreDb, AppError> {
    tracing::info!("Using unauthenticated connection for Firestore Emulator");

    let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
        Ok(gcloud_sdk::Token {
            token_type: "Bearer".to_string(),
            token: gcloud_sdk::SecretValue::new(
                "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                    .to_string()
                    .into(),
            ),
            expiry: chrono::Utc::now() + chrono::Duration::hours(1),
        })
    });

    let options = firestore::FirestoreDbOptions::new(project_id.to_string());

    let client = FirestoreDb::with_options_token_source(
        options,
        gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
        gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
    )
    .await
    .map_err(|e| {
        AppError::Internal(anyhow::anyhow!(
            "Failed to connect to Firestore Emulator: {}",
            e
        ))
    })?;

    tracing::info!(
        project = project_id,
        "Connected to Firestore (Emulator/Unauthenticated)"
    );
    Ok(client)
}

fn backend_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

pub(super) async fn get<T>(db: &FirestoreDb, collection: &str, id: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned + Send,
{
    db.fluent()
        .select()
        .by_id_in(collection)
        .obj::<T>()
        .one(id)
        .await
        .map_err(backend_error)
}

pub(super) async fn put<T>(db: &FirestoreDb, collection: &str, id: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    let _: () = db
        .fluent()
        .update()
        .in_col(collection)
        .document_id(id)
        .object(value)
        .execute()
        .await
        .map_err(backend_error)?;
    Ok(())
}

pub(super) async fn create<T>(db: &FirestoreDb, collection: &str, id: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    let result: Result<T, FirestoreError> = db
        .fluent()
        .insert()
        .into(collection)
        .document_id(id)
        .object(value)
        .execute()
        .await;
    match result {
        Ok(_) => Ok(()),
        Err(FirestoreError::DataConflictError(_)) => {
            Err(StoreError::Conflict(format!("{}/{}", collection, id)))
        }
        Err(e) => Err(backend_error(e)),
    }
}

pub(super) async fn delete(db: &FirestoreDb, collection: &str, id: &str) -> Result<(), StoreError> {
    db.fluent()
        .delete()
        .from(collection)
        .document_id(id)
        .execute()
        .await
        .map_err(backend_error)
}

pub(super) async fn query<T>(db: &FirestoreDb, collection: &str, query: Query) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned + Send,
{
    let Query {
        filters,
        order_desc,
        limit,
    } = query;

    let mut builder = db.fluent().select().from(collection);

    if !filters.is_empty() {
        builder = builder.filter(move |q| {
            let conditions: Vec<_> = filters
                .iter()
                .map(|(field, value)| match value {
                    FilterValue::Str(s) => q.field(*field).eq(s.clone()),
                    FilterValue::Bool(b) => q.field(*field).eq(*b),
                })
                .collect();
            q.for_all(conditions)
        });
    }

    // Composite indexes (user_id + sort field) are required for these
    if let Some(field) = order_desc {
        builder = builder.order_by([(field, FirestoreQueryDirection::Descending)]);
    }

    if let Some(n) = limit {
        builder = builder.limit(n);
    }

    builder.obj::<T>().query().await.map_err(backend_error)
}
