// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local document store used for development and tests.
//!
//! Documents are kept as JSON values. Queries support equality filters and a
//! single descending sort, matching what the Firestore backend is asked to do.

use super::{FilterValue, Query, StoreError};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

#[derive(Default)]
pub struct MemoryStore {
    /// collection -> document id -> (insertion sequence, document)
    collections: DashMap<String, HashMap<String, (u64, Value)>>,
    seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>, StoreError> {
        let doc = self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).map(|(_, v)| v.clone()));
        doc.map(serde_json::from_value).transpose().map_err(StoreError::from)
    }

    pub fn put<T: Serialize>(&self, collection: &str, id: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        // Overwrites keep their original position for tie-breaking
        let seq = match docs.get(id) {
            Some((seq, _)) => *seq,
            None => self.seq.fetch_add(1, AtomicOrdering::Relaxed),
        };
        docs.insert(id.to_string(), (seq, value));
        Ok(())
    }

    pub fn create<T: Serialize>(&self, collection: &str, id: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        match docs.entry(id.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("{}/{}", collection, id))),
            Entry::Vacant(slot) => {
                slot.insert((self.seq.fetch_add(1, AtomicOrdering::Relaxed), value));
                Ok(())
            }
        }
    }

    pub fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        if let Some(mut docs) = self.collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    pub fn query<T: DeserializeOwned>(&self, collection: &str, query: &Query) -> Result<Vec<T>, StoreError> {
        let mut matched: Vec<(u64, Value)> = match self.collections.get(collection) {
            Some(docs) => docs
                .values()
                .filter(|(_, doc)| {
                    query
                        .filters
                        .iter()
                        .all(|(field, want)| field_matches(doc.get(*field), want))
                })
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        match query.order_desc {
            Some(field) => matched.sort_by(|(sa, a), (sb, b)| {
                compare(b.get(field), a.get(field)).then_with(|| sb.cmp(sa))
            }),
            None => matched.sort_by_key(|(seq, _)| *seq),
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit as usize);
        }

        matched
            .into_iter()
            .map(|(_, doc)| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }
}

fn field_matches(actual: Option<&Value>, want: &FilterValue) -> bool {
    match (actual, want) {
        (Some(Value::String(s)), FilterValue::Str(w)) => s == w,
        (Some(Value::Bool(b)), FilterValue::Bool(w)) => b == w,
        _ => false,
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (None | Some(Value::Null), Some(_)) => Ordering::Less,
        (Some(_), None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
