// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-process confession store.
//!
//! Records live in a `BTreeMap` keyed by `(created_at, seq)` so oldest-first
//! and newest-first scans are range walks. A `DashMap` indexes ids to keys
//! for deletes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::traits::{ConfessionStore, DeleteResult, StorageError};
use crate::confession::{now_millis, validate_content, Confession, ConfessionId};

/// Ordering key: creation time, then insertion sequence.
type OrderKey = (i64, u64);

#[derive(Default)]
struct Ordered {
    records: BTreeMap<OrderKey, Confession>,
    next_seq: u64,
}

pub struct InMemoryStore {
    ordered: RwLock<Ordered>,
    index: DashMap<ConfessionId, OrderKey>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ordered: RwLock::new(Ordered::default()),
            index: DashMap::new(),
        }
    }

    /// Get current confession count
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ConfessionId) -> bool {
        self.index.contains_key(id)
    }

    /// Create with an explicit timestamp (imports and backfills).
    pub fn create_at(&self, content: &str, created_at: i64) -> Result<Confession, StorageError> {
        validate_content(content)?;

        let confession = Confession::new(ConfessionId::generate(), content.to_string(), created_at);
        let mut ordered = self.ordered.write();
        let key = (created_at, ordered.next_seq);
        ordered.next_seq += 1;
        ordered.records.insert(key, confession.clone());
        self.index.insert(confession.id.clone(), key);
        Ok(confession)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfessionStore for InMemoryStore {
    async fn create(&self, content: &str) -> Result<Confession, StorageError> {
        self.create_at(content, now_millis())
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.len() as u64)
    }

    async fn list_oldest(&self, limit: usize) -> Result<Vec<Confession>, StorageError> {
        let ordered = self.ordered.read();
        Ok(ordered.records.values().take(limit).cloned().collect())
    }

    async fn list_newest(&self, limit: usize) -> Result<Vec<Confession>, StorageError> {
        let ordered = self.ordered.read();
        Ok(ordered.records.values().rev().take(limit).cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<Confession>, StorageError> {
        let ordered = self.ordered.read();
        Ok(ordered.records.values().cloned().collect())
    }

    async fn content_lengths(&self) -> Result<Vec<usize>, StorageError> {
        let ordered = self.ordered.read();
        Ok(ordered.records.values().map(Confession::content_len).collect())
    }

    async fn delete_by_ids(&self, ids: &[ConfessionId]) -> Result<DeleteResult, StorageError> {
        let mut ordered = self.ordered.write();
        let mut deleted = 0;
        for id in ids {
            if let Some((_, key)) = self.index.remove(id) {
                if ordered.records.remove(&key).is_some() {
                    deleted += 1;
                }
            }
        }
        Ok(DeleteResult { deleted })
    }

    async fn delete_all(&self) -> Result<DeleteResult, StorageError> {
        let mut ordered = self.ordered.write();
        let deleted = ordered.records.len() as u64;
        ordered.records.clear();
        self.index.clear();
        Ok(DeleteResult { deleted })
    }
}
