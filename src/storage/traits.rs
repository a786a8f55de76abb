// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use thiserror::Error;

use crate::confession::{Confession, ConfessionId, ValidationError};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl StorageError {
    /// Whether the error was caused by the caller's input rather than the store.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result of a delete operation.
///
/// `deleted` counts rows actually removed; ids that were already gone are
/// not counted and are not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted: u64,
}

/// Persistence capability consumed by the board and the eviction engine.
///
/// Ordering contract: "oldest" means smallest `created_at`, ties broken by
/// insertion order.
#[async_trait]
pub trait ConfessionStore: Send + Sync {
    /// Validate and persist new content, assigning id and timestamp.
    async fn create(&self, content: &str) -> Result<Confession, StorageError>;

    async fn count(&self) -> Result<u64, StorageError>;

    /// Up to `limit` confessions, oldest first.
    async fn list_oldest(&self, limit: usize) -> Result<Vec<Confession>, StorageError>;

    /// Up to `limit` confessions, newest first.
    async fn list_newest(&self, limit: usize) -> Result<Vec<Confession>, StorageError>;

    async fn list_all(&self) -> Result<Vec<Confession>, StorageError>;

    /// Content length (in characters) of every stored confession.
    /// Default implementation derives it from `list_all`.
    async fn content_lengths(&self) -> Result<Vec<usize>, StorageError> {
        Ok(self
            .list_all()
            .await?
            .iter()
            .map(Confession::content_len)
            .collect())
    }

    /// Remove the given ids. Unknown ids are ignored.
    async fn delete_by_ids(&self, ids: &[ConfessionId]) -> Result<DeleteResult, StorageError>;

    /// Administrative wipe of every confession.
    async fn delete_all(&self) -> Result<DeleteResult, StorageError>;
}
