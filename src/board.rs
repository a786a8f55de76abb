// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The board: posting, the feed, search, and the admin wipe.
//!
//! Every successful post is followed by an eviction check. The check's
//! outcome is logged and never turns a successful post into a failure.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use confession_board::{BoardConfig, ConfessionBoard, InMemoryStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let board = ConfessionBoard::new(Arc::new(InMemoryStore::new()), BoardConfig::default());
//!
//! board.post("I still use tabs").await.unwrap();
//! board.post("I have never seen a single episode").await.unwrap();
//!
//! let feed = board.feed(10).await.unwrap();
//! assert_eq!(feed[0].content, "I have never seen a single episode");
//!
//! let hits = board.search("TABS", 10).await.unwrap();
//! assert_eq!(hits.len(), 1);
//! # }
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{BoardConfig, ConfigError};
use crate::confession::Confession;
use crate::eviction::engine::{CleanupReport, EvictionEngine};
use crate::monitor::{Monitor, MonitorHandle};
use crate::storage::provider::StoreProvider;
use crate::storage::traits::{ConfessionStore, DeleteResult, StorageError};

#[derive(Error, Debug)]
pub enum BoardError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct ConfessionBoard {
    store: Arc<dyn ConfessionStore>,
    engine: Arc<EvictionEngine>,
    config: BoardConfig,
}

impl ConfessionBoard {
    /// Build a board over an existing store. `config` is trusted as given.
    pub fn new(store: Arc<dyn ConfessionStore>, config: BoardConfig) -> Self {
        let engine = Arc::new(EvictionEngine::from_config(store.clone(), &config));
        Self { store, engine, config }
    }

    /// Validate `config` and build a board over the provider's store,
    /// connecting it if this is the first use.
    pub async fn open(provider: &StoreProvider, config: BoardConfig) -> Result<Self, BoardError> {
        config.validate()?;
        let store = provider.connect().await?;
        info!(mode = %config.mode, "Confession board ready");
        Ok(Self::new(store, config))
    }

    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[must_use]
    pub fn engine(&self) -> Arc<EvictionEngine> {
        self.engine.clone()
    }

    #[must_use]
    pub fn store(&self) -> Arc<dyn ConfessionStore> {
        self.store.clone()
    }

    /// Start periodic checks at the configured interval.
    pub fn start_monitor(&self) -> MonitorHandle {
        Monitor::spawn(self.engine.clone(), self.config.monitor_interval())
    }

    /// Create a confession, then run an eviction check.
    ///
    /// Validation errors are returned without touching the store or the
    /// engine.
    #[tracing::instrument(skip(self, content), fields(len = content.chars().count()))]
    pub async fn post(&self, content: &str) -> Result<Confession, StorageError> {
        let confession = match self.store.create(content).await {
            Ok(confession) => confession,
            Err(e) => {
                if e.is_validation() {
                    debug!(error = %e, "Rejected confession");
                    crate::metrics::record_post("rejected");
                } else {
                    warn!(error = %e, "Failed to store confession");
                    crate::metrics::record_post("error");
                }
                return Err(e);
            }
        };
        crate::metrics::record_post("accepted");

        let report = self.engine.run_check().await;
        log_post_check(&report);

        Ok(confession)
    }

    /// Up to `limit` confessions, newest first.
    pub async fn feed(&self, limit: usize) -> Result<Vec<Confession>, StorageError> {
        self.store.list_newest(limit).await
    }

    /// Up to `limit` feed entries containing `query`, ignoring case.
    /// A blank query returns the plain feed.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Confession>, StorageError> {
        let query = query.trim();
        if query.is_empty() {
            return self.feed(limit).await;
        }
        let hits = self
            .store
            .list_newest(usize::MAX)
            .await?
            .into_iter()
            .filter(|c| c.matches(query))
            .take(limit)
            .collect();
        Ok(hits)
    }

    /// Delete every confession. Bypasses the eviction engine.
    pub async fn wipe_all(&self) -> Result<DeleteResult, StorageError> {
        let result = self.store.delete_all().await.inspect_err(|e| {
            warn!(error = %e, "Failed to delete all confessions");
            crate::metrics::record_store_error("wipe");
        })?;
        crate::metrics::record_wipe(result.deleted);
        info!(deleted = result.deleted, "Deleted all confessions");
        Ok(result)
    }
}

fn log_post_check(report: &CleanupReport) {
    if report.performed() {
        info!(deleted = report.deleted, "Post-create cleanup performed");
    } else {
        debug!(outcome = %report.outcome, "No post-create cleanup needed");
    }
}
