// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Confession Board
//!
//! Storage for an anonymous confession board, with a capacity-bounded
//! eviction policy that deletes the oldest posts once the dataset grows past
//! a configured limit.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Triggers                                 │
//! │  • ConfessionBoard::post() → check after every create       │
//! │  • Monitor → initial check + one per interval (single-flight)│
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 EvictionEngine::run_check()                 │
//! │  • measure usage (byte estimate or record count)            │
//! │  • decide a deletion budget                                 │
//! │  • list oldest N → delete by ids                            │
//! │  • fail open: store errors never reach the writer           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ConfessionStore                          │
//! │  • InMemoryStore (ordered map)                              │
//! │  • SqlStore (SQLite / MySQL via sqlx Any)                   │
//! │  • StoreProvider: lazily connected shared handle            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use confession_board::{BoardConfig, ConfessionBoard, StoreProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = BoardConfig {
//!         store_url: Some("sqlite:confessions.db?mode=rwc".into()),
//!         ..Default::default()
//!     };
//!
//!     let provider = StoreProvider::new(config.store_url.clone());
//!     let board = ConfessionBoard::open(&provider, config).await.expect("Failed to open board");
//!     let monitor = board.start_monitor();
//!
//!     board.post("I water my neighbour's plants with coffee").await.expect("Failed to post");
//!     for confession in board.feed(20).await.unwrap() {
//!         println!("{}: {}", confession.created_at, confession.content);
//!     }
//!
//!     monitor.shutdown().await;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`confession`]: the record type and content validation
//! - [`storage`]: the store capability and its backends
//! - [`eviction`]: usage estimation, budgets, the eviction engine
//! - [`monitor`]: periodic checks
//! - [`board`]: posting, feed, search, wipe
//! - [`resilience`]: retry with backoff

pub mod config;
pub mod confession;
pub mod storage;
pub mod resilience;
pub mod eviction;
pub mod monitor;
pub mod board;
pub mod metrics;

pub use config::{BoardConfig, ConfigError, EvictionMode};
pub use confession::{Confession, ConfessionId, ValidationError};
pub use storage::traits::{ConfessionStore, DeleteResult, StorageError};
pub use storage::memory::InMemoryStore;
pub use storage::sql::SqlStore;
pub use storage::provider::StoreProvider;
pub use eviction::estimate::{UsageEstimate, UsageEstimator};
pub use eviction::policy::{EvictionDecision, EvictionPolicy};
pub use eviction::engine::{CheckOutcome, CleanupReport, EvictionEngine};
pub use monitor::{Monitor, MonitorHandle, MonitorStats};
pub use board::{BoardError, ConfessionBoard};
