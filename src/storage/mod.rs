// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Confession storage backends.
//!
//! - [`traits`]: the [`ConfessionStore`](traits::ConfessionStore) capability
//! - [`memory`]: in-process store
//! - [`sql`]: SQLite/MySQL store
//! - [`provider`]: lazily connected, shared store handle

pub mod traits;
pub mod memory;
pub mod sql;
pub mod provider;
