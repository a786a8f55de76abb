// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Capacity-based eviction of the oldest confessions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Eviction Module                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  estimate.rs  - UsageEstimate / UsageEstimator               │
//! │  └─ bytes ≈ Σ (len * bytes_per_char + overhead)              │
//! ├──────────────────────────────────────────────────────────────┤
//! │  budget.rs    - how many oldest records to delete            │
//! │  └─ ByteBudget: ceil(excess / avg), floor, clamp to count    │
//! │  └─ count_cap_budget: count - max_records                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  policy.rs    - EvictionPolicy (ByteEstimate | CountCap)     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  engine.rs    - EvictionEngine::run_check()                  │
//! │  └─ measure → decide → list oldest → delete by ids           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Triggers live outside this module: the board runs a check after every
//! post and [`crate::monitor`] runs one on a timer.

pub mod estimate;
pub mod budget;
pub mod policy;
pub mod engine;
