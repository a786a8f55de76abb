// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The two eviction strategies behind one config-selected type.

use crate::config::{BoardConfig, EvictionMode};
use crate::storage::traits::{ConfessionStore, StorageError};

use super::budget::{count_cap_budget, ByteBudget};
use super::estimate::{UsageEstimate, UsageEstimator};

/// What one check decided: current usage and how many records to drop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvictionDecision {
    pub usage: UsageEstimate,
    pub budget: usize,
}

#[derive(Debug, Clone)]
pub enum EvictionPolicy {
    /// Estimate bytes from content lengths, evict above a percentage of capacity.
    ByteEstimate {
        estimator: UsageEstimator,
        budget: ByteBudget,
    },
    /// Keep at most `max_records` confessions.
    CountCap { max_records: u64 },
}

impl EvictionPolicy {
    pub fn from_config(config: &BoardConfig) -> Self {
        match config.mode {
            EvictionMode::ByteEstimate => Self::ByteEstimate {
                estimator: UsageEstimator::new(
                    config.bytes_per_char,
                    config.metadata_overhead_bytes,
                    config.capacity_bytes(),
                ),
                budget: ByteBudget {
                    capacity_bytes: config.capacity_bytes(),
                    threshold_percent: config.threshold_percent,
                    target_percent: config.target_percent,
                    min_delete_batch: config.min_delete_batch,
                },
            },
            EvictionMode::CountCap => Self::CountCap {
                max_records: config.max_records,
            },
        }
    }

    #[must_use]
    pub fn mode(&self) -> EvictionMode {
        match self {
            Self::ByteEstimate { .. } => EvictionMode::ByteEstimate,
            Self::CountCap { .. } => EvictionMode::CountCap,
        }
    }

    /// Current usage as this strategy measures it.
    pub async fn measure(&self, store: &dyn ConfessionStore) -> Result<UsageEstimate, StorageError> {
        match self {
            Self::ByteEstimate { estimator, .. } => estimator.try_estimate(store).await,
            Self::CountCap { max_records } => {
                let count = store.count().await?;
                Ok(UsageEstimate::from_count(count, *max_records))
            }
        }
    }

    /// Deletion budget for an already measured usage.
    #[must_use]
    pub fn budget_for(&self, usage: &UsageEstimate) -> usize {
        match self {
            Self::ByteEstimate { budget, .. } => budget.budget(usage),
            Self::CountCap { max_records } => count_cap_budget(usage.confession_count, *max_records),
        }
    }

    pub async fn decide(&self, store: &dyn ConfessionStore) -> Result<EvictionDecision, StorageError> {
        let usage = self.measure(store).await?;
        Ok(EvictionDecision {
            budget: self.budget_for(&usage),
            usage,
        })
    }
}
