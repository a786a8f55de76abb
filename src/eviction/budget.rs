// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Deletion budget: how many of the oldest confessions one pass removes.
//!
//! The byte budget assumes every record has the average size, so the usage
//! left after a pass lands near the target, not on it.

use super::estimate::UsageEstimate;

/// Byte-estimate budget parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ByteBudget {
    pub capacity_bytes: u64,
    /// Evict when usage is strictly above this percentage
    pub threshold_percent: f64,
    /// Usage percentage a pass aims for
    pub target_percent: f64,
    /// Smallest number of records a triggered pass deletes
    pub min_delete_batch: usize,
}

impl ByteBudget {
    #[must_use]
    pub fn exceeds_threshold(&self, usage: &UsageEstimate) -> bool {
        usage.confession_count > 0 && usage.percent_used > self.threshold_percent
    }

    /// Records to delete for `usage`; 0 when no eviction is needed.
    #[must_use]
    pub fn budget(&self, usage: &UsageEstimate) -> usize {
        if !self.exceeds_threshold(usage) {
            return 0;
        }

        let count = usage.confession_count;
        let target_bytes = self.target_percent / 100.0 * self.capacity_bytes as f64;
        let excess_bytes = usage.total_bytes_estimate as f64 - target_bytes;
        let avg = usage.avg_bytes_per_confession();

        let needed = if excess_bytes > 0.0 && avg > 0.0 {
            (excess_bytes / avg).ceil() as u64
        } else {
            0
        };

        clamp_to_count(needed.max(self.min_delete_batch as u64), count)
    }
}

/// Count-cap budget: everything above `max_records`.
#[must_use]
pub fn count_cap_budget(count: u64, max_records: u64) -> usize {
    clamp_to_count(count.saturating_sub(max_records), count)
}

fn clamp_to_count(n: u64, count: u64) -> usize {
    usize::try_from(n.min(count)).unwrap_or(usize::MAX)
}
