// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Storage usage estimation.
//!
//! The store never reports real byte usage, so usage is approximated from
//! content lengths: each record costs `len * bytes_per_char + overhead`.

use tracing::warn;

use crate::confession::estimated_footprint;
use crate::storage::traits::{ConfessionStore, StorageError};

/// Approximate storage consumed by all confessions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UsageEstimate {
    pub total_bytes_estimate: u64,
    /// Percentage of configured capacity (may exceed 100)
    pub percent_used: f64,
    pub confession_count: u64,
}

impl UsageEstimate {
    /// Result reported when the store cannot be read.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Byte estimate from per-record content lengths.
    #[must_use]
    pub fn from_lengths(
        lengths: &[usize],
        bytes_per_char: u64,
        overhead_bytes: u64,
        capacity_bytes: u64,
    ) -> Self {
        if lengths.is_empty() {
            return Self::zero();
        }
        let total = lengths.iter().fold(0u64, |acc, &len| {
            acc.saturating_add(estimated_footprint(len, bytes_per_char, overhead_bytes))
        });
        let percent_used = if capacity_bytes == 0 {
            0.0
        } else {
            total as f64 / capacity_bytes as f64 * 100.0
        };
        Self {
            total_bytes_estimate: total,
            percent_used,
            confession_count: lengths.len() as u64,
        }
    }

    /// Record-count usage against a fixed cap. No byte figure is produced.
    #[must_use]
    pub fn from_count(count: u64, max_records: u64) -> Self {
        let percent_used = if count == 0 {
            0.0
        } else {
            count as f64 / max_records.max(1) as f64 * 100.0
        };
        Self {
            total_bytes_estimate: 0,
            percent_used,
            confession_count: count,
        }
    }

    /// Mean estimated record size; 0 for an empty store.
    #[must_use]
    pub fn avg_bytes_per_confession(&self) -> f64 {
        if self.confession_count == 0 {
            0.0
        } else {
            self.total_bytes_estimate as f64 / self.confession_count as f64
        }
    }
}

/// Byte-estimate usage calculator.
#[derive(Debug, Clone)]
pub struct UsageEstimator {
    pub bytes_per_char: u64,
    pub metadata_overhead_bytes: u64,
    pub capacity_bytes: u64,
}

impl UsageEstimator {
    pub fn new(bytes_per_char: u64, metadata_overhead_bytes: u64, capacity_bytes: u64) -> Self {
        Self {
            bytes_per_char,
            metadata_overhead_bytes,
            capacity_bytes,
        }
    }

    /// Estimate usage, propagating store failures.
    pub async fn try_estimate(&self, store: &dyn ConfessionStore) -> Result<UsageEstimate, StorageError> {
        let lengths = store.content_lengths().await?;
        Ok(UsageEstimate::from_lengths(
            &lengths,
            self.bytes_per_char,
            self.metadata_overhead_bytes,
            self.capacity_bytes,
        ))
    }

    /// Estimate usage; a failing store reads as zero usage.
    pub async fn estimate(&self, store: &dyn ConfessionStore) -> UsageEstimate {
        match self.try_estimate(store).await {
            Ok(usage) => usage,
            Err(e) => {
                warn!(error = %e, "Usage estimate failed, reporting zero usage");
                crate::metrics::record_store_error("estimate");
                UsageEstimate::zero()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BYTES_PER_MB;
    use crate::storage::memory::InMemoryStore;

    #[test]
    fn test_empty_lengths_is_zero() {
        let usage = UsageEstimate::from_lengths(&[], 2, 100, BYTES_PER_MB);
        assert_eq!(usage, UsageEstimate::zero());
        assert_eq!(usage.avg_bytes_per_confession(), 0.0);
    }

    #[test]
    fn test_from_lengths_sums_footprints() {
        let usage = UsageEstimate::from_lengths(&[10, 20], 2, 100, 1000);
        // (10*2+100) + (20*2+100) = 260
        assert_eq!(usage.total_bytes_estimate, 260);
        assert_eq!(usage.confession_count, 2);
        assert!((usage.percent_used - 26.0).abs() < 1e-9);
        assert!((usage.avg_bytes_per_confession() - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_lengths_can_exceed_capacity() {
        let usage = UsageEstimate::from_lengths(&[2000; 10], 2, 100, 10_000);
        assert_eq!(usage.total_bytes_estimate, 41_000);
        assert!(usage.percent_used > 100.0);
    }

    #[test]
    fn test_from_count() {
        assert_eq!(UsageEstimate::from_count(0, 100).percent_used, 0.0);
        assert!((UsageEstimate::from_count(50, 100).percent_used - 50.0).abs() < 1e-9);
        assert_eq!(UsageEstimate::from_count(3, 0).percent_used, 300.0);
    }

    #[tokio::test]
    async fn test_estimator_reads_store() {
        let store = InMemoryStore::new();
        store.create(&"a".repeat(2000)).await.unwrap();
        store.create("hello").await.unwrap();

        let estimator = UsageEstimator::new(2, 100, BYTES_PER_MB);
        let usage = estimator.estimate(&store).await;

        assert_eq!(usage.confession_count, 2);
        assert_eq!(usage.total_bytes_estimate, 4100 + 110);
        assert!(usage.percent_used > 0.0);
    }

    #[tokio::test]
    async fn test_estimator_empty_store() {
        let store = InMemoryStore::new();
        let estimator = UsageEstimator::new(2, 100, BYTES_PER_MB);
        let usage = estimator.try_estimate(&store).await.unwrap();
        assert_eq!(usage.confession_count, 0);
        assert_eq!(usage.percent_used, 0.0);
    }
}
