// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Eviction engine: measure, decide, delete the oldest.
//!
//! `run_check()` never returns an error. Store failures are logged, counted,
//! and reported as [`CheckOutcome::StoreUnavailable`] so the write path that
//! triggered the check is never blocked by it.
//!
//! Concurrent checks are allowed. Two overlapping checks may pick the same
//! victims; the store ignores ids that are already gone and the reported
//! `deleted` count only includes rows this check actually removed.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{BoardConfig, EvictionMode};
use crate::confession::ConfessionId;
use crate::storage::traits::ConfessionStore;

use super::estimate::UsageEstimate;
use super::policy::EvictionPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No confessions stored
    EmptyStore,
    /// Usage within bounds, nothing deleted
    BelowThreshold,
    /// Oldest confessions were deleted
    Evicted,
    /// The store failed; no cleanup performed
    StoreUnavailable,
}

impl CheckOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyStore => "empty_store",
            Self::BelowThreshold => "below_threshold",
            Self::Evicted => "evicted",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

impl std::fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one `run_check()`.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupReport {
    pub mode: EvictionMode,
    pub outcome: CheckOutcome,
    /// Usage measured before deleting (zero when the store failed)
    pub usage_before: UsageEstimate,
    /// Records the check intended to delete
    pub budget: usize,
    /// Records actually removed
    pub deleted: u64,
    /// Usage re-measured after deleting, when enabled and readable
    pub usage_after: Option<UsageEstimate>,
}

impl CleanupReport {
    fn new(mode: EvictionMode, outcome: CheckOutcome, usage_before: UsageEstimate) -> Self {
        Self {
            mode,
            outcome,
            usage_before,
            budget: 0,
            deleted: 0,
            usage_after: None,
        }
    }

    /// Whether any confession was removed.
    #[must_use]
    pub fn performed(&self) -> bool {
        self.outcome == CheckOutcome::Evicted && self.deleted > 0
    }
}

pub struct EvictionEngine {
    store: Arc<dyn ConfessionStore>,
    policy: EvictionPolicy,
    report_usage_after: bool,
}

impl EvictionEngine {
    pub fn new(store: Arc<dyn ConfessionStore>, policy: EvictionPolicy) -> Self {
        Self {
            store,
            policy,
            report_usage_after: true,
        }
    }

    pub fn from_config(store: Arc<dyn ConfessionStore>, config: &BoardConfig) -> Self {
        Self {
            store,
            policy: EvictionPolicy::from_config(config),
            report_usage_after: config.report_usage_after,
        }
    }

    #[must_use]
    pub fn with_usage_report(mut self, enabled: bool) -> Self {
        self.report_usage_after = enabled;
        self
    }

    #[must_use]
    pub fn policy(&self) -> &EvictionPolicy {
        &self.policy
    }

    #[must_use]
    pub fn mode(&self) -> EvictionMode {
        self.policy.mode()
    }

    /// Current usage; a failing store reads as zero.
    pub async fn usage(&self) -> UsageEstimate {
        match self.policy.measure(self.store.as_ref()).await {
            Ok(usage) => usage,
            Err(e) => {
                warn!(error = %e, "Usage estimate failed, reporting zero usage");
                crate::metrics::record_store_error("estimate");
                UsageEstimate::zero()
            }
        }
    }

    /// Measure usage and, if over the limit, delete the oldest confessions.
    #[tracing::instrument(skip(self), fields(mode = %self.policy.mode()))]
    pub async fn run_check(&self) -> CleanupReport {
        let start = Instant::now();
        let report = self.check().await;
        crate::metrics::record_check(
            &report.mode.to_string(),
            report.outcome.as_str(),
            start.elapsed(),
        );
        report
    }

    async fn check(&self) -> CleanupReport {
        let mode = self.policy.mode();
        let store = self.store.as_ref();

        let decision = match self.policy.decide(store).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "Eviction check could not read the store, skipping");
                crate::metrics::record_store_error("estimate");
                return CleanupReport::new(mode, CheckOutcome::StoreUnavailable, UsageEstimate::zero());
            }
        };
        let usage = decision.usage;
        crate::metrics::set_usage(&usage);

        if usage.confession_count == 0 {
            debug!("No confessions stored, nothing to evict");
            return CleanupReport::new(mode, CheckOutcome::EmptyStore, usage);
        }
        if decision.budget == 0 {
            debug!(
                percent_used = format!("{:.2}%", usage.percent_used),
                confessions = usage.confession_count,
                "Usage within bounds"
            );
            return CleanupReport::new(mode, CheckOutcome::BelowThreshold, usage);
        }

        info!(
            percent_used = format!("{:.2}%", usage.percent_used),
            estimated_bytes = usage.total_bytes_estimate,
            confessions = usage.confession_count,
            budget = decision.budget,
            "Usage over limit, evicting oldest confessions"
        );

        let mut report = CleanupReport::new(mode, CheckOutcome::StoreUnavailable, usage);
        report.budget = decision.budget;

        let victims = match store.list_oldest(decision.budget).await {
            Ok(victims) => victims,
            Err(e) => {
                warn!(error = %e, "Failed to list oldest confessions, no cleanup performed");
                crate::metrics::record_store_error("list_oldest");
                return report;
            }
        };
        let ids: Vec<ConfessionId> = victims.into_iter().map(|c| c.id).collect();

        let deleted = match store.delete_by_ids(&ids).await {
            Ok(result) => result.deleted,
            Err(e) => {
                warn!(error = %e, victims = ids.len(), "Failed to delete oldest confessions, no cleanup performed");
                crate::metrics::record_store_error("delete");
                return report;
            }
        };

        if deleted < ids.len() as u64 {
            debug!(
                selected = ids.len(),
                deleted,
                "Some selected confessions were already gone"
            );
        }

        report.outcome = CheckOutcome::Evicted;
        report.deleted = deleted;
        crate::metrics::record_eviction(deleted);

        if self.report_usage_after {
            match self.policy.measure(store).await {
                Ok(after) => {
                    crate::metrics::set_usage(&after);
                    report.usage_after = Some(after);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to re-estimate usage after eviction");
                    crate::metrics::record_store_error("estimate");
                }
            }
        }

        info!(
            deleted,
            percent_after = ?report.usage_after.map(|u| u.percent_used),
            "Deleted oldest confessions to stay under capacity"
        );
        report
    }
}
