// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Periodic eviction checks.
//!
//! The monitor runs one check as soon as it starts, then one per interval.
//! At most one check is in flight: a tick that lands while the previous check
//! is still running is skipped, and the next tick picks up whatever is left.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::eviction::engine::EvictionEngine;

#[derive(Default)]
struct MonitorState {
    in_flight: AtomicBool,
    checks_started: AtomicU64,
    ticks_skipped: AtomicU64,
}

/// Counters for a running monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorStats {
    pub checks_started: u64,
    pub ticks_skipped: u64,
}

/// Clears the in-flight flag when the check task ends, even on panic.
struct InFlightGuard(Arc<MonitorState>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

pub struct Monitor;

impl Monitor {
    /// Start the periodic loop on the current Tokio runtime.
    pub fn spawn(engine: Arc<EvictionEngine>, interval: Duration) -> MonitorHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let state = Arc::new(MonitorState::default());
        let loop_state = state.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval_ms = interval.as_millis() as u64, "Eviction monitor started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        fire(&engine, &loop_state);
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Eviction monitor stopped");
        });

        MonitorHandle {
            shutdown: shutdown_tx,
            task,
            state,
        }
    }
}

fn fire(engine: &Arc<EvictionEngine>, state: &Arc<MonitorState>) {
    if state
        .in_flight
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        debug!("Previous eviction check still running, skipping tick");
        state.ticks_skipped.fetch_add(1, Ordering::Relaxed);
        crate::metrics::record_monitor_skip();
        return;
    }

    state.checks_started.fetch_add(1, Ordering::Relaxed);
    let guard = InFlightGuard(state.clone());
    let engine = engine.clone();
    tokio::spawn(async move {
        let _guard = guard;
        let report = engine.run_check().await;
        if report.performed() {
            info!(deleted = report.deleted, "Periodic cleanup performed");
        } else {
            debug!(outcome = %report.outcome, "No periodic cleanup needed");
        }
    });
}

/// Handle to a running monitor. Dropping it stops the loop.
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    state: Arc<MonitorState>,
}

impl MonitorHandle {
    #[must_use]
    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            checks_started: self.state.checks_started.load(Ordering::Relaxed),
            ticks_skipped: self.state.ticks_skipped.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn is_check_running(&self) -> bool {
        self.state.in_flight.load(Ordering::Acquire)
    }

    /// Stop ticking and wait for the loop to exit. A check already in flight
    /// runs to completion on its own task.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
