//! Reconciliation sweeps.
//!
//! A sweep lists every eligible workload, decides its patch and applies it.
//! Workloads are handled one after another; a failure is logged, counted and
//! never stops the pass.

use std::sync::Arc;
use std::time::Duration;

use autoupdate_core::config::{UpdaterConfig, WorkloadKind};
use autoupdate_core::error::Result;

use crate::decision::UpdateDecider;
use crate::workload::{Workload, WorkloadSource};

/// What a sweep looks at and whether it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOptions {
    pub label_selector: String,
    pub kinds: Vec<WorkloadKind>,
    pub dry_run: bool,
}

impl SweepOptions {
    pub fn from_config(config: &UpdaterConfig) -> Self {
        Self {
            label_selector: config.label_selector.clone(),
            kinds: config.kinds.clone(),
            dry_run: config.dry_run,
        }
    }
}

/// Outcome counts of one sweep.
///
/// Every listed workload lands in exactly one of `patched`, `pending`,
/// `unchanged` or `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub attempted: usize,
    pub patched: usize,
    /// Patches computed but not applied (dry run)
    pub pending: usize,
    pub unchanged: usize,
    pub failed: usize,
    /// Workload kinds that could not be listed
    pub list_failures: usize,
}

enum Outcome {
    Patched,
    Pending,
    Unchanged,
}

/// Drives sweeps over a workload source.
pub struct Reconciler {
    source: Arc<dyn WorkloadSource>,
    decider: UpdateDecider,
    options: SweepOptions,
}

impl Reconciler {
    pub fn new(source: Arc<dyn WorkloadSource>, decider: UpdateDecider, options: SweepOptions) -> Self {
        Self {
            source,
            decider,
            options,
        }
    }

    /// Perform one full pass over all eligible workloads.
    pub async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for &kind in &self.options.kinds {
            let workloads = match self.source.list(kind, &self.options.label_selector).await {
                Ok(workloads) => workloads,
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "Failed to list workloads");
                    report.list_failures += 1;
                    continue;
                }
            };

            for workload in &workloads {
                report.attempted += 1;
                match self.reconcile(workload).await {
                    Ok(Outcome::Patched) => report.patched += 1,
                    Ok(Outcome::Pending) => report.pending += 1,
                    Ok(Outcome::Unchanged) => report.unchanged += 1,
                    Err(e) => {
                        tracing::error!(workload = %workload.id(), error = %e, "Failed to update workload");
                        report.failed += 1;
                    }
                }
            }
        }

        tracing::info!(
            attempted = report.attempted,
            patched = report.patched,
            pending = report.pending,
            unchanged = report.unchanged,
            failed = report.failed,
            list_failures = report.list_failures,
            "Sweep complete"
        );
        report
    }

    async fn reconcile(&self, workload: &Workload) -> Result<Outcome> {
        let Some(patch) = self.decider.decide(workload).await? else {
            return Ok(Outcome::Unchanged);
        };

        let changes = serde_json::to_string(patch.containers())?;
        if self.options.dry_run {
            tracing::info!(workload = %workload.id(), patch = %changes, "Dry run, not patching");
            return Ok(Outcome::Pending);
        }

        tracing::info!(workload = %workload.id(), patch = %changes, "Patching workload");
        self.source.apply(workload, &patch).await?;
        Ok(Outcome::Patched)
    }

    /// Sweep forever: wait `initial_delay`, then alternate sweeps and `interval` waits.
    ///
    /// The wait starts after a sweep finishes, so passes never overlap.
    pub async fn run_scheduled(&self, initial_delay: Duration, interval: Duration) {
        if !initial_delay.is_zero() {
            tracing::info!(delay_secs = initial_delay.as_secs(), "Waiting before first sweep");
            tokio::time::sleep(initial_delay).await;
        }

        loop {
            self.sweep().await;
            tracing::info!(interval_secs = interval.as_secs(), "Sleeping until next sweep");
            tokio::time::sleep(interval).await;
        }
    }
}
