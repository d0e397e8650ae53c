//! Poll loop that pulls the desired-state set and hands it to the
//! synchronizer.
//!
//! Retrying is implicit: a line that failed stays out of sync in the cache,
//! so the next tick sees the same difference and sends the command again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use ledbridge_domain::error::BridgeError;
use ledbridge_domain::output::DesiredState;

use crate::ports::{DesiredStateSource, DeviceLink};
use crate::services::synchronizer::{ApplyOutcome, Synchronizer};

/// Counts from one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub applied: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Poll-driven source adapter feeding [`Synchronizer::apply_many`].
pub struct Reconciler<S, L> {
    source: S,
    synchronizer: Arc<Synchronizer<L>>,
    interval: Duration,
}

impl<S, L> Reconciler<S, L>
where
    S: DesiredStateSource + Send + Sync + 'static,
    L: DeviceLink,
{
    #[must_use]
    pub fn new(source: S, synchronizer: Arc<Synchronizer<L>>, interval: Duration) -> Self {
        Self {
            source,
            synchronizer,
            interval,
        }
    }

    /// Spawn the poll loop. Abort the returned handle to stop it.
    pub fn start(self) -> JoinHandle<()> {
        tracing::info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "reconciler started"
        );
        tokio::spawn(self.run())
    }

    /// Reconcile, sleep, repeat.
    async fn run(self) {
        loop {
            if let Err(err) = self.tick().await {
                tracing::warn!(error = %err, "desired-state fetch failed, retrying next interval");
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Run one reconciliation pass.
    ///
    /// # Errors
    ///
    /// Returns the source's error when the desired-state set cannot be read.
    /// Per-line device failures are counted in the report, not returned.
    pub async fn tick(&self) -> Result<ReconcileReport, BridgeError> {
        let rows = self.source.desired_states().await?;
        self.warn_on_line_mismatch(&rows);

        let batch = rows.iter().map(|row| (row.output_id, row.state)).collect();
        let mut report = ReconcileReport::default();

        for line in self.synchronizer.apply_many(batch).await {
            match line.result {
                Ok(ApplyOutcome::Applied) => report.applied += 1,
                Ok(ApplyOutcome::Unchanged) => report.unchanged += 1,
                Err(err) => {
                    tracing::warn!(output = %line.output_id, error = %err, "reconciliation failed");
                    report.failed += 1;
                }
            }
        }

        if report.applied > 0 || report.failed > 0 {
            tracing::info!(
                applied = report.applied,
                unchanged = report.unchanged,
                failed = report.failed,
                "reconciliation pass"
            );
        } else {
            tracing::trace!(unchanged = report.unchanged, "nothing to reconcile");
        }

        Ok(report)
    }

    /// The registry is authoritative for line numbers; a store that disagrees
    /// is worth a warning, not a write to an unexpected pin.
    fn warn_on_line_mismatch(&self, rows: &[DesiredState]) {
        let registry = self.synchronizer.registry();
        for row in rows {
            if let Ok(output) = registry.resolve(row.output_id)
                && output.line != row.line
            {
                tracing::warn!(
                    output = %row.output_id,
                    label = %row.label,
                    store_line = %row.line,
                    configured_line = %output.line,
                    "store disagrees with configured line, using configured line"
                );
            }
        }
    }
}
