//! Report worker
//!
//! Two background loops share one `ReportService`:
//! - the tick claims and generates the next report every poll interval
//! - the sweep fails reports stuck in progress past the timeout
//!
//! Both stop when the shutdown channel flips to `true`. A failed cycle is
//! logged and the loop carries on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::app::report_service::{ReportService, TickOutcome};
use crate::domain::ports::{ElasticsearchClient, ReportMailer, ReportRepository, SqlExecutor};

/// Background driver for report generation
pub struct ReportWorker<RR, SE, ES, RM>
where
    RR: ReportRepository,
    SE: SqlExecutor,
    ES: ElasticsearchClient,
    RM: ReportMailer,
{
    service: Arc<ReportService<RR, SE, ES, RM>>,
    poll_interval: Duration,
    sweep_interval: Duration,
}

impl<RR, SE, ES, RM> ReportWorker<RR, SE, ES, RM>
where
    RR: ReportRepository,
    SE: SqlExecutor,
    ES: ElasticsearchClient,
    RM: ReportMailer,
{
    pub fn new(
        service: Arc<ReportService<RR, SE, ES, RM>>,
        poll_interval: Duration,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            service,
            poll_interval,
            sweep_interval,
        }
    }

    /// Claim-and-generate loop
    pub async fn run_ticks(&self, mut shutdown: watch::Receiver<bool>) {
        let mut timer = interval(self.poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let settings = self.service.settings();
        info!(
            poll_seconds = self.poll_interval.as_secs(),
            max_concurrent = settings.max_concurrent,
            page_size = settings.page_size,
            max_rows = settings.max_rows,
            "Starting report worker"
        );

        loop {
            tokio::select! {
                _ = timer.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            match self.service.process_next(&mut shutdown).await {
                Ok(TickOutcome::Finished { id, status }) => {
                    info!(report_id = %id, %status, "Report finished");
                }
                Ok(TickOutcome::Interrupted(id)) => {
                    info!(report_id = %id, "Report left for the next run");
                    break;
                }
                Ok(TickOutcome::Busy) | Ok(TickOutcome::Idle) => {
                    debug!("No report processed this tick");
                }
                Err(e) => {
                    error!(error = %e, "Report tick failed");
                    continue;
                }
            }
        }

        info!("Report worker stopped");
    }

    /// Timeout sweep loop
    pub async fn run_sweeps(&self, mut shutdown: watch::Receiver<bool>) {
        let mut timer = interval(self.sweep_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_seconds = self.sweep_interval.as_secs(),
            timeout_minutes = self.service.settings().timeout.num_minutes(),
            "Starting report timeout sweep"
        );

        loop {
            tokio::select! {
                _ = timer.tick() => {}
                _ = shutdown.changed() => break,
            }

            match self.service.sweep().await {
                Ok(failed) if !failed.is_empty() => {
                    info!(count = failed.len(), "Failed reports past the timeout");
                }
                Ok(_) => debug!("No stale reports this cycle"),
                Err(e) => {
                    error!(error = %e, "Report sweep failed");
                    continue;
                }
            }
        }

        info!("Report timeout sweep stopped");
    }
}
