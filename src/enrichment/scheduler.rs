//! Cron-driven refresh job.
//!
//! The enrichment cycle runs once at startup and then on a fixed cron
//! schedule (every 12 hours in the default deployment). There is no
//! cancellation: a cycle that outlives its interval simply overlaps the next
//! one, and the per-call in-flight guard keeps duplicates bounded.

use std::str::FromStr;
use std::sync::Arc;

use apalis::layers::WorkerBuilderExt;
use apalis::prelude::{Data, Monitor, WorkerBuilder, WorkerFactoryFn};
use apalis_cron::{CronStream, Schedule};
use tracing::error;

use crate::enrichment::tasks::EnrichmentService;

/// Marker struct for the cron-triggered refresh job.
/// Must implement `From<chrono::DateTime<chrono::Utc>>` for apalis-cron.
#[derive(Default, Debug, Clone)]
pub struct RefreshJob;

impl From<chrono::DateTime<chrono::Utc>> for RefreshJob {
    fn from(_: chrono::DateTime<chrono::Utc>) -> Self {
        Self
    }
}

/// Context handed to the refresh worker.
#[derive(Clone)]
pub struct RefreshContext {
    pub service: Arc<EnrichmentService>,
}

/// Process one scheduled refresh tick.
pub async fn process_refresh_job(
    _job: RefreshJob,
    ctx: Data<RefreshContext>,
) -> Result<(), apalis::prelude::Error> {
    ctx.service.refresh().await;
    Ok(())
}

/// Parse the configured cron expression.
pub fn refresh_schedule(expression: &str) -> Result<Schedule, String> {
    Schedule::from_str(expression)
        .map_err(|error| format!("invalid refresh cron expression `{expression}`: {error}"))
}

/// Spawn the monitor driving the refresh worker.
pub fn spawn_refresh_monitor(
    service: Arc<EnrichmentService>,
    schedule: Schedule,
) -> tokio::task::JoinHandle<()> {
    let worker = WorkerBuilder::new("enrichment-refresh-worker")
        .data(RefreshContext { service })
        .backend(CronStream::new(schedule))
        .build_fn(process_refresh_job);

    let monitor = Monitor::new().register(worker);

    tokio::spawn(async move {
        if let Err(error) = monitor.run().await {
            error!(error = %error, "enrichment monitor stopped");
        }
    })
}
