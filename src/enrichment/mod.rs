//! Enrichment coordination.
//!
//! Providers are trait seams; tasks fan out fetches and publish typed
//! updates; the scheduler re-runs the whole cycle on a cron interval.

pub mod providers;
pub mod scheduler;
pub mod tasks;

pub use providers::{CodeHost, ProviderError, Providers, RepoRef, SocialSource, VideoSource};
pub use scheduler::{RefreshContext, RefreshJob, process_refresh_job, refresh_schedule,
    spawn_refresh_monitor};
pub use tasks::EnrichmentService;
