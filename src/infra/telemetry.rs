use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "perf_tooling_provider_fetch_total",
            Unit::Count,
            "Provider fetches by provider and outcome (ok, not_found, error)."
        );
        describe_counter!(
            "perf_tooling_updates_applied_total",
            Unit::Count,
            "Enrichment updates applied to catalog state, by kind."
        );
        describe_gauge!(
            "perf_tooling_update_queue_len",
            Unit::Count,
            "Current number of pending enrichment updates."
        );
        describe_histogram!(
            "perf_tooling_update_consume_ms",
            Unit::Milliseconds,
            "Latency of one update-queue consumption batch."
        );
        describe_counter!(
            "perf_tooling_page_cache_hit_total",
            Unit::Count,
            "Render-cache hits by page."
        );
        describe_counter!(
            "perf_tooling_page_cache_miss_total",
            Unit::Count,
            "Render-cache misses (first render or post-invalidation) by page."
        );
        describe_counter!(
            "perf_tooling_page_render_total",
            Unit::Count,
            "Page renders by page, cached and filtered alike."
        );
    });
}
