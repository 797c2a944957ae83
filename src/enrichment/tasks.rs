//! The four enrichment tasks.
//!
//! Each task targets one provider and runs independently: a slow or failing
//! provider never blocks the others, and every completion is published to
//! the engine as a typed update. Failures leave prior state untouched.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;
use metrics::counter;
use tracing::{debug, info, warn};

use crate::catalog::{Engine, EntryKey, Update};
use crate::domain::entries::{Category, VideoId};
use crate::enrichment::providers::{
    CodeHost, Providers, RepoRef, SocialSource, VideoSource,
};

const METRIC_PROVIDER_FETCH: &str = "perf_tooling_provider_fetch_total";

/// Guard against unbounded duplicate requests: a fetch whose predecessor
/// from an earlier cycle is still outstanding is skipped this cycle.
#[derive(Clone, Default)]
struct InFlight {
    keys: Arc<DashMap<String, ()>>,
}

impl InFlight {
    fn acquire(&self, key: String) -> Option<InFlightGuard> {
        use dashmap::mapref::entry::Entry;
        match self.keys.entry(key.clone()) {
            Entry::Occupied(_) => {
                debug!(key, "Skipping fetch: previous call still in flight");
                None
            }
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(InFlightGuard {
                    keys: Arc::clone(&self.keys),
                    key,
                })
            }
        }
    }
}

struct InFlightGuard {
    keys: Arc<DashMap<String, ()>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys.remove(&self.key);
    }
}

/// Runs the refresh cycle against the configured providers.
pub struct EnrichmentService {
    engine: Arc<Engine>,
    providers: Providers,
    repository: Option<RepoRef>,
    in_flight: InFlight,
}

impl EnrichmentService {
    pub fn new(engine: Arc<Engine>, providers: Providers, repository: Option<RepoRef>) -> Self {
        Self {
            engine,
            providers,
            repository,
            in_flight: InFlight::default(),
        }
    }

    /// One full refresh cycle: all four tasks, concurrently.
    pub async fn refresh(&self) {
        info!("Starting enrichment cycle");
        tokio::join!(
            self.refresh_contributors(),
            self.refresh_stars(),
            self.refresh_videos(),
            self.refresh_profiles(),
        );
        info!("Enrichment cycle finished");
    }

    async fn refresh_contributors(&self) {
        let Some(host) = self.providers.code_host.as_ref() else {
            debug!("Code-host credentials missing; skipping contributor fetch");
            return;
        };
        let Some(repo) = self.repository.as_ref() else {
            debug!("No project repository configured; skipping contributor fetch");
            return;
        };
        let Some(_guard) = self.in_flight.acquire("contributors".to_string()) else {
            return;
        };

        match host.contributors(repo).await {
            Ok(list) => {
                counter!(METRIC_PROVIDER_FETCH, "provider" => "contributors", "outcome" => "ok")
                    .increment(1);
                info!(repo = %repo, count = list.len(), "Fetched contributor list");
                self.engine.submit(Update::Contributors { list });
            }
            Err(error) => {
                counter!(METRIC_PROVIDER_FETCH, "provider" => "contributors", "outcome" => "error")
                    .increment(1);
                warn!(repo = %repo, error = %error, "Contributor fetch failed; keeping previous list");
            }
        }
    }

    async fn refresh_stars(&self) {
        let Some(host) = self.providers.code_host.as_ref() else {
            debug!("Code-host credentials missing; skipping star counts");
            return;
        };

        let snapshot = self.engine.state().snapshot(Category::Tools);
        let targets: Vec<(EntryKey, String, RepoRef)> = snapshot
            .iter()
            .enumerate()
            .flat_map(|(index, entry)| {
                let target = EntryKey {
                    category: Category::Tools,
                    index,
                };
                entry
                    .string_fields()
                    .filter_map(|(key, value)| {
                        RepoRef::from_link(value).map(|repo| (target, key.to_string(), repo))
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        join_all(targets.into_iter().map(|(target, field, repo)| async move {
            let Some(_guard) = self.in_flight.acquire(format!("stars:{target}:{field}")) else {
                return;
            };
            match host.stargazers(&repo).await {
                Ok(count) => {
                    counter!(METRIC_PROVIDER_FETCH, "provider" => "stars", "outcome" => "ok")
                        .increment(1);
                    self.engine.submit(Update::Stars {
                        target,
                        field,
                        count,
                    });
                }
                Err(error) if error.is_not_found() => {
                    counter!(METRIC_PROVIDER_FETCH, "provider" => "stars", "outcome" => "not_found")
                        .increment(1);
                    info!(repo = %repo, target = %target, "Repository not found; leaving field unset");
                }
                Err(error) => {
                    counter!(METRIC_PROVIDER_FETCH, "provider" => "stars", "outcome" => "error")
                        .increment(1);
                    warn!(repo = %repo, target = %target, error = %error, "Star fetch failed");
                }
            }
        }))
        .await;
    }

    async fn refresh_videos(&self) {
        let snapshot = self.engine.state().snapshot(Category::Videos);
        let targets: Vec<(EntryKey, VideoId)> = snapshot
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                entry.video_id().map(|id| {
                    (
                        EntryKey {
                            category: Category::Videos,
                            index,
                        },
                        id,
                    )
                })
            })
            .collect();

        join_all(targets.into_iter().map(|(target, id)| async move {
            let (provider, platform, video_id): (&Option<Arc<dyn VideoSource>>, _, _) = match &id {
                VideoId::Youtube(video_id) => (&self.providers.youtube, "youtube", video_id),
                VideoId::Vimeo(video_id) => (&self.providers.vimeo, "vimeo", video_id),
            };
            let Some(source) = provider.as_ref() else {
                debug!(platform, "Video platform credentials missing; skipping fetch");
                return;
            };
            let Some(_guard) = self.in_flight.acquire(format!("video:{target}")) else {
                return;
            };

            match source.video_meta(video_id).await {
                Ok(meta) => {
                    counter!(METRIC_PROVIDER_FETCH, "provider" => platform, "outcome" => "ok")
                        .increment(1);
                    self.engine.submit(Update::VideoMeta { target, meta });
                }
                Err(error) => {
                    let outcome = if error.is_not_found() { "not_found" } else { "error" };
                    counter!(METRIC_PROVIDER_FETCH, "provider" => platform, "outcome" => outcome)
                        .increment(1);
                    warn!(
                        platform,
                        target = %target,
                        error = %error,
                        "Video metadata fetch failed; keeping previous metadata"
                    );
                }
            }
        }))
        .await;
    }

    async fn refresh_profiles(&self) {
        let Some(social) = self.providers.social.as_ref() else {
            debug!("Social credentials missing; skipping profile fetches");
            return;
        };

        // Distinct handles across every category: one fetch per handle per
        // cycle no matter how many entries cite it.
        let handles = self.engine.state().distinct_handles();

        join_all(handles.into_iter().map(|handle| async move {
            let Some(_guard) = self.in_flight.acquire(format!("profile:{handle}")) else {
                return;
            };
            match social.profile(&handle).await {
                Ok(profile) => {
                    counter!(METRIC_PROVIDER_FETCH, "provider" => "social", "outcome" => "ok")
                        .increment(1);
                    self.engine.submit(Update::Profile { handle, profile });
                }
                Err(error) => {
                    let outcome = if error.is_not_found() { "not_found" } else { "error" };
                    counter!(METRIC_PROVIDER_FETCH, "provider" => "social", "outcome" => outcome)
                        .increment(1);
                    warn!(handle, error = %error, "Profile fetch failed");
                }
            }
        }))
        .await;
    }
}
