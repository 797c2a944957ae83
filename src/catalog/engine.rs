//! The aggregation engine.
//!
//! Single consumer of the update queue: drains pending enrichment updates,
//! applies each one to catalog state as one atomic per-entry step, and
//! invalidates the cached pages the update made stale. Page content itself
//! is recomputed lazily by the render cache on the next read.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::catalog::state::CatalogState;
use crate::catalog::updates::{Update, UpdateQueue};
use crate::render::cache::PageCache;
use crate::render::context::PageKind;

const CONSUME_BATCH_LIMIT: usize = 256;
const METRIC_UPDATES_APPLIED: &str = "perf_tooling_updates_applied_total";
const METRIC_CONSUME_MS: &str = "perf_tooling_update_consume_ms";

pub struct Engine {
    state: Arc<CatalogState>,
    queue: Arc<UpdateQueue>,
    pages: Arc<PageCache>,
}

impl Engine {
    pub fn new(state: Arc<CatalogState>, queue: Arc<UpdateQueue>, pages: Arc<PageCache>) -> Self {
        Self {
            state,
            queue,
            pages,
        }
    }

    pub fn state(&self) -> &Arc<CatalogState> {
        &self.state
    }

    pub fn queue(&self) -> &Arc<UpdateQueue> {
        &self.queue
    }

    pub fn pages(&self) -> &Arc<PageCache> {
        &self.pages
    }

    /// Publish one update and consume the queue immediately.
    ///
    /// The path enrichment tasks take on every completion; a periodic
    /// consume tick in `main` backstops anything published without an
    /// immediate consume.
    pub fn submit(&self, update: Update) {
        self.queue.publish(update);
        self.consume();
    }

    /// Drain pending updates and apply them in FIFO order.
    ///
    /// Each update is applied under a single write-lock section, so a
    /// concurrent render snapshot observes either none or all of an update's
    /// field group. Invalidation happens after the batch, deduplicated per
    /// page. Returns the number of updates applied.
    pub fn consume(&self) -> usize {
        let started_at = Instant::now();
        let updates = self.queue.drain(CONSUME_BATCH_LIMIT);
        if updates.is_empty() {
            return 0;
        }

        let mut stale_pages: HashSet<PageKind> = HashSet::new();
        let mut applied = 0usize;

        for queued in updates {
            let kind = queued.update.kind();
            let affected = self.apply(queued.update);
            if affected.is_empty() {
                debug!(
                    update_id = %queued.id,
                    update_kind = kind,
                    "Update applied without page effect"
                );
            } else {
                applied += 1;
                counter!(METRIC_UPDATES_APPLIED, "kind" => kind).increment(1);
                stale_pages.extend(affected);
            }
        }

        for page in &stale_pages {
            self.pages.invalidate(*page);
        }

        info!(
            applied,
            invalidated = stale_pages.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Consumed enrichment updates"
        );
        histogram!(METRIC_CONSUME_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        applied
    }

    /// Apply one update; returns the pages it made stale.
    fn apply(&self, update: Update) -> Vec<PageKind> {
        match update {
            Update::Stars {
                target,
                field,
                count,
            } => {
                if self.state.merge_stars(target, &field, count) {
                    vec![PageKind::Category(target.category)]
                } else {
                    warn!(target = %target, field, "Star update targeted a missing entry");
                    Vec::new()
                }
            }
            Update::VideoMeta { target, meta } => {
                if self.state.set_video_meta(target, meta) {
                    vec![PageKind::Category(target.category)]
                } else {
                    warn!(target = %target, "Video update targeted a missing entry");
                    Vec::new()
                }
            }
            Update::Profile { handle, profile } => {
                self.state.insert_person(handle.clone(), profile);
                self.state
                    .categories_citing(&handle)
                    .into_iter()
                    .map(PageKind::Category)
                    .collect()
            }
            Update::Contributors { list } => {
                self.state.set_contributors(list);
                vec![PageKind::Index]
            }
        }
    }
}
