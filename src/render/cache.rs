//! Versioned render cache.
//!
//! Holds the last rendered output per unfiltered page. Invalidation bumps a
//! per-page version counter; the next read observes the stamp mismatch and
//! re-renders synchronously from current catalog snapshots. Query-filtered
//! renders are computed per request and never cached: their input domain is
//! unbounded.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use metrics::counter;
use tracing::debug;

use crate::catalog::{CatalogState, rw_read, rw_write};
use crate::domain::entries::{Category, Entry};
use crate::render::context::{PageContext, PageKind, ResourceCounts, SiteMeta};
use crate::render::{RenderError, Renderer};

const SOURCE: &str = "render::cache";
const METRIC_PAGE_HIT: &str = "perf_tooling_page_cache_hit_total";
const METRIC_PAGE_MISS: &str = "perf_tooling_page_cache_miss_total";
const METRIC_PAGE_RENDER: &str = "perf_tooling_page_render_total";

struct RenderedPage {
    html: String,
    /// The page-version counter value this output was built from.
    version: u64,
}

pub struct PageCache {
    renderer: Arc<dyn Renderer>,
    state: Arc<CatalogState>,
    site: SiteMeta,
    platforms: Vec<String>,
    pages: RwLock<HashMap<PageKind, RenderedPage>>,
    versions: [AtomicU64; PageKind::ALL.len()],
}

impl PageCache {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        state: Arc<CatalogState>,
        site: SiteMeta,
        platforms: Vec<String>,
    ) -> Self {
        Self {
            renderer,
            state,
            site,
            platforms,
            pages: RwLock::new(HashMap::new()),
            versions: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    fn slot(kind: PageKind) -> usize {
        match kind {
            PageKind::Index => 0,
            PageKind::Category(Category::Articles) => 1,
            PageKind::Category(Category::Books) => 2,
            PageKind::Category(Category::Slides) => 3,
            PageKind::Category(Category::Tools) => 4,
            PageKind::Category(Category::Videos) => 5,
        }
    }

    /// The unfiltered page, rendered at most once per version.
    ///
    /// Returned strings are owned and immutable; a later invalidation never
    /// changes output already handed out.
    pub fn page(&self, kind: PageKind) -> Result<String, RenderError> {
        let current = self.versions[Self::slot(kind)].load(Ordering::Acquire);

        if let Some(cached) = rw_read(&self.pages, SOURCE, "page").get(&kind) {
            if cached.version == current {
                counter!(METRIC_PAGE_HIT, "page" => kind.to_string()).increment(1);
                return Ok(cached.html.clone());
            }
        }

        counter!(METRIC_PAGE_MISS, "page" => kind.to_string()).increment(1);
        let context = self.context(kind, None);
        let html = self.render(&context)?;
        rw_write(&self.pages, SOURCE, "page.store").insert(
            kind,
            RenderedPage {
                html: html.clone(),
                version: current,
            },
        );
        Ok(html)
    }

    /// A filtered category page, rendered fresh for every request.
    ///
    /// Works on a cloned snapshot: the canonical list's `hidden` flags are
    /// never touched.
    pub fn filtered_page(&self, category: Category, query: &str) -> Result<String, RenderError> {
        let mut entries = self.state.snapshot(category);
        apply_query(&mut entries, query);

        let mut context = self.context(PageKind::Category(category), Some(query.to_string()));
        context.entries = Some(entries);
        self.render(&context)
    }

    /// Drop the cached page; the next `page` call recomputes.
    pub fn invalidate(&self, kind: PageKind) {
        let version = self.versions[Self::slot(kind)].fetch_add(1, Ordering::AcqRel) + 1;
        debug!(page = %kind, version, "Invalidated cached page");
    }

    fn render(&self, context: &PageContext) -> Result<String, RenderError> {
        counter!(METRIC_PAGE_RENDER, "page" => context.kind.to_string()).increment(1);
        self.renderer.render(context)
    }

    fn context(&self, kind: PageKind, query: Option<String>) -> PageContext {
        let entries = match kind {
            PageKind::Index => None,
            PageKind::Category(category) => Some(self.state.snapshot(category)),
        };
        PageContext {
            kind,
            site: self.site.clone(),
            platforms: self.platforms.clone(),
            counts: self.counts(),
            contributors: self.state.contributors_snapshot(),
            people: self.state.people_snapshot(),
            entries,
            query,
        }
    }

    fn counts(&self) -> ResourceCounts {
        ResourceCounts {
            articles: self.state.len(Category::Articles),
            books: self.state.len(Category::Books),
            slides: self.state.len(Category::Slides),
            tools: self.state.len(Category::Tools),
            videos: self.state.len(Category::Videos),
        }
    }
}

/// Recompute `hidden` on a transient entry list from the match rule.
///
/// Split the query on whitespace; an entry matches iff every term occurs,
/// case-insensitively, as a substring of its fuzzy token. Non-matching
/// entries are hidden rather than removed, preserving stable ordering and
/// count semantics for the template.
pub fn apply_query(entries: &mut [Entry], query: &str) {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|term| term.to_lowercase())
        .collect();

    for entry in entries {
        entry.hidden = !terms.iter().all(|term| entry.fuzzy.contains(term));
    }
}
