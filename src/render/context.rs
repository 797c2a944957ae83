//! Rendering context types.
//!
//! The page renderer is an opaque pure function from a `PageContext` to an
//! HTML string; everything a template may show travels in the context.

use std::collections::HashMap;

use crate::domain::entries::{Category, Contributor, Entry, PersonProfile};

/// One renderable page. The closed key set of the render cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Index,
    Category(Category),
}

impl PageKind {
    pub const ALL: [PageKind; 6] = [
        PageKind::Index,
        PageKind::Category(Category::Articles),
        PageKind::Category(Category::Books),
        PageKind::Category(Category::Slides),
        PageKind::Category(Category::Tools),
        PageKind::Category(Category::Videos),
    ];
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageKind::Index => f.write_str("index"),
            PageKind::Category(category) => write!(f, "{category}"),
        }
    }
}

/// Site-wide metadata baked into every page.
#[derive(Debug, Clone)]
pub struct SiteMeta {
    pub name: String,
    pub cdn: String,
    /// Content fingerprints of the embedded stylesheet and script, used for
    /// cache-busting asset URLs.
    pub css_version: String,
    pub js_version: String,
}

impl SiteMeta {
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            name: "Performance tooling today".to_string(),
            cdn: String::new(),
            css_version: "deadbeef".to_string(),
            js_version: "deadbeef".to_string(),
        }
    }
}

/// Resource counts per category, shown in the page chrome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub articles: usize,
    pub books: usize,
    pub slides: usize,
    pub tools: usize,
    pub videos: usize,
}

/// Everything a single page render may observe.
///
/// Built from catalog snapshots; holding one never blocks or observes
/// concurrent enrichment merges.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub kind: PageKind,
    pub site: SiteMeta,
    pub platforms: Vec<String>,
    pub counts: ResourceCounts,
    pub contributors: Option<Vec<Contributor>>,
    pub people: HashMap<String, PersonProfile>,
    /// Entry snapshot for list pages; `None` on the index.
    pub entries: Option<Vec<Entry>>,
    /// The active search query on filtered renders.
    pub query: Option<String>,
}
