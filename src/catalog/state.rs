//! Engine-owned mutable state.
//!
//! One `CatalogState` instance holds everything the process mutates after
//! boot: the per-category entry lists, the shared person-profile map and the
//! contributor list. It is passed by reference to the render and enrichment
//! components, so tests can run any number of independent instances.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use dashmap::DashMap;

use crate::catalog::lock::{rw_read, rw_write};
use crate::catalog::updates::EntryKey;
use crate::domain::entries::{Category, Contributor, Entry, PersonProfile, VideoMeta};

const SOURCE: &str = "catalog::state";

/// The loaded flat-file store, one ordered list per category.
#[derive(Debug, Default)]
pub struct LoadedStore {
    pub articles: Vec<Entry>,
    pub books: Vec<Entry>,
    pub slides: Vec<Entry>,
    pub tools: Vec<Entry>,
    pub videos: Vec<Entry>,
}

impl LoadedStore {
    pub fn take(&mut self, category: Category) -> Vec<Entry> {
        match category {
            Category::Articles => std::mem::take(&mut self.articles),
            Category::Books => std::mem::take(&mut self.books),
            Category::Slides => std::mem::take(&mut self.slides),
            Category::Tools => std::mem::take(&mut self.tools),
            Category::Videos => std::mem::take(&mut self.videos),
        }
    }
}

/// All mutable aggregation state for one engine instance.
///
/// Entry lists keep their load order for the whole process lifetime; updates
/// mutate entries in place and never insert, remove or reorder, which is what
/// makes `(category, index)` a stable update target.
pub struct CatalogState {
    articles: RwLock<Vec<Entry>>,
    books: RwLock<Vec<Entry>>,
    slides: RwLock<Vec<Entry>>,
    tools: RwLock<Vec<Entry>>,
    videos: RwLock<Vec<Entry>>,
    people: DashMap<String, PersonProfile>,
    contributors: RwLock<Option<Vec<Contributor>>>,
}

impl CatalogState {
    pub fn new(mut store: LoadedStore) -> Self {
        Self {
            articles: RwLock::new(store.take(Category::Articles)),
            books: RwLock::new(store.take(Category::Books)),
            slides: RwLock::new(store.take(Category::Slides)),
            tools: RwLock::new(store.take(Category::Tools)),
            videos: RwLock::new(store.take(Category::Videos)),
            people: DashMap::new(),
            contributors: RwLock::new(None),
        }
    }

    fn list(&self, category: Category) -> &RwLock<Vec<Entry>> {
        match category {
            Category::Articles => &self.articles,
            Category::Books => &self.books,
            Category::Slides => &self.slides,
            Category::Tools => &self.tools,
            Category::Videos => &self.videos,
        }
    }

    /// Clone the category list under a read lock.
    ///
    /// Renders work against snapshots, so a concurrent enrichment merge can
    /// never surface half-written inside an already-running render.
    pub fn snapshot(&self, category: Category) -> Vec<Entry> {
        rw_read(self.list(category), SOURCE, "snapshot").clone()
    }

    pub fn len(&self, category: Category) -> usize {
        rw_read(self.list(category), SOURCE, "len").len()
    }

    pub fn is_empty(&self, category: Category) -> bool {
        self.len(category) == 0
    }

    /// Merge one star count into one entry's stars map.
    ///
    /// Returns false when the target no longer resolves (only possible with a
    /// key from a different state instance).
    pub fn merge_stars(&self, target: EntryKey, field: &str, count: u64) -> bool {
        let mut list = rw_write(self.list(target.category), SOURCE, "merge_stars");
        match list.get_mut(target.index) {
            Some(entry) => {
                entry.enrichment.stars.insert(field.to_string(), count);
                true
            }
            None => false,
        }
    }

    /// Replace one entry's video metadata as a single atomic group.
    pub fn set_video_meta(&self, target: EntryKey, meta: VideoMeta) -> bool {
        let mut list = rw_write(self.list(target.category), SOURCE, "set_video_meta");
        match list.get_mut(target.index) {
            Some(entry) => {
                entry.enrichment.video = Some(meta);
                true
            }
            None => false,
        }
    }

    /// Publish a person profile under its normalized handle.
    ///
    /// Every entry citing the handle observes the new profile immediately:
    /// entries hold the handle, not a copy of the profile.
    pub fn insert_person(&self, handle: String, profile: PersonProfile) {
        self.people.insert(handle, profile);
    }

    pub fn person(&self, handle: &str) -> Option<PersonProfile> {
        self.people.get(handle).map(|profile| profile.value().clone())
    }

    pub fn people_snapshot(&self) -> HashMap<String, PersonProfile> {
        self.people
            .iter()
            .map(|item| (item.key().clone(), item.value().clone()))
            .collect()
    }

    pub fn set_contributors(&self, list: Vec<Contributor>) {
        *rw_write(&self.contributors, SOURCE, "set_contributors") = Some(list);
    }

    pub fn contributors_snapshot(&self) -> Option<Vec<Contributor>> {
        rw_read(&self.contributors, SOURCE, "contributors_snapshot").clone()
    }

    /// Distinct normalized handles across every category.
    pub fn distinct_handles(&self) -> BTreeSet<String> {
        let mut handles = BTreeSet::new();
        for category in Category::ALL {
            let list = rw_read(self.list(category), SOURCE, "distinct_handles");
            handles.extend(list.iter().filter_map(Entry::social_handle));
        }
        handles
    }

    /// Categories containing at least one entry citing the handle.
    pub fn categories_citing(&self, handle: &str) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|category| {
                let list = rw_read(self.list(*category), SOURCE, "categories_citing");
                list.iter()
                    .any(|entry| entry.social_handle().as_deref() == Some(handle))
            })
            .collect()
    }
}
