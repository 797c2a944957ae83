//! End-to-end engine behavior: store loading, enrichment application and
//! render-cache consistency, using stub providers and a deterministic
//! renderer.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use perf_tooling::catalog::{
    CatalogState, Engine, EntryKey, Update, UpdateQueue, load_store,
};
use perf_tooling::domain::entries::{Category, Contributor, PersonProfile};
use perf_tooling::enrichment::{
    CodeHost, EnrichmentService, ProviderError, Providers, RepoRef, SocialSource,
};
use perf_tooling::render::cache::PageCache;
use perf_tooling::render::context::{PageContext, PageKind, SiteMeta};
use perf_tooling::render::{RenderError, Renderer};

/// Renders a page as a plain-text digest so assertions can read it.
struct DigestRenderer;

impl Renderer for DigestRenderer {
    fn render(&self, context: &PageContext) -> Result<String, RenderError> {
        let mut lines = vec![format!("page:{}", context.kind)];
        if let Some(contributors) = &context.contributors {
            lines.push(format!("contributors:{}", contributors.len()));
        }
        if let Some(entries) = &context.entries {
            for entry in entries {
                let stars = entry
                    .enrichment
                    .stars
                    .iter()
                    .map(|(field, count)| format!("{field}={count}"))
                    .collect::<Vec<_>>()
                    .join(",");
                let person = entry
                    .social_handle()
                    .and_then(|handle| context.people.get(&handle).cloned())
                    .map(|profile| format!("@{}", profile.follower_count))
                    .unwrap_or_default();
                lines.push(format!(
                    "entry:{} hidden:{} stars:[{stars}] {person}",
                    entry.name, entry.hidden
                ));
            }
        }
        Ok(lines.join("\n"))
    }
}

fn write_store(records: &[(&str, &str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for (category, file, body) in records {
        let category_dir = dir.path().join(category);
        fs::create_dir_all(&category_dir).expect("create category dir");
        fs::write(category_dir.join(file), body).expect("write record");
    }
    dir
}

async fn engine_from_store(dir: &TempDir) -> Arc<Engine> {
    let (store, _reports) = load_store(dir.path(), &[]).await;
    let state = Arc::new(CatalogState::new(store));
    let pages = Arc::new(PageCache::new(
        Arc::new(DigestRenderer),
        state.clone(),
        SiteMeta {
            name: "Performance tooling today".to_string(),
            cdn: String::new(),
            css_version: "test".to_string(),
            js_version: "test".to_string(),
        },
        Vec::new(),
    ));
    Arc::new(Engine::new(state, Arc::new(UpdateQueue::new()), pages))
}

struct FixedStars(u64);

#[async_trait]
impl CodeHost for FixedStars {
    async fn stargazers(&self, _repo: &RepoRef) -> Result<u64, ProviderError> {
        Ok(self.0)
    }

    async fn contributors(&self, _repo: &RepoRef) -> Result<Vec<Contributor>, ProviderError> {
        Err(ProviderError::Status(500))
    }
}

struct FixedProfile;

#[async_trait]
impl SocialSource for FixedProfile {
    async fn profile(&self, handle: &str) -> Result<PersonProfile, ProviderError> {
        Ok(PersonProfile {
            description: None,
            follower_count: 777,
            image: format!("https://example.com/{handle}.png"),
        })
    }
}

#[tokio::test]
async fn malformed_record_star_fetch_and_invalidation_scenario() {
    // A tools category with 3 records, one malformed.
    let dir = write_store(&[
        (
            "tools",
            "a.json",
            r#"{"name": "alpha", "cli": "https://github.com/acme/alpha"}"#,
        ),
        ("tools", "broken.json", r#"{"name": "nope", "#),
        ("tools", "b.json", r#"{"name": "beta"}"#),
    ]);
    let engine = engine_from_store(&dir).await;

    let tools = engine.state().snapshot(Category::Tools);
    assert_eq!(tools.len(), 2);

    let kind = PageKind::Category(Category::Tools);
    let before = engine.pages().page(kind).expect("render");
    assert!(!before.contains("42"));

    // Star fetch succeeds with 42 for alpha's cli field.
    let index = tools
        .iter()
        .position(|entry| entry.name == "alpha")
        .expect("alpha loaded");
    engine.submit(Update::Stars {
        target: EntryKey {
            category: Category::Tools,
            index,
        },
        field: "cli".to_string(),
        count: 42,
    });

    // The page served before the update never changes retroactively.
    assert!(!before.contains("42"));

    let after = engine.pages().page(kind).expect("render");
    assert!(after.contains("stars:[cli=42]"));
    assert!(after.contains("entry:beta hidden:false stars:[]"));

    // Entry beta is untouched in canonical state too.
    let snapshot = engine.state().snapshot(Category::Tools);
    assert!(snapshot[index].enrichment.stars.contains_key("cli"));
    assert!(
        snapshot
            .iter()
            .filter(|entry| entry.name == "beta")
            .all(|entry| entry.enrichment.stars.is_empty())
    );
}

#[tokio::test]
async fn cached_pages_are_byte_identical_until_invalidated() {
    let dir = write_store(&[("articles", "a.json", r#"{"name": "one"}"#)]);
    let engine = engine_from_store(&dir).await;
    let kind = PageKind::Category(Category::Articles);

    let first = engine.pages().page(kind).expect("render");
    let second = engine.pages().page(kind).expect("render");
    assert_eq!(first, second);
}

#[tokio::test]
async fn filtering_hides_conjunctive_misses_and_preserves_canonical_flags() {
    let dir = write_store(&[
        (
            "tools",
            "a.json",
            r#"{"name": "alpha", "tags": ["foo", "bar"]}"#,
        ),
        ("tools", "b.json", r#"{"name": "beta", "tags": ["foo"]}"#),
    ]);
    let engine = engine_from_store(&dir).await;

    let filtered = engine
        .pages()
        .filtered_page(Category::Tools, "foo bar")
        .expect("render");
    assert!(filtered.contains("entry:alpha hidden:false"));
    assert!(filtered.contains("entry:beta hidden:true"));

    let snapshot = engine.state().snapshot(Category::Tools);
    assert!(snapshot.iter().all(|entry| !entry.hidden));
}

#[tokio::test]
async fn full_refresh_cycle_with_stub_providers() {
    let dir = write_store(&[
        (
            "tools",
            "t.json",
            r#"{"name": "tool", "cli": "https://github.com/acme/tool"}"#,
        ),
        (
            "articles",
            "a.json",
            r#"{"name": "article", "social": {"twitter": "@Jane"}}"#,
        ),
        (
            "videos",
            "v.json",
            r#"{"name": "video", "social": {"twitter": "jane"}}"#,
        ),
    ]);
    let engine = engine_from_store(&dir).await;

    let providers = Providers {
        code_host: Some(Arc::new(FixedStars(9))),
        social: Some(Arc::new(FixedProfile)),
        ..Providers::default()
    };
    let service = EnrichmentService::new(engine.clone(), providers, None);
    service.refresh().await;

    // Stars merged into the tools entry.
    let tools = engine.state().snapshot(Category::Tools);
    assert_eq!(tools[0].enrichment.stars.get("cli"), Some(&9));

    // Both citing entries resolve the same profile object after one fetch.
    let profile = engine.state().person("jane").expect("profile stored");
    assert_eq!(profile.follower_count, 777);

    let articles = engine
        .pages()
        .page(PageKind::Category(Category::Articles))
        .expect("render");
    let videos = engine
        .pages()
        .page(PageKind::Category(Category::Videos))
        .expect("render");
    assert!(articles.contains("@777"));
    assert!(videos.contains("@777"));

    // Contributor fetch failed (stub returns 500): prior absence preserved.
    assert!(engine.state().contributors_snapshot().is_none());
}

#[tokio::test]
async fn independent_engine_instances_do_not_share_state() {
    let dir = write_store(&[("tools", "a.json", r#"{"name": "alpha"}"#)]);
    let first = engine_from_store(&dir).await;
    let second = engine_from_store(&dir).await;

    first.submit(Update::Profile {
        handle: "solo".to_string(),
        profile: PersonProfile {
            description: None,
            follower_count: 1,
            image: String::new(),
        },
    });

    assert!(first.state().person("solo").is_some());
    assert!(second.state().person("solo").is_none());
}

#[tokio::test]
async fn loader_reports_match_store_contents() {
    let dir = write_store(&[
        ("tools", "a.json", r#"{"name": "a"}"#),
        ("tools", "bad.json", "{"),
        ("books", "b.json", r#"{"name": "b"}"#),
    ]);

    let (_store, reports) = load_store(dir.path(), &[]).await;
    let by_category: HashMap<Category, (usize, usize)> = reports
        .into_iter()
        .map(|report| (report.category, (report.loaded, report.skipped)))
        .collect();

    assert_eq!(by_category[&Category::Tools], (1, 1));
    assert_eq!(by_category[&Category::Books], (1, 0));
    assert_eq!(by_category[&Category::Videos], (0, 0));
}
