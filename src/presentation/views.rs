//! View models and page templates.
//!
//! Templates stay logic-free: everything they show is prepared here from the
//! render context, including formatted dates and resolved person profiles.

use std::collections::HashMap;

use askama::Template;
use time::macros::format_description;

use crate::domain::entries::{Category, Contributor, Entry, PersonProfile, VideoMeta};
use crate::render::context::{PageContext, ResourceCounts, SiteMeta};

/// One outbound link of an entry, labeled by its record field key.
#[derive(Clone)]
pub struct LinkView {
    pub label: String,
    pub href: String,
    pub stars: Option<u64>,
}

#[derive(Clone)]
pub struct PersonView {
    pub handle: String,
    pub description: Option<String>,
    pub follower_count: u64,
    pub image: String,
}

#[derive(Clone)]
pub struct VideoView {
    pub title: String,
    pub url: String,
    pub duration: Option<String>,
    pub published: String,
    pub thumbnail_url: String,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub views: u64,
    pub likes: u64,
}

#[derive(Clone)]
pub struct EntryView {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub hidden: bool,
    pub links: Vec<LinkView>,
    pub person: Option<PersonView>,
    pub video: Option<VideoView>,
}

impl EntryView {
    pub fn from_entry(entry: &Entry, people: &HashMap<String, PersonProfile>) -> Self {
        let links = entry
            .string_fields()
            .filter(|(_, value)| value.starts_with("http://") || value.starts_with("https://"))
            .map(|(key, value)| LinkView {
                label: key.to_string(),
                href: value.to_string(),
                stars: entry.enrichment.stars.get(key).copied(),
            })
            .collect();

        let person = entry.social_handle().and_then(|handle| {
            people.get(&handle).map(|profile| PersonView {
                handle,
                description: profile.description.clone(),
                follower_count: profile.follower_count,
                image: profile.image.clone(),
            })
        });

        Self {
            name: entry.name.clone(),
            description: entry.description.clone(),
            tags: entry.tags.clone(),
            hidden: entry.hidden,
            links,
            person,
            video: entry.enrichment.video.as_ref().map(VideoView::from_meta),
        }
    }
}

impl VideoView {
    fn from_meta(meta: &VideoMeta) -> Self {
        let format = format_description!("[month repr:short] [day padding:none], [year]");
        Self {
            title: meta.title.clone(),
            url: meta.url.clone(),
            duration: meta
                .duration_minutes
                .map(|minutes| format!("{minutes:.0} min")),
            published: meta.published_at.format(&format).unwrap_or_default(),
            thumbnail_url: meta.thumbnail.url.clone(),
            thumbnail_width: meta.thumbnail.width,
            thumbnail_height: meta.thumbnail.height,
            views: meta.stats.views,
            likes: meta.stats.likes,
        }
    }
}

#[derive(Clone)]
pub struct ContributorView {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    pub contributions: u64,
}

impl ContributorView {
    fn from_contributor(contributor: &Contributor) -> Self {
        Self {
            login: contributor.login.clone(),
            avatar_url: contributor.avatar_url.clone(),
            html_url: contributor.html_url.clone(),
            contributions: contributor.contributions,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub site: SiteMeta,
    pub counts: ResourceCounts,
    pub platforms: Vec<String>,
    pub contributors: Vec<ContributorView>,
}

impl IndexTemplate {
    pub fn from_context(context: &PageContext) -> Self {
        Self {
            site: context.site.clone(),
            counts: context.counts,
            platforms: context.platforms.clone(),
            contributors: context
                .contributors
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(ContributorView::from_contributor)
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "list.html")]
pub struct ListTemplate {
    pub site: SiteMeta,
    pub counts: ResourceCounts,
    pub platforms: Vec<String>,
    pub category: String,
    pub query: Option<String>,
    pub entries: Vec<EntryView>,
}

impl ListTemplate {
    pub fn from_context(category: Category, context: &PageContext) -> Self {
        Self {
            site: context.site.clone(),
            counts: context.counts,
            platforms: context.platforms.clone(),
            category: category.to_string(),
            query: context.query.clone(),
            entries: context
                .entries
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|entry| EntryView::from_entry(entry, &context.people))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use time::macros::datetime;

    use crate::domain::entries::{Thumbnail, VideoStats};

    fn entry(json: &str) -> Entry {
        serde_json::from_str(json).expect("record should parse")
    }

    #[test]
    fn links_carry_their_star_counts() {
        let mut entry = entry(
            r#"{"name": "t", "cli": "https://github.com/x/t", "docs": "not a url"}"#,
        );
        entry.enrichment.stars.insert("cli".to_string(), 42);

        let view = EntryView::from_entry(&entry, &HashMap::new());
        assert_eq!(view.links.len(), 1);
        assert_eq!(view.links[0].label, "cli");
        assert_eq!(view.links[0].stars, Some(42));
    }

    #[test]
    fn person_resolves_by_handle_lookup() {
        let entry = entry(r#"{"name": "a", "social": {"twitter": "@Jane"}}"#);

        let mut people = HashMap::new();
        people.insert(
            "jane".to_string(),
            PersonProfile {
                description: Some("perf person".to_string()),
                follower_count: 99,
                image: "https://example.com/jane.png".to_string(),
            },
        );

        let view = EntryView::from_entry(&entry, &people);
        let person = view.person.expect("profile resolved");
        assert_eq!(person.handle, "jane");
        assert_eq!(person.follower_count, 99);

        let unresolved = EntryView::from_entry(
            &serde_json::from_str::<Entry>(r#"{"name": "b", "social": {"twitter": "bob"}}"#)
                .expect("parse"),
            &people,
        );
        assert!(unresolved.person.is_none());
    }

    #[test]
    fn video_view_formats_duration_and_date() {
        let meta = VideoMeta {
            title: "Talk".to_string(),
            url: "https://vimeo.com/1".to_string(),
            duration_minutes: Some(31.4),
            published_at: datetime!(2015-03-09 12:00 UTC),
            thumbnail: Thumbnail {
                url: "https://example.com/t.jpg".to_string(),
                width: 200,
                height: 150,
            },
            stats: VideoStats {
                views: 1000,
                likes: 12,
                dislikes: None,
            },
        };

        let view = VideoView::from_meta(&meta);
        assert_eq!(view.duration.as_deref(), Some("31 min"));
        assert_eq!(view.published, "Mar 9, 2015");
    }
}
