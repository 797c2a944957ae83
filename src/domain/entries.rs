//! Catalog records and the enrichment data attached to them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

/// The five listable resource categories.
///
/// Also the closed set of store directories and public routes; parsing is
/// case-sensitive on the lowercase route segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Articles,
    Books,
    Slides,
    Tools,
    Videos,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Articles,
        Category::Books,
        Category::Slides,
        Category::Tools,
        Category::Videos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Articles => "articles",
            Category::Books => "books",
            Category::Slides => "slides",
            Category::Tools => "tools",
            Category::Videos => "videos",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category `{}`", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "articles" => Ok(Category::Articles),
            "books" => Ok(Category::Books),
            "slides" => Ok(Category::Slides),
            "tools" => Ok(Category::Tools),
            "videos" => Ok(Category::Videos),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Social handles carried by a store record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub twitter: Option<String>,
}

/// One cataloged resource as read from the flat-file store.
///
/// The named fields are shared across categories; everything else a record
/// carries (platform links, article URLs, author names) lands in `fields`.
/// `fields` is a `BTreeMap` so derived data is stable across loads.
///
/// `fuzzy`, `hidden` and `enrichment` never come from the store: the loader
/// derives `fuzzy` exactly once, `hidden` is only ever flipped on transient
/// render copies, and `enrichment` is written through the update queue.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub social: Option<SocialLinks>,
    #[serde(default, rename = "youtubeId")]
    pub youtube_id: Option<String>,
    #[serde(default, rename = "vimeoId")]
    pub vimeo_id: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,

    #[serde(skip)]
    pub fuzzy: String,
    #[serde(skip)]
    pub hidden: bool,
    #[serde(skip)]
    pub enrichment: Enrichment,
}

impl Entry {
    /// Category-specific fields whose value is a plain string, in stable
    /// (alphabetical) order.
    pub fn string_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|(key, value)| value.as_str().map(|text| (key.as_str(), text)))
    }

    /// The record's social handle with any leading `@` stripped, lowercased.
    ///
    /// This is the key into the shared person-profile map.
    pub fn social_handle(&self) -> Option<String> {
        self.social
            .as_ref()
            .and_then(|social| social.twitter.as_deref())
            .map(normalize_handle)
            .filter(|handle| !handle.is_empty())
    }

    /// The owning video platform, when the record carries a platform id.
    ///
    /// A video record has exactly one of the two ids; if both are present the
    /// record is malformed and YouTube wins deterministically.
    pub fn video_id(&self) -> Option<VideoId> {
        if let Some(id) = self.youtube_id.as_deref() {
            return Some(VideoId::Youtube(id.to_string()));
        }
        self.vimeo_id
            .as_deref()
            .map(|id| VideoId::Vimeo(id.to_string()))
    }
}

/// Normalize a social handle for keying: strip a leading `@`, lowercase.
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}

/// Identifier of a video on its owning platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoId {
    Youtube(String),
    Vimeo(String),
}

/// Enrichment attached to one entry after load.
///
/// A small closed set of field groups rather than an open map: each group is
/// written by exactly one provider, so concurrent providers touching the same
/// entry can never clobber each other. `stars` is merged key by key; `video`
/// is replaced as one group.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub stars: BTreeMap<String, u64>,
    pub video: Option<VideoMeta>,
}

/// Video metadata fetched from the owning platform, replaced atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMeta {
    pub title: String,
    pub url: String,
    pub duration_minutes: Option<f64>,
    pub published_at: OffsetDateTime,
    pub thumbnail: Thumbnail,
    pub stats: VideoStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoStats {
    pub views: u64,
    pub likes: u64,
    pub dislikes: Option<u64>,
}

/// Profile of a person referenced by one or more entries.
///
/// Stored once per handle and shared by lookup, never copied into entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonProfile {
    pub description: Option<String>,
    pub follower_count: u64,
    pub image: String,
}

/// One project contributor, shown on the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    pub contributions: u64,
}
