//! YouTube Data API client for video metadata.

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::entries::{Thumbnail, VideoMeta, VideoStats};
use crate::enrichment::{ProviderError, VideoSource};

use super::expect_success;

const API_URL: &str = "https://www.googleapis.com/youtube/v3/videos";

pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }
}

#[derive(Debug, Deserialize)]
struct ListPayload {
    #[serde(default)]
    items: Vec<ItemPayload>,
}

#[derive(Debug, Deserialize)]
struct ItemPayload {
    snippet: SnippetPayload,
    statistics: StatisticsPayload,
}

#[derive(Debug, Deserialize)]
struct SnippetPayload {
    title: String,
    #[serde(rename = "publishedAt")]
    published_at: String,
    thumbnails: ThumbnailsPayload,
}

#[derive(Debug, Deserialize)]
struct ThumbnailsPayload {
    medium: ThumbnailPayload,
}

#[derive(Debug, Deserialize)]
struct ThumbnailPayload {
    url: String,
    width: u32,
    height: u32,
}

// Statistics values arrive as decimal strings.
#[derive(Debug, Deserialize)]
struct StatisticsPayload {
    #[serde(rename = "viewCount")]
    view_count: String,
    #[serde(default, rename = "likeCount")]
    like_count: Option<String>,
    #[serde(default, rename = "dislikeCount")]
    dislike_count: Option<String>,
}

fn parse_count(value: &str, field: &str) -> Result<u64, ProviderError> {
    value
        .parse::<u64>()
        .map_err(|_| ProviderError::Payload(format!("{field} is not a number: `{value}`")))
}

impl ItemPayload {
    fn into_meta(self, id: &str) -> Result<VideoMeta, ProviderError> {
        let published_at = OffsetDateTime::parse(&self.snippet.published_at, &Rfc3339)
            .map_err(|error| ProviderError::Payload(format!("publishedAt: {error}")))?;

        let likes = match self.statistics.like_count.as_deref() {
            Some(value) => parse_count(value, "likeCount")?,
            None => 0,
        };
        let dislikes = match self.statistics.dislike_count.as_deref() {
            Some(value) => Some(parse_count(value, "dislikeCount")?),
            None => None,
        };

        Ok(VideoMeta {
            title: self.snippet.title,
            url: format!("https://www.youtube.com/watch?v={id}"),
            duration_minutes: None,
            published_at,
            thumbnail: Thumbnail {
                url: self.snippet.thumbnails.medium.url,
                width: self.snippet.thumbnails.medium.width,
                height: self.snippet.thumbnails.medium.height,
            },
            stats: VideoStats {
                views: parse_count(&self.statistics.view_count, "viewCount")?,
                likes,
                dislikes,
            },
        })
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn video_meta(&self, id: &str) -> Result<VideoMeta, ProviderError> {
        let response = self
            .http
            .get(API_URL)
            .query(&[
                ("part", "snippet,statistics"),
                ("id", id),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let payload: ListPayload = expect_success(response)?
            .json()
            .await
            .map_err(|error| ProviderError::Payload(error.to_string()))?;

        // The list endpoint answers 200 with no items for unknown ids.
        let item = payload.items.into_iter().next().ok_or(ProviderError::NotFound)?;
        item.into_meta(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEM: &str = r#"{
        "snippet": {
            "title": "Fast by default",
            "publishedAt": "2015-03-09T17:00:00Z",
            "thumbnails": {
                "medium": {"url": "https://i.ytimg.com/vi/x/mqdefault.jpg", "width": 320, "height": 180}
            }
        },
        "statistics": {"viewCount": "1024", "likeCount": "99"}
    }"#;

    #[test]
    fn item_maps_to_video_meta() {
        let item: ItemPayload = serde_json::from_str(ITEM).expect("payload should parse");
        let meta = item.into_meta("x").expect("meta");

        assert_eq!(meta.title, "Fast by default");
        assert_eq!(meta.url, "https://www.youtube.com/watch?v=x");
        assert_eq!(meta.stats.views, 1024);
        assert_eq!(meta.stats.likes, 99);
        assert_eq!(meta.stats.dislikes, None);
        assert_eq!(meta.published_at.year(), 2015);
        assert_eq!(meta.thumbnail.width, 320);
    }

    #[test]
    fn non_numeric_counts_are_payload_errors() {
        let mut item: ItemPayload = serde_json::from_str(ITEM).expect("payload should parse");
        item.statistics.view_count = "many".to_string();
        assert!(matches!(
            item.into_meta("x"),
            Err(ProviderError::Payload(_))
        ));
    }

    #[test]
    fn empty_item_lists_mean_not_found() {
        let payload: ListPayload = serde_json::from_str(r#"{"items": []}"#).expect("parse");
        assert!(payload.items.is_empty());
    }
}
