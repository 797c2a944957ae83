//! Vimeo API client for video metadata.

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::entries::{Thumbnail, VideoMeta, VideoStats};
use crate::enrichment::{ProviderError, VideoSource};

use super::expect_success;

const API_ROOT: &str = "https://api.vimeo.com";

/// Index into `pictures.sizes`; the third size is the medium thumbnail.
const THUMBNAIL_SIZE_INDEX: usize = 2;

pub struct VimeoClient {
    http: reqwest::Client,
    access_token: String,
}

impl VimeoClient {
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        Self {
            http,
            access_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideoPayload {
    name: String,
    link: String,
    duration: f64,
    created_time: String,
    pictures: PicturesPayload,
    stats: StatsPayload,
    metadata: MetadataPayload,
}

#[derive(Debug, Deserialize)]
struct PicturesPayload {
    #[serde(default)]
    sizes: Vec<SizePayload>,
}

#[derive(Debug, Deserialize)]
struct SizePayload {
    link: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct StatsPayload {
    #[serde(default)]
    plays: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MetadataPayload {
    connections: ConnectionsPayload,
}

#[derive(Debug, Deserialize)]
struct ConnectionsPayload {
    likes: LikesPayload,
}

#[derive(Debug, Deserialize)]
struct LikesPayload {
    total: u64,
}

impl VideoPayload {
    fn into_meta(mut self) -> Result<VideoMeta, ProviderError> {
        let published_at = OffsetDateTime::parse(&self.created_time, &Rfc3339)
            .map_err(|error| ProviderError::Payload(format!("created_time: {error}")))?;

        if self.pictures.sizes.is_empty() {
            return Err(ProviderError::Payload("no thumbnail sizes".to_string()));
        }
        let index = THUMBNAIL_SIZE_INDEX.min(self.pictures.sizes.len() - 1);
        let size = self.pictures.sizes.swap_remove(index);

        Ok(VideoMeta {
            title: self.name,
            url: self.link,
            duration_minutes: Some(self.duration / 60.0),
            published_at,
            thumbnail: Thumbnail {
                url: size.link,
                width: size.width,
                height: size.height,
            },
            stats: VideoStats {
                views: self.stats.plays.unwrap_or(0),
                likes: self.metadata.connections.likes.total,
                dislikes: None,
            },
        })
    }
}

#[async_trait]
impl VideoSource for VimeoClient {
    async fn video_meta(&self, id: &str) -> Result<VideoMeta, ProviderError> {
        let response = self
            .http
            .get(format!("{API_ROOT}/videos/{id}"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let payload: VideoPayload = expect_success(response)?
            .json()
            .await
            .map_err(|error| ProviderError::Payload(error.to_string()))?;
        payload.into_meta()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO: &str = r#"{
        "name": "Designing for performance",
        "link": "https://vimeo.com/123",
        "duration": 1830,
        "created_time": "2014-11-20T10:00:00+00:00",
        "pictures": {"sizes": [
            {"link": "https://i.vimeocdn.com/s.jpg", "width": 100, "height": 75},
            {"link": "https://i.vimeocdn.com/m.jpg", "width": 200, "height": 150},
            {"link": "https://i.vimeocdn.com/l.jpg", "width": 295, "height": 166}
        ]},
        "stats": {"plays": 5000},
        "metadata": {"connections": {"likes": {"total": 40}}}
    }"#;

    #[test]
    fn payload_maps_to_video_meta() {
        let payload: VideoPayload = serde_json::from_str(VIDEO).expect("payload should parse");
        let meta = payload.into_meta().expect("meta");

        assert_eq!(meta.title, "Designing for performance");
        assert_eq!(meta.duration_minutes, Some(30.5));
        assert_eq!(meta.thumbnail.url, "https://i.vimeocdn.com/l.jpg");
        assert_eq!(meta.stats.views, 5000);
        assert_eq!(meta.stats.likes, 40);
        assert_eq!(meta.published_at.year(), 2014);
    }

    #[test]
    fn short_size_lists_fall_back_to_the_largest() {
        let mut payload: VideoPayload = serde_json::from_str(VIDEO).expect("parse");
        payload.pictures.sizes.truncate(1);
        let meta = payload.into_meta().expect("meta");
        assert_eq!(meta.thumbnail.url, "https://i.vimeocdn.com/s.jpg");
    }

    #[test]
    fn missing_thumbnails_are_payload_errors() {
        let mut payload: VideoPayload = serde_json::from_str(VIDEO).expect("parse");
        payload.pictures.sizes.clear();
        assert!(matches!(
            payload.into_meta(),
            Err(ProviderError::Payload(_))
        ));
    }
}
