//! Social-profile client (Twitter API v2, bearer-token auth).

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::entries::PersonProfile;
use crate::enrichment::{ProviderError, SocialSource};

use super::expect_success;

const API_ROOT: &str = "https://api.twitter.com/2";

pub struct TwitterClient {
    http: reqwest::Client,
    bearer_token: String,
}

impl TwitterClient {
    pub fn new(http: reqwest::Client, bearer_token: String) -> Self {
        Self {
            http,
            bearer_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    #[serde(default)]
    data: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    profile_image_url: Option<String>,
    public_metrics: MetricsPayload,
}

#[derive(Debug, Deserialize)]
struct MetricsPayload {
    followers_count: u64,
}

impl From<UserPayload> for PersonProfile {
    fn from(payload: UserPayload) -> Self {
        Self {
            description: payload
                .description
                .filter(|description| !description.is_empty()),
            follower_count: payload.public_metrics.followers_count,
            image: payload.profile_image_url.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl SocialSource for TwitterClient {
    async fn profile(&self, handle: &str) -> Result<PersonProfile, ProviderError> {
        let response = self
            .http
            .get(format!("{API_ROOT}/users/by/username/{handle}"))
            .query(&[(
                "user.fields",
                "description,profile_image_url,public_metrics",
            )])
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        let envelope: UserEnvelope = expect_success(response)?
            .json()
            .await
            .map_err(|error| ProviderError::Payload(error.to_string()))?;

        // Unknown usernames answer 200 with an errors array and no data.
        let user = envelope.data.ok_or(ProviderError::NotFound)?;
        Ok(PersonProfile::from(user))
    }
}
