//! GitHub metadata client: star counts and the contributor list.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::entries::Contributor;
use crate::enrichment::{CodeHost, ProviderError, RepoRef};

use super::expect_success;

const API_ROOT: &str = "https://api.github.com";

pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
}

impl GitHubClient {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self { http, token }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;
        expect_success(response)?
            .json::<T>()
            .await
            .map_err(|error| ProviderError::Payload(error.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct RepoPayload {
    stargazers_count: u64,
}

#[derive(Debug, Deserialize)]
struct ContributorPayload {
    login: String,
    avatar_url: String,
    html_url: String,
    contributions: u64,
}

impl From<ContributorPayload> for Contributor {
    fn from(payload: ContributorPayload) -> Self {
        Self {
            login: payload.login,
            avatar_url: payload.avatar_url,
            html_url: payload.html_url,
            contributions: payload.contributions,
        }
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn stargazers(&self, repo: &RepoRef) -> Result<u64, ProviderError> {
        let payload: RepoPayload = self
            .get_json(format!("{API_ROOT}/repos/{}/{}", repo.owner, repo.name))
            .await?;
        Ok(payload.stargazers_count)
    }

    async fn contributors(&self, repo: &RepoRef) -> Result<Vec<Contributor>, ProviderError> {
        let payload: Vec<ContributorPayload> = self
            .get_json(format!(
                "{API_ROOT}/repos/{}/{}/contributors",
                repo.owner, repo.name
            ))
            .await?;
        Ok(payload.into_iter().map(Contributor::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_payload_reads_star_count() {
        let payload: RepoPayload =
            serde_json::from_str(r#"{"stargazers_count": 42, "forks_count": 7}"#)
                .expect("payload should parse");
        assert_eq!(payload.stargazers_count, 42);
    }

    #[test]
    fn contributor_payload_maps_to_domain() {
        let payload: ContributorPayload = serde_json::from_str(
            r#"{
                "login": "jane",
                "avatar_url": "https://avatars.example.com/jane",
                "html_url": "https://github.com/jane",
                "contributions": 12,
                "type": "User"
            }"#,
        )
        .expect("payload should parse");

        let contributor = Contributor::from(payload);
        assert_eq!(contributor.login, "jane");
        assert_eq!(contributor.contributions, 12);
    }
}
