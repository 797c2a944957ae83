//! Provider seams.
//!
//! Each external data source is one trait; the engine and the refresh tasks
//! only ever see `Arc<dyn …>`, so tests run against stubs and a deployment
//! missing credentials simply leaves the slot empty.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::domain::entries::{Contributor, PersonProfile, VideoMeta};

/// Per-call provider failure taxonomy.
///
/// `NotFound` is the softer variant: logged distinctly, never retried inside
/// a cycle, and the targeted field is simply left unset.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("resource not found")]
    NotFound,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Payload(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound)
    }
}

/// A GitHub repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse a record link field into a repository reference.
    ///
    /// Accepts `https://github.com/{owner}/{repo}` with optional deeper path
    /// segments or fragments; anything else (including other hosts) is not a
    /// star-count target.
    pub fn from_link(value: &str) -> Option<Self> {
        let url = Url::parse(value).ok()?;
        if url.host_str() != Some("github.com") {
            return None;
        }
        let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());
        let owner = segments.next()?;
        let name = segments.next()?;
        Some(Self {
            owner: owner.to_string(),
            name: name.trim_end_matches(".git").to_string(),
        })
    }

    /// Parse an `owner/name` slug, as configured for the contributor fetch.
    pub fn from_slug(slug: &str) -> Option<Self> {
        let (owner, name) = slug.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Source-code host metadata: star counts and the contributor list.
#[async_trait]
pub trait CodeHost: Send + Sync {
    async fn stargazers(&self, repo: &RepoRef) -> Result<u64, ProviderError>;
    async fn contributors(&self, repo: &RepoRef) -> Result<Vec<Contributor>, ProviderError>;
}

/// One video platform's metadata API.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn video_meta(&self, id: &str) -> Result<VideoMeta, ProviderError>;
}

/// Social-profile metadata API.
#[async_trait]
pub trait SocialSource: Send + Sync {
    async fn profile(&self, handle: &str) -> Result<PersonProfile, ProviderError>;
}

/// The configured provider set. Absent credentials leave a slot `None`; the
/// owning task logs the gap once per cycle and does nothing.
#[derive(Clone, Default)]
pub struct Providers {
    pub code_host: Option<Arc<dyn CodeHost>>,
    pub youtube: Option<Arc<dyn VideoSource>>,
    pub vimeo: Option<Arc<dyn VideoSource>>,
    pub social: Option<Arc<dyn SocialSource>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_ref_parses_github_links() {
        assert_eq!(
            RepoRef::from_link("https://github.com/GoogleChrome/lighthouse"),
            Some(RepoRef {
                owner: "GoogleChrome".to_string(),
                name: "lighthouse".to_string(),
            })
        );
        assert_eq!(
            RepoRef::from_link("https://github.com/tkadlec/grunt-perfbudget#readme"),
            Some(RepoRef {
                owner: "tkadlec".to_string(),
                name: "grunt-perfbudget".to_string(),
            })
        );
    }

    #[test]
    fn repo_ref_rejects_non_repository_links() {
        assert_eq!(RepoRef::from_link("https://example.com/a/b"), None);
        assert_eq!(RepoRef::from_link("https://github.com/"), None);
        assert_eq!(RepoRef::from_link("not a url"), None);
    }

    #[test]
    fn repo_ref_parses_slugs() {
        assert_eq!(
            RepoRef::from_slug("stefanjudis/perf-tooling"),
            Some(RepoRef {
                owner: "stefanjudis".to_string(),
                name: "perf-tooling".to_string(),
            })
        );
        assert_eq!(RepoRef::from_slug("no-slash"), None);
        assert_eq!(RepoRef::from_slug("a/b/c"), None);
    }
}
