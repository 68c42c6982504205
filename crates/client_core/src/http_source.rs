use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::Story,
    error::LoadFailure,
    protocol::{SearchResponse, StoryHit},
};
use tracing::info;
use url::Url;

pub const DEFAULT_SEARCH_API: &str = "https://hn.algolia.com/api/v1";

/// Fetches stories from a Hacker News style search API (`<base>/search`).
pub struct HttpStorySource {
    http: Client,
    endpoint: Url,
    query: String,
}

impl HttpStorySource {
    pub fn new(base_url: &str, query: impl Into<String>) -> Result<Self> {
        let mut endpoint =
            Url::parse(base_url).with_context(|| format!("invalid search api url '{base_url}'"))?;
        endpoint
            .path_segments_mut()
            .map_err(|_| anyhow!("search api url '{base_url}' cannot be a base"))?
            .pop_if_empty()
            .push("search");

        Ok(Self {
            http: Client::new(),
            endpoint,
            query: query.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    async fn fetch_hits(&self) -> Result<Vec<Story>> {
        let res = self
            .http
            .get(self.endpoint.clone())
            .query(&[("query", self.query.as_str())])
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.endpoint))?
            .error_for_status()?;
        let body: SearchResponse = res.json().await.context("malformed search response")?;

        let received = body.hits.len();
        let stories: Vec<Story> = body
            .hits
            .into_iter()
            .filter_map(StoryHit::into_story)
            .collect();
        info!(
            received,
            kept = stories.len(),
            query = %self.query,
            "http source: search hits decoded"
        );
        Ok(stories)
    }
}

#[async_trait]
impl crate::loader::CollectionSource<Story> for HttpStorySource {
    async fn fetch(&self) -> std::result::Result<Vec<Story>, LoadFailure> {
        self.fetch_hits()
            .await
            .map_err(|err| LoadFailure::new(format!("{err:#}")))
    }
}

#[cfg(test)]
#[path = "tests/http_source_tests.rs"]
mod tests;
