use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{SearchBackend, ensure_success};
use crate::models::CandidateSource;

const ENDPOINT: &str = "https://api.tavily.com/search";
const NAME: &str = "tavily";

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    query: &'a str,
    topic: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    score: Option<f64>,
    published_date: Option<String>,
}

pub struct TavilyBackend {
    client: reqwest::Client,
    api_key: String,
    timeout: Duration,
}

impl TavilyBackend {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl SearchBackend for TavilyBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn search(
        &self,
        term: &str,
        prioritize_recency: bool,
    ) -> anyhow::Result<Vec<CandidateSource>> {
        let request = TavilySearchRequest {
            query: term,
            topic: if prioritize_recency { "news" } else { "general" },
            search_depth: "basic",
            max_results: 10,
        };

        let response = self
            .client
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;
        let body: TavilySearchResponse = ensure_success(NAME, response).await?.json().await?;
        Ok(into_candidates(body))
    }
}

fn into_candidates(body: TavilySearchResponse) -> Vec<CandidateSource> {
    body.results
        .into_iter()
        .map(|r| {
            let mut hit = CandidateSource::new(r.url, r.title, r.content, NAME)
                .with_metadata("source_api", NAME);
            if let Some(score) = r.score {
                hit = hit.with_metadata("score", score);
            }
            if let Some(date) = r.published_date {
                hit = hit.with_metadata("published_date", date);
            }
            hit
        })
        .collect()
}
