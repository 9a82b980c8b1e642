//! Search backends and the retrieval broker that fans search terms out to one of them.

mod google_cse;
mod offline;
mod serpapi;
mod tavily;

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::error::ResearchError;
use crate::models::{CandidateSource, QueryType};

pub use google_cse::GoogleCseBackend;
pub use offline::OfflineBackend;
pub use serpapi::SerpApiBackend;
pub use tavily::TavilyBackend;

/// One interchangeable web search provider.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Tag recorded as `backend` on every candidate
    fn name(&self) -> &'static str;

    /// Ordered hits for one term. `prioritize_recency` asks for news-style results.
    async fn search(
        &self,
        term: &str,
        prioritize_recency: bool,
    ) -> anyhow::Result<Vec<CandidateSource>>;
}

/// Pick a backend from the available credentials: SerpApi, Tavily, Google CSE, then offline.
pub fn select_backend(config: &SearchConfig) -> Box<dyn SearchBackend> {
    if let Some(key) = &config.serpapi_api_key {
        return Box::new(SerpApiBackend::new(key.clone(), config.timeout));
    }
    if let Some(key) = &config.tavily_api_key {
        return Box::new(TavilyBackend::new(key.clone(), config.timeout));
    }
    if let (Some(key), Some(engine_id)) = (&config.google_api_key, &config.google_search_engine_id) {
        return Box::new(GoogleCseBackend::new(
            key.clone(),
            engine_id.clone(),
            config.timeout,
        ));
    }
    warn!("no search API credentials found, using offline search results");
    Box::new(OfflineBackend)
}

/// Turn a non-2xx response into an external call failure.
pub(crate) async fn ensure_success(
    service: &str,
    response: reqwest::Response,
) -> anyhow::Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ResearchError::external(
        service,
        format!("HTTP {}: {}", status, crate::util::excerpt(&body, 200)),
    )
    .into())
}

/// Merges per-term results into one deduplicated candidate list.
pub struct RetrievalBroker {
    backend: Box<dyn SearchBackend>,
}

impl RetrievalBroker {
    pub fn new(backend: Box<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(select_backend(config))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Search each term in order until `limit` unique URLs are collected.
    ///
    /// A failing term is logged and skipped; it never aborts retrieval.
    pub async fn retrieve(
        &self,
        terms: &[String],
        query_type: QueryType,
        limit: usize,
    ) -> Vec<CandidateSource> {
        let prioritize_recency = query_type == QueryType::News;
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for term in terms {
            if candidates.len() >= limit {
                break;
            }

            let hits = match self.backend.search(term, prioritize_recency).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(backend = self.backend.name(), term = %term, error = %e, "search term failed");
                    continue;
                }
            };
            debug!(backend = self.backend.name(), term = %term, hits = hits.len(), "search term done");

            for hit in hits {
                if candidates.len() >= limit {
                    break;
                }
                if hit.url.trim().is_empty() || !seen.insert(hit.url.clone()) {
                    continue;
                }
                candidates.push(hit);
            }
        }

        info!(
            backend = self.backend.name(),
            terms = terms.len(),
            candidates = candidates.len(),
            "retrieval finished"
        );
        candidates
    }
}
