//! Content extraction: URL in, normalized text (or a documented absence) out.
//!
//! Each page is fetched once. The article strategy runs first; when it yields
//! too little text the generic container strategy runs on the same markup, and
//! that in turn falls back to the full visible page text.

pub mod article;
pub mod html;
pub mod normalize;
pub mod robots;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::ExtractionConfig;
use crate::error::ResearchError;
use crate::models::ExtractionMethod;
use crate::search::ensure_success;

use article::Article;
use robots::PermissionCache;

pub const ROBOTS_RESTRICTED_NOTICE: &str =
    "[Access to this content is restricted by the website's robots.txt policy]";

/// Rendered article text must exceed this to count at all
const ARTICLE_MIN_CHARS: usize = 50;
/// and reach this to skip the generic strategy.
const ARTICLE_ACCEPT_CHARS: usize = 100;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Body of a 2xx response; anything else is an error.
    async fn fetch(&self, url: &str) -> anyhow::Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ResearchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ResearchError::external("fetch", e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        let response = self.client.get(url).send().await?;
        Ok(ensure_success("fetch", response).await?.text().await?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub method: ExtractionMethod,
    /// Date found in the page's article metadata
    pub publish_date: Option<String>,
}

/// Owns the fetcher and the per-origin robots cache.
pub struct ContentExtractor {
    fetcher: Arc<dyn PageFetcher>,
    permissions: PermissionCache,
    respect_robots: bool,
}

impl ContentExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &ExtractionConfig) -> Self {
        Self {
            fetcher,
            permissions: PermissionCache::new(config.user_agent.clone()),
            respect_robots: config.respect_robots,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ResearchError> {
        let fetcher = HttpFetcher::new(&config.user_agent, config.timeout)?;
        Ok(Self::new(Arc::new(fetcher), config))
    }

    /// Never fails: any fetch or parse problem is logged and yields `None`.
    pub async fn extract(&self, url: &str) -> Option<Extraction> {
        let parsed = match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
            _ => {
                warn!(url, "skipping non-http URL");
                return None;
            }
        };

        if self.respect_robots
            && !self
                .permissions
                .is_allowed(&parsed, self.fetcher.as_ref())
                .await
        {
            warn!(url, "robots.txt disallows fetching");
            return Some(Extraction {
                text: ROBOTS_RESTRICTED_NOTICE.to_string(),
                method: ExtractionMethod::RobotsRestricted,
                publish_date: None,
            });
        }

        let markup = match self.fetcher.fetch(url).await {
            Ok(markup) => markup,
            Err(e) => {
                warn!(url, error = %e, "fetch failed");
                return None;
            }
        };

        let extraction = extract_from_markup(&markup);
        match &extraction {
            Some(found) => debug!(
                url,
                method = ?found.method,
                chars = found.text.len(),
                "extracted content"
            ),
            None => warn!(url, "no usable content in page"),
        }
        extraction
    }
}

/// Run both strategies over already-fetched markup.
pub fn extract_from_markup(markup: &str) -> Option<Extraction> {
    let article = Article::parse(markup);
    let publish_date = article.published.clone();

    let article_text = article
        .render()
        .filter(|text| text.trim().chars().count() > ARTICLE_MIN_CHARS);

    let (raw, method) = match article_text {
        Some(text) if text.trim().chars().count() >= ARTICLE_ACCEPT_CHARS => {
            (text, ExtractionMethod::Article)
        }
        _ => html::extract_generic(markup)?,
    };

    let text = normalize::clean_text(&raw);
    if text.is_empty() {
        return None;
    }
    Some(Extraction {
        text,
        method,
        publish_date,
    })
}
