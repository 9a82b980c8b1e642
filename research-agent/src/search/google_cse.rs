use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{SearchBackend, ensure_success};
use crate::models::CandidateSource;

const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
const NAME: &str = "google_cse";

/// Google Programmable Search (Custom Search JSON API)
pub struct GoogleCseBackend {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    timeout: Duration,
}

impl GoogleCseBackend {
    pub fn new(api_key: String, engine_id: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            engine_id,
            timeout,
        }
    }
}

#[async_trait]
impl SearchBackend for GoogleCseBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn search(
        &self,
        term: &str,
        prioritize_recency: bool,
    ) -> anyhow::Result<Vec<CandidateSource>> {
        let mut params = vec![
            ("key", self.api_key.as_str()),
            ("cx", self.engine_id.as_str()),
            ("q", term),
            ("num", "10"),
        ];
        if prioritize_recency {
            params.push(("sort", "date"));
        }

        let response = self
            .client
            .get(ENDPOINT)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await?;
        let data: Value = ensure_success(NAME, response).await?.json().await?;
        Ok(parse_items(&data))
    }
}

fn parse_items(data: &Value) -> Vec<CandidateSource> {
    let Some(items) = data["items"].as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let url = item["link"].as_str()?;
            let text = |key: &str| item[key].as_str().unwrap_or_default().to_string();
            Some(
                CandidateSource::new(url, text("title"), text("snippet"), NAME)
                    .with_metadata("display_link", text("displayLink"))
                    .with_metadata("file_format", text("fileFormat"))
                    .with_metadata("source_api", NAME),
            )
        })
        .collect()
}
