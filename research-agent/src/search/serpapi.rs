use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{SearchBackend, ensure_success};
use crate::models::CandidateSource;

const ENDPOINT: &str = "https://serpapi.com/search";
const NAME: &str = "serpapi";

pub struct SerpApiBackend {
    client: reqwest::Client,
    api_key: String,
    timeout: Duration,
}

impl SerpApiBackend {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl SearchBackend for SerpApiBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn search(
        &self,
        term: &str,
        prioritize_recency: bool,
    ) -> anyhow::Result<Vec<CandidateSource>> {
        let mut params = vec![
            ("api_key", self.api_key.as_str()),
            ("q", term),
            ("gl", "us"),
            ("hl", "en"),
        ];
        if prioritize_recency {
            params.push(("tbm", "nws"));
        }

        let response = self
            .client
            .get(ENDPOINT)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await?;
        let data: Value = ensure_success(NAME, response).await?.json().await?;
        Ok(parse_results(&data))
    }
}

/// Organic results when present, otherwise news results.
fn parse_results(data: &Value) -> Vec<CandidateSource> {
    if let Some(items) = data["organic_results"].as_array() {
        return items
            .iter()
            .filter_map(|item| {
                let hit = base_hit(item)?
                    .with_metadata("displayed_link", str_field(item, "displayed_link"))
                    .with_metadata("source_api", NAME);
                Some(match item.get("position") {
                    Some(position) => hit.with_metadata("position", position.clone()),
                    None => hit,
                })
            })
            .collect();
    }

    data["news_results"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(
                        base_hit(item)?
                            .with_metadata("source", str_field(item, "source"))
                            .with_metadata("date", str_field(item, "date"))
                            .with_metadata("source_api", NAME),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

fn base_hit(item: &Value) -> Option<CandidateSource> {
    let url = item["link"].as_str()?;
    Some(CandidateSource::new(
        url,
        str_field(item, "title"),
        str_field(item, "snippet"),
        NAME,
    ))
}

fn str_field(item: &Value, key: &str) -> String {
    item[key].as_str().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_organic_results() {
        let data = json!({
            "organic_results": [
                {"position": 1, "link": "https://en.wikipedia.org/wiki/Paris", "title": "Paris", "snippet": "Capital of France", "displayed_link": "en.wikipedia.org"},
                {"position": 2, "title": "no link"}
            ]
        });
        let hits = parse_results(&data);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Paris");
        assert_eq!(hits[0].backend, "serpapi");
        assert_eq!(hits[0].metadata["position"], 1);
        assert_eq!(hits[0].metadata["source_api"], "serpapi");
    }

    #[test]
    fn falls_back_to_news_results() {
        let data = json!({
            "news_results": [
                {"link": "https://news.test/a", "title": "Flood warning", "source": "Wire", "date": "2 hours ago"}
            ]
        });
        let hits = parse_results(&data);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].snippet, "");
        assert_eq!(hits[0].metadata["date"], "2 hours ago");
    }

    #[test]
    fn empty_payload_yields_nothing() {
        assert!(parse_results(&json!({"search_metadata": {}})).is_empty());
    }
}
