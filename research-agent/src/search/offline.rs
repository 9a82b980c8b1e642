use async_trait::async_trait;

use super::SearchBackend;
use crate::models::CandidateSource;
use crate::util::title_case;

const NAME: &str = "offline";
const DOMAINS: [&str; 5] = [
    "wikipedia.org",
    "blog.example.com",
    "news.example.com",
    "research.example.org",
    "academic.example.edu",
];

/// Deterministic stand-in used when no search credentials are configured.
///
/// Results are derived from the term alone, so repeated runs agree.
pub struct OfflineBackend;

#[async_trait]
impl SearchBackend for OfflineBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn search(
        &self,
        term: &str,
        prioritize_recency: bool,
    ) -> anyhow::Result<Vec<CandidateSource>> {
        Ok(offline_results(term, prioritize_recency))
    }
}

fn offline_results(term: &str, news: bool) -> Vec<CandidateSource> {
    let term = term.trim();
    let slug = term.to_lowercase().replace(' ', "-");
    let title = title_case(term);
    let mut results = Vec::with_capacity(DOMAINS.len() + 1);

    if !news {
        results.push(
            CandidateSource::new(
                format!("https://en.wikipedia.org/wiki/{}", term.replace(' ', "_")),
                format!("{} - Wikipedia", title),
                format!(
                    "This Wikipedia article provides comprehensive information about {}, including its history, significance, and key concepts...",
                    term
                ),
                NAME,
            )
            .with_metadata("display_link", "en.wikipedia.org")
            .with_metadata("source_api", NAME),
        );
    }

    for (i, domain) in DOMAINS.iter().enumerate() {
        let n = i + 1;
        let hit = if news {
            CandidateSource::new(
                format!("https://news.example.com/{}-article-{}", slug, n),
                format!("Latest News About {} - Article {}", title, n),
                format!("This news article discusses recent developments in {}...", term),
                NAME,
            )
            .with_metadata("source", "Example News")
            .with_metadata("date", format!("2023-{:02}-{:02}", i % 12 + 1, i % 28 + 1))
        } else {
            CandidateSource::new(
                format!("https://{}/{}-{}", domain, slug, n),
                format!("Information About {} - Result {}", title, n),
                format!(
                    "This webpage contains information about {} including definitions, examples, and applications...",
                    term
                ),
                NAME,
            )
            .with_metadata("display_link", *domain)
        };
        results.push(hit.with_metadata("source_api", NAME));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn factual_results_lead_with_wikipedia() {
        let hits = OfflineBackend.search("capital of France", false).await.unwrap();
        assert_eq!(hits.len(), 6);
        assert_eq!(hits[0].url, "https://en.wikipedia.org/wiki/capital_of_France");
        assert_eq!(hits[0].title, "Capital Of France - Wikipedia");
        assert_eq!(hits[2].url, "https://blog.example.com/capital-of-france-2");
        assert!(hits.iter().all(|h| h.metadata["source_api"] == "offline"));
    }

    #[tokio::test]
    async fn news_results_are_dated() {
        let hits = OfflineBackend.search("solar storm", true).await.unwrap();
        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0].url, "https://news.example.com/solar-storm-article-1");
        assert_eq!(hits[1].metadata["date"], "2023-02-02");
    }

    #[tokio::test]
    async fn output_is_reproducible() {
        let a = OfflineBackend.search("graph theory", false).await.unwrap();
        let b = OfflineBackend.search("graph theory", false).await.unwrap();
        assert_eq!(a, b);
    }
}
