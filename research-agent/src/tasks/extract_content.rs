use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use research_flow::{Context, NextAction, Result, Task, TaskResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::keys;
use crate::extract::{ContentExtractor, Extraction};
use crate::models::{CandidateSource, ExtractedDocument};

/// Fetches every candidate through a bounded pool; the output keeps candidate order.
pub struct ExtractContentTask {
    extractor: Arc<ContentExtractor>,
    concurrency: usize,
}

impl ExtractContentTask {
    pub fn new(extractor: Arc<ContentExtractor>, concurrency: usize) -> Self {
        Self {
            extractor,
            concurrency: concurrency.max(1),
        }
    }
}

fn metadata_date(source: &CandidateSource) -> Option<String> {
    ["published_date", "date"]
        .iter()
        .filter_map(|key| source.metadata.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|date| !date.is_empty())
        .map(str::to_string)
}

fn into_document(source: CandidateSource, extraction: Extraction) -> ExtractedDocument {
    let publish_date = extraction.publish_date.or_else(|| metadata_date(&source));
    ExtractedDocument {
        source,
        text: extraction.text,
        extraction_method: extraction.method,
        publish_date,
    }
}

#[async_trait]
impl Task for ExtractContentTask {
    fn id(&self) -> &str {
        "extract"
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let candidates: Vec<CandidateSource> = context.require(keys::CANDIDATES).await?;
        let total = candidates.len();

        let mut extracted: Vec<(usize, ExtractedDocument)> =
            stream::iter(candidates.into_iter().enumerate())
                .map(|(index, source)| {
                    let extractor = Arc::clone(&self.extractor);
                    async move {
                        info!(url = %source.url, "extracting content");
                        let extraction = extractor.extract(&source.url).await?;
                        Some((index, into_document(source, extraction)))
                    }
                })
                .buffer_unordered(self.concurrency)
                .filter_map(|item| async move { item })
                .collect()
                .await;
        extracted.sort_by_key(|(index, _)| *index);

        let documents: Vec<ExtractedDocument> =
            extracted.into_iter().map(|(_, document)| document).collect();
        let count = documents.len();
        info!(extracted = count, candidates = total, "extraction finished");

        context.set(keys::DOCUMENT_COUNT, count).await?;
        context.set(keys::DOCUMENTS, documents).await?;

        Ok(TaskResult::new_with_status(
            NextAction::Continue,
            format!("extracted {} of {} source(s)", count, total),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::models::ExtractionMethod;
    use crate::testing::StaticFetcher;

    fn page(body: &str) -> String {
        format!(
            "<html><head><title>T</title></head><body><main><p>{}</p></main></body></html>",
            body.repeat(20)
        )
    }

    #[tokio::test]
    async fn keeps_candidate_order_and_skips_failures() {
        let fetcher = StaticFetcher::new()
            .with_page("https://o.test/1", &page("first "))
            .with_page("https://o.test/3", &page("third "))
            .with_page("https://o.test/4", &page("fourth "));
        let extractor = Arc::new(ContentExtractor::new(
            Arc::new(fetcher),
            &ExtractionConfig::default(),
        ));
        let task = ExtractContentTask::new(extractor, 3);

        let candidates: Vec<CandidateSource> = (1..=4)
            .map(|i| {
                CandidateSource::new(format!("https://o.test/{}", i), format!("C{}", i), "", "static")
                    .with_metadata("date", "2024-01-02")
            })
            .collect();
        let context = Context::new();
        context.set(keys::CANDIDATES, candidates).await.unwrap();

        task.run(context.clone()).await.unwrap();

        let documents: Vec<ExtractedDocument> = context.require(keys::DOCUMENTS).await.unwrap();
        let urls: Vec<&str> = documents.iter().map(|d| d.source.url.as_str()).collect();
        assert_eq!(urls, vec!["https://o.test/1", "https://o.test/3", "https://o.test/4"]);
        assert_eq!(context.get::<usize>(keys::DOCUMENT_COUNT).await, Some(3));
        assert_eq!(documents[0].extraction_method, ExtractionMethod::Generic);
        assert_eq!(documents[0].publish_date.as_deref(), Some("2024-01-02"));
    }

    #[test]
    fn page_dates_win_over_search_metadata() {
        let source = CandidateSource::new("https://x.test", "X", "", "static")
            .with_metadata("published_date", " ")
            .with_metadata("date", "2023-05-06");
        assert_eq!(metadata_date(&source).as_deref(), Some("2023-05-06"));

        let document = into_document(
            source,
            Extraction {
                text: "body".into(),
                method: ExtractionMethod::Article,
                publish_date: Some("2024-02-03".into()),
            },
        );
        assert_eq!(document.publish_date.as_deref(), Some("2024-02-03"));
    }
}
