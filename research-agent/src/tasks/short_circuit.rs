use async_trait::async_trait;
use research_flow::{Context, NextAction, Result, Task, TaskResult};
use tracing::warn;

use super::keys;
use crate::error::ResearchError;
use crate::models::{CandidateSource, QueryIntent, ResearchResult};

/// Terminal for a search that produced no candidates.
pub struct NoResultsTask;

#[async_trait]
impl Task for NoResultsTask {
    fn id(&self) -> &str {
        "no_results"
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let query: String = context.require(keys::QUERY).await?;
        let intent: QueryIntent = context.require(keys::INTENT).await?;

        warn!(query = %query, "no search results found");
        let result = ResearchResult::failure(&query, intent, &ResearchError::NoResults, Vec::new());
        context.set(keys::RESULT, result).await?;

        Ok(TaskResult::new_with_status(NextAction::End, "no search results"))
    }
}

/// Terminal for candidates none of which yielded content; the candidates are still reported.
pub struct NoContentTask;

#[async_trait]
impl Task for NoContentTask {
    fn id(&self) -> &str {
        "no_content"
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let query: String = context.require(keys::QUERY).await?;
        let intent: QueryIntent = context.require(keys::INTENT).await?;
        let candidates: Vec<CandidateSource> = context.require(keys::CANDIDATES).await?;

        warn!(query = %query, candidates = candidates.len(), "content extraction failed for all results");
        let error = ResearchError::NoContent {
            candidates: candidates.len(),
        };
        let sources = candidates.iter().map(CandidateSource::source_ref).collect();
        let result = ResearchResult::failure(&query, intent, &error, sources);
        context.set(keys::RESULT, result).await?;

        Ok(TaskResult::new_with_status(NextAction::End, "no extractable content"))
    }
}
