use async_trait::async_trait;
use research_flow::{Context, NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::info;

use super::keys;
use crate::models::{ExtractedDocument, QueryIntent};
use crate::relevance::RelevanceEngine;

pub struct RankSourcesTask {
    engine: Arc<RelevanceEngine>,
}

impl RankSourcesTask {
    pub fn new(engine: Arc<RelevanceEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Task for RankSourcesTask {
    fn id(&self) -> &str {
        "filter"
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let intent: QueryIntent = context.require(keys::INTENT).await?;
        let documents: Vec<ExtractedDocument> = context.require(keys::DOCUMENTS).await?;

        info!(documents = documents.len(), "analyzing content relevance");
        let ranked = self.engine.rank(&intent, documents).await;
        let count = ranked.len();
        context.set(keys::RANKED, ranked).await?;

        Ok(TaskResult::new_with_status(
            NextAction::Continue,
            format!("kept {} relevant source(s)", count),
        ))
    }
}
